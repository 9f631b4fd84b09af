//! Resolves image sources by decoding their headers.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use slate_core::elements::ImageFormat;
use slate_core::resources::{ImageInfo, ResourceLoader};
use slate_core::storage::BoxFuture;
use std::io::Cursor;
use std::path::PathBuf;

/// Loads `data:` URIs and paths relative to a base directory.
#[derive(Debug, Clone)]
pub struct FsResourceLoader {
    base: PathBuf,
}

impl FsResourceLoader {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn dimensions(&self, source: &str) -> Result<(u32, u32), String> {
        if ImageFormat::from_source(source) == Some(ImageFormat::Svg) {
            return Err("SVG sources are not decoded".to_string());
        }
        if let Some(rest) = source.strip_prefix("data:") {
            let (_, payload) = rest
                .split_once(";base64,")
                .ok_or_else(|| "only base64 data URIs are supported".to_string())?;
            let bytes = STANDARD.decode(payload).map_err(|e| e.to_string())?;
            return image::ImageReader::new(Cursor::new(bytes))
                .with_guessed_format()
                .map_err(|e| e.to_string())?
                .into_dimensions()
                .map_err(|e| e.to_string());
        }
        image::image_dimensions(self.base.join(source)).map_err(|e| format!("{source}: {e}"))
    }
}

impl ResourceLoader for FsResourceLoader {
    fn load(&self, key: &str) -> BoxFuture<'_, Result<ImageInfo, String>> {
        let result = self
            .dimensions(key)
            .map(|(width, height)| ImageInfo { width, height });
        Box::pin(async move { result })
    }
}
