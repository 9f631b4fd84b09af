//! Image payload and filters.

use serde::{Deserialize, Serialize};

/// Image format guessed from a source reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
    Gif,
    Svg,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Svg => "image/svg+xml",
        }
    }

    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::WebP),
            "gif" => Some(ImageFormat::Gif),
            "svg" => Some(ImageFormat::Svg),
            _ => None,
        }
    }

    /// Detect format from a `data:` URI or a path/URL extension.
    pub fn from_source(source: &str) -> Option<Self> {
        if let Some(rest) = source.strip_prefix("data:") {
            let mime = rest.split([';', ',']).next()?;
            return Self::all().iter().copied().find(|f| f.mime_type() == mime);
        }
        let path = source.split(['?', '#']).next()?;
        let (_, ext) = path.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    fn all() -> &'static [ImageFormat] {
        &[
            ImageFormat::Png,
            ImageFormat::Jpeg,
            ImageFormat::WebP,
            ImageFormat::Gif,
            ImageFormat::Svg,
        ]
    }
}

/// Filter set applied by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageFilters {
    #[serde(default)]
    pub grayscale: bool,
    /// Blur radius, never negative.
    #[serde(default)]
    pub blur: f64,
    #[serde(default = "default_brightness")]
    pub brightness: f64,
}

fn default_brightness() -> f64 {
    1.0
}

impl Default for ImageFilters {
    fn default() -> Self {
        Self {
            grayscale: false,
            blur: 0.0,
            brightness: 1.0,
        }
    }
}

impl ImageFilters {
    /// True when the filters leave the image unchanged.
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

/// Partial filter update.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FilterPatch {
    pub grayscale: Option<bool>,
    pub blur: Option<f64>,
    pub brightness: Option<f64>,
}

impl FilterPatch {
    pub(crate) fn apply(&self, filters: &mut ImageFilters) {
        if let Some(grayscale) = self.grayscale {
            filters.grayscale = grayscale;
        }
        if let Some(blur) = self.blur {
            filters.blur = blur.max(0.0);
        }
        if let Some(brightness) = self.brightness {
            filters.brightness = brightness.max(0.0);
        }
    }
}

/// Image element payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageData {
    /// Path, URL or data URI. Resolved by the rendering collaborator.
    pub source: String,
    #[serde(default)]
    pub filters: ImageFilters,
}

impl ImageData {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            filters: ImageFilters::default(),
        }
    }

    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_source(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ImageFormat::from_extension("PNG"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_extension("jpg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("bmp"), None);
    }

    #[test]
    fn test_format_from_source() {
        assert_eq!(
            ImageFormat::from_source("https://example.com/cat.webp?size=2"),
            Some(ImageFormat::WebP)
        );
        assert_eq!(
            ImageFormat::from_source("data:image/svg+xml;base64,AAAA"),
            Some(ImageFormat::Svg)
        );
        assert_eq!(ImageFormat::from_source("no-extension"), None);
    }

    #[test]
    fn test_filter_patch_clamps() {
        let mut filters = ImageFilters::default();
        FilterPatch {
            blur: Some(-3.0),
            grayscale: Some(true),
            ..FilterPatch::default()
        }
        .apply(&mut filters);
        assert!(filters.grayscale);
        assert!(filters.blur.abs() < f64::EPSILON);
        assert!((filters.brightness - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_filters_use_defaults() {
        let data: ImageData = serde_json::from_str(r#"{"source":"a.png"}"#).unwrap();
        assert!(data.filters.is_identity());
        let filters: ImageFilters = serde_json::from_str(r#"{"blur":2.5}"#).unwrap();
        assert!((filters.brightness - 1.0).abs() < f64::EPSILON);
        assert!((filters.blur - 2.5).abs() < f64::EPSILON);
    }
}
