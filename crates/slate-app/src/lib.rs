//! Slate headless shell.
//!
//! Replays a JSON input script against a persisted scene, renders the final
//! frame through [`renderer::LogRenderer`] and returns the scene as JSON.

pub mod loader;
pub mod renderer;
pub mod script;
pub mod session;

use clap::Parser;
use loader::FsResourceLoader;
use renderer::LogRenderer;
use script::{ScriptError, parse_script};
use session::Session;
use slate_core::config::EditorConfig;
use slate_core::render::Renderer;
use slate_core::storage::FileStorage;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Replay an input script against a persisted scene.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "slate-app", about = "Replay a Slate input script and print the scene")]
pub struct Args {
    /// JSON input script.
    pub script: PathBuf,

    /// Scene store directory (defaults to the platform data dir).
    #[arg(long, value_name = "DIR")]
    pub store: Option<PathBuf>,

    /// Editor config JSON.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

fn read(path: &Path) -> Result<String, ScriptError> {
    std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Run the shell and return the resulting scene JSON.
pub async fn run(args: Args) -> Result<String, ScriptError> {
    let config = match &args.config {
        Some(path) => EditorConfig::from_json(&read(path)?).map_err(ScriptError::Config)?,
        None => EditorConfig::default(),
    };
    let script = parse_script(&read(&args.script)?)?;

    let storage = match &args.store {
        Some(dir) => FileStorage::new(dir.clone())?,
        None => FileStorage::default_location()?,
    };
    log::info!("Using scene store at {}", storage.base_path().display());

    let base = args
        .script
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let loader = FsResourceLoader::new(base);

    let mut session = Session::new(Arc::new(storage), config);
    session.restore().await;
    session.run(&script, &loader).await?;
    session.save().await;

    let mut renderer = LogRenderer::new();
    let frame = session.frame();
    if let Err(e) = renderer.render(&frame) {
        log::error!("Render failed: {e}");
    }

    session.store().to_json().map_err(ScriptError::Serialize)
}
