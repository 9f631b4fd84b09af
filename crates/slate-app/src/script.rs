//! Input scripts: a JSON list of steps replayed against a session.

use serde::Deserialize;
use slate_core::input::{Modifiers, MouseButton};
use slate_core::storage::StorageError;
use slate_core::text_sync::MarkupError;
use slate_core::tools::ToolKind;
use std::path::PathBuf;
use thiserror::Error;

/// Virtual time between steps unless a step says otherwise.
pub const DEFAULT_STEP_MS: u64 = 1000;

fn default_step_ms() -> u64 {
    DEFAULT_STEP_MS
}

fn left() -> MouseButton {
    MouseButton::Left
}

/// One scripted action.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScriptStep {
    PointerDown {
        x: f64,
        y: f64,
        #[serde(default = "left")]
        button: MouseButton,
        #[serde(default)]
        modifiers: Modifiers,
    },
    PointerMove {
        x: f64,
        y: f64,
    },
    PointerUp {
        x: f64,
        y: f64,
        #[serde(default = "left")]
        button: MouseButton,
    },
    PointerCancel,
    Wheel {
        x: f64,
        y: f64,
        #[serde(default)]
        dx: f64,
        #[serde(default)]
        dy: f64,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Key {
        key: String,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Tool {
        tool: ToolKind,
    },
    /// Replace the content of the open text edit surface.
    EditHtml {
        html: String,
    },
    EndEdit,
    PasteAt {
        x: f64,
        y: f64,
    },
    ImportImage {
        source: String,
        width: f64,
        height: f64,
    },
    /// Run the resource loader for every image source seen so far.
    ResolveImages,
}

/// A step plus the virtual time that passes before it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptEntry {
    #[serde(default = "default_step_ms")]
    pub wait_ms: u64,
    #[serde(flatten)]
    pub step: ScriptStep,
}

impl ScriptEntry {
    pub fn new(step: ScriptStep) -> Self {
        Self {
            wait_ms: DEFAULT_STEP_MS,
            step,
        }
    }

    pub fn after(wait_ms: u64, step: ScriptStep) -> Self {
        Self { wait_ms, step }
    }
}

/// Parse a script document.
pub fn parse_script(json: &str) -> Result<Vec<ScriptEntry>, ScriptError> {
    serde_json::from_str(json).map_err(ScriptError::Parse)
}

/// Errors that stop a script run.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid script: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("invalid config: {0}")]
    Config(#[source] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Storage(#[from] StorageError),
    #[error("step {step}: no text is being edited")]
    NotEditing { step: usize },
    #[error("step {step}: {source}")]
    Markup {
        step: usize,
        #[source]
        source: MarkupError,
    },
    #[error("failed to serialize scene: {0}")]
    Serialize(#[source] serde_json::Error),
}
