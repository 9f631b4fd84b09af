//! Slate Core Library
//!
//! Platform-agnostic scene state and interaction logic for the Slate editor:
//! the element store, viewport, hit-testing, selection, drag/resize, rich-text
//! editing handoff, clipboard and persistence.

pub mod camera;
pub mod clipboard;
pub mod config;
pub mod elements;
pub mod input;
pub mod interaction;
pub mod render;
pub mod resources;
pub mod selection;
pub mod storage;
pub mod store;
pub mod text_edit;
pub mod text_sync;
pub mod tools;

pub use camera::Camera;
pub use clipboard::{ClipboardManager, ClipboardPayload};
pub use config::EditorConfig;
pub use elements::{Element, ElementDraft, ElementId, ElementKind};
pub use input::{InputState, KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use interaction::{CursorKind, InteractionController, ModeKind};
pub use render::{DrawCommand, Frame, FrameBuilder, Renderer};
pub use resources::{ImageInfo, ResourceCache, ResourceLoader, ResourceState};
pub use selection::{Handle, HandleKind, MultiMoveState, ResizeState};
pub use storage::{FileStorage, MemoryStorage, ScenePersistence, Storage, StorageError};
pub use store::ElementStore;
pub use text_edit::{EditOutcome, TextEditSession, TextOwnership};
pub use text_sync::{Mark, Markup, MarkupError};
pub use tools::{ToolKind, ToolManager};
