//! A headless renderer that summarises frames to the log.

use slate_core::render::{DrawCommand, Frame, RenderResult, Renderer};
use std::fmt;

/// Per-kind command counts for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameSummary {
    pub shapes: usize,
    pub images: usize,
    pub texts: usize,
    pub overlays: usize,
    pub pending_images: usize,
}

impl FrameSummary {
    pub fn of(frame: &Frame) -> Self {
        let mut summary = Self {
            pending_images: frame.pending_images,
            ..Self::default()
        };
        for command in &frame.commands {
            match command {
                DrawCommand::Shape { .. } => summary.shapes += 1,
                DrawCommand::Image { .. } => summary.images += 1,
                DrawCommand::Text { .. } => summary.texts += 1,
                DrawCommand::SelectionOutline(_)
                | DrawCommand::Handle(_)
                | DrawCommand::Marquee(_)
                | DrawCommand::CreationPreview(_) => summary.overlays += 1,
            }
        }
        summary
    }
}

impl fmt::Display for FrameSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} shapes, {} images ({} pending), {} texts, {} overlays",
            self.shapes, self.images, self.pending_images, self.texts, self.overlays
        )
    }
}

/// Logs a summary of each frame instead of drawing it.
#[derive(Debug, Default)]
pub struct LogRenderer {
    frames: u64,
    last: Option<FrameSummary>,
}

impl LogRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_summary(&self) -> Option<FrameSummary> {
        self.last
    }
}

impl Renderer for LogRenderer {
    fn render(&mut self, frame: &Frame) -> RenderResult<()> {
        let summary = FrameSummary::of(frame);
        self.frames += 1;
        log::info!("Frame {}: {summary}", self.frames);
        self.last = Some(summary);
        Ok(())
    }
}
