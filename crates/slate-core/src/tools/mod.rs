//! Tool system for the editor.

use crate::elements::{ElementDraft, ElementKind, FontFamily, ShapeStyle, TextData};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ToolKind {
    #[default]
    Select,
    Pan,
    Rectangle,
    Circle,
    RoundedRectangle,
    Triangle,
    Text,
}

impl ToolKind {
    /// Tools that create an element by dragging out its box.
    pub fn creates_by_drag(self) -> bool {
        matches!(
            self,
            ToolKind::Rectangle | ToolKind::Circle | ToolKind::RoundedRectangle | ToolKind::Triangle
        )
    }
}

/// State of a tool interaction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ToolState {
    /// Tool is idle, waiting for interaction.
    #[default]
    Idle,
    /// A creation drag is in progress (world coordinates).
    Active {
        tool: ToolKind,
        start: Point,
        current: Point,
    },
}

/// Builds drafts for the creation tools.
///
/// The active tool itself lives in the store; the manager only tracks the
/// in-progress drag and the style applied to new elements.
#[derive(Debug, Clone)]
pub struct ToolManager {
    /// Current state of the tool.
    pub state: ToolState,
    /// Current style to apply to new shapes.
    pub current_style: ShapeStyle,
    /// Corner radius for new rounded rectangles.
    pub corner_radius: f64,
    pub font_size: f64,
    pub font_family: FontFamily,
}

impl Default for ToolManager {
    fn default() -> Self {
        Self {
            state: ToolState::Idle,
            current_style: ShapeStyle::default(),
            corner_radius: 10.0,
            font_size: TextData::DEFAULT_FONT_SIZE,
            font_family: FontFamily::default(),
        }
    }
}

impl ToolManager {
    /// Create a new tool manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a creation drag. Returns false for tools that don't create by drag.
    pub fn begin(&mut self, tool: ToolKind, point: Point) -> bool {
        if !tool.creates_by_drag() {
            return false;
        }
        self.state = ToolState::Active {
            tool,
            start: point,
            current: point,
        };
        true
    }

    /// Update the current interaction.
    pub fn update(&mut self, point: Point) {
        if let ToolState::Active { current, .. } = &mut self.state {
            *current = point;
        }
    }

    /// End the current interaction and return the draft it describes.
    ///
    /// Size filtering is left to the caller.
    pub fn end(&mut self, point: Point) -> Option<ElementDraft> {
        let ToolState::Active { tool, start, .. } = self.state else {
            return None;
        };
        self.state = ToolState::Idle;
        self.draft_for(tool, Rect::from_points(start, point))
    }

    /// Cancel the current interaction.
    pub fn cancel(&mut self) {
        self.state = ToolState::Idle;
    }

    /// Check if a tool interaction is active.
    pub fn is_active(&self) -> bool {
        matches!(self.state, ToolState::Active { .. })
    }

    /// Draft for the drag in progress, for preview drawing.
    pub fn preview_draft(&self) -> Option<ElementDraft> {
        match self.state {
            ToolState::Active {
                tool,
                start,
                current,
            } => self.draft_for(tool, Rect::from_points(start, current)),
            ToolState::Idle => None,
        }
    }

    /// An empty text element at `origin` using the current font settings.
    pub fn text_draft(&self, origin: Point) -> ElementDraft {
        let mut draft = ElementDraft::text(origin, Vec::new());
        if let ElementKind::Text(text) = &mut draft.kind {
            text.font_size = self.font_size;
            text.font_family = self.font_family;
        }
        draft
    }

    fn draft_for(&self, tool: ToolKind, rect: Rect) -> Option<ElementDraft> {
        let draft = match tool {
            ToolKind::Rectangle => ElementDraft::rectangle(rect),
            ToolKind::Circle => ElementDraft::circle(rect),
            ToolKind::RoundedRectangle => ElementDraft::rounded_rectangle(rect, self.corner_radius),
            ToolKind::Triangle => ElementDraft::triangle(rect),
            ToolKind::Select | ToolKind::Pan | ToolKind::Text => return None,
        };
        Some(draft.with_style(self.current_style.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::SerializableColor;

    #[test]
    fn test_tool_interaction() {
        let mut tm = ToolManager::new();
        assert!(!tm.is_active());

        assert!(tm.begin(ToolKind::Rectangle, Point::new(100.0, 100.0)));
        assert!(tm.is_active());

        tm.update(Point::new(50.0, 60.0));
        let preview = tm.preview_draft().unwrap();
        assert_eq!(preview.bounds(), Rect::new(50.0, 60.0, 100.0, 100.0));

        let draft = tm.end(Point::new(40.0, 30.0)).unwrap();
        assert!((draft.x - 40.0).abs() < f64::EPSILON);
        assert!((draft.y - 30.0).abs() < f64::EPSILON);
        assert!((draft.width - 60.0).abs() < f64::EPSILON);
        assert!((draft.height - 70.0).abs() < f64::EPSILON);
        assert!(!tm.is_active());
    }

    #[test]
    fn test_cancel_interaction() {
        let mut tm = ToolManager::new();
        tm.begin(ToolKind::Circle, Point::new(0.0, 0.0));
        assert!(tm.is_active());

        tm.cancel();
        assert!(!tm.is_active());
        assert!(tm.end(Point::new(10.0, 10.0)).is_none());
    }

    #[test]
    fn test_select_tool_no_shape() {
        let mut tm = ToolManager::new();
        assert!(!tm.begin(ToolKind::Select, Point::new(0.0, 0.0)));
        assert!(!tm.begin(ToolKind::Text, Point::new(0.0, 0.0)));
        assert!(tm.end(Point::new(100.0, 100.0)).is_none());
    }

    #[test]
    fn test_style_and_radius_applied() {
        let mut tm = ToolManager::new();
        tm.corner_radius = 6.0;
        tm.current_style.fill_color = Some(SerializableColor::new(255, 0, 0, 255));
        tm.begin(ToolKind::RoundedRectangle, Point::ZERO);
        let draft = tm.end(Point::new(20.0, 20.0)).unwrap();
        match draft.kind {
            ElementKind::RoundedRectangle {
                style,
                corner_radius,
            } => {
                assert!((corner_radius - 6.0).abs() < f64::EPSILON);
                assert_eq!(style.fill_color, Some(SerializableColor::new(255, 0, 0, 255)));
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_text_draft_is_empty() {
        let mut tm = ToolManager::new();
        tm.font_size = 32.0;
        let draft = tm.text_draft(Point::new(5.0, 5.0));
        let text = draft.kind.as_text().unwrap();
        assert!(text.is_blank());
        assert!((text.font_size - 32.0).abs() < f64::EPSILON);
    }
}
