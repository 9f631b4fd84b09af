//! Element definitions for the scene.

mod image;
mod text;

pub use image::{FilterPatch, ImageData, ImageFilters, ImageFormat};
pub use text::{
    ApproximateMeasurer, FontFamily, Span, SpanStyle, TextData, TextMeasurer, TextPatch,
};

use kurbo::{BezPath, Ellipse, Point, Rect, RoundedRect, Shape as KurboShape, Size};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for elements.
pub type ElementId = Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Multiply the alpha channel by `opacity` (clamped to 0..=1).
    pub fn with_opacity(self, opacity: f64) -> Color {
        let alpha = (self.a as f64 * opacity.clamp(0.0, 1.0)).round() as u8;
        Color::from_rgba8(self.r, self.g, self.b, alpha)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Style properties shared by the geometric element kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    /// Fill color (None = no fill).
    pub fill_color: Option<SerializableColor>,
    /// Stroke color.
    pub stroke_color: SerializableColor,
    /// Stroke width in world units.
    pub stroke_width: f64,
    /// Overall opacity (0.0 = fully transparent, 1.0 = fully opaque).
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_opacity() -> f64 {
    1.0
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            fill_color: Some(SerializableColor::white()),
            stroke_color: SerializableColor::black(),
            stroke_width: 2.0,
            opacity: 1.0,
        }
    }
}

impl ShapeStyle {
    /// Get the stroke color with opacity applied.
    pub fn stroke_with_opacity(&self) -> Color {
        self.stroke_color.with_opacity(self.opacity)
    }

    /// Get the fill color with opacity applied.
    pub fn fill_with_opacity(&self) -> Option<Color> {
        self.fill_color.map(|c| c.with_opacity(self.opacity))
    }
}

/// Partial style update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StylePatch {
    /// `Some(None)` removes the fill.
    pub fill_color: Option<Option<SerializableColor>>,
    pub stroke_color: Option<SerializableColor>,
    pub stroke_width: Option<f64>,
    pub opacity: Option<f64>,
    /// Only meaningful for rounded rectangles.
    pub corner_radius: Option<f64>,
}

impl StylePatch {
    fn apply(&self, style: &mut ShapeStyle) {
        if let Some(fill) = self.fill_color {
            style.fill_color = fill;
        }
        if let Some(stroke) = self.stroke_color {
            style.stroke_color = stroke;
        }
        if let Some(width) = self.stroke_width {
            style.stroke_width = width.max(0.0);
        }
        if let Some(opacity) = self.opacity {
            style.opacity = opacity.clamp(0.0, 1.0);
        }
    }
}

/// Type-specific payload of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ElementKind {
    Rectangle(ShapeStyle),
    Circle(ShapeStyle),
    RoundedRectangle {
        style: ShapeStyle,
        corner_radius: f64,
    },
    Triangle(ShapeStyle),
    Image(ImageData),
    Text(TextData),
}

impl ElementKind {
    /// Short type name used in logs.
    pub fn type_name(&self) -> &'static str {
        match self {
            ElementKind::Rectangle(_) => "rectangle",
            ElementKind::Circle(_) => "circle",
            ElementKind::RoundedRectangle { .. } => "rounded-rectangle",
            ElementKind::Triangle(_) => "triangle",
            ElementKind::Image(_) => "image",
            ElementKind::Text(_) => "text",
        }
    }

    /// Shape style, for the geometric kinds.
    pub fn style(&self) -> Option<&ShapeStyle> {
        match self {
            ElementKind::Rectangle(style)
            | ElementKind::Circle(style)
            | ElementKind::Triangle(style)
            | ElementKind::RoundedRectangle { style, .. } => Some(style),
            ElementKind::Image(_) | ElementKind::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextData> {
        match self {
            ElementKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageData> {
        match self {
            ElementKind::Image(image) => Some(image),
            _ => None,
        }
    }

    /// Outline of this kind laid out inside `rect` (axis-aligned, rotation not applied).
    pub fn outline(&self, rect: Rect) -> BezPath {
        match self {
            ElementKind::Circle(_) => Ellipse::from_rect(rect).to_path(0.1),
            ElementKind::RoundedRectangle { corner_radius, .. } => {
                let radius = corner_radius.min(rect.width() / 2.0).min(rect.height() / 2.0);
                RoundedRect::from_rect(rect, radius.max(0.0)).to_path(0.1)
            }
            ElementKind::Triangle(_) => {
                let mut path = BezPath::new();
                path.move_to(Point::new(rect.center().x, rect.y0));
                path.line_to(Point::new(rect.x1, rect.y1));
                path.line_to(Point::new(rect.x0, rect.y1));
                path.close_path();
                path
            }
            ElementKind::Rectangle(_) | ElementKind::Image(_) | ElementKind::Text(_) => {
                rect.to_path(0.1)
            }
        }
    }

    /// Apply a style patch. Returns false for kinds without a shape style.
    fn apply_style(&mut self, patch: &StylePatch) -> bool {
        match self {
            ElementKind::Rectangle(style)
            | ElementKind::Circle(style)
            | ElementKind::Triangle(style) => {
                patch.apply(style);
                true
            }
            ElementKind::RoundedRectangle {
                style,
                corner_radius,
            } => {
                patch.apply(style);
                if let Some(radius) = patch.corner_radius {
                    *corner_radius = radius.max(0.0);
                }
                true
            }
            ElementKind::Image(_) | ElementKind::Text(_) => false,
        }
    }
}

/// An element in the scene.
///
/// Fields are only writable inside the crate; everything outside goes through
/// [`crate::store::ElementStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub(crate) id: ElementId,
    pub(crate) x: f64,
    pub(crate) y: f64,
    /// For text this is the laid-out width.
    pub(crate) width: f64,
    /// For text this is the laid-out height.
    pub(crate) height: f64,
    /// Rotation in radians around the center.
    #[serde(default)]
    pub(crate) rotation: f64,
    /// Mirrors selection membership; written only by the store.
    #[serde(skip)]
    pub(crate) selected: bool,
    pub(crate) kind: ElementKind,
}

impl Element {
    pub(crate) fn from_draft(id: ElementId, draft: ElementDraft) -> Self {
        Self {
            id,
            x: draft.x,
            y: draft.y,
            width: draft.width,
            height: draft.height,
            rotation: draft.rotation,
            selected: false,
            kind: draft.kind,
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Axis-aligned bounding box. Rotation is ignored.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position(), self.size())
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, ElementKind::Text(_))
    }

    /// Copy of every field except the id and the selection flag.
    pub fn to_draft(&self) -> ElementDraft {
        ElementDraft {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            rotation: self.rotation,
            kind: self.kind.clone(),
        }
    }

    /// Merge a transform patch. Width and height are ignored for text.
    pub(crate) fn apply_transform(&mut self, patch: &TransformPatch) {
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(rotation) = patch.rotation {
            self.rotation = rotation;
        }
        if self.is_text() {
            return;
        }
        if let Some(width) = patch.width {
            self.width = width.max(0.0);
        }
        if let Some(height) = patch.height {
            self.height = height.max(0.0);
        }
    }

    pub(crate) fn apply_style(&mut self, patch: &StylePatch) -> bool {
        self.kind.apply_style(patch)
    }

    /// Recompute the derived size of a text element.
    pub(crate) fn relayout(&mut self, measurer: &dyn TextMeasurer) {
        if let ElementKind::Text(text) = &self.kind {
            let size = measurer.measure(text);
            self.width = size.width;
            self.height = size.height;
        }
    }
}

/// An element without identity: used for creation, paste and clipboard payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDraft {
    pub x: f64,
    pub y: f64,
    /// Ignored for text (recomputed from layout).
    pub width: f64,
    /// Ignored for text (recomputed from layout).
    pub height: f64,
    #[serde(default)]
    pub rotation: f64,
    pub kind: ElementKind,
}

impl ElementDraft {
    fn new(rect: Rect, kind: ElementKind) -> Self {
        Self {
            x: rect.x0,
            y: rect.y0,
            width: rect.width(),
            height: rect.height(),
            rotation: 0.0,
            kind,
        }
    }

    pub fn rectangle(rect: Rect) -> Self {
        Self::new(rect, ElementKind::Rectangle(ShapeStyle::default()))
    }

    pub fn circle(rect: Rect) -> Self {
        Self::new(rect, ElementKind::Circle(ShapeStyle::default()))
    }

    pub fn rounded_rectangle(rect: Rect, corner_radius: f64) -> Self {
        Self::new(
            rect,
            ElementKind::RoundedRectangle {
                style: ShapeStyle::default(),
                corner_radius,
            },
        )
    }

    pub fn triangle(rect: Rect) -> Self {
        Self::new(rect, ElementKind::Triangle(ShapeStyle::default()))
    }

    pub fn image(rect: Rect, source: impl Into<String>) -> Self {
        Self::new(rect, ElementKind::Image(ImageData::new(source)))
    }

    /// A text draft at `origin`; the store computes its size.
    pub fn text(origin: Point, spans: Vec<Span>) -> Self {
        Self::new(
            Rect::from_origin_size(origin, Size::ZERO),
            ElementKind::Text(TextData::new(spans)),
        )
    }

    /// Replace the shape style (no effect on image and text drafts).
    pub fn with_style(mut self, new_style: ShapeStyle) -> Self {
        match &mut self.kind {
            ElementKind::Rectangle(style)
            | ElementKind::Circle(style)
            | ElementKind::Triangle(style)
            | ElementKind::RoundedRectangle { style, .. } => *style = new_style,
            ElementKind::Image(_) | ElementKind::Text(_) => {}
        }
        self
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(Point::new(self.x, self.y), Size::new(self.width, self.height))
    }
}

/// Partial transform update. Width and height are ignored for text elements.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransformPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rotation: Option<f64>,
}

impl TransformPatch {
    pub fn position(position: Point) -> Self {
        Self {
            x: Some(position.x),
            y: Some(position.y),
            ..Self::default()
        }
    }

    pub fn frame(rect: Rect) -> Self {
        Self {
            x: Some(rect.x0),
            y: Some(rect.y0),
            width: Some(rect.width()),
            height: Some(rect.height()),
            rotation: None,
        }
    }
}

/// One entry of a batched position commit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionUpdate {
    pub id: ElementId,
    pub x: f64,
    pub y: f64,
}

/// Generate a fresh element id.
pub(crate) fn generate_id() -> ElementId {
    Uuid::new_v4()
}
