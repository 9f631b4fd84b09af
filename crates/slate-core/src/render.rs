//! Renderer trait abstraction and frame building.
//!
//! [`FrameBuilder`] turns a shared borrow of the store (plus any in-flight
//! gesture previews) into a flat list of world-space [`DrawCommand`]s.
//! Backends implement [`Renderer`] to rasterise them.

use crate::elements::{ElementId, ElementKind, FontFamily, ImageFilters, Span};
use crate::interaction::InteractionController;
use crate::resources::{ImageInfo, ResourceCache, ResourceState};
use crate::selection::{self, handles_for_bounds};
use crate::store::ElementStore;
use kurbo::{Affine, BezPath, Point, Rect, Size};
use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Render failed: {0}")]
    RenderFailed(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// One drawing instruction, in world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// A geometric element; rotation is already applied to `path`.
    Shape {
        id: ElementId,
        path: BezPath,
        fill: Option<Color>,
        stroke: Color,
        stroke_width: f64,
    },
    Image {
        id: ElementId,
        rect: Rect,
        rotation: f64,
        filters: ImageFilters,
        size: ImageInfo,
    },
    Text {
        id: ElementId,
        origin: Point,
        spans: Vec<Span>,
        font_size: f64,
        font_family: FontFamily,
        color: Color,
    },
    /// Outline around one selected (or marquee-touched) element.
    SelectionOutline(Rect),
    /// A resize handle square.
    Handle(Rect),
    Marquee(Rect),
    /// Outline of the element being dragged out by a creation tool.
    CreationPreview(BezPath),
}

/// Everything a backend needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// World to screen transform.
    pub transform: Affine,
    pub commands: Vec<DrawCommand>,
    /// Images skipped this frame because their source is not resolved.
    pub pending_images: usize,
}

impl Frame {
    /// Commands that draw scene elements (not overlays).
    pub fn element_ids(&self) -> Vec<ElementId> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Shape { id, .. }
                | DrawCommand::Image { id, .. }
                | DrawCommand::Text { id, .. } => Some(*id),
                _ => None,
            })
            .collect()
    }
}

/// Trait for rendering backends.
pub trait Renderer: Send + Sync {
    /// Draw a frame.
    fn render(&mut self, frame: &Frame) -> RenderResult<()>;
}

/// Builds a [`Frame`] from the scene.
pub struct FrameBuilder<'a> {
    store: &'a ElementStore,
    resources: &'a mut ResourceCache,
    interaction: Option<&'a InteractionController>,
    /// Handle side length in screen pixels.
    handle_size: f64,
}

impl<'a> FrameBuilder<'a> {
    pub fn new(store: &'a ElementStore, resources: &'a mut ResourceCache) -> Self {
        Self {
            store,
            resources,
            interaction: None,
            handle_size: 8.0,
        }
    }

    /// Include gesture previews, the marquee and text edit suppression.
    pub fn with_interaction(mut self, interaction: &'a InteractionController) -> Self {
        self.handle_size = interaction.config().handle_size;
        self.interaction = Some(interaction);
        self
    }

    pub fn build(self) -> Frame {
        let store = self.store;
        let interaction = self.interaction;
        let editing = interaction.and_then(InteractionController::editing_id);
        let mut commands = Vec::with_capacity(store.len());
        let mut pending_images = 0;

        for element in store.elements() {
            let id = element.id();
            if editing == Some(id) {
                continue;
            }
            let frame = element_frame(interaction, id, element.bounds());
            let rotation = element.rotation();
            match element.kind() {
                ElementKind::Image(image) => match self.resources.request(&image.source) {
                    ResourceState::Ready(size) => commands.push(DrawCommand::Image {
                        id,
                        rect: frame,
                        rotation,
                        filters: image.filters,
                        size,
                    }),
                    ResourceState::Pending | ResourceState::Failed(_) => pending_images += 1,
                },
                ElementKind::Text(text) => commands.push(DrawCommand::Text {
                    id,
                    origin: frame.origin(),
                    spans: text.spans.clone(),
                    font_size: text.font_size,
                    font_family: text.font_family,
                    color: text.color.into(),
                }),
                kind => {
                    let Some(style) = kind.style() else {
                        continue;
                    };
                    let mut path = kind.outline(frame);
                    if rotation != 0.0 {
                        path.apply_affine(Affine::rotate_about(rotation, frame.center()));
                    }
                    commands.push(DrawCommand::Shape {
                        id,
                        path,
                        fill: style.fill_with_opacity(),
                        stroke: style.stroke_with_opacity(),
                        stroke_width: style.stroke_width,
                    });
                }
            }
        }

        let zoom = store.camera().zoom();
        let overlay = Overlay {
            store,
            interaction,
            handle_world: self.handle_size / zoom,
        };
        overlay.push_into(&mut commands);

        Frame {
            transform: store.camera().transform(),
            commands,
            pending_images,
        }
    }
}

/// Box an element is drawn in, with gesture previews applied.
fn element_frame(interaction: Option<&InteractionController>, id: ElementId, bounds: Rect) -> Rect {
    let Some(interaction) = interaction else {
        return bounds;
    };
    if let Some(rect) = interaction.preview_transform(id) {
        return rect;
    }
    match interaction.preview_position(id) {
        Some(origin) => Rect::from_origin_size(origin, bounds.size()),
        None => bounds,
    }
}

struct Overlay<'a> {
    store: &'a ElementStore,
    interaction: Option<&'a InteractionController>,
    handle_world: f64,
}

impl Overlay<'_> {
    fn push_into(&self, commands: &mut Vec<DrawCommand>) {
        let editing = self.interaction.and_then(InteractionController::editing_id);
        let mut selection_bounds: Option<Rect> = None;
        for element in self.store.selected_elements() {
            if editing == Some(element.id()) {
                continue;
            }
            let frame = element_frame(self.interaction, element.id(), element.bounds());
            commands.push(DrawCommand::SelectionOutline(frame));
            selection_bounds = Some(selection_bounds.map_or(frame, |b| b.union(frame)));
        }

        if let Some(interaction) = self.interaction {
            for &id in interaction.marquee_preview() {
                if let Some(element) = self.store.get(id) {
                    if !element.is_selected() {
                        commands.push(DrawCommand::SelectionOutline(element.bounds()));
                    }
                }
            }
            if let Some(rect) = interaction.marquee_rect() {
                commands.push(DrawCommand::Marquee(rect));
            }
            if let Some(draft) = interaction.creation_preview() {
                commands.push(DrawCommand::CreationPreview(draft.kind.outline(draft.bounds())));
            }
        }

        if !selection::can_resize(self.store) {
            return;
        }
        let bounds = self
            .interaction
            .and_then(InteractionController::preview_bounds)
            .or(selection_bounds);
        if let Some(bounds) = bounds {
            let size = Size::new(self.handle_world, self.handle_world);
            commands.extend(
                handles_for_bounds(bounds)
                    .iter()
                    .map(|handle| DrawCommand::Handle(Rect::from_center_size(handle.position, size))),
            );
        }
    }
}
