//! Selection handles and group manipulation math.

use crate::elements::{ElementId, PositionUpdate, TransformPatch};
use crate::store::ElementStore;
use crate::tools::ToolKind;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One of the eight resize handles on the selection box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl HandleKind {
    pub fn all() -> &'static [HandleKind] {
        &[
            HandleKind::TopLeft,
            HandleKind::Top,
            HandleKind::TopRight,
            HandleKind::Right,
            HandleKind::BottomRight,
            HandleKind::Bottom,
            HandleKind::BottomLeft,
            HandleKind::Left,
        ]
    }

    /// Position of this handle on `bounds`.
    pub fn position(&self, bounds: Rect) -> Point {
        let center = bounds.center();
        match self {
            HandleKind::TopLeft => Point::new(bounds.x0, bounds.y0),
            HandleKind::Top => Point::new(center.x, bounds.y0),
            HandleKind::TopRight => Point::new(bounds.x1, bounds.y0),
            HandleKind::Right => Point::new(bounds.x1, center.y),
            HandleKind::BottomRight => Point::new(bounds.x1, bounds.y1),
            HandleKind::Bottom => Point::new(center.x, bounds.y1),
            HandleKind::BottomLeft => Point::new(bounds.x0, bounds.y1),
            HandleKind::Left => Point::new(bounds.x0, center.y),
        }
    }

    fn moves_left(&self) -> bool {
        matches!(self, HandleKind::TopLeft | HandleKind::Left | HandleKind::BottomLeft)
    }

    fn moves_right(&self) -> bool {
        matches!(self, HandleKind::TopRight | HandleKind::Right | HandleKind::BottomRight)
    }

    fn moves_top(&self) -> bool {
        matches!(self, HandleKind::TopLeft | HandleKind::Top | HandleKind::TopRight)
    }

    fn moves_bottom(&self) -> bool {
        matches!(self, HandleKind::BottomLeft | HandleKind::Bottom | HandleKind::BottomRight)
    }
}

/// A selection handle with its position and type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    /// Position in world coordinates.
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a point (in world coordinates) hits this handle.
    /// `tolerance` should be adjusted for camera zoom.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point.x - self.position.x).abs() <= tolerance
            && (point.y - self.position.y).abs() <= tolerance
    }

    /// Square around the handle, `size` on each side.
    pub fn rect(&self, size: f64) -> Rect {
        Rect::from_center_size(self.position, (size, size))
    }
}

/// Handles for an arbitrary box.
pub fn handles_for_bounds(bounds: Rect) -> Vec<Handle> {
    HandleKind::all()
        .iter()
        .map(|&kind| Handle::new(kind.position(bounds), kind))
        .collect()
}

/// Whether the current selection can be resized.
///
/// Only with the select tool, only with a non-empty selection, and never for
/// a lone text element.
pub fn can_resize(store: &ElementStore) -> bool {
    if store.tool() != ToolKind::Select {
        return false;
    }
    match store.selected_ids() {
        [] => false,
        [only] => store.get(*only).is_some_and(|e| !e.is_text()),
        _ => true,
    }
}

/// Handles offered for the current selection (empty when resizing is not allowed).
pub fn selection_handles(store: &ElementStore) -> Vec<Handle> {
    if !can_resize(store) {
        return Vec::new();
    }
    store
        .selection_bounds()
        .map(handles_for_bounds)
        .unwrap_or_default()
}

/// Find which handle (if any) is hit at the given point.
pub fn hit_test_handles(handles: &[Handle], point: Point, tolerance: f64) -> Option<HandleKind> {
    handles
        .iter()
        .find(|handle| handle.hit_test(point, tolerance))
        .map(|handle| handle.kind)
}

/// New box after dragging `handle` by `delta`; the opposite side stays fixed
/// and neither dimension drops below `min_size`.
pub fn resize_bounds(old: Rect, handle: HandleKind, delta: Vec2, min_size: f64) -> Rect {
    let mut new = old;
    if handle.moves_left() {
        new.x0 = (old.x0 + delta.x).min(old.x1 - min_size);
    }
    if handle.moves_right() {
        new.x1 = (old.x1 + delta.x).max(old.x0 + min_size);
    }
    if handle.moves_top() {
        new.y0 = (old.y0 + delta.y).min(old.y1 - min_size);
    }
    if handle.moves_bottom() {
        new.y1 = (old.y1 + delta.y).max(old.y0 + min_size);
    }
    new
}

/// Snapshot of the selected elements at the start of a group drag.
#[derive(Debug, Clone)]
pub struct MultiMoveState {
    /// Press position in world coordinates.
    pub start_point: Point,
    /// Current pointer position in world coordinates.
    pub current_point: Point,
    /// Original positions (id -> top-left).
    pub original_positions: Vec<(ElementId, Point)>,
}

impl MultiMoveState {
    pub fn new(start_point: Point, store: &ElementStore) -> Self {
        Self {
            start_point,
            current_point: start_point,
            original_positions: store
                .selected_elements()
                .map(|e| (e.id(), e.position()))
                .collect(),
        }
    }

    /// Get the drag delta.
    pub fn delta(&self) -> Vec2 {
        self.current_point - self.start_point
    }

    /// Preview position of one dragged element.
    pub fn position_of(&self, id: ElementId) -> Option<Point> {
        let delta = self.delta();
        self.original_positions
            .iter()
            .find(|(other, _)| *other == id)
            .map(|(_, origin)| *origin + delta)
    }

    /// Final positions for every dragged element.
    pub fn updates(&self) -> Vec<PositionUpdate> {
        let delta = self.delta();
        self.original_positions
            .iter()
            .map(|&(id, origin)| {
                let moved = origin + delta;
                PositionUpdate {
                    id,
                    x: moved.x,
                    y: moved.y,
                }
            })
            .collect()
    }
}

/// One element captured at the start of a resize.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ResizeItem {
    bounds: Rect,
    /// Text keeps its laid-out size; only its position is rescaled.
    keep_size: bool,
}

/// Snapshot of the selection at the start of a group resize.
#[derive(Debug, Clone)]
pub struct ResizeState {
    pub handle: HandleKind,
    pub original_bounds: Rect,
    /// Box the selection currently occupies.
    pub current_bounds: Rect,
    items: HashMap<ElementId, ResizeItem>,
    order: Vec<ElementId>,
}

impl ResizeState {
    /// Capture the current selection. Returns None if there is nothing to resize.
    pub fn from_selection(store: &ElementStore, handle: HandleKind) -> Option<Self> {
        let bounds = store.selection_bounds()?;
        let elements = store
            .selected_elements()
            .map(|e| (e.id(), e.bounds(), e.is_text()));
        Some(Self::with_bounds(bounds, handle, elements))
    }

    /// Capture an explicit set of `(id, box, is_text)` within `bounds`.
    pub fn with_bounds(
        bounds: Rect,
        handle: HandleKind,
        elements: impl IntoIterator<Item = (ElementId, Rect, bool)>,
    ) -> Self {
        let mut items = HashMap::new();
        let mut order = Vec::new();
        for (id, rect, keep_size) in elements {
            if items
                .insert(id, ResizeItem { bounds: rect, keep_size })
                .is_none()
            {
                order.push(id);
            }
        }
        Self {
            handle,
            original_bounds: bounds,
            current_bounds: bounds,
            items,
            order,
        }
    }

    /// Recompute the target box from the pointer delta since the press.
    pub fn update(&mut self, delta: Vec2, min_size: f64) {
        self.current_bounds = resize_bounds(self.original_bounds, self.handle, delta, min_size);
    }

    /// `(scale_x, scale_y)`; an axis with no original extent keeps scale 1.
    pub fn scale(&self) -> (f64, f64) {
        let axis = |new: f64, old: f64| if old > 0.0 { new / old } else { 1.0 };
        (
            axis(self.current_bounds.width(), self.original_bounds.width()),
            axis(self.current_bounds.height(), self.original_bounds.height()),
        )
    }

    /// Box one element occupies under the current scale.
    pub fn frame_of(&self, id: ElementId) -> Option<Rect> {
        let item = self.items.get(&id)?;
        let (sx, sy) = self.scale();
        let old_origin = self.original_bounds.origin();
        let new_origin = self.current_bounds.origin();
        let x = new_origin.x + (item.bounds.x0 - old_origin.x) * sx;
        let y = new_origin.y + (item.bounds.y0 - old_origin.y) * sy;
        let (w, h) = if item.keep_size {
            (item.bounds.width(), item.bounds.height())
        } else {
            (item.bounds.width() * sx, item.bounds.height() * sy)
        };
        Some(Rect::new(x, y, x + w, y + h))
    }

    /// Transform patches for every captured element, in selection order.
    pub fn transforms(&self) -> Vec<(ElementId, TransformPatch)> {
        self.order
            .iter()
            .filter_map(|&id| {
                let frame = self.frame_of(id)?;
                let patch = if self.items.get(&id).is_some_and(|item| item.keep_size) {
                    TransformPatch::position(frame.origin())
                } else {
                    TransformPatch::frame(frame)
                };
                Some((id, patch))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{ElementDraft, Span};
    use crate::store::tests::FixedMeasurer;
    use kurbo::Size;
    use std::sync::Arc;

    fn assert_rect(actual: Rect, expected: Rect) {
        assert!((actual.x0 - expected.x0).abs() < 1e-9, "{actual:?} != {expected:?}");
        assert!((actual.y0 - expected.y0).abs() < 1e-9, "{actual:?} != {expected:?}");
        assert!((actual.x1 - expected.x1).abs() < 1e-9, "{actual:?} != {expected:?}");
        assert!((actual.y1 - expected.y1).abs() < 1e-9, "{actual:?} != {expected:?}");
    }

    #[test]
    fn test_handles_cover_box() {
        let handles = handles_for_bounds(Rect::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(handles.len(), 8);
        let bottom = handles.iter().find(|h| h.kind == HandleKind::Bottom).unwrap();
        assert_eq!(bottom.position, Point::new(50.0, 50.0));
        assert_eq!(
            hit_test_handles(&handles, Point::new(101.0, 49.0), 3.0),
            Some(HandleKind::BottomRight)
        );
        assert_eq!(hit_test_handles(&handles, Point::new(30.0, 20.0), 3.0), None);
    }

    #[test]
    fn test_single_text_has_no_handles() {
        let mut store = ElementStore::new();
        let text = store.add(ElementDraft::text(Point::ZERO, vec![Span::new("hi")]));
        store.set_selected([text]);
        assert!(selection_handles(&store).is_empty());

        let rect = store.add(ElementDraft::rectangle(Rect::new(50.0, 50.0, 60.0, 60.0)));
        store.set_selected([text, rect]);
        assert_eq!(selection_handles(&store).len(), 8);

        store.set_tool(ToolKind::Rectangle);
        assert!(selection_handles(&store).is_empty());
    }

    #[test]
    fn test_resize_bounds_fixes_opposite_side() {
        let old = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_rect(
            resize_bounds(old, HandleKind::TopLeft, Vec2::new(10.0, 20.0), 1.0),
            Rect::new(10.0, 20.0, 100.0, 100.0),
        );
        assert_rect(
            resize_bounds(old, HandleKind::Right, Vec2::new(-30.0, 55.0), 1.0),
            Rect::new(0.0, 0.0, 70.0, 100.0),
        );
    }

    #[test]
    fn test_resize_bounds_clamps_to_minimum() {
        let old = Rect::new(0.0, 0.0, 100.0, 100.0);
        let inverted = resize_bounds(old, HandleKind::BottomRight, Vec2::new(-500.0, -500.0), 1.0);
        assert_rect(inverted, Rect::new(0.0, 0.0, 1.0, 1.0));
        let inverted = resize_bounds(old, HandleKind::TopLeft, Vec2::new(500.0, 500.0), 1.0);
        assert_rect(inverted, Rect::new(99.0, 99.0, 100.0, 100.0));
    }

    #[test]
    fn test_group_resize_keeps_text_size() {
        let rect_id = crate::elements::generate_id();
        let text_id = crate::elements::generate_id();
        let mut state = ResizeState::with_bounds(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            HandleKind::BottomRight,
            [
                (rect_id, Rect::new(10.0, 10.0, 30.0, 30.0), false),
                (text_id, Rect::new(50.0, 50.0, 80.0, 60.0), true),
            ],
        );
        state.update(Vec2::new(50.0, 0.0), 1.0);
        let (sx, sy) = state.scale();
        assert!((sx - 1.5).abs() < 1e-12);
        assert!((sy - 1.0).abs() < 1e-12);
        assert_rect(state.frame_of(rect_id).unwrap(), Rect::new(15.0, 10.0, 45.0, 30.0));
        assert_rect(state.frame_of(text_id).unwrap(), Rect::new(75.0, 50.0, 105.0, 60.0));
    }

    #[test]
    fn test_group_resize_commit_through_store() {
        let mut store =
            ElementStore::with_measurer(Arc::new(FixedMeasurer(Size::new(30.0, 10.0))));
        let frame = store.add(ElementDraft::rectangle(Rect::new(0.0, 0.0, 100.0, 100.0)));
        let rect = store.add(ElementDraft::rectangle(Rect::new(10.0, 10.0, 30.0, 30.0)));
        let text = store.add(ElementDraft::text(Point::new(50.0, 50.0), vec![Span::new("t")]));
        store.set_selected([frame, rect, text]);

        let mut state = ResizeState::from_selection(&store, HandleKind::BottomRight).unwrap();
        state.update(Vec2::new(50.0, 0.0), 1.0);
        assert_eq!(store.update_transforms(&state.transforms()), 3);

        assert_rect(store.get(rect).unwrap().bounds(), Rect::new(15.0, 10.0, 45.0, 30.0));
        let text = store.get(text).unwrap();
        assert_eq!(text.position(), Point::new(75.0, 50.0));
        assert_eq!(text.size(), Size::new(30.0, 10.0));
        assert_rect(store.get(frame).unwrap().bounds(), Rect::new(0.0, 0.0, 150.0, 100.0));
    }

    #[test]
    fn test_zero_extent_axis_keeps_scale() {
        let id = crate::elements::generate_id();
        let mut state = ResizeState::with_bounds(
            Rect::new(0.0, 0.0, 100.0, 0.0),
            HandleKind::Right,
            [(id, Rect::new(0.0, 0.0, 100.0, 0.0), false)],
        );
        state.update(Vec2::new(100.0, 0.0), 1.0);
        assert_eq!(state.scale(), (2.0, 1.0));
    }

    #[test]
    fn test_multi_move_delta() {
        let mut store = ElementStore::new();
        let a = store.add(ElementDraft::rectangle(Rect::new(0.0, 0.0, 10.0, 10.0)));
        let b = store.add(ElementDraft::circle(Rect::new(100.0, 40.0, 110.0, 50.0)));
        store.set_selected([a, b]);
        let mut state = MultiMoveState::new(Point::new(5.0, 5.0), &store);
        state.current_point = Point::new(17.5, -2.0);
        assert_eq!(state.position_of(b), Some(Point::new(112.5, 33.0)));
        let updates = state.updates();
        assert_eq!(updates.len(), 2);
        assert!((updates[0].x - 12.5).abs() < 1e-12);
        assert!((updates[0].y + 7.0).abs() < 1e-12);
    }
}
