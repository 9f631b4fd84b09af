//! The scene: element registry, selection and viewport state.

use crate::camera::Camera;
use crate::elements::{
    ApproximateMeasurer, Element, ElementDraft, ElementId, ElementKind, FilterPatch,
    PositionUpdate, StylePatch, TextMeasurer, TextPatch, TransformPatch, generate_id,
};
use crate::tools::ToolKind;
use kurbo::Rect;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Canonical scene state and the only writer of element data.
///
/// Every public mutation leaves the scene consistent: ids are unique, the
/// selection only names live elements, and each element's `selected` flag
/// matches selection membership.
#[derive(Debug, Clone)]
pub struct ElementStore {
    /// All elements, keyed by ID.
    elements: HashMap<ElementId, Element>,
    /// Z-order of elements (back to front).
    z_order: Vec<ElementId>,
    /// Selected ids in selection order, no duplicates.
    selection: Vec<ElementId>,
    camera: Camera,
    tool: ToolKind,
    measurer: Arc<dyn TextMeasurer>,
}

impl Default for ElementStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementStore {
    /// Create an empty scene using the approximate text layout.
    pub fn new() -> Self {
        Self::with_measurer(Arc::new(ApproximateMeasurer))
    }

    /// Create an empty scene with a custom text layout.
    pub fn with_measurer(measurer: Arc<dyn TextMeasurer>) -> Self {
        Self {
            elements: HashMap::new(),
            z_order: Vec::new(),
            selection: Vec::new(),
            camera: Camera::new(),
            tool: ToolKind::default(),
            measurer,
        }
    }

    /// Add an element on top of the z-order and return its new id.
    pub fn add(&mut self, draft: ElementDraft) -> ElementId {
        let mut id = generate_id();
        while self.elements.contains_key(&id) {
            id = generate_id();
        }
        let mut element = Element::from_draft(id, draft);
        element.relayout(self.measurer.as_ref());
        log::debug!("added {} {}", element.kind.type_name(), id);
        self.z_order.push(id);
        self.elements.insert(id, element);
        self.check_consistency();
        id
    }

    /// Remove an element. Stale ids are ignored.
    pub fn remove(&mut self, id: ElementId) -> Option<Element> {
        let Some(mut element) = self.elements.remove(&id) else {
            log::debug!("remove: no element {id}");
            return None;
        };
        self.z_order.retain(|&other| other != id);
        if element.selected {
            self.selection.retain(|&other| other != id);
        }
        element.selected = false;
        self.check_consistency();
        Some(element)
    }

    /// Remove every selected element. Returns how many were removed.
    pub fn delete_selected(&mut self) -> usize {
        let doomed: HashSet<ElementId> = self.selection.drain(..).collect();
        self.elements.retain(|id, _| !doomed.contains(id));
        self.z_order.retain(|id| !doomed.contains(id));
        self.check_consistency();
        doomed.len()
    }

    /// Remove all elements.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.z_order.clear();
        self.selection.clear();
    }

    /// Replace the selection with exactly `ids` (deduplicated, stale ids dropped).
    pub fn set_selected(&mut self, ids: impl IntoIterator<Item = ElementId>) {
        self.resync_selection(ids.into_iter().collect());
    }

    /// Union `ids` into the selection.
    pub fn add_to_selection(&mut self, ids: impl IntoIterator<Item = ElementId>) {
        let mut next = self.selection.clone();
        next.extend(ids);
        self.resync_selection(next);
    }

    /// Remove `ids` from the selection.
    pub fn remove_from_selection(&mut self, ids: impl IntoIterator<Item = ElementId>) {
        let removed: HashSet<ElementId> = ids.into_iter().collect();
        let next = self
            .selection
            .iter()
            .copied()
            .filter(|id| !removed.contains(id))
            .collect();
        self.resync_selection(next);
    }

    pub fn clear_selection(&mut self) {
        self.resync_selection(Vec::new());
    }

    /// Select every element, back to front.
    pub fn select_all(&mut self) {
        self.resync_selection(self.z_order.clone());
    }

    /// The single path that writes the selection and the per-element flags.
    fn resync_selection(&mut self, requested: Vec<ElementId>) {
        let mut seen = HashSet::with_capacity(requested.len());
        let selection: Vec<ElementId> = requested
            .into_iter()
            .filter(|id| self.elements.contains_key(id) && seen.insert(*id))
            .collect();
        for (id, element) in &mut self.elements {
            element.selected = seen.contains(id);
        }
        self.selection = selection;
        self.check_consistency();
    }

    /// Merge a transform patch onto an element. Size is ignored for text.
    pub fn update_transform(&mut self, id: ElementId, patch: TransformPatch) -> bool {
        match self.elements.get_mut(&id) {
            Some(element) => {
                element.apply_transform(&patch);
                true
            }
            None => {
                log::debug!("update_transform: no element {id}");
                false
            }
        }
    }

    /// Apply several transform patches as one unit. Returns how many applied.
    pub fn update_transforms(&mut self, patches: &[(ElementId, TransformPatch)]) -> usize {
        patches
            .iter()
            .filter(|(id, patch)| self.update_transform(*id, *patch))
            .count()
    }

    /// Commit a batch of positions (one group drag). Returns how many applied.
    pub fn update_positions(&mut self, updates: &[PositionUpdate]) -> usize {
        let mut applied = 0;
        for update in updates {
            match self.elements.get_mut(&update.id) {
                Some(element) => {
                    element.x = update.x;
                    element.y = update.y;
                    applied += 1;
                }
                None => log::debug!("update_positions: no element {}", update.id),
            }
        }
        applied
    }

    /// Merge filter changes onto an image element.
    pub fn update_filters(&mut self, id: ElementId, patch: FilterPatch) -> bool {
        match self.elements.get_mut(&id).map(|e| &mut e.kind) {
            Some(ElementKind::Image(image)) => {
                patch.apply(&mut image.filters);
                true
            }
            Some(_) => {
                log::debug!("update_filters: {id} is not an image");
                false
            }
            None => {
                log::debug!("update_filters: no element {id}");
                false
            }
        }
    }

    /// Merge content or font changes onto a text element and relayout it.
    pub fn update_text_content(&mut self, id: ElementId, patch: TextPatch) -> bool {
        let Some(element) = self.elements.get_mut(&id) else {
            log::debug!("update_text_content: no element {id}");
            return false;
        };
        let ElementKind::Text(text) = &mut element.kind else {
            log::debug!("update_text_content: {id} is not text");
            return false;
        };
        patch.apply(text);
        element.relayout(self.measurer.as_ref());
        true
    }

    /// Merge style changes onto a shape element.
    pub fn update_style(&mut self, id: ElementId, patch: StylePatch) -> bool {
        match self.elements.get_mut(&id) {
            Some(element) => {
                let applied = element.apply_style(&patch);
                if !applied {
                    log::debug!("update_style: {id} has no shape style");
                }
                applied
            }
            None => {
                log::debug!("update_style: no element {id}");
                false
            }
        }
    }

    /// Bring an element to the front (topmost).
    pub fn bring_to_front(&mut self, id: ElementId) -> bool {
        if !self.elements.contains_key(&id) {
            return false;
        }
        self.z_order.retain(|&other| other != id);
        self.z_order.push(id);
        true
    }

    /// Send an element to the back (bottommost).
    pub fn send_to_back(&mut self, id: ElementId) -> bool {
        if !self.elements.contains_key(&id) {
            return false;
        }
        self.z_order.retain(|&other| other != id);
        self.z_order.insert(0, id);
        true
    }

    /// Move an element one layer forward.
    /// Returns false if it is already at the front.
    pub fn bring_forward(&mut self, id: ElementId) -> bool {
        match self.z_order.iter().position(|&other| other == id) {
            Some(pos) if pos + 1 < self.z_order.len() => {
                self.z_order.swap(pos, pos + 1);
                true
            }
            _ => false,
        }
    }

    /// Move an element one layer backward.
    /// Returns false if it is already at the back.
    pub fn send_backward(&mut self, id: ElementId) -> bool {
        match self.z_order.iter().position(|&other| other == id) {
            Some(pos) if pos > 0 => {
                self.z_order.swap(pos, pos - 1);
                true
            }
            _ => false,
        }
    }

    /// Move the selected elements to the front, keeping their relative order.
    pub fn bring_selection_to_front(&mut self) {
        let (selected, rest): (Vec<_>, Vec<_>) = self
            .z_order
            .iter()
            .copied()
            .partition(|id| self.elements.get(id).is_some_and(|e| e.selected));
        self.z_order = rest.into_iter().chain(selected).collect();
    }

    /// Move the selected elements to the back, keeping their relative order.
    pub fn send_selection_to_back(&mut self) {
        let (selected, rest): (Vec<_>, Vec<_>) = self
            .z_order
            .iter()
            .copied()
            .partition(|id| self.elements.get(id).is_some_and(|e| e.selected));
        self.z_order = selected.into_iter().chain(rest).collect();
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    /// Elements in z-order (back to front).
    pub fn elements(&self) -> impl DoubleEndedIterator<Item = &Element> {
        self.z_order.iter().filter_map(|id| self.elements.get(id))
    }

    /// Ids in z-order (back to front).
    pub fn ids(&self) -> &[ElementId] {
        &self.z_order
    }

    pub fn selected_ids(&self) -> &[ElementId] {
        &self.selection
    }

    /// Selected elements in selection order.
    pub fn selected_elements(&self) -> impl Iterator<Item = &Element> {
        self.selection.iter().filter_map(|id| self.elements.get(id))
    }

    pub fn is_selected(&self, id: ElementId) -> bool {
        self.elements.get(&id).is_some_and(|e| e.selected)
    }

    pub fn has_selection(&self) -> bool {
        !self.selection.is_empty()
    }

    /// Union of the selected elements' boxes.
    pub fn selection_bounds(&self) -> Option<Rect> {
        union_bounds(self.selected_elements())
    }

    /// Union of every element's box.
    pub fn bounds(&self) -> Option<Rect> {
        union_bounds(self.elements())
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.tool = tool;
    }

    pub fn measurer(&self) -> &dyn TextMeasurer {
        self.measurer.as_ref()
    }

    /// Replace the scene with persisted elements, in the given order.
    ///
    /// Selection is cleared and text is relaid out. Later duplicates of an id
    /// are dropped.
    pub fn load_elements(&mut self, elements: Vec<Element>) {
        self.clear();
        for mut element in elements {
            if self.elements.contains_key(&element.id) {
                log::warn!("load_elements: dropping duplicate id {}", element.id);
                continue;
            }
            element.selected = false;
            element.relayout(self.measurer.as_ref());
            self.z_order.push(element.id);
            self.elements.insert(element.id, element);
        }
        self.check_consistency();
    }

    /// Serialize the ordered element list to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let ordered: Vec<&Element> = self.elements().collect();
        serde_json::to_string_pretty(&ordered)
    }

    /// Build a store from a JSON element list.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let elements: Vec<Element> = serde_json::from_str(json)?;
        let mut store = Self::new();
        store.load_elements(elements);
        Ok(store)
    }

    fn check_consistency(&self) {
        debug_assert_eq!(self.elements.len(), self.z_order.len());
        debug_assert!(self.selection.iter().all(|id| self.elements.contains_key(id)));
        debug_assert!(self.elements.values().all(|e| {
            e.selected == self.selection.contains(&e.id)
        }));
    }
}

fn union_bounds<'a>(elements: impl Iterator<Item = &'a Element>) -> Option<Rect> {
    elements.map(Element::bounds).reduce(|acc, b| acc.union(b))
}
