//! Copy, cut and paste of selected elements.

use crate::elements::{ElementDraft, ElementId};
use crate::store::ElementStore;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Stored clipboard content: full element fields without ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipboardPayload {
    pub elements: Vec<ElementDraft>,
}

impl ClipboardPayload {
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Union of the stored elements' boxes.
    pub fn bounds(&self) -> Option<Rect> {
        self.elements
            .iter()
            .map(ElementDraft::bounds)
            .reduce(|acc, b| acc.union(b))
    }
}

/// Holds the clipboard slot and the keyboard-paste cascade counter.
#[derive(Debug, Clone)]
pub struct ClipboardManager {
    payload: Option<ClipboardPayload>,
    /// Multiplier for the next cursor-less paste offset.
    cascade: u32,
    offset_step: f64,
}

impl Default for ClipboardManager {
    fn default() -> Self {
        Self::new(20.0)
    }
}

impl ClipboardManager {
    /// `offset_step` is the diagonal shift per cascaded paste.
    pub fn new(offset_step: f64) -> Self {
        Self {
            payload: None,
            cascade: 1,
            offset_step,
        }
    }

    pub fn cascade(&self) -> u32 {
        self.cascade
    }

    pub fn payload(&self) -> Option<&ClipboardPayload> {
        self.payload.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.as_ref().is_none_or(ClipboardPayload::is_empty)
    }

    /// Replace the slot with persisted content.
    pub fn restore(&mut self, payload: ClipboardPayload) {
        self.payload = Some(payload);
        self.cascade = 1;
    }

    /// Copy the selected elements (in z-order). Does nothing if nothing is selected.
    pub fn copy(&mut self, store: &ElementStore) -> usize {
        let elements: Vec<ElementDraft> = store
            .elements()
            .filter(|e| e.is_selected())
            .map(|e| e.to_draft())
            .collect();
        if elements.is_empty() {
            return 0;
        }
        let count = elements.len();
        self.payload = Some(ClipboardPayload { elements });
        self.cascade = 1;
        log::info!("Copied {count} elements to clipboard");
        count
    }

    /// Copy then delete the selection.
    pub fn cut(&mut self, store: &mut ElementStore) -> usize {
        let count = self.copy(store);
        if count > 0 {
            store.delete_selected();
            log::info!("Cut {count} elements");
        }
        count
    }

    /// Paste clones of the stored elements and select them.
    ///
    /// With an anchor, the stored group's center lands on it. Without one,
    /// clones shift diagonally by `offset_step * cascade` and the cascade grows.
    pub fn paste(&mut self, store: &mut ElementStore, anchor: Option<Point>) -> Vec<ElementId> {
        let Some(payload) = self.payload.as_ref().filter(|p| !p.is_empty()) else {
            log::debug!("paste with empty clipboard");
            return Vec::new();
        };
        let delta = match (anchor, payload.bounds()) {
            (Some(anchor), Some(bounds)) => anchor - bounds.center(),
            _ => {
                let step = self.offset_step * self.cascade as f64;
                self.cascade += 1;
                Vec2::new(step, step)
            }
        };

        store.clear_selection();
        let ids: Vec<ElementId> = payload
            .elements
            .iter()
            .cloned()
            .map(|mut draft| {
                draft.x += delta.x;
                draft.y += delta.y;
                store.add(draft)
            })
            .collect();
        store.set_selected(ids.iter().copied());
        log::info!("Pasted {} elements", ids.len());
        ids
    }
}
