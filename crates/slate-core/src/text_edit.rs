//! Ownership handoff between the scene and a text editing surface.
//!
//! While a text element is being edited, its content lives in the
//! [`TextEditSession`] surface and the renderer suppresses the element.
//! [`TextOwnership::end`] is the only way back to [`TextOwnership::Committed`].

use crate::elements::{ElementId, ElementKind, Span, TextPatch};
use crate::store::ElementStore;
use crate::text_sync::{Mark, Markup, MarkupError, decode, encode, toggle_mark};

/// Live editing surface for one text element.
#[derive(Debug, Clone, PartialEq)]
pub struct TextEditSession {
    element_id: ElementId,
    surface: Markup,
    /// The whole surface content is selected.
    all_selected: bool,
}

impl TextEditSession {
    fn new(element_id: ElementId, spans: &[Span]) -> Self {
        Self {
            element_id,
            surface: encode(spans),
            all_selected: true,
        }
    }

    pub fn element_id(&self) -> ElementId {
        self.element_id
    }

    pub fn surface(&self) -> &Markup {
        &self.surface
    }

    pub fn is_all_selected(&self) -> bool {
        self.all_selected
    }

    pub fn select_all(&mut self) {
        self.all_selected = true;
    }

    /// Replace the surface content (the user typed).
    pub fn set_markup(&mut self, markup: Markup) {
        self.surface = markup;
        self.all_selected = false;
    }

    /// Replace the surface content from HTML. On error the surface is unchanged.
    pub fn set_html(&mut self, html: &str) -> Result<(), MarkupError> {
        let markup = Markup::parse_html(html)?;
        self.set_markup(markup);
        Ok(())
    }

    pub fn html(&self) -> String {
        self.surface.to_html()
    }

    /// Toggle a mark across the whole surface.
    pub fn toggle_mark_all(&mut self, mark: Mark) {
        let spans = toggle_mark(&decode(&self.surface), mark);
        self.surface = encode(&spans);
    }

    /// Current surface content as spans.
    pub fn spans(&self) -> Vec<Span> {
        decode(&self.surface)
    }
}

/// Result of ending an edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// No session was active.
    NotEditing,
    /// The content was written back to the element.
    Updated(ElementId),
    /// The content was blank and the element was deleted.
    Removed(ElementId),
    /// The element disappeared while being edited.
    Stale(ElementId),
}

/// Who owns the content of the text element being edited.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TextOwnership {
    #[default]
    Committed,
    Editing(TextEditSession),
}

impl TextOwnership {
    pub fn is_editing(&self) -> bool {
        matches!(self, TextOwnership::Editing(_))
    }

    /// Id of the element owned by the session, if any.
    pub fn editing_id(&self) -> Option<ElementId> {
        self.session().map(TextEditSession::element_id)
    }

    pub fn session(&self) -> Option<&TextEditSession> {
        match self {
            TextOwnership::Editing(session) => Some(session),
            TextOwnership::Committed => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut TextEditSession> {
        match self {
            TextOwnership::Editing(session) => Some(session),
            TextOwnership::Committed => None,
        }
    }

    /// Hand a text element over to a new session.
    ///
    /// A session that is already open is ended first. Returns false if `id`
    /// is not a text element.
    pub fn begin(&mut self, store: &mut ElementStore, id: ElementId) -> bool {
        if self.editing_id() == Some(id) {
            return true;
        }
        let Some(ElementKind::Text(text)) = store.get(id).map(|e| e.kind()) else {
            log::debug!("begin text edit: {id} is not a text element");
            return false;
        };
        let session = TextEditSession::new(id, &text.spans);
        if self.is_editing() {
            // Ending the old session clears the selection.
            let was_selected = store.is_selected(id);
            self.end(store);
            if was_selected {
                store.set_selected([id]);
            }
        }
        log::debug!("editing text {id}");
        *self = TextOwnership::Editing(session);
        true
    }

    /// Commit the session back to the scene and clear the selection.
    pub fn end(&mut self, store: &mut ElementStore) -> EditOutcome {
        let TextOwnership::Editing(session) = std::mem::take(self) else {
            return EditOutcome::NotEditing;
        };
        let id = session.element_id;
        let spans = session.spans();
        let outcome = if !store.get(id).is_some_and(|e| e.is_text()) {
            log::debug!("end text edit: {id} no longer exists");
            EditOutcome::Stale(id)
        } else if spans.iter().all(Span::is_blank) {
            store.remove(id);
            log::debug!("removed empty text {id}");
            EditOutcome::Removed(id)
        } else {
            store.update_text_content(id, TextPatch::spans(spans));
            EditOutcome::Updated(id)
        };
        store.clear_selection();
        outcome
    }
}
