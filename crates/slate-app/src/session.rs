//! A scripted editing session: store, controller, resources and persistence.

use crate::script::{ScriptEntry, ScriptError, ScriptStep};
use kurbo::{Point, Vec2};
use slate_core::config::EditorConfig;
use slate_core::input::{KeyEvent, Modifiers, PointerEvent};
use slate_core::interaction::InteractionController;
use slate_core::render::{Frame, FrameBuilder};
use slate_core::resources::{self, ResourceCache, ResourceLoader};
use slate_core::storage::{ScenePersistence, Storage};
use slate_core::store::ElementStore;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Drives one scene from scripted input.
///
/// Time is virtual: each step advances the clock by its `wait_ms`, so double
/// clicks and autosave intervals behave the same on every run.
pub struct Session<S: Storage> {
    store: ElementStore,
    controller: InteractionController,
    resources: ResourceCache,
    persistence: ScenePersistence<S>,
    clock: Instant,
    elapsed: Duration,
}

impl<S: Storage> Session<S> {
    pub fn new(storage: Arc<S>, config: EditorConfig) -> Self {
        let mut persistence = ScenePersistence::new(storage);
        persistence.set_interval(config.autosave_interval());
        Self {
            store: ElementStore::new(),
            controller: InteractionController::new(config),
            resources: ResourceCache::new(),
            persistence,
            clock: Instant::now(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn store(&self) -> &ElementStore {
        &self.store
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut InteractionController {
        &mut self.controller
    }

    pub fn persistence(&self) -> &ScenePersistence<S> {
        &self.persistence
    }

    /// Current virtual time.
    pub fn now(&self) -> Instant {
        self.clock + self.elapsed
    }

    /// Load the saved scene and clipboard, if any.
    pub async fn restore(&mut self) {
        if let Some(elements) = self.persistence.load_scene().await {
            self.store.load_elements(elements);
        }
        if let Some(payload) = self.persistence.load_clipboard().await {
            self.controller.clipboard_mut().restore(payload);
        }
    }

    /// Replay a script. Stops at the first failing step.
    pub async fn run<L: ResourceLoader + ?Sized>(
        &mut self,
        script: &[ScriptEntry],
        loader: &L,
    ) -> Result<(), ScriptError> {
        for (index, entry) in script.iter().enumerate() {
            self.elapsed += Duration::from_millis(entry.wait_ms);
            self.apply(index + 1, &entry.step, loader).await?;
            self.persistence.mark_dirty();
            let now = self.now();
            self.persistence.maybe_save_at(&self.store, now).await;
        }
        Ok(())
    }

    async fn apply<L: ResourceLoader + ?Sized>(
        &mut self,
        step_number: usize,
        step: &ScriptStep,
        loader: &L,
    ) -> Result<(), ScriptError> {
        let now = self.now();
        match step {
            ScriptStep::PointerDown {
                x,
                y,
                button,
                modifiers,
            } => {
                self.controller.set_modifiers(*modifiers);
                let event = PointerEvent::Down {
                    position: Point::new(*x, *y),
                    button: *button,
                };
                self.controller.pointer_event_at(&mut self.store, event, now);
            }
            ScriptStep::PointerMove { x, y } => {
                let event = PointerEvent::Move {
                    position: Point::new(*x, *y),
                };
                self.controller.pointer_event_at(&mut self.store, event, now);
            }
            ScriptStep::PointerUp { x, y, button } => {
                let event = PointerEvent::Up {
                    position: Point::new(*x, *y),
                    button: *button,
                };
                self.controller.pointer_event_at(&mut self.store, event, now);
            }
            ScriptStep::PointerCancel => {
                self.controller
                    .pointer_event_at(&mut self.store, PointerEvent::Cancel, now);
            }
            ScriptStep::Wheel {
                x,
                y,
                dx,
                dy,
                modifiers,
            } => {
                self.controller.set_modifiers(*modifiers);
                let event = PointerEvent::Scroll {
                    position: Point::new(*x, *y),
                    delta: Vec2::new(*dx, *dy),
                };
                self.controller.pointer_event_at(&mut self.store, event, now);
            }
            ScriptStep::Key { key, modifiers } => {
                self.controller.set_modifiers(*modifiers);
                self.controller
                    .key_event(&mut self.store, KeyEvent::Pressed(key.clone()));
                self.controller
                    .key_event(&mut self.store, KeyEvent::Released(key.clone()));
                self.controller.set_modifiers(Modifiers::default());
            }
            ScriptStep::Tool { tool } => self.controller.set_tool(&mut self.store, *tool),
            ScriptStep::EditHtml { html } => {
                let session = self
                    .controller
                    .ownership_mut()
                    .session_mut()
                    .ok_or(ScriptError::NotEditing { step: step_number })?;
                session
                    .set_html(html)
                    .map_err(|source| ScriptError::Markup {
                        step: step_number,
                        source,
                    })?;
            }
            ScriptStep::EndEdit => {
                let outcome = self.controller.end_text_edit(&mut self.store);
                log::debug!("Step {step_number}: edit ended with {outcome:?}");
            }
            ScriptStep::PasteAt { x, y } => {
                self.controller.paste_at(&mut self.store, Point::new(*x, *y));
            }
            ScriptStep::ImportImage {
                source,
                width,
                height,
            } => {
                self.controller
                    .import_image(&mut self.store, source.clone(), *width, *height);
            }
            ScriptStep::ResolveImages => {
                // Building a frame queues every unresolved source.
                self.frame();
                let resolved = resources::load_pending(&mut self.resources, loader).await;
                log::info!("Step {step_number}: resolved {resolved} images");
            }
        }
        Ok(())
    }

    /// Build the current frame, including gesture previews.
    pub fn frame(&mut self) -> Frame {
        FrameBuilder::new(&self.store, &mut self.resources)
            .with_interaction(&self.controller)
            .build()
    }

    /// Save the scene and clipboard now.
    pub async fn save(&mut self) {
        let now = self.now();
        self.persistence.save_scene_at(&self.store, now).await;
        self.persistence
            .save_clipboard(self.controller.clipboard())
            .await;
    }
}
