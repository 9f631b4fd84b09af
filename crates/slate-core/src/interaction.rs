//! Pointer and keyboard interaction: selection, drag, resize, marquee, creation.
//!
//! The controller turns input events into store mutations. During a gesture
//! it only keeps preview state; the store is written once, on release.

use crate::clipboard::ClipboardManager;
use crate::config::EditorConfig;
use crate::elements::{ElementDraft, ElementId, PositionUpdate};
use crate::hit_test;
use crate::input::{InputState, KeyEvent, Modifiers, MouseButton, PointerEvent};
use crate::selection::{self, HandleKind, MultiMoveState, ResizeState};
use crate::store::ElementStore;
use crate::text_edit::{EditOutcome, TextOwnership};
use crate::tools::{ToolKind, ToolManager};
use kurbo::{Point, Rect, Size, Vec2};
use std::time::Instant;

/// Largest side of an imported image before it is scaled down.
const MAX_IMPORT_SIZE: f64 = 800.0;

/// Cursor to show for the pointer position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorKind {
    Default,
    Crosshair,
    Text,
    Move,
    Grab,
    Grabbing,
    Resize(HandleKind),
}

/// Selection change decided at press time but applied only if no drag follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeferredClick {
    None,
    /// Collapse a multi-selection to this element.
    Collapse(ElementId),
    /// Shift-click on a selected element: remove it.
    Toggle(ElementId),
}

#[derive(Debug, Clone, Default)]
enum Mode {
    #[default]
    Idle,
    Panning {
        /// Last pointer position in screen coordinates.
        last: Point,
    },
    /// The drag itself is tracked by the tool manager.
    Creating,
    Dragging {
        state: MultiMoveState,
        press_screen: Point,
        dragged: bool,
        deferred: DeferredClick,
    },
    Resizing {
        state: ResizeState,
        press_world: Point,
    },
    Marqueeing {
        start: Point,
        current: Point,
        press_screen: Point,
        /// Elements the marquee currently touches; not yet the selection.
        preview: Vec<ElementId>,
    },
}

/// Public view of the active gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    Idle,
    Panning,
    Creating,
    Dragging,
    Resizing,
    Marqueeing,
}

/// Routes input to the scene.
#[derive(Debug, Clone)]
pub struct InteractionController {
    input: InputState,
    tools: ToolManager,
    clipboard: ClipboardManager,
    text: TextOwnership,
    config: EditorConfig,
    mode: Mode,
    /// Viewport size in screen pixels.
    viewport: Size,
    /// Element under the previous left press, for double-click matching.
    last_press_target: Option<ElementId>,
    /// Button that started the active gesture; only its release ends it.
    active_button: MouseButton,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl InteractionController {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            input: InputState::new(config.double_click_window()),
            tools: ToolManager::new(),
            clipboard: ClipboardManager::new(config.paste_offset),
            text: TextOwnership::default(),
            mode: Mode::Idle,
            viewport: Size::new(1280.0, 800.0),
            last_press_target: None,
            active_button: MouseButton::Left,
            config,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn tools(&self) -> &ToolManager {
        &self.tools
    }

    pub fn tools_mut(&mut self) -> &mut ToolManager {
        &mut self.tools
    }

    pub fn clipboard(&self) -> &ClipboardManager {
        &self.clipboard
    }

    pub fn clipboard_mut(&mut self) -> &mut ClipboardManager {
        &mut self.clipboard
    }

    pub fn ownership(&self) -> &TextOwnership {
        &self.text
    }

    pub fn ownership_mut(&mut self) -> &mut TextOwnership {
        &mut self.text
    }

    /// Id of the text element currently owned by an edit session.
    pub fn editing_id(&self) -> Option<ElementId> {
        self.text.editing_id()
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.input.set_modifiers(modifiers);
    }

    pub fn mode(&self) -> ModeKind {
        match self.mode {
            Mode::Idle => ModeKind::Idle,
            Mode::Panning { .. } => ModeKind::Panning,
            Mode::Creating => ModeKind::Creating,
            Mode::Dragging { .. } => ModeKind::Dragging,
            Mode::Resizing { .. } => ModeKind::Resizing,
            Mode::Marqueeing { .. } => ModeKind::Marqueeing,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.mode, Mode::Idle)
    }

    /// Position an element is drawn at while a group drag is in progress.
    pub fn preview_position(&self, id: ElementId) -> Option<Point> {
        match &self.mode {
            Mode::Dragging {
                state,
                dragged: true,
                ..
            } => state.position_of(id),
            _ => None,
        }
    }

    /// Box an element is drawn in while a resize is in progress.
    pub fn preview_transform(&self, id: ElementId) -> Option<Rect> {
        match &self.mode {
            Mode::Resizing { state, .. } => state.frame_of(id),
            _ => None,
        }
    }

    /// Selection box while a resize is in progress.
    pub fn preview_bounds(&self) -> Option<Rect> {
        match &self.mode {
            Mode::Resizing { state, .. } => Some(state.current_bounds),
            _ => None,
        }
    }

    /// Marquee rectangle in world coordinates.
    pub fn marquee_rect(&self) -> Option<Rect> {
        match &self.mode {
            Mode::Marqueeing { start, current, .. } => Some(Rect::from_points(*start, *current)),
            _ => None,
        }
    }

    /// Elements the active marquee touches.
    pub fn marquee_preview(&self) -> &[ElementId] {
        match &self.mode {
            Mode::Marqueeing { preview, .. } => preview,
            _ => &[],
        }
    }

    /// Draft of the element being dragged out by a creation tool.
    pub fn creation_preview(&self) -> Option<ElementDraft> {
        match self.mode {
            Mode::Creating => self.tools.preview_draft(),
            _ => None,
        }
    }

    /// Switch tools. Ends any text edit and abandons the active gesture.
    pub fn set_tool(&mut self, store: &mut ElementStore, tool: ToolKind) {
        self.end_text_edit(store);
        self.cancel(store);
        store.set_tool(tool);
        log::info!("Tool: {tool:?}");
    }

    /// Commit the open text edit session, if any.
    pub fn end_text_edit(&mut self, store: &mut ElementStore) -> EditOutcome {
        self.text.end(store)
    }

    /// Abandon the active gesture without touching the store.
    pub fn cancel(&mut self, _store: &mut ElementStore) {
        match std::mem::take(&mut self.mode) {
            Mode::Idle => {}
            Mode::Creating => {
                self.tools.cancel();
                log::debug!("creation cancelled");
            }
            other => log::debug!("gesture cancelled: {other:?}"),
        }
    }

    /// Process a pointer event observed now.
    pub fn pointer_event(&mut self, store: &mut ElementStore, event: PointerEvent) {
        self.pointer_event_at(store, event, Instant::now());
    }

    /// Process a pointer event observed at `now`.
    pub fn pointer_event_at(&mut self, store: &mut ElementStore, event: PointerEvent, now: Instant) {
        self.input.handle_pointer_event(&event, now);
        match event {
            PointerEvent::Down { position, button } => self.handle_press(store, position, button),
            PointerEvent::Move { position } => self.handle_move(store, position),
            PointerEvent::Up { position, button } => {
                if !self.is_idle() && button != self.active_button {
                    log::debug!("{button:?} release ignored during {:?}", self.mode());
                    return;
                }
                self.handle_release(store, position);
            }
            PointerEvent::Scroll { position, delta } => self.handle_scroll(store, position, delta),
            PointerEvent::Cancel => self.cancel(store),
        }
    }

    fn hit_tolerance(&self, store: &ElementStore) -> f64 {
        store.camera().screen_to_world_distance(self.config.hit_tolerance)
    }

    fn handle_press(&mut self, store: &mut ElementStore, screen: Point, button: MouseButton) {
        if !self.is_idle() {
            log::debug!("press ignored during {:?}", self.mode());
            return;
        }
        self.active_button = button;
        let world = store.camera().screen_to_world(screen);
        let tolerance = self.hit_tolerance(store);

        // If we're editing text and click elsewhere, stop editing
        if let Some(editing) = self.text.editing_id() {
            if hit_test::element_at(store, world, tolerance) == Some(editing) {
                return;
            }
            self.text.end(store);
        }

        let target = hit_test::element_at(store, world, tolerance);
        let previous = if button == MouseButton::Left {
            std::mem::replace(&mut self.last_press_target, target)
        } else {
            None
        };
        let double_click = self.input.is_double_click() && target.is_some() && previous == target;

        if button == MouseButton::Middle || store.tool() == ToolKind::Pan {
            self.mode = Mode::Panning { last: screen };
            return;
        }
        if button != MouseButton::Left {
            return;
        }

        match store.tool() {
            ToolKind::Select => self.select_press(store, screen, world, target, double_click),
            ToolKind::Text => {
                let id = match target.filter(|&id| store.get(id).is_some_and(|e| e.is_text())) {
                    Some(id) => id,
                    None => store.add(self.tools.text_draft(world)),
                };
                store.set_selected([id]);
                self.text.begin(store, id);
            }
            tool => {
                if self.tools.begin(tool, world) {
                    self.mode = Mode::Creating;
                }
            }
        }
    }

    fn select_press(
        &mut self,
        store: &mut ElementStore,
        screen: Point,
        world: Point,
        target: Option<ElementId>,
        double_click: bool,
    ) {
        let handle_tolerance = store.camera().screen_to_world_distance(self.config.handle_size);
        let handles = selection::selection_handles(store);
        if let Some(handle) = selection::hit_test_handles(&handles, world, handle_tolerance) {
            if let Some(state) = ResizeState::from_selection(store, handle) {
                self.mode = Mode::Resizing {
                    state,
                    press_world: world,
                };
                return;
            }
        }

        let Some(id) = target else {
            if self.input.shift() {
                self.mode = Mode::Marqueeing {
                    start: world,
                    current: world,
                    press_screen: screen,
                    preview: Vec::new(),
                };
            } else {
                store.clear_selection();
                self.mode = Mode::Panning { last: screen };
            }
            return;
        };

        if double_click && store.get(id).is_some_and(|e| e.is_text()) {
            store.set_selected([id]);
            self.text.begin(store, id);
            self.input.reset_click_tracking();
            return;
        }

        let deferred = match (self.input.shift(), store.is_selected(id)) {
            (false, false) => {
                store.set_selected([id]);
                DeferredClick::None
            }
            (false, true) if store.selected_ids().len() > 1 => DeferredClick::Collapse(id),
            (false, true) => DeferredClick::None,
            (true, false) => {
                store.add_to_selection([id]);
                DeferredClick::None
            }
            (true, true) => DeferredClick::Toggle(id),
        };
        self.mode = Mode::Dragging {
            state: MultiMoveState::new(world, store),
            press_screen: screen,
            dragged: false,
            deferred,
        };
    }

    fn handle_move(&mut self, store: &mut ElementStore, screen: Point) {
        let world = store.camera().screen_to_world(screen);
        let threshold = self.config.drag_threshold;
        let min_resize = self.config.min_resize_size;
        match &mut self.mode {
            Mode::Idle => {}
            Mode::Panning { last } => {
                let delta = screen - *last;
                *last = screen;
                store.camera_mut().pan(delta);
            }
            Mode::Creating => self.tools.update(world),
            Mode::Dragging {
                state,
                press_screen,
                dragged,
                ..
            } => {
                state.current_point = world;
                if !*dragged && screen.distance(*press_screen) >= threshold {
                    *dragged = true;
                }
            }
            Mode::Resizing { state, press_world } => {
                state.update(world - *press_world, min_resize);
            }
            Mode::Marqueeing {
                start,
                current,
                preview,
                ..
            } => {
                *current = world;
                *preview = hit_test::elements_in_rect(store, Rect::from_points(*start, world));
            }
        }
    }

    fn handle_release(&mut self, store: &mut ElementStore, screen: Point) {
        let world = store.camera().screen_to_world(screen);
        match std::mem::take(&mut self.mode) {
            Mode::Idle | Mode::Panning { .. } => {}
            Mode::Creating => {
                let Some(draft) = self.tools.end(world) else {
                    return;
                };
                let min = self.config.min_create_size;
                if draft.width < min || draft.height < min {
                    log::debug!("discarded {}x{} draft", draft.width, draft.height);
                    return;
                }
                let id = store.add(draft);
                store.set_selected([id]);
            }
            Mode::Dragging {
                mut state,
                press_screen,
                dragged,
                deferred,
            } => {
                if dragged || screen.distance(press_screen) >= self.config.drag_threshold {
                    state.current_point = world;
                    let moved = store.update_positions(&state.updates());
                    log::debug!("moved {moved} elements by {:?}", state.delta());
                } else {
                    match deferred {
                        DeferredClick::None => {}
                        DeferredClick::Collapse(id) => store.set_selected([id]),
                        DeferredClick::Toggle(id) => store.remove_from_selection([id]),
                    }
                }
            }
            Mode::Resizing {
                mut state,
                press_world,
            } => {
                state.update(world - press_world, self.config.min_resize_size);
                if state.current_bounds != state.original_bounds {
                    store.update_transforms(&state.transforms());
                }
            }
            Mode::Marqueeing {
                start,
                press_screen,
                ..
            } => {
                let distance_sq = (screen - press_screen).hypot2();
                if distance_sq < self.config.marquee_click_threshold_sq {
                    store.clear_selection();
                } else {
                    let hits = hit_test::elements_in_rect(store, Rect::from_points(start, world));
                    store.set_selected(hits);
                }
            }
        }
    }

    fn handle_scroll(&mut self, store: &mut ElementStore, screen: Point, delta: Vec2) {
        if self.input.modifiers.command() {
            // Ctrl/Cmd + scroll = zoom
            if delta.y == 0.0 {
                return;
            }
            let factor = if delta.y > 0.0 {
                self.config.zoom_step
            } else {
                1.0 / self.config.zoom_step
            };
            store.camera_mut().zoom_at(screen, factor);
        } else {
            store.camera_mut().pan(delta);
        }
    }

    /// Process a key event.
    pub fn key_event(&mut self, store: &mut ElementStore, event: KeyEvent) {
        self.input.handle_key_event(&event);
        let KeyEvent::Pressed(key) = event else {
            return;
        };

        // The edit surface owns the keyboard; only Escape reaches the scene.
        if self.text.is_editing() {
            if key == "Escape" {
                self.text.end(store);
            }
            return;
        }

        if key == "Escape" {
            if self.is_idle() {
                store.clear_selection();
                store.set_tool(ToolKind::Select);
            } else {
                self.cancel(store);
            }
            return;
        }
        if !self.is_idle() {
            return;
        }

        let command = self.input.modifiers.command();
        match key.as_str() {
            "Delete" | "Backspace" => {
                let removed = store.delete_selected();
                if removed > 0 {
                    log::info!("Deleted {removed} elements");
                }
            }
            "a" | "A" if command => store.select_all(),
            "c" | "C" if command => {
                self.clipboard.copy(store);
            }
            "x" | "X" if command => {
                self.clipboard.cut(store);
            }
            "v" | "V" if command => {
                self.clipboard.paste(store, None);
            }
            "]" if command => store.bring_selection_to_front(),
            "[" if command => store.send_selection_to_back(),
            "ArrowLeft" | "ArrowRight" | "ArrowUp" | "ArrowDown" => {
                let step = if self.input.shift() {
                    self.config.nudge_large
                } else {
                    self.config.nudge
                };
                let delta = match key.as_str() {
                    "ArrowLeft" => Vec2::new(-step, 0.0),
                    "ArrowRight" => Vec2::new(step, 0.0),
                    "ArrowUp" => Vec2::new(0.0, -step),
                    _ => Vec2::new(0.0, step),
                };
                self.nudge(store, delta);
            }
            _ => {}
        }
    }

    fn nudge(&self, store: &mut ElementStore, delta: Vec2) {
        let updates: Vec<PositionUpdate> = store
            .selected_elements()
            .map(|e| {
                let moved = e.position() + delta;
                PositionUpdate {
                    id: e.id(),
                    x: moved.x,
                    y: moved.y,
                }
            })
            .collect();
        store.update_positions(&updates);
    }

    /// Paste the clipboard centred on a screen point.
    pub fn paste_at(&mut self, store: &mut ElementStore, screen: Point) -> Vec<ElementId> {
        self.text.end(store);
        let anchor = store.camera().screen_to_world(screen);
        self.clipboard.paste(store, Some(anchor))
    }

    /// Add an image of the given pixel size at the centre of the view and select it.
    pub fn import_image(
        &mut self,
        store: &mut ElementStore,
        source: impl Into<String>,
        width: f64,
        height: f64,
    ) -> ElementId {
        self.text.end(store);
        let center = store.camera().visible_world_rect(self.viewport).center();
        let scale = if width > MAX_IMPORT_SIZE || height > MAX_IMPORT_SIZE {
            MAX_IMPORT_SIZE / width.max(height)
        } else {
            1.0
        };
        let size = Size::new(width.max(0.0) * scale, height.max(0.0) * scale);
        let source = source.into();
        log::info!("Imported image {source} ({width}x{height})");
        let id = store.add(ElementDraft::image(Rect::from_center_size(center, size), source));
        store.set_selected([id]);
        id
    }

    /// Cursor for the pointer at `screen`.
    pub fn cursor_for_position(&self, store: &ElementStore, screen: Point) -> CursorKind {
        match &self.mode {
            Mode::Panning { .. } => return CursorKind::Grabbing,
            Mode::Creating | Mode::Marqueeing { .. } => return CursorKind::Crosshair,
            Mode::Dragging { .. } => return CursorKind::Move,
            Mode::Resizing { state, .. } => return CursorKind::Resize(state.handle),
            Mode::Idle => {}
        }
        let world = store.camera().screen_to_world(screen);
        match store.tool() {
            ToolKind::Pan => CursorKind::Grab,
            ToolKind::Text => CursorKind::Text,
            ToolKind::Select => {
                let handle_tolerance =
                    store.camera().screen_to_world_distance(self.config.handle_size);
                let handles = selection::selection_handles(store);
                if let Some(handle) = selection::hit_test_handles(&handles, world, handle_tolerance)
                {
                    return CursorKind::Resize(handle);
                }
                match hit_test::element_at(store, world, self.hit_tolerance(store)) {
                    Some(id) if self.text.editing_id() == Some(id) => CursorKind::Text,
                    Some(_) => CursorKind::Move,
                    None => CursorKind::Default,
                }
            }
            _ => CursorKind::Crosshair,
        }
    }
}
