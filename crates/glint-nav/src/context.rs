#![forbid(unsafe_code)]

//! The per-frame orchestrator.
//!
//! [`UiContext`] owns every piece of cross-frame state and drives the frame
//! protocol:
//!
//! ```text
//! ctx.begin_frame(snapshot, dt);      // decision pass
//! ctx.begin_window(key, rect, flags); // per window...
//! ctx.item_add(id, bb);               //   ...per item
//! ctx.end_window();
//! ctx.end_frame();                    // wrap resolution, liveness sweep
//! ```
//!
//! Widgets are not retained: the host re-declares them every frame through
//! `item_add` and the interaction helpers, and the context keeps only
//! identities, timers, and per-window navigation slots in between.

use bitflags::bitflags;
use glint_core::geometry::{Rect, Vec2};
use glint_core::id::WidgetId;
use glint_core::input::{InputSnapshot, InputState, Key, Modifiers};
use glint_core::metrics::Metrics;

use crate::engine::{NavEngine, NavMoveFlags};
use crate::registry::{mod_positive, InteractionRegistry};
use crate::window::{
    NavLayer, PopupStack, Window, WindowFlags, WindowId, Windows, FOCUS_REQUEST_NONE,
};
use crate::windowing::WindowingState;

bitflags! {
    /// Flags applied to items while they are submitted.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ItemFlags: u8 {
        /// Item ignores all interaction.
        const DISABLED             = 1 << 0;
        /// Item is skipped by Tab traversal.
        const NO_TAB_STOP          = 1 << 1;
        /// Item is invisible to directional navigation.
        const NO_NAV               = 1 << 2;
        /// Item never receives default focus when its window appears.
        const NO_NAV_DEFAULT_FOCUS = 1 << 3;
    }
}

/// Tunables for navigation and the windowing overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavConfig {
    /// Seconds the windowing gesture must be held before the overlay
    /// highlight shows.
    pub windowing_delay: f32,
    /// Window drag speed while the overlay is up, logical pixels/second.
    pub windowing_move_speed: f32,
    /// Hold threshold for long-press buttons, in seconds.
    pub long_press_duration: f32,
}

impl Default for NavConfig {
    /// Defaults: `windowing_delay` 0.20s, `windowing_move_speed` 600 px/s,
    /// `long_press_duration` 0.40s.
    fn default() -> Self {
        Self {
            windowing_delay: 0.20,
            windowing_move_speed: 600.0,
            long_press_duration: 0.40,
        }
    }
}

impl NavConfig {
    /// Set the long-press hold threshold.
    #[must_use]
    pub fn with_long_press_duration(mut self, seconds: f32) -> Self {
        self.long_press_duration = seconds;
        self
    }

    /// Set the overlay highlight delay.
    #[must_use]
    pub fn with_windowing_delay(mut self, seconds: f32) -> Self {
        self.windowing_delay = seconds;
        self
    }
}

/// All interaction and navigation state for one UI.
#[derive(Debug)]
pub struct UiContext {
    pub(crate) input: InputState,
    pub(crate) metrics: Metrics,
    pub(crate) config: NavConfig,
    pub(crate) registry: InteractionRegistry,
    pub(crate) engine: NavEngine,
    pub(crate) windows: Windows,
    pub(crate) popups: PopupStack,
    pub(crate) item_flags: ItemFlags,
    item_flags_stack: Vec<ItemFlags>,
    window_stack: Vec<WindowId>,
    pub(crate) current_window: Option<WindowId>,
    pub(crate) hovered_window: Option<WindowId>,
}

impl Default for UiContext {
    fn default() -> Self {
        Self::new()
    }
}

impl UiContext {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(NavConfig::default())
    }

    #[must_use]
    pub fn with_config(config: NavConfig) -> Self {
        Self {
            input: InputState::default(),
            metrics: Metrics::default(),
            config,
            registry: InteractionRegistry::default(),
            engine: NavEngine::default(),
            windows: Windows::default(),
            popups: PopupStack::default(),
            item_flags: ItemFlags::empty(),
            item_flags_stack: Vec::new(),
            window_stack: Vec::new(),
            current_window: None,
            hovered_window: None,
        }
    }

    // --- Accessors ---

    /// Cross-frame input state.
    #[inline]
    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// Mutable input state, for rebinding keys or toggling nav sources.
    #[inline]
    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    /// Host-supplied text metrics.
    #[inline]
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Replace the text metrics.
    pub fn set_metrics(&mut self, metrics: Metrics) {
        self.metrics = metrics;
    }

    /// The identity registry.
    #[inline]
    pub fn registry(&self) -> &InteractionRegistry {
        &self.registry
    }

    /// All windows ever submitted.
    #[inline]
    pub fn windows(&self) -> &Windows {
        &self.windows
    }

    /// Open popups, bottom first.
    #[inline]
    pub fn popups(&self) -> &PopupStack {
        &self.popups
    }

    /// Window currently being submitted.
    #[inline]
    pub fn current_window(&self) -> Option<WindowId> {
        self.current_window
    }

    /// Window under the pointer this frame.
    #[inline]
    pub fn hovered_window(&self) -> Option<WindowId> {
        self.hovered_window
    }

    /// Windowing overlay state, for rendering.
    #[inline]
    pub fn windowing(&self) -> &WindowingState {
        &self.engine.windowing
    }

    /// Focused item.
    #[inline]
    pub fn nav_id(&self) -> WidgetId {
        self.registry.nav_id
    }

    /// Window holding navigation focus.
    #[inline]
    pub fn nav_window(&self) -> Option<WindowId> {
        self.registry.nav_window
    }

    /// True while keyboard/gamepad navigation can act.
    #[inline]
    pub fn nav_active(&self) -> bool {
        self.engine.nav_active
    }

    /// True while a focus highlight should be drawn.
    #[inline]
    pub fn nav_visible(&self) -> bool {
        self.engine.nav_visible
    }

    /// Position the host should warp the pointer to this frame, if any.
    #[inline]
    pub fn want_warp_mouse(&self) -> Option<Vec2> {
        self.engine.want_warp_mouse()
    }

    /// True once a window was moved by the overlay; reading clears it.
    pub fn take_settings_dirty(&mut self) -> bool {
        std::mem::take(&mut self.engine.settings_dirty)
    }

    /// Activate `id` next frame as if the confirm input were pressed on it.
    pub fn request_activate(&mut self, id: WidgetId) {
        self.engine.request_activate(id);
    }

    /// Programmatically focus a window (or clear window focus).
    pub fn focus_window(&mut self, window: Option<WindowId>) {
        self.engine.focus_window(&mut self.registry, &mut self.windows, window);
    }

    /// Mark `id` as alive so its capture survives this frame.
    pub fn keep_alive_id(&mut self, id: WidgetId) {
        self.registry.keep_alive_id(id);
    }

    /// Give `id` exclusive capture, owned by the current window.
    pub fn set_active_id(&mut self, id: WidgetId) {
        self.registry.set_active_id(id, self.current_window);
    }

    /// Release exclusive capture.
    pub fn clear_active_id(&mut self) {
        self.registry.clear_active_id();
    }

    /// Move navigation focus to `id` in the current window.
    pub fn set_focus_id(&mut self, id: WidgetId) {
        if let Some(win) = self.current_window {
            self.registry.set_focus_id(id, win, &mut self.windows);
        }
    }

    // --- Frame protocol ---

    /// Start a frame: consume input and run the navigation decision pass.
    pub fn begin_frame(&mut self, snapshot: InputSnapshot, dt: f32) {
        self.input.begin_frame(snapshot, dt);

        // Real pointer motion re-enables mouse hover after nav drove it.
        if self.input.snapshot.mouse_pos != self.input.mouse_pos_prev
            && self.input.snapshot.mouse_pos.is_some()
        {
            self.registry.nav_disable_mouse_hover = false;
        }

        self.registry.new_frame(dt);
        self.windows.new_frame();
        self.popups.prune_inactive(&self.windows);
        self.update_hovered_window();

        self.engine.update(
            &mut self.registry,
            &mut self.windows,
            &mut self.popups,
            &self.input,
            &self.config,
            &self.metrics,
        );

        // Tab with nothing captured walks focus through the nav window's
        // tab stops. The request resolves during submission, wrapping at
        // the window's item count.
        if self.registry.active_id.is_none()
            && self.engine.windowing.target.is_none()
            && !self.input.snapshot.modifiers.contains(Modifiers::CTRL)
            && self.input.key_pressed(Key::Tab, false)
            && let Some(nav_win) = self.registry.nav_window
            && self.windows.get(nav_win).was_active
            && !self
                .windows
                .get(nav_win)
                .flags
                .contains(WindowFlags::NO_NAV_INPUTS)
        {
            let shift = self.input.snapshot.modifiers.contains(Modifiers::SHIFT);
            let request = if self.registry.nav_id.is_some() {
                self.registry.nav_id_tab_counter + if shift { -1 } else { 1 }
            } else if shift {
                -1
            } else {
                0
            };
            self.windows.get_mut(nav_win).focus_idx_tab_request_next = request;
        }
    }

    /// Finish a frame: resolve wrap requests and sweep stale captures.
    pub fn end_frame(&mut self) {
        debug_assert!(
            self.window_stack.is_empty(),
            "begin_window/end_window mismatch"
        );
        self.engine.end_frame(&mut self.registry, &mut self.windows);
        self.registry.end_frame();
    }

    /// Pick the front-most submitted window under the pointer.
    fn update_hovered_window(&mut self) {
        self.hovered_window = None;
        let Some(pos) = self.input.snapshot.mouse_pos else {
            return;
        };
        let mut best: Option<(i32, u32, WindowId)> = None;
        for window in self.windows.iter() {
            if !window.was_active || !window.rect.contains(pos) {
                continue;
            }
            let z = self.windows.focus_index(window.root).unwrap_or(-1);
            let mut depth = 0u32;
            let mut cursor = window.parent;
            while let Some(p) = cursor {
                depth += 1;
                cursor = self.windows.get(p).parent;
            }
            let key = (z, depth, window.id);
            if best.is_none_or(|(bz, bd, _)| (z, depth) > (bz, bd)) {
                best = Some(key);
            }
        }
        self.hovered_window = best.map(|(_, _, id)| id);
    }

    // --- Windows ---

    /// Begin submitting a window. `rect` is only applied when the window is
    /// first created; afterwards the window keeps its own geometry (see
    /// [`UiContext::set_window_rect`]).
    pub fn begin_window(&mut self, key: u64, rect: Rect, flags: WindowFlags) -> WindowId {
        let (id, created) = self.windows.ensure(key);
        let frame = self.input.frame;
        let parent = self.window_stack.last().copied();
        let first_begin = self.windows.get(id).last_frame_active != Some(frame);
        if !first_begin {
            // Re-begun to append: keep the frame state as-is.
            self.window_stack.push(id);
            self.current_window = Some(id);
            return id;
        }

        {
            let window = self.windows.get_mut(id);
            window.flags = flags;
            window.parent = parent;
            if created {
                window.rect = rect;
            }
            window.clip_rect = window.rect;
            window.appearing = window.last_frame_active != Some(frame.wrapping_sub(1));
            window.last_frame_active = Some(frame);
            window.active = true;

            window.nav_layer_current = NavLayer::Main;
            window.nav_layer_active_mask = window.nav_layer_active_mask_next;
            window.nav_layer_active_mask_next = 0;
            window.last_item_id = WidgetId::NONE;
            window.last_item_rect = Rect::ZERO;

            // Turn last frame's queued focus requests into this frame's,
            // wrapping at last frame's item counts.
            let all_count = window.focus_idx_all_counter + 1;
            let tab_count = window.focus_idx_tab_counter + 1;
            window.focus_idx_all_request_current =
                resolve_focus_request(window.focus_idx_all_request_next, all_count);
            window.focus_idx_tab_request_current =
                resolve_focus_request(window.focus_idx_tab_request_next, tab_count);
            window.focus_idx_all_request_next = FOCUS_REQUEST_NONE;
            window.focus_idx_tab_request_next = FOCUS_REQUEST_NONE;
            window.focus_idx_all_counter = -1;
            window.focus_idx_tab_counter = -1;
        }

        let root = match parent {
            Some(p)
                if flags.contains(WindowFlags::CHILD_WINDOW)
                    && !flags.contains(WindowFlags::POPUP) =>
            {
                self.windows.root_of(p)
            }
            _ => id,
        };
        self.windows.get_mut(id).root = root;

        let appearing = self.windows.get(id).appearing;
        if appearing
            && flags.intersects(WindowFlags::POPUP | WindowFlags::MODAL)
            && !(0..self.popups.len()).any(|i| self.popups.entry(i).window == id)
        {
            let backup = self.registry.nav_window;
            self.popups.push(id, backup);
        }

        // Fresh top-level windows and popups take focus and queue default
        // item selection.
        let wants_focus = appearing
            && !flags.contains(WindowFlags::NO_NAV_FOCUS)
            && (!flags.contains(WindowFlags::CHILD_WINDOW)
                || flags.intersects(WindowFlags::POPUP | WindowFlags::MODAL));
        if wants_focus {
            self.engine
                .focus_window(&mut self.registry, &mut self.windows, Some(id));
            self.engine
                .init_window(&mut self.registry, &mut self.windows, id, false);
        }

        self.window_stack.push(id);
        self.current_window = Some(id);
        id
    }

    /// Finish the current window. A navigable child registers itself as an
    /// item in its parent so directional moves and Cancel can reach it.
    pub fn end_window(&mut self) {
        let Some(finished) = self.window_stack.pop() else {
            debug_assert!(false, "end_window without begin_window");
            return;
        };
        self.current_window = self.window_stack.last().copied();

        if self.current_window.is_some() {
            let (flags, child_id, rect, navigable) = {
                let w = self.windows.get(finished);
                let navigable = w.nav_layer_active_mask != 0 || w.has_scroll();
                (w.flags, w.child_id, w.rect, navigable)
            };
            if flags.contains(WindowFlags::CHILD_WINDOW) {
                if navigable && !flags.contains(WindowFlags::NAV_FLATTENED) {
                    self.item_add(child_id, rect);
                } else {
                    self.item_add(WidgetId::NONE, rect);
                }
            }
        }
    }

    /// Reposition a window (host-driven, outside the overlay).
    pub fn set_window_rect(&mut self, window: WindowId, rect: Rect) {
        let w = self.windows.get_mut(window);
        w.rect = rect;
        w.clip_rect = rect;
    }

    /// Set the current window's content extent, enabling scrolling when it
    /// exceeds the window rect.
    pub fn set_window_content_size(&mut self, size: Vec2) {
        if let Some(win) = self.current_window {
            self.windows.get_mut(win).content_size = size;
        }
    }

    /// Set the current window's scroll offset, clamped to the content.
    pub fn set_window_scroll(&mut self, scroll: Vec2) {
        if let Some(win) = self.current_window {
            let w = self.windows.get_mut(win);
            w.scroll = scroll.clamp(Vec2::ZERO, w.scroll_max());
            // The remembered focus rect may now be off-screen.
            self.engine.move_from_clamped_ref_rect = true;
        }
    }

    /// Switch the current window's submission layer (menu bars submit on
    /// [`NavLayer::Menu`]).
    pub fn set_nav_layer(&mut self, layer: NavLayer) {
        if let Some(win) = self.current_window {
            self.windows.get_mut(win).nav_layer_current = layer;
        }
    }

    // --- Item flags ---

    /// Push an item flag for subsequent items.
    pub fn push_item_flag(&mut self, flag: ItemFlags, enabled: bool) {
        self.item_flags_stack.push(self.item_flags);
        self.item_flags.set(flag, enabled);
    }

    /// Restore the item flags from before the matching push.
    pub fn pop_item_flag(&mut self) {
        if let Some(prev) = self.item_flags_stack.pop() {
            self.item_flags = prev;
        }
    }

    /// Item flags currently in effect.
    #[inline]
    pub fn item_flags(&self) -> ItemFlags {
        self.item_flags
    }

    // --- Items ---

    /// Declare one item. Feeds pending navigation requests, then reports
    /// whether the item is visible enough to be worth drawing and testing.
    pub fn item_add(&mut self, id: WidgetId, bb: Rect) -> bool {
        let Some(win_id) = self.current_window else {
            debug_assert!(false, "item_add outside a window");
            return false;
        };

        if id.is_some() {
            if id == self.registry.active_id {
                self.registry.active_id_is_alive = true;
            }
            {
                let window = self.windows.get_mut(win_id);
                window.nav_layer_active_mask_next |= window.nav_layer_current.bit();
            }
            // Navigation runs before the clip test so init requests can
            // land in fresh windows and moves can target clipped items.
            if (self.registry.nav_id == id || self.engine.any_request)
                && let Some(nav_win) = self.registry.nav_window
                && self.windows.root_of(nav_win) == self.windows.root_of(win_id)
            {
                let flattened = (self.windows.get(win_id).flags
                    | self.windows.get(nav_win).flags)
                    .contains(WindowFlags::NAV_FLATTENED);
                if win_id == nav_win || flattened {
                    self.engine.process_item(
                        &mut self.registry,
                        &mut self.windows,
                        win_id,
                        id,
                        bb,
                        self.item_flags,
                    );
                }
            }
        }

        let window = self.windows.get_mut(win_id);
        window.last_item_id = id;
        window.last_item_rect = bb;

        if !bb.overlaps(&window.clip_rect) && (id.is_none() || id != self.registry.active_id) {
            return false;
        }
        true
    }

    /// Hover test for the last-declared item: passes only when no other
    /// item holds hover or capture, the pointer is inside the clipped
    /// bounds, and nothing (popup, modal, nav) blocks this window.
    pub fn item_hoverable(&mut self, bb: Rect, id: WidgetId) -> bool {
        let Some(win_id) = self.current_window else {
            return false;
        };
        let reg = &self.registry;
        if reg.hovered_id.is_some() && reg.hovered_id != id && !reg.hovered_id_allow_overlap {
            return false;
        }
        if self.hovered_window != Some(win_id) {
            return false;
        }
        if reg.active_id.is_some() && reg.active_id != id && !reg.active_id_allow_overlap {
            return false;
        }
        let Some(pos) = self.input.snapshot.mouse_pos else {
            return false;
        };
        let clip = self.windows.get(win_id).clip_rect;
        let clipped = Rect::new(bb.min.max(clip.min), bb.max.min(clip.max));
        if clipped.is_inverted() || !clipped.contains(pos) {
            return false;
        }
        if reg.nav_disable_mouse_hover || !self.is_window_content_hoverable(win_id) {
            return false;
        }
        if self.item_flags.contains(ItemFlags::DISABLED) {
            return false;
        }
        self.registry.set_hovered_id(id);
        true
    }

    /// True unless a popup or modal elsewhere blocks pointer interaction
    /// with `window`.
    pub(crate) fn is_window_content_hoverable(&self, window: WindowId) -> bool {
        if let Some(modal) = self.popups.topmost_modal(&self.windows)
            && self.windows.root_of(modal) != self.windows.root_of(window)
        {
            return false;
        }
        if let Some(nav_win) = self.registry.nav_window {
            let focused_root = self.windows.root_of(nav_win);
            let w = self.windows.get(focused_root);
            if w.was_active
                && focused_root != self.windows.root_of(window)
                && w.flags.intersects(WindowFlags::POPUP | WindowFlags::MODAL)
            {
                return false;
            }
        }
        true
    }

    // --- Tab traversal ---

    /// Register the next item as a focus/tab stop, before its `item_add`.
    /// Returns true when a queued focus request lands on it; the item then
    /// also receives navigation focus.
    pub fn focusable_item_register(&mut self, id: WidgetId) -> bool {
        let Some(win_id) = self.current_window else {
            return false;
        };
        let is_tab_stop = !self
            .item_flags
            .intersects(ItemFlags::NO_TAB_STOP | ItemFlags::DISABLED);

        let window = self.windows.get_mut(win_id);
        window.focus_idx_all_counter += 1;
        if is_tab_stop {
            window.focus_idx_tab_counter += 1;
        }

        // Tab out of the item currently holding capture.
        if is_tab_stop
            && self.registry.active_id == id
            && window.focus_idx_all_request_next == FOCUS_REQUEST_NONE
            && window.focus_idx_tab_request_next == FOCUS_REQUEST_NONE
            && !self.input.snapshot.modifiers.contains(Modifiers::CTRL)
            && self.input.key_pressed(Key::Tab, false)
        {
            let shift = self.input.snapshot.modifiers.contains(Modifiers::SHIFT);
            window.focus_idx_tab_request_next =
                window.focus_idx_tab_counter + if shift { -1 } else { 1 };
        }

        let granted_all = window.focus_idx_all_counter == window.focus_idx_all_request_current;
        let granted_tab =
            is_tab_stop && window.focus_idx_tab_counter == window.focus_idx_tab_request_current;
        if !granted_all && !granted_tab {
            return false;
        }
        if granted_tab {
            self.registry.nav_just_tabbed_id = id;
        }
        if self.registry.active_id.is_some() && self.registry.active_id != id {
            self.registry.clear_active_id();
        }
        self.registry.set_focus_id(id, win_id, &mut self.windows);
        true
    }

    /// Undo the counter bump of a `focusable_item_register` for an item
    /// that turned out not to be submitted.
    pub fn focusable_item_unregister(&mut self) {
        if let Some(win_id) = self.current_window {
            let window = self.windows.get_mut(win_id);
            window.focus_idx_all_counter -= 1;
            window.focus_idx_tab_counter -= 1;
        }
    }

    /// Queue keyboard focus onto a focusable item relative to the current
    /// declaration point: `offset` 0 targets the next registered item, -1
    /// the one just registered. The request resolves during the next
    /// frame's submission, wrapping at the window's item count, and works
    /// on items that are not tab stops.
    pub fn set_keyboard_focus_here(&mut self, offset: i32) {
        let Some(win_id) = self.current_window else {
            return;
        };
        self.focus_window(Some(win_id));
        let window = self.windows.get_mut(win_id);
        window.focus_idx_all_request_next = window.focus_idx_all_counter + 1 + offset;
    }

    /// Make the last-declared item the default focus of an appearing
    /// window, overriding first-item selection.
    pub fn set_item_default_focus(&mut self) {
        let Some(win_id) = self.current_window else {
            return;
        };
        let window = self.windows.get(win_id);
        if !window.appearing {
            return;
        }
        if self.registry.nav_window != Some(window.root) {
            return;
        }
        if !(self.engine.init_request || self.engine.init_result_id.is_some()) {
            return;
        }
        if self.registry.nav_layer != window.nav_layer_current {
            return;
        }
        let last_id = window.last_item_id;
        let rect_rel = window
            .last_item_rect
            .translate(Vec2::new(-window.rect.min.x, -window.rect.min.y));
        self.engine.init_request = false;
        self.engine.init_result_id = last_id;
        self.engine.init_result_rect_rel = rect_rel;
        self.engine.update_any_request_flag();
    }

    // --- Navigation requests from widgets ---

    /// Ask the pending move to wrap or loop within the current window if it
    /// finds no candidate; resolved in `end_frame`.
    pub fn nav_move_request_try_wrapping(&mut self, flags: NavMoveFlags) {
        if let Some(win) = self.current_window
            && self.engine.move_request
        {
            self.engine.try_wrapping(win, flags);
        }
    }

    /// Look up a window handle by submission key.
    #[must_use]
    pub fn find_window(&self, key: u64) -> Option<WindowId> {
        self.windows.find(key)
    }

    /// Read-only view of a window.
    #[must_use]
    pub fn window(&self, id: WindowId) -> &Window {
        self.windows.get(id)
    }
}

#[inline]
fn resolve_focus_request(next: i32, count: i32) -> i32 {
    if next == FOCUS_REQUEST_NONE || count <= 0 {
        FOCUS_REQUEST_NONE
    } else {
        mod_positive(next, count)
    }
}
