#![forbid(unsafe_code)]

//! Identity & interaction registry.
//!
//! Tracks the three global identities of the immediate-mode core and their
//! timers:
//!
//! - **ActiveId**: exclusive interaction capture (a held button, a dragged
//!   slider). At most one per frame.
//! - **HoveredId**: the item under the pointer, subject to overlap rules.
//! - **NavId**: keyboard/gamepad focus, with its window and nav layer.
//!
//! # Invariants
//!
//! 1. `active_id != NONE` implies `active_id_window` is set.
//! 2. `clear_active_id` is idempotent.
//! 3. Hover timers reset only when the hovered id differs from the previous
//!    frame's hovered id; re-hovering the same id accumulates monotonically.
//! 4. An active id not kept alive during a frame is released by the frame
//!    epilogue (liveness-based recovery; a bad frame self-heals).

use glint_core::geometry::Vec2;
use glint_core::id::WidgetId;

use crate::window::{NavLayer, WindowId, Windows};

/// Which input device granted the current capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputSource {
    /// Mouse / touch.
    #[default]
    Pointer,
    /// Keyboard or gamepad navigation.
    Nav,
}

/// Global identity and capture state for one UI root.
#[derive(Debug, Default)]
pub struct InteractionRegistry {
    // --- Exclusive capture ---
    pub(crate) active_id: WidgetId,
    pub(crate) active_id_window: Option<WindowId>,
    pub(crate) active_id_source: InputSource,
    pub(crate) active_id_timer: f32,
    pub(crate) active_id_is_alive: bool,
    pub(crate) active_id_previous_frame: WidgetId,
    pub(crate) active_id_previous_frame_is_alive: bool,
    pub(crate) active_id_is_just_activated: bool,
    pub(crate) active_id_allow_overlap: bool,
    pub(crate) active_id_has_been_pressed: bool,
    pub(crate) active_id_has_been_edited: bool,
    /// Directions the active widget still lets navigation move in.
    pub(crate) active_id_allow_nav_dir_flags: u8,
    /// Nav inputs the active widget captures for itself (bit per input).
    pub(crate) active_id_block_nav_inputs: u32,
    /// Pointer position relative to the item when capture was taken.
    pub(crate) active_id_click_offset: Vec2,

    // --- Hover ---
    pub(crate) hovered_id: WidgetId,
    pub(crate) hovered_id_previous_frame: WidgetId,
    pub(crate) hovered_id_allow_overlap: bool,
    pub(crate) hovered_id_timer: f32,
    pub(crate) hovered_id_not_active_timer: f32,

    // --- Navigation focus ---
    pub(crate) nav_id: WidgetId,
    pub(crate) nav_window: Option<WindowId>,
    pub(crate) nav_layer: NavLayer,
    /// Tab-counter value of the focused item, captured at submission.
    pub(crate) nav_id_tab_counter: i32,

    // --- Per-frame nav hints, written by the engine's decision pass ---
    /// Focused item should act as pressed this frame (confirm input).
    pub(crate) nav_activate_id: WidgetId,
    /// Focused item while the confirm input is held.
    pub(crate) nav_activate_down_id: WidgetId,
    /// Focused item on the frame the confirm input goes down.
    pub(crate) nav_activate_pressed_id: WidgetId,
    /// Focused item should enter input mode this frame.
    pub(crate) nav_input_id: WidgetId,
    /// Item granted focus via Tab this frame.
    pub(crate) nav_just_tabbed_id: WidgetId,
    /// Item focus just moved to via a directional move.
    pub(crate) nav_just_moved_to_id: WidgetId,

    // --- Highlight / hover suppression, toggled by focus source ---
    pub(crate) nav_disable_highlight: bool,
    pub(crate) nav_disable_mouse_hover: bool,
}

impl InteractionRegistry {
    /// Identity currently holding exclusive capture.
    #[inline]
    pub fn active_id(&self) -> WidgetId {
        self.active_id
    }

    /// Window owning the active id.
    #[inline]
    pub fn active_id_window(&self) -> Option<WindowId> {
        self.active_id_window
    }

    /// Which device granted the current capture.
    #[inline]
    pub fn active_id_source(&self) -> InputSource {
        self.active_id_source
    }

    /// Seconds the current capture has been held.
    #[inline]
    pub fn active_id_timer(&self) -> f32 {
        self.active_id_timer
    }

    /// Pointer position relative to the item when capture was taken, for
    /// drag math. `(-1, -1)` until a pointer grab records it.
    #[inline]
    pub fn active_id_click_offset(&self) -> Vec2 {
        self.active_id_click_offset
    }

    /// Identity holding keyboard/gamepad focus.
    #[inline]
    pub fn nav_id(&self) -> WidgetId {
        self.nav_id
    }

    /// Window holding navigation focus.
    #[inline]
    pub fn nav_window(&self) -> Option<WindowId> {
        self.nav_window
    }

    /// Focus track within the nav window.
    #[inline]
    pub fn nav_layer(&self) -> NavLayer {
        self.nav_layer
    }

    /// Hovered identity, falling back to the previous frame's value while
    /// this frame's submission has not reached the hovered item yet.
    #[inline]
    pub fn hovered_id(&self) -> WidgetId {
        if self.hovered_id.is_some() {
            self.hovered_id
        } else {
            self.hovered_id_previous_frame
        }
    }

    /// Seconds the current id has been hovered.
    #[inline]
    pub fn hovered_id_timer(&self) -> f32 {
        self.hovered_id_timer
    }

    /// Seconds the current id has been hovered without holding capture.
    #[inline]
    pub fn hovered_id_not_active_timer(&self) -> f32 {
        self.hovered_id_not_active_timer
    }

    /// True when navigation wants mouse hover suppressed.
    #[inline]
    pub fn mouse_hover_disabled(&self) -> bool {
        self.nav_disable_mouse_hover
    }

    /// True when the nav highlight is suppressed (pointer drove last focus).
    #[inline]
    pub fn highlight_disabled(&self) -> bool {
        self.nav_disable_highlight
    }

    /// Item the engine wants pressed this frame via confirm input.
    #[inline]
    pub fn nav_activate_id(&self) -> WidgetId {
        self.nav_activate_id
    }

    /// Transition exclusive capture to `id`.
    ///
    /// On an actual change the capture timer and press/edit flags reset.
    /// The capture source becomes [`InputSource::Nav`] when `id` matches a
    /// pending nav-activation or nav-input identity, [`InputSource::Pointer`]
    /// otherwise.
    pub fn set_active_id(&mut self, id: WidgetId, window: Option<WindowId>) {
        debug_assert!(
            id.is_none() || window.is_some(),
            "an active id must have an owning window"
        );
        if self.active_id != id {
            self.active_id_timer = 0.0;
            self.active_id_has_been_pressed = false;
            self.active_id_has_been_edited = false;
        }
        self.active_id = id;
        self.active_id_window = if id.is_none() { None } else { window };
        self.active_id_is_just_activated = true;
        self.active_id_allow_overlap = false;
        self.active_id_allow_nav_dir_flags = 0;
        self.active_id_block_nav_inputs = 0;
        self.active_id_click_offset = Vec2::new(-1.0, -1.0);
        self.active_id_source = if id.is_some()
            && (self.nav_activate_id == id
                || self.nav_input_id == id
                || self.nav_just_tabbed_id == id
                || self.nav_just_moved_to_id == id)
        {
            InputSource::Nav
        } else {
            InputSource::Pointer
        };
    }

    /// Release exclusive capture. Idempotent.
    pub fn clear_active_id(&mut self) {
        self.set_active_id(WidgetId::NONE, None);
    }

    /// Move keyboard/gamepad focus to `id` in `window`.
    ///
    /// The nav layer is taken from the window's current submission layer.
    /// If `id` is the window's last-submitted item, its rect is snapshotted
    /// as the layer's reference rect for future directional moves.
    pub fn set_focus_id(&mut self, id: WidgetId, window_id: WindowId, windows: &mut Windows) {
        debug_assert!(id.is_some(), "set_focus_id requires a real id");
        let window = windows.get_mut(window_id);
        let layer = window.nav_layer_current;
        self.nav_id = id;
        self.nav_window = Some(window_id);
        self.nav_layer = layer;
        window.nav_last_ids[layer.index()] = id;
        if window.last_item_id == id {
            let pos = window.rect.min;
            window.nav_rect_rel[layer.index()] = window
                .last_item_rect
                .translate(Vec2::new(-pos.x, -pos.y));
        }
        match self.active_id_source {
            InputSource::Nav => self.nav_disable_mouse_hover = true,
            InputSource::Pointer => self.nav_disable_highlight = true,
        }
    }

    /// Set the hovered identity.
    ///
    /// Timers reset only when `id` differs from the previous frame's
    /// hovered id, so hovering the same item accumulates monotonically.
    pub fn set_hovered_id(&mut self, id: WidgetId) {
        self.hovered_id = id;
        self.hovered_id_allow_overlap = false;
        if id.is_some() && self.hovered_id_previous_frame != id {
            self.hovered_id_timer = 0.0;
            self.hovered_id_not_active_timer = 0.0;
        }
    }

    /// Mark `id` as still alive this frame; without this the frame epilogue
    /// releases a stale capture.
    pub fn keep_alive_id(&mut self, id: WidgetId) {
        if self.active_id == id {
            self.active_id_is_alive = true;
        }
        if self.active_id_previous_frame == id {
            self.active_id_previous_frame_is_alive = true;
        }
    }

    /// Let the active widget declare which directions navigation may still
    /// move in while it holds capture.
    pub fn set_active_id_allow_nav_dirs(&mut self, mask: u8) {
        self.active_id_allow_nav_dir_flags = mask;
    }

    /// Let the active widget declare overlap-tolerant capture.
    pub fn set_active_id_allow_overlap(&mut self, allow: bool) {
        self.active_id_allow_overlap = allow;
    }

    /// Advance timers and roll hover state. Runs once at frame start,
    /// before the navigation decision pass.
    pub(crate) fn new_frame(&mut self, dt: f32) {
        if self.active_id.is_some() {
            self.active_id_timer += dt;
        }
        self.active_id_is_just_activated = false;
        if self.hovered_id.is_some() {
            self.hovered_id_timer += dt;
            if self.active_id != self.hovered_id {
                self.hovered_id_not_active_timer += dt;
            }
        }
        self.hovered_id_previous_frame = self.hovered_id;
        self.hovered_id = WidgetId::NONE;
        self.hovered_id_allow_overlap = false;
    }

    /// Frame epilogue: release captures that were not kept alive, then roll
    /// the liveness flags.
    ///
    /// A capture acquired this frame (previous frame id differs) gets a
    /// grace frame so widgets activated after their submission point are
    /// not dropped immediately.
    pub(crate) fn end_frame(&mut self) {
        if self.active_id.is_some()
            && !self.active_id_is_alive
            && self.active_id_previous_frame == self.active_id
        {
            self.clear_active_id();
        }
        self.active_id_previous_frame = self.active_id;
        self.active_id_previous_frame_is_alive = self.active_id_is_alive;
        self.active_id_is_alive = false;
    }
}

/// Positive modulo for tab-counter wraparound.
#[inline]
pub(crate) fn mod_positive(v: i32, count: i32) -> i32 {
    debug_assert!(count > 0);
    ((v % count) + count) % count
}
