#![forbid(unsafe_code)]

//! Directional navigation engine.
//!
//! The engine runs one decision pass per frame, before any window is
//! submitted:
//!
//! 1. Apply results of the previous frame's init/move requests.
//! 2. Emit a mouse-warp position if the focused item moved.
//! 3. Run the windowing overlay.
//! 4. Handle Cancel, activation inputs, and new directional presses.
//! 5. Build the scoring rectangle for this frame's candidates.
//!
//! Items submitted during the frame feed [`NavEngine::process_item`], which
//! scores them into the local/other/visible result slots. The frame epilogue
//! ([`NavEngine::end_frame`]) resolves wrap-around requests by re-scoring
//! the recorded candidates against a relocated reference rectangle, so a
//! wrapped move lands in the same frame it was requested.
//!
//! # State machine
//!
//! A move request is born in the decision pass (or forced by a page move),
//! collects candidates during submission, optionally wraps in the epilogue,
//! and is consumed at the start of the next decision pass. An init request
//! follows the same life cycle but selects a default item instead.

use bitflags::bitflags;
use glint_core::geometry::{Dir, Rect, Vec2};
use glint_core::id::WidgetId;
use glint_core::input::{InputState, Key, NavInput, NavReadMode};
use glint_core::metrics::Metrics;

use crate::context::{ItemFlags, NavConfig};
use crate::registry::InteractionRegistry;
use crate::scoring::{score_item, Candidate, NavMoveResult, ScoreParams, VISIBLE_RATIO};
use crate::window::{NavLayer, PopupStack, Window, WindowFlags, WindowId, Windows};
use crate::windowing::WindowingState;

bitflags! {
    /// Behavior flags attached to a directional move request.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NavMoveFlags: u16 {
        /// On failed horizontal moves, retry from the opposite edge of the
        /// same row.
        const LOOP_X               = 1 << 0;
        /// On failed vertical moves, retry from the opposite edge of the
        /// same column.
        const LOOP_Y               = 1 << 1;
        /// Like `LOOP_X`, but also step one row down/up.
        const WRAP_X               = 1 << 2;
        /// Like `LOOP_Y`, but also step one column right/left.
        const WRAP_Y               = 1 << 3;
        /// The currently focused item may win the move (page moves).
        const ALLOW_CURRENT_NAV_ID = 1 << 4;
        /// Prefer the visible-set result and scroll the window (page moves).
        const ALSO_SCROLL_WINDOW   = 1 << 5;
    }
}

#[derive(Debug, Default)]
pub struct NavEngine {
    // Init request: select a default item in the nav window.
    pub(crate) init_request: bool,
    pub(crate) init_request_from_move: bool,
    pub(crate) init_result_id: WidgetId,
    pub(crate) init_result_rect_rel: Rect,

    // Move request.
    pub(crate) move_request: bool,
    pub(crate) move_dir: Option<Dir>,
    pub(crate) move_dir_last: Option<Dir>,
    pub(crate) move_clip_dir: Dir,
    pub(crate) move_flags: NavMoveFlags,
    pub(crate) result_local: NavMoveResult,
    pub(crate) result_other: NavMoveResult,
    pub(crate) result_local_visible: NavMoveResult,
    /// Reference rectangle candidates are scored against, screen space.
    pub(crate) scoring_rect: Rect,
    /// Flags of the nav window when the move was initiated.
    move_src_window_flags: WindowFlags,
    /// Every candidate scored this frame, kept for wrap re-scoring.
    pub(crate) candidates: Vec<Candidate>,

    // Wrap request recorded during submission.
    wrap_request_window: Option<WindowId>,
    wrap_request_flags: NavMoveFlags,

    /// True while either request is live; gates per-item processing.
    pub(crate) any_request: bool,
    /// The focused item was submitted this frame.
    pub(crate) nav_id_is_alive: bool,
    /// Focus moved; the synthetic pointer should follow.
    pub(crate) mouse_pos_dirty: bool,
    /// The reference rect may be out of view and needs clamping before the
    /// next move.
    pub(crate) move_from_clamped_ref_rect: bool,
    /// Programmatic activation queued for the next decision pass.
    next_activate_id: WidgetId,
    /// Position the host should warp the pointer to this frame.
    want_warp_mouse: Option<Vec2>,
    /// A window was moved by the windowing overlay; host should persist
    /// window positions.
    pub(crate) settings_dirty: bool,

    // Output flags.
    pub(crate) nav_active: bool,
    pub(crate) nav_visible: bool,

    pub(crate) windowing: WindowingState,
}

impl NavEngine {
    /// Where the host should warp the pointer, if anywhere, this frame.
    #[inline]
    pub fn want_warp_mouse(&self) -> Option<Vec2> {
        self.want_warp_mouse
    }

    /// Queue an activation of `id` for the next frame, as if the confirm
    /// input had been pressed while it was focused.
    pub fn request_activate(&mut self, id: WidgetId) {
        self.next_activate_id = id;
    }

    /// Record a wrap/loop request for the current move, to be resolved in
    /// the frame epilogue if the move finds no candidate.
    pub(crate) fn try_wrapping(&mut self, window: WindowId, flags: NavMoveFlags) {
        self.wrap_request_window = Some(window);
        self.wrap_request_flags = flags;
    }

    #[inline]
    fn move_request_but_no_result_yet(&self) -> bool {
        self.move_request
            && !self.result_local.has_result()
            && !self.result_other.has_result()
            && !self.result_local_visible.has_result()
    }

    pub(crate) fn update_any_request_flag(&mut self) {
        self.any_request = self.move_request || self.init_request;
    }

    // --- Focus primitives ---

    pub(crate) fn set_nav_id(
        &mut self,
        reg: &mut InteractionRegistry,
        windows: &mut Windows,
        id: WidgetId,
        layer: NavLayer,
    ) {
        reg.nav_id = id;
        if let Some(win) = reg.nav_window {
            windows.get_mut(win).nav_last_ids[layer.index()] = id;
        }
    }

    pub(crate) fn set_nav_id_with_rect(
        &mut self,
        reg: &mut InteractionRegistry,
        windows: &mut Windows,
        id: WidgetId,
        layer: NavLayer,
        rect_rel: Rect,
    ) {
        self.set_nav_id(reg, windows, id, layer);
        if let Some(win) = reg.nav_window {
            windows.get_mut(win).nav_rect_rel[layer.index()] = rect_rel;
        }
        self.mouse_pos_dirty = true;
        reg.nav_disable_highlight = false;
        reg.nav_disable_mouse_hover = true;
    }

    /// Move navigation focus to `window`, restoring its last focused item,
    /// and raise its root in the focus order.
    pub(crate) fn focus_window(
        &mut self,
        reg: &mut InteractionRegistry,
        windows: &mut Windows,
        window: Option<WindowId>,
    ) {
        if reg.nav_window != window {
            reg.nav_window = window;
            if window.is_some() && reg.nav_disable_mouse_hover {
                self.mouse_pos_dirty = true;
            }
            self.init_request = false;
            reg.nav_id = match window {
                Some(w) => windows.get(w).nav_last_ids[NavLayer::Main.index()],
                None => WidgetId::NONE,
            };
            self.nav_id_is_alive = false;
            reg.nav_layer = NavLayer::Main;
        }
        if let Some(w) = window {
            windows.bring_to_focus_front(w);
        }
    }

    /// Queue an init request for `window`, or restore its remembered focus.
    ///
    /// Fresh top-level windows and popups ask for a default item; child
    /// windows and windows with a remembered item reuse what they had,
    /// unless `force` is set.
    pub(crate) fn init_window(
        &mut self,
        reg: &mut InteractionRegistry,
        windows: &mut Windows,
        window: WindowId,
        force: bool,
    ) {
        debug_assert_eq!(reg.nav_window, Some(window));
        let w = windows.get(window);
        let flags = w.flags;
        let last_main = w.nav_last_ids[NavLayer::Main.index()];
        let init_for_nav = !flags.contains(WindowFlags::NO_NAV_INPUTS)
            && (!flags.contains(WindowFlags::CHILD_WINDOW)
                || flags.contains(WindowFlags::POPUP)
                || last_main.is_none()
                || force);
        if init_for_nav {
            self.set_nav_id(reg, windows, WidgetId::NONE, reg.nav_layer);
            self.init_request = true;
            self.init_request_from_move = false;
            self.init_result_id = WidgetId::NONE;
            self.init_result_rect_rel = Rect::ZERO;
            self.update_any_request_flag();
        } else {
            reg.nav_id = last_main;
        }
    }

    /// Switch the nav layer, restoring the layer's remembered item or
    /// re-initializing the window.
    pub(crate) fn restore_layer(
        &mut self,
        reg: &mut InteractionRegistry,
        windows: &mut Windows,
        layer: NavLayer,
    ) {
        reg.nav_layer = layer;
        if layer == NavLayer::Main
            && let Some(win) = reg.nav_window
        {
            reg.nav_window = Some(windows.restore_last_child_nav(win));
        }
        let Some(win) = reg.nav_window else { return };
        let last = windows.get(win).nav_last_ids[layer.index()];
        if layer == NavLayer::Main && last.is_some() {
            let rect_rel = windows.get(win).nav_rect_rel[layer.index()];
            self.set_nav_id_with_rect(reg, windows, last, layer, rect_rel);
        } else {
            self.init_window(reg, windows, win, true);
        }
    }

    // --- Frame decision pass ---

    #[allow(clippy::too_many_lines)]
    pub(crate) fn update(
        &mut self,
        reg: &mut InteractionRegistry,
        windows: &mut Windows,
        popups: &mut PopupStack,
        input: &InputState,
        config: &NavConfig,
        metrics: &Metrics,
    ) {
        self.want_warp_mouse = None;

        // Apply the previous frame's init result. A pointer-driven session
        // (highlight disabled) ignores it unless the init came from a
        // directional move into an empty window.
        if self.init_result_id.is_some()
            && (!reg.nav_disable_highlight || self.init_request_from_move)
            && let Some(nav_win) = reg.nav_window
        {
            let id = self.init_result_id;
            let rect_rel = self.init_result_rect_rel;
            if self.init_request_from_move {
                self.set_nav_id_with_rect(reg, windows, id, reg.nav_layer, rect_rel);
            } else {
                self.set_nav_id(reg, windows, id, reg.nav_layer);
            }
            windows.get_mut(nav_win).nav_rect_rel[reg.nav_layer.index()] = rect_rel;
        }
        self.init_request = false;
        self.init_request_from_move = false;
        self.init_result_id = WidgetId::NONE;
        reg.nav_just_moved_to_id = WidgetId::NONE;

        // Apply the previous frame's move result.
        if self.move_request
            && (self.result_local.has_result() || self.result_other.has_result())
        {
            self.apply_move_result(reg, windows);
            trace_move_applied(reg.nav_id);
        }

        // Emit the pointer warp once the move result has settled.
        if self.mouse_pos_dirty && self.nav_id_is_alive {
            if !reg.nav_disable_highlight
                && reg.nav_disable_mouse_hover
                && reg.nav_window.is_some()
            {
                self.want_warp_mouse =
                    Some(self.preferred_ref_pos(reg, windows, input, metrics));
            }
            self.mouse_pos_dirty = false;
        }
        self.nav_id_is_alive = false;
        reg.nav_just_tabbed_id = WidgetId::NONE;

        // Remember which child of the nav root held focus, so returning from
        // the menu layer can restore it. Clear the note once back on Main.
        if let Some(nav_win) = reg.nav_window {
            save_last_child_nav_window(windows, nav_win);
            if windows.get(nav_win).nav_last_child_window.is_some()
                && reg.nav_layer == NavLayer::Main
            {
                windows.get_mut(nav_win).nav_last_child_window = None;
            }
        }

        crate::windowing::update(self, reg, windows, popups, input, config);

        // Output flags.
        let nav_input_on = input.nav_keyboard_active || input.nav_gamepad_active;
        self.nav_active = nav_input_on
            && reg
                .nav_window
                .is_some_and(|w| !windows.get(w).flags.contains(WindowFlags::NO_NAV_INPUTS));
        self.nav_visible = (self.nav_active && reg.nav_id.is_some() && !reg.nav_disable_highlight)
            || self.windowing.target.is_some();

        // Cancel: release capture, leave a child, close a popup, drop the
        // menu layer, or clear focus, in that order of precedence.
        if input.nav_pressed(NavInput::Cancel, NavReadMode::Pressed) {
            self.handle_cancel(reg, windows, popups);
        }

        // Activation hints for this frame.
        reg.nav_activate_id = WidgetId::NONE;
        reg.nav_activate_down_id = WidgetId::NONE;
        reg.nav_activate_pressed_id = WidgetId::NONE;
        reg.nav_input_id = WidgetId::NONE;
        if reg.nav_id.is_some()
            && !reg.nav_disable_highlight
            && self.windowing.target.is_none()
            && let Some(nav_win) = reg.nav_window
            && !windows.get(nav_win).flags.contains(WindowFlags::NO_NAV_INPUTS)
        {
            let activate_down = input.nav_down(NavInput::Activate);
            let activate_pressed =
                activate_down && input.nav_pressed(NavInput::Activate, NavReadMode::Pressed);
            if reg.active_id.is_none() && activate_pressed {
                reg.nav_activate_id = reg.nav_id;
            }
            let unclaimed = reg.active_id.is_none() || reg.active_id == reg.nav_id;
            if unclaimed && activate_down {
                reg.nav_activate_down_id = reg.nav_id;
            }
            if unclaimed && activate_pressed {
                reg.nav_activate_pressed_id = reg.nav_id;
            }
            if unclaimed && input.nav_pressed(NavInput::Input, NavReadMode::Pressed) {
                reg.nav_input_id = reg.nav_id;
            }
        }
        if let Some(nav_win) = reg.nav_window
            && windows.get(nav_win).flags.contains(WindowFlags::NO_NAV_INPUTS)
        {
            reg.nav_disable_highlight = true;
        }
        self.move_request = false;

        // Programmatic activation beats input-driven hints.
        if self.next_activate_id.is_some() {
            reg.nav_activate_id = self.next_activate_id;
            reg.nav_activate_down_id = self.next_activate_id;
            reg.nav_activate_pressed_id = self.next_activate_id;
            reg.nav_input_id = self.next_activate_id;
        }
        self.next_activate_id = WidgetId::NONE;

        // New directional request. An active widget restricts which
        // directions may leave it.
        let allowed_dir_flags: u8 = if reg.active_id.is_none() {
            0b1111
        } else {
            reg.active_id_allow_nav_dir_flags
        };
        self.move_dir = None;
        self.move_flags = NavMoveFlags::empty();
        if let Some(nav_win) = reg.nav_window
            && self.windowing.target.is_none()
            && !windows.get(nav_win).flags.contains(WindowFlags::NO_NAV_INPUTS)
        {
            let pairs = [
                (Dir::Left, NavInput::DpadLeft, NavInput::KeyLeft),
                (Dir::Right, NavInput::DpadRight, NavInput::KeyRight),
                (Dir::Up, NavInput::DpadUp, NavInput::KeyUp),
                (Dir::Down, NavInput::DpadDown, NavInput::KeyDown),
            ];
            for (dir, pad, key) in pairs {
                if allowed_dir_flags & dir.bit() != 0
                    && input.nav_pressed_any_of_two(pad, key, NavReadMode::Repeat)
                {
                    self.move_dir = Some(dir);
                }
            }
        }
        self.move_clip_dir = self.move_dir.unwrap_or(Dir::Down);

        let mut scoring_rect_offset_y = 0.0;
        if input.nav_keyboard_active {
            scoring_rect_offset_y =
                self.update_page_up_down(reg, windows, input, metrics, allowed_dir_flags);
        }

        if self.move_dir.is_some() {
            self.move_request = true;
            self.move_dir_last = self.move_dir;
        }

        // Moving with no focused item doubles as an init request, so the
        // move lands on a default item if scoring finds nothing.
        if self.move_request && reg.nav_id.is_none() {
            self.init_request = true;
            self.init_request_from_move = true;
            self.init_result_id = WidgetId::NONE;
            reg.nav_disable_highlight = false;
        }
        self.update_any_request_flag();

        // Fallback: directional inputs scroll a window that has no
        // navigable items.
        if let Some(nav_win) = reg.nav_window
            && !windows.get(nav_win).flags.contains(WindowFlags::NO_NAV_INPUTS)
            && self.windowing.target.is_none()
        {
            let scroll_speed = (metrics.font_size * 100.0 * input.dt + 0.5).floor();
            let window = windows.get_mut(nav_win);
            if window.nav_layer_active_mask == 0
                && window.has_scroll()
                && self.move_request
                && let Some(dir) = self.move_dir
            {
                let delta = match dir {
                    Dir::Left => Vec2::new(-scroll_speed, 0.0),
                    Dir::Right => Vec2::new(scroll_speed, 0.0),
                    Dir::Up => Vec2::new(0.0, -scroll_speed),
                    Dir::Down => Vec2::new(0.0, scroll_speed),
                };
                window.scroll =
                    (window.scroll + delta).floor().clamp(Vec2::ZERO, window.scroll_max());
            }
        }

        // Reset search state for the coming submission pass.
        self.result_local.clear();
        self.result_other.clear();
        self.result_local_visible.clear();
        self.candidates.clear();
        self.wrap_request_window = None;
        self.wrap_request_flags = NavMoveFlags::empty();

        if self.move_request
            && let Some(nav_win) = reg.nav_window
        {
            self.move_src_window_flags = windows.get(nav_win).flags;

            // After a manual scroll the reference rect can sit far outside
            // the view; project it back so navigation resumes from visible
            // items.
            if self.move_from_clamped_ref_rect && reg.nav_layer == NavLayer::Main {
                let window = windows.get_mut(nav_win);
                let layer = reg.nav_layer.index();
                let mut window_rect_rel = Rect::new(
                    Vec2::new(-1.0, -1.0),
                    window.rect.size() + Vec2::new(1.0, 1.0),
                );
                if !window_rect_rel.contains_rect(&window.nav_rect_rel[layer]) {
                    // Rough stand-in for "start from the first fully
                    // visible item".
                    let pad = metrics.font_size * 0.5;
                    let shrink = Vec2::new(
                        pad.min(window_rect_rel.width()),
                        pad.min(window_rect_rel.height()),
                    );
                    window_rect_rel.min += shrink;
                    window_rect_rel.max = window_rect_rel.max - shrink;
                    window.nav_rect_rel[layer] =
                        window.nav_rect_rel[layer].clip_with(&window_rect_rel);
                    reg.nav_id = WidgetId::NONE;
                }
                self.move_from_clamped_ref_rect = false;
            }
        }

        // Scoring rectangle: the reference rect in screen space, collapsed
        // to a segment on its left edge so zero-spaced neighbors don't
        // overlap it.
        let mut scoring_rect = match reg.nav_window {
            Some(nav_win) => {
                let window = windows.get(nav_win);
                let rel = window.nav_rect_rel[reg.nav_layer.index()];
                let rel = if rel.is_inverted() { Rect::ZERO } else { rel };
                rel.translate(window.rect.min)
            }
            None => Rect::from_min_size(Vec2::ZERO, input.snapshot.display_size),
        };
        scoring_rect = scoring_rect.translate(Vec2::new(0.0, scoring_rect_offset_y));
        scoring_rect.min.x = (scoring_rect.min.x + 1.0).min(scoring_rect.max.x);
        scoring_rect.max.x = scoring_rect.min.x;
        debug_assert!(!scoring_rect.is_inverted());
        self.scoring_rect = scoring_rect;
    }

    fn handle_cancel(
        &mut self,
        reg: &mut InteractionRegistry,
        windows: &mut Windows,
        popups: &mut PopupStack,
    ) {
        if reg.active_id.is_some() {
            if reg.active_id_block_nav_inputs & (1 << NavInput::Cancel.index()) == 0 {
                reg.clear_active_id();
            }
            return;
        }
        if let Some(nav_win) = reg.nav_window {
            let flags = windows.get(nav_win).flags;
            if flags.contains(WindowFlags::CHILD_WINDOW)
                && !flags.contains(WindowFlags::POPUP)
                && let Some(parent) = windows.get(nav_win).parent
            {
                // Step out of a child window onto its item in the parent.
                let child_id = windows.get(nav_win).child_id;
                debug_assert!(child_id.is_some());
                self.focus_window(reg, windows, Some(parent));
                self.set_nav_id(reg, windows, child_id, NavLayer::Main);
                self.nav_id_is_alive = false;
                if reg.nav_disable_mouse_hover {
                    self.mouse_pos_dirty = true;
                }
                return;
            }
        }
        if !popups.is_empty() {
            let top_is_modal = popups
                .top()
                .is_some_and(|e| windows.get(e.window).flags.contains(WindowFlags::MODAL));
            if !top_is_modal {
                let level = popups.len() - 1;
                if let Some(mut focus) = popups.close_to_level(level) {
                    if reg.nav_layer == NavLayer::Main {
                        focus = windows.restore_last_child_nav(focus);
                    }
                    self.focus_window(reg, windows, Some(focus));
                }
            }
            return;
        }
        if reg.nav_layer != NavLayer::Main {
            self.restore_layer(reg, windows, NavLayer::Main);
            return;
        }
        // Clear focus. Popups forget their remembered item; regular child
        // windows keep it so focus can come back later.
        if let Some(nav_win) = reg.nav_window {
            let flags = windows.get(nav_win).flags;
            if flags.contains(WindowFlags::POPUP) || !flags.contains(WindowFlags::CHILD_WINDOW) {
                windows.get_mut(nav_win).nav_last_ids[NavLayer::Main.index()] = WidgetId::NONE;
            }
        }
        reg.nav_id = WidgetId::NONE;
    }

    /// Pick and apply the winning move result.
    fn apply_move_result(&mut self, reg: &mut InteractionRegistry, windows: &mut Windows) {
        let mut result = if self.result_local.has_result() {
            self.result_local
        } else {
            self.result_other
        };
        let mut result_is_other = !self.result_local.has_result();

        // Page moves first try the best already-visible item; only when
        // that is the current item do they fall through to the scrolled-in
        // result.
        if self.move_flags.contains(NavMoveFlags::ALSO_SCROLL_WINDOW)
            && self.result_local_visible.has_result()
            && self.result_local_visible.id != reg.nav_id
        {
            result = self.result_local_visible;
            result_is_other = false;
        }

        // Entering a flattened child from outside: resolve the local/other
        // tie with the regular scoring order.
        if !result_is_other
            && self.result_other.has_result()
            && let Some(other_win) = self.result_other.window
            && windows.get(other_win).parent == reg.nav_window
            && (self.result_other.dist_box < result.dist_box
                || (self.result_other.dist_box == result.dist_box
                    && self.result_other.dist_center < result.dist_center))
        {
            result = self.result_other;
        }

        debug_assert!(reg.nav_window.is_some());
        let Some(result_win) = result.window else {
            debug_assert!(false, "a recorded result always has a window");
            return;
        };

        // Scroll the winner into view and restate its rect in post-scroll
        // coordinates, so the pointer warp lands on the final position.
        if reg.nav_layer == NavLayer::Main {
            let window = windows.get_mut(result_win);
            let rect_abs = result.rect_rel.translate(window.rect.min);
            let delta = scroll_to_bring_rect_into_view(window, rect_abs);
            result.rect_rel = result.rect_rel.translate(delta);

            if windows.get(result_win).flags.contains(WindowFlags::CHILD_WINDOW)
                && let Some(parent) = windows.get(result_win).parent
            {
                let moved = rect_abs.translate(delta);
                scroll_to_bring_rect_into_view(windows.get_mut(parent), moved);
            }
        }

        reg.clear_active_id();
        reg.nav_window = Some(result_win);
        self.set_nav_id_with_rect(reg, windows, result.id, reg.nav_layer, result.rect_rel);
        reg.nav_just_moved_to_id = result.id;
        self.move_from_clamped_ref_rect = false;
    }

    /// Handle PageUp/PageDown. Returns the vertical offset to apply to the
    /// scoring rectangle.
    fn update_page_up_down(
        &mut self,
        reg: &mut InteractionRegistry,
        windows: &mut Windows,
        input: &InputState,
        metrics: &Metrics,
        allowed_dir_flags: u8,
    ) -> f32 {
        if self.move_dir.is_some() || reg.nav_layer != NavLayer::Main {
            return 0.0;
        }
        let Some(nav_win) = reg.nav_window else {
            return 0.0;
        };
        if windows.get(nav_win).flags.contains(WindowFlags::NO_NAV_INPUTS)
            || self.windowing.target.is_some()
        {
            return 0.0;
        }
        let page_up_held =
            input.key_down(Key::PageUp) && allowed_dir_flags & Dir::Up.bit() != 0;
        let page_down_held =
            input.key_down(Key::PageDown) && allowed_dir_flags & Dir::Down.bit() != 0;
        if page_up_held == page_down_held {
            return 0.0;
        }

        let window = windows.get_mut(nav_win);
        if window.nav_layer_active_mask == 0 && window.has_scroll() {
            // No navigable items: page keys scroll directly.
            let page = window.rect.height();
            if input.key_pressed(Key::PageUp, true) {
                window.scroll.y = (window.scroll.y - page).max(0.0);
            } else if input.key_pressed(Key::PageDown, true) {
                window.scroll.y = (window.scroll.y + page).min(window.scroll_max().y);
            }
            return 0.0;
        }

        let nav_rect_rel = window.nav_rect_rel[NavLayer::Main.index()];
        let page_offset_y =
            (window.rect.height() - metrics.font_size + nav_rect_rel.height()).max(0.0);
        // The scoring rect is pushed a page away and the move direction
        // reversed, so the search always lands on the farthest item of the
        // new page.
        if input.key_pressed(Key::PageUp, true) {
            self.move_dir = Some(Dir::Down);
            self.move_clip_dir = Dir::Up;
            self.move_flags =
                NavMoveFlags::ALLOW_CURRENT_NAV_ID | NavMoveFlags::ALSO_SCROLL_WINDOW;
            -page_offset_y
        } else if input.key_pressed(Key::PageDown, true) {
            self.move_dir = Some(Dir::Up);
            self.move_clip_dir = Dir::Down;
            self.move_flags =
                NavMoveFlags::ALLOW_CURRENT_NAV_ID | NavMoveFlags::ALSO_SCROLL_WINDOW;
            page_offset_y
        } else {
            0.0
        }
    }

    /// Synthetic pointer position for the focused item: just inside its
    /// bottom-left corner, clamped to the viewport.
    pub(crate) fn preferred_ref_pos(
        &self,
        reg: &InteractionRegistry,
        windows: &Windows,
        input: &InputState,
        metrics: &Metrics,
    ) -> Vec2 {
        let fallback = input.snapshot.mouse_pos.unwrap_or(Vec2::ZERO).floor();
        if reg.nav_disable_highlight || !reg.nav_disable_mouse_hover {
            return fallback;
        }
        let Some(nav_win) = reg.nav_window else {
            return fallback;
        };
        let window = windows.get(nav_win);
        let rect_rel = window.nav_rect_rel[reg.nav_layer.index()];
        let pos = window.rect.min
            + Vec2::new(
                rect_rel.min.x + (metrics.frame_padding.x * 4.0).min(rect_rel.width()),
                rect_rel.max.y - metrics.frame_padding.y.min(rect_rel.height()),
            );
        pos.clamp(Vec2::ZERO, input.snapshot.display_size).floor()
    }

    // --- Per-item processing ---

    /// Feed one submitted focusable item into the pending requests.
    ///
    /// `nav_bb` is the item's bounds in screen coordinates. Call only while
    /// a request is live or the item is the focused one; the caller gates
    /// on [`NavEngine::any_request`].
    pub(crate) fn process_item(
        &mut self,
        reg: &mut InteractionRegistry,
        windows: &mut Windows,
        window_id: WindowId,
        id: WidgetId,
        nav_bb: Rect,
        item_flags: ItemFlags,
    ) {
        let window = windows.get_mut(window_id);
        let pos = window.rect.min;
        let nav_bb_rel = nav_bb.translate(Vec2::new(-pos.x, -pos.y));
        let layer = window.nav_layer_current;

        // Init request: first eligible item wins; items opting out of
        // default focus are kept as a fallback only.
        if self.init_request && reg.nav_layer == layer {
            if !item_flags.contains(ItemFlags::NO_NAV_DEFAULT_FOCUS) || self.init_result_id.is_none()
            {
                self.init_result_id = id;
                self.init_result_rect_rel = nav_bb_rel;
            }
            if !item_flags.contains(ItemFlags::NO_NAV_DEFAULT_FOCUS) {
                self.init_request = false;
                self.update_any_request_flag();
            }
        }

        // Move request: score into the local/other slot.
        if (reg.nav_id != id || self.move_flags.contains(NavMoveFlags::ALLOW_CURRENT_NAV_ID))
            && !item_flags.intersects(ItemFlags::DISABLED | ItemFlags::NO_NAV)
            && self.move_request
            && let Some(move_dir) = self.move_dir
        {
            let crossing_flattened =
                window.parent.is_some() && window.parent == reg.nav_window;
            let cand = Candidate {
                id,
                window: window_id,
                bb: nav_bb,
                layer,
                clip_rect: window.clip_rect,
                window_pos: pos,
                crossing_flattened,
            };
            let params = ScoreParams {
                move_dir,
                clip_dir: self.move_clip_dir,
                scoring_rect: self.scoring_rect,
                nav_id: reg.nav_id,
                nav_layer: reg.nav_layer,
                nav_window_flags: self.move_src_window_flags,
            };
            self.candidates.push(cand);

            let slot = if Some(window_id) == reg.nav_window {
                &mut self.result_local
            } else {
                &mut self.result_other
            };
            if score_item(slot, &cand, &params) {
                slot.id = id;
                slot.window = Some(window_id);
                slot.rect_rel = nav_bb_rel;
            }

            // Page moves also track the best mostly-visible item.
            if self.move_flags.contains(NavMoveFlags::ALSO_SCROLL_WINDOW)
                && window.clip_rect.overlaps(&nav_bb)
            {
                let clip = window.clip_rect;
                let visible_h = nav_bb.max.y.clamp(clip.min.y, clip.max.y)
                    - nav_bb.min.y.clamp(clip.min.y, clip.max.y);
                if visible_h >= nav_bb.height() * VISIBLE_RATIO
                    && score_item(&mut self.result_local_visible, &cand, &params)
                {
                    self.result_local_visible.id = id;
                    self.result_local_visible.window = Some(window_id);
                    self.result_local_visible.rect_rel = nav_bb_rel;
                }
            }
        }

        // The focused item refreshes its window, layer, and reference rect
        // every frame it is submitted.
        if reg.nav_id == id {
            reg.nav_window = Some(window_id);
            reg.nav_layer = layer;
            self.nav_id_is_alive = true;
            reg.nav_id_tab_counter = window.focus_idx_tab_counter;
            window.nav_rect_rel[layer.index()] = nav_bb_rel;
        }
    }

    // --- Frame epilogue ---

    /// Resolve a pending wrap/loop request by re-scoring this frame's
    /// candidates against a reference rect relocated to the far edge.
    ///
    /// The re-scored result is applied by the next decision pass exactly
    /// like a regular move result, so a wrapped move costs no extra frame.
    pub(crate) fn end_frame(&mut self, reg: &mut InteractionRegistry, windows: &mut Windows) {
        let wrap_window = self.wrap_request_window.take();
        let wrap_flags = self.wrap_request_flags;
        self.wrap_request_flags = NavMoveFlags::empty();

        if !self.move_request_but_no_result_yet() {
            return;
        }
        let Some(move_dir) = self.move_dir else { return };
        let Some(wrap_win) = wrap_window else { return };
        if reg.nav_window != Some(wrap_win) || reg.nav_layer != NavLayer::Main {
            return;
        }

        let window = windows.get_mut(wrap_win);
        let mut bb_rel = window.nav_rect_rel[NavLayer::Main.index()];
        let mut clip_dir = move_dir;
        let span = Vec2::new(
            window.rect.width().max(window.content_size.x),
            window.rect.height().max(window.content_size.y),
        );
        match move_dir {
            Dir::Left if wrap_flags.intersects(NavMoveFlags::LOOP_X | NavMoveFlags::WRAP_X) => {
                let x = span.x - window.scroll.x;
                bb_rel.min.x = x;
                bb_rel.max.x = x;
                if wrap_flags.contains(NavMoveFlags::WRAP_X) {
                    bb_rel = bb_rel.translate(Vec2::new(0.0, -bb_rel.height()));
                    clip_dir = Dir::Up;
                }
            }
            Dir::Right if wrap_flags.intersects(NavMoveFlags::LOOP_X | NavMoveFlags::WRAP_X) => {
                let x = -window.scroll.x;
                bb_rel.min.x = x;
                bb_rel.max.x = x;
                if wrap_flags.contains(NavMoveFlags::WRAP_X) {
                    bb_rel = bb_rel.translate(Vec2::new(0.0, bb_rel.height()));
                    clip_dir = Dir::Down;
                }
            }
            Dir::Up if wrap_flags.intersects(NavMoveFlags::LOOP_Y | NavMoveFlags::WRAP_Y) => {
                let y = span.y - window.scroll.y;
                bb_rel.min.y = y;
                bb_rel.max.y = y;
                if wrap_flags.contains(NavMoveFlags::WRAP_Y) {
                    bb_rel = bb_rel.translate(Vec2::new(-bb_rel.width(), 0.0));
                    clip_dir = Dir::Left;
                }
            }
            Dir::Down if wrap_flags.intersects(NavMoveFlags::LOOP_Y | NavMoveFlags::WRAP_Y) => {
                let y = -window.scroll.y;
                bb_rel.min.y = y;
                bb_rel.max.y = y;
                if wrap_flags.contains(NavMoveFlags::WRAP_Y) {
                    bb_rel = bb_rel.translate(Vec2::new(bb_rel.width(), 0.0));
                    clip_dir = Dir::Right;
                }
            }
            _ => return,
        }

        window.nav_rect_rel[NavLayer::Main.index()] = bb_rel;
        self.move_clip_dir = clip_dir;
        self.move_flags = wrap_flags;

        // Rebuild the scoring rect at the relocated reference and replay
        // every candidate seen this frame.
        let mut scoring_rect = bb_rel.translate(window.rect.min);
        scoring_rect.min.x = (scoring_rect.min.x + 1.0).min(scoring_rect.max.x);
        scoring_rect.max.x = scoring_rect.min.x;
        self.scoring_rect = scoring_rect;

        let params = ScoreParams {
            move_dir,
            clip_dir,
            scoring_rect,
            nav_id: reg.nav_id,
            nav_layer: reg.nav_layer,
            nav_window_flags: self.move_src_window_flags,
        };
        let candidates = std::mem::take(&mut self.candidates);
        for cand in &candidates {
            let slot = if Some(cand.window) == reg.nav_window {
                &mut self.result_local
            } else {
                &mut self.result_other
            };
            if score_item(slot, cand, &params) {
                slot.id = cand.id;
                slot.window = Some(cand.window);
                slot.rect_rel = cand.rect_rel();
            }
        }
        self.candidates = candidates;
        trace_wrap_rescored(move_dir, self.result_local.id);
    }
}

/// Note on the nav root which of its children currently holds focus.
fn save_last_child_nav_window(windows: &mut Windows, nav_win: WindowId) {
    let mut parent = nav_win;
    loop {
        let w = windows.get(parent);
        let is_plain_child = w.flags.contains(WindowFlags::CHILD_WINDOW)
            && !w
                .flags
                .intersects(WindowFlags::POPUP | WindowFlags::CHILD_MENU);
        if !is_plain_child {
            break;
        }
        let Some(p) = w.parent else { break };
        parent = p;
    }
    if parent != nav_win {
        windows.get_mut(parent).nav_last_child_window = Some(nav_win);
    }
}

/// Adjust `window.scroll` so `item_rect` (screen space) is visible.
/// Returns `old_scroll - new_scroll`, the translation items will undergo.
fn scroll_to_bring_rect_into_view(window: &mut Window, item_rect: Rect) -> Vec2 {
    let view = window.rect.expand(1.0);
    if view.contains_rect(&item_rect) {
        return Vec2::ZERO;
    }
    let old = window.scroll;
    let mut target = old;
    if window.content_size.x > window.rect.width() {
        if item_rect.min.x < view.min.x {
            target.x += item_rect.min.x - view.min.x;
        } else if item_rect.max.x >= view.max.x {
            target.x += item_rect.max.x - view.max.x;
        }
    }
    if item_rect.min.y < view.min.y {
        target.y += item_rect.min.y - view.min.y;
    } else if item_rect.max.y >= view.max.y {
        target.y += item_rect.max.y - view.max.y;
    }
    window.scroll = target.clamp(Vec2::ZERO, window.scroll_max());
    old - window.scroll
}

#[cfg(feature = "tracing")]
fn trace_move_applied(id: WidgetId) {
    glint_core::trace!(target: "glint_nav::engine", %id, "move result applied");
}

#[cfg(not(feature = "tracing"))]
fn trace_move_applied(_id: WidgetId) {}

#[cfg(feature = "tracing")]
fn trace_wrap_rescored(dir: Dir, winner: WidgetId) {
    glint_core::trace!(target: "glint_nav::engine", ?dir, %winner, "wrap request re-scored");
}

#[cfg(not(feature = "tracing"))]
fn trace_wrap_rescored(_dir: Dir, _winner: WidgetId) {}
