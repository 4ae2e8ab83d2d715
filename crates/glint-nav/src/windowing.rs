#![forbid(unsafe_code)]

//! Windowing overlay: cycling window focus and toggling the menu layer.
//!
//! Two gestures share this code path:
//!
//! - **Gamepad**: pressing Menu arms the overlay. A quick tap toggles the
//!   menu layer; holding it shows the highlight after a short delay and
//!   FocusPrev/FocusNext cycle through focusable windows. Focus applies on
//!   release.
//! - **Keyboard**: Ctrl+Tab arms the overlay and cycles directly (Shift
//!   reverses); focus applies when Ctrl is released. Tapping and releasing
//!   Alt toggles the menu layer.
//!
//! While armed, held directional inputs drag the target window, unless it
//! opts out of moving.

use glint_core::geometry::Vec2;
use glint_core::id::WidgetId;
use glint_core::input::{InputState, Key, Modifiers, NavInput, NavReadMode};

use crate::context::NavConfig;
use crate::engine::NavEngine;
use crate::registry::InteractionRegistry;
use crate::window::{NavLayer, PopupStack, WindowFlags, WindowId, Windows};

/// Which device armed the overlay; decides which inputs drive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowingInputSource {
    #[default]
    Keyboard,
    Gamepad,
}

/// Overlay state, owned by the engine.
#[derive(Debug, Default)]
pub struct WindowingState {
    /// Root window currently highlighted for focus, `None` when idle.
    pub(crate) target: Option<WindowId>,
    /// Seconds since the overlay was armed.
    pub(crate) timer: f32,
    /// Highlight opacity, `0.0..=1.0`. Stays at zero for quick taps.
    pub(crate) highlight_alpha: f32,
    /// A release should toggle the menu layer instead of applying focus.
    pub(crate) toggle_layer: bool,
    pub(crate) input_source: WindowingInputSource,
}

impl WindowingState {
    /// Window the overlay would focus on release.
    #[inline]
    pub fn target(&self) -> Option<WindowId> {
        self.target
    }

    /// Current highlight opacity for the overlay renderer.
    #[inline]
    pub fn highlight_alpha(&self) -> f32 {
        self.highlight_alpha
    }
}

pub(crate) fn update(
    engine: &mut NavEngine,
    reg: &mut InteractionRegistry,
    windows: &mut Windows,
    popups: &mut PopupStack,
    input: &InputState,
    config: &NavConfig,
) {
    let mut apply_focus_window: Option<WindowId> = None;
    let mut apply_toggle_layer = false;

    // A modal owns all input; the overlay stands down.
    if popups.topmost_modal(windows).is_some() {
        engine.windowing.target = None;
        return;
    }

    // Fade the highlight out after the overlay closes.
    if engine.windowing.target.is_none() && engine.windowing.highlight_alpha > 0.0 {
        engine.windowing.highlight_alpha =
            (engine.windowing.highlight_alpha - input.dt * 10.0).max(0.0);
    }

    // Arm the overlay.
    let start_with_gamepad = engine.windowing.target.is_none()
        && input.nav_pressed(NavInput::Menu, NavReadMode::Pressed);
    let start_with_keyboard = engine.windowing.target.is_none()
        && input.snapshot.modifiers.contains(Modifiers::CTRL)
        && input.key_pressed(Key::Tab, false)
        && input.nav_keyboard_active;
    if start_with_gamepad || start_with_keyboard {
        let start_window = reg.nav_window.or_else(|| {
            let last = windows.focus_order.len() as i32 - 1;
            windows.find_nav_focusable(last, -1, -1, reg.nav_window)
        });
        if let Some(window) = start_window {
            engine.windowing.target = Some(windows.root_of(window));
            engine.windowing.timer = 0.0;
            engine.windowing.highlight_alpha = 0.0;
            engine.windowing.toggle_layer = start_with_gamepad;
            engine.windowing.input_source = if start_with_keyboard {
                WindowingInputSource::Keyboard
            } else {
                WindowingInputSource::Gamepad
            };
        }
    }
    if engine.windowing.target.is_some() {
        engine.windowing.timer += input.dt;
    }

    // Gamepad: cycle with the shoulder inputs, settle on release.
    if engine.windowing.target.is_some()
        && engine.windowing.input_source == WindowingInputSource::Gamepad
    {
        // The highlight holds off briefly so a tap-to-toggle adds no flicker.
        engine.windowing.highlight_alpha = engine.windowing.highlight_alpha.max(
            ((engine.windowing.timer - config.windowing_delay) / 0.05).clamp(0.0, 1.0),
        );

        let focus_change_dir = i32::from(
            input.nav_pressed(NavInput::FocusPrev, NavReadMode::RepeatSlow),
        ) - i32::from(input.nav_pressed(NavInput::FocusNext, NavReadMode::RepeatSlow));
        if focus_change_dir != 0 {
            cycle_highlight_window(engine, reg, windows, focus_change_dir);
            engine.windowing.highlight_alpha = 1.0;
        }

        if !input.nav_down(NavInput::Menu) {
            // Held long enough to show the highlight? Then it was never a
            // tap.
            engine.windowing.toggle_layer &= engine.windowing.highlight_alpha < 1.0;
            if engine.windowing.toggle_layer && reg.nav_window.is_some() {
                apply_toggle_layer = true;
            } else if !engine.windowing.toggle_layer {
                apply_focus_window = engine.windowing.target;
            }
            engine.windowing.target = None;
        }
    }

    // Keyboard: Tab cycles while Ctrl holds the overlay open.
    if engine.windowing.target.is_some()
        && engine.windowing.input_source == WindowingInputSource::Keyboard
    {
        engine.windowing.highlight_alpha = engine.windowing.highlight_alpha.max(
            ((engine.windowing.timer - config.windowing_delay) / 0.05).clamp(0.0, 1.0),
        );
        if input.key_pressed(Key::Tab, true) {
            let dir = if input.snapshot.modifiers.contains(Modifiers::SHIFT) {
                1
            } else {
                -1
            };
            cycle_highlight_window(engine, reg, windows, dir);
        }
        if !input.snapshot.modifiers.contains(Modifiers::CTRL) {
            apply_focus_window = engine.windowing.target;
        }
    }

    // Alt tap toggles the menu layer. The mouse-validity comparison filters
    // out hosts that drop all keys on a system Alt-Tab.
    if (reg.active_id.is_none() || reg.active_id_allow_overlap)
        && input.nav_pressed(NavInput::KeyMenu, NavReadMode::Released)
        && input.snapshot.mouse_pos.is_some() == input.mouse_pos_prev.is_some()
    {
        apply_toggle_layer = true;
    }

    // Drag the target window with held directional inputs.
    if let Some(target) = engine.windowing.target
        && !windows.get(target).flags.contains(WindowFlags::NO_MOVE)
    {
        let held = |input_id: NavInput| input.nav_down(input_id);
        let move_delta = match engine.windowing.input_source {
            WindowingInputSource::Keyboard
                if !input.snapshot.modifiers.contains(Modifiers::SHIFT) =>
            {
                Vec2::new(
                    f32::from(held(NavInput::KeyRight)) - f32::from(held(NavInput::KeyLeft)),
                    f32::from(held(NavInput::KeyDown)) - f32::from(held(NavInput::KeyUp)),
                )
            }
            WindowingInputSource::Gamepad => Vec2::new(
                f32::from(held(NavInput::DpadRight)) - f32::from(held(NavInput::DpadLeft)),
                f32::from(held(NavInput::DpadDown)) - f32::from(held(NavInput::DpadUp)),
            ),
            _ => Vec2::ZERO,
        };
        if move_delta.x != 0.0 || move_delta.y != 0.0 {
            let speed = (config.windowing_move_speed * input.dt).floor();
            let root = windows.root_of(target);
            let window = windows.get_mut(root);
            window.rect = window.rect.translate(move_delta * speed);
            reg.nav_disable_mouse_hover = true;
            engine.settings_dirty = true;
        }
    }

    // Apply the chosen focus.
    if let Some(apply) = apply_focus_window {
        let already_focused = reg
            .nav_window
            .is_some_and(|nw| windows.root_of(nw) == apply);
        if !already_focused {
            reg.nav_disable_highlight = false;
            reg.nav_disable_mouse_hover = true;
            let apply = windows.restore_last_child_nav(apply);
            popups.close_over_window(windows, apply);
            engine.focus_window(reg, windows, Some(apply));
            if windows.get(apply).nav_last_ids[NavLayer::Main.index()] == WidgetId::NONE {
                engine.init_window(reg, windows, apply, false);
            }
            // A window with only a menu layer focuses it directly.
            if windows.get(apply).nav_layer_active_mask == NavLayer::Menu.bit() {
                reg.nav_layer = NavLayer::Menu;
            }
            // The remembered rect may be stale after a scroll elsewhere.
            engine.move_from_clamped_ref_rect = true;
        }
        engine.windowing.target = None;
    }

    // Apply the layer toggle.
    if apply_toggle_layer && let Some(nav_win) = reg.nav_window {
        // Plain child windows have no menu bar of their own; climb to the
        // nearest ancestor that might.
        let mut new_nav_window = nav_win;
        loop {
            let w = windows.get(new_nav_window);
            if w.nav_layer_active_mask & NavLayer::Menu.bit() != 0
                || !w.flags.contains(WindowFlags::CHILD_WINDOW)
                || w.flags
                    .intersects(WindowFlags::POPUP | WindowFlags::CHILD_MENU)
            {
                break;
            }
            let Some(parent) = w.parent else { break };
            new_nav_window = parent;
        }
        if new_nav_window != nav_win {
            engine.focus_window(reg, windows, Some(new_nav_window));
            windows.get_mut(new_nav_window).nav_last_child_window = Some(nav_win);
        }
        reg.nav_disable_highlight = false;
        reg.nav_disable_mouse_hover = true;
        if let Some(current) = reg.nav_window {
            let layer = if windows.get(current).nav_layer_active_mask & NavLayer::Menu.bit() != 0
            {
                reg.nav_layer.flipped()
            } else {
                NavLayer::Main
            };
            engine.restore_layer(reg, windows, layer);
        }
    }
}

/// Step the highlighted window through the focus order, wrapping around.
fn cycle_highlight_window(
    engine: &mut NavEngine,
    reg: &InteractionRegistry,
    windows: &Windows,
    dir: i32,
) {
    let Some(target) = engine.windowing.target else {
        return;
    };
    if windows.get(target).flags.contains(WindowFlags::MODAL) {
        return;
    }
    let Some(current) = windows.focus_index(target) else {
        return;
    };
    let len = windows.focus_order.len() as i32;
    let unbounded_stop = if dir < 0 { -1 } else { len };
    let next = windows
        .find_nav_focusable(current + dir, unbounded_stop, dir, reg.nav_window)
        .or_else(|| {
            let restart = if dir < 0 { len - 1 } else { 0 };
            windows.find_nav_focusable(restart, current, dir, reg.nav_window)
        });
    if let Some(next) = next {
        engine.windowing.target = Some(next);
    }
    engine.windowing.toggle_layer = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_core::geometry::Rect;
    use glint_core::input::InputSnapshot;

    struct Fixture {
        engine: NavEngine,
        reg: InteractionRegistry,
        windows: Windows,
        popups: PopupStack,
        input: InputState,
        config: NavConfig,
    }

    impl Fixture {
        fn new(window_count: usize) -> Self {
            let mut windows = Windows::default();
            for key in 0..window_count as u64 {
                let (id, _) = windows.ensure(key);
                let w = windows.get_mut(id);
                w.rect = Rect::from_ltrb(0.0, 0.0, 200.0, 200.0);
                w.clip_rect = w.rect;
                w.active = true;
            }
            Self {
                engine: NavEngine::default(),
                reg: InteractionRegistry::default(),
                windows,
                popups: PopupStack::default(),
                input: InputState::default(),
                config: NavConfig::default(),
            }
        }

        fn frame(&mut self, snapshot: InputSnapshot) {
            self.input.begin_frame(snapshot, 0.016);
            update(
                &mut self.engine,
                &mut self.reg,
                &mut self.windows,
                &mut self.popups,
                &self.input,
                &self.config,
            );
        }
    }

    // --- Gamepad ---

    #[test]
    fn menu_tap_toggles_menu_layer() {
        let mut f = Fixture::new(1);
        let win = f.windows.focus_order[0];
        f.windows.get_mut(win).nav_layer_active_mask =
            NavLayer::Main.bit() | NavLayer::Menu.bit();
        f.engine
            .focus_window(&mut f.reg, &mut f.windows, Some(win));

        f.frame(InputSnapshot::default().with_nav_input(NavInput::Menu));
        assert!(f.engine.windowing.target.is_some());
        assert!(f.engine.windowing.toggle_layer);

        f.frame(InputSnapshot::default());
        assert!(f.engine.windowing.target.is_none());
        assert_eq!(f.reg.nav_layer(), NavLayer::Menu);
    }

    #[test]
    fn menu_hold_and_cycle_applies_focus() {
        let mut f = Fixture::new(2);
        let back = f.windows.focus_order[0];
        let front = f.windows.focus_order[1];
        f.engine
            .focus_window(&mut f.reg, &mut f.windows, Some(front));
        // focus_window reorders; re-read.
        assert_eq!(*f.windows.focus_order.last().unwrap(), front);

        f.frame(InputSnapshot::default().with_nav_input(NavInput::Menu));
        f.frame(
            InputSnapshot::default()
                .with_nav_input(NavInput::Menu)
                .with_nav_input(NavInput::FocusPrev),
        );
        assert_eq!(f.engine.windowing.target, Some(back));
        assert_eq!(f.engine.windowing.highlight_alpha, 1.0);
        assert!(!f.engine.windowing.toggle_layer);

        f.frame(InputSnapshot::default());
        assert_eq!(f.reg.nav_window(), Some(back));
        assert!(f.engine.windowing.target.is_none());
    }

    // --- Keyboard ---

    #[test]
    fn ctrl_tab_cycles_and_applies_on_ctrl_release() {
        let mut f = Fixture::new(2);
        let back = f.windows.focus_order[0];
        let front = f.windows.focus_order[1];
        f.engine
            .focus_window(&mut f.reg, &mut f.windows, Some(front));

        f.frame(
            InputSnapshot::default()
                .with_key(Key::Tab)
                .with_modifiers(Modifiers::CTRL),
        );
        // Armed on the previously focused root, then stepped backward.
        assert_eq!(f.engine.windowing.target, Some(back));

        f.frame(InputSnapshot::default().with_modifiers(Modifiers::CTRL));
        assert_eq!(f.engine.windowing.target, Some(back));

        f.frame(InputSnapshot::default());
        assert_eq!(f.reg.nav_window(), Some(back));
    }

    #[test]
    fn alt_tap_toggles_layer() {
        let mut f = Fixture::new(1);
        let win = f.windows.focus_order[0];
        f.windows.get_mut(win).nav_layer_active_mask =
            NavLayer::Main.bit() | NavLayer::Menu.bit();
        f.engine
            .focus_window(&mut f.reg, &mut f.windows, Some(win));

        f.frame(InputSnapshot::default().with_modifiers(Modifiers::ALT));
        assert_eq!(f.reg.nav_layer(), NavLayer::Main);
        f.frame(InputSnapshot::default());
        assert_eq!(f.reg.nav_layer(), NavLayer::Menu);
        // A second tap returns to the main layer.
        f.frame(InputSnapshot::default().with_modifiers(Modifiers::ALT));
        f.frame(InputSnapshot::default());
        assert_eq!(f.reg.nav_layer(), NavLayer::Main);
    }

    // --- Modal / movement ---

    #[test]
    fn modal_cancels_overlay() {
        let mut f = Fixture::new(2);
        let front = f.windows.focus_order[1];
        f.engine
            .focus_window(&mut f.reg, &mut f.windows, Some(front));
        f.frame(InputSnapshot::default().with_nav_input(NavInput::Menu));
        assert!(f.engine.windowing.target.is_some());

        let modal = f.windows.focus_order[0];
        f.windows.get_mut(modal).flags = WindowFlags::POPUP | WindowFlags::MODAL;
        f.popups.push(modal, Some(front));
        f.frame(InputSnapshot::default().with_nav_input(NavInput::Menu));
        assert!(f.engine.windowing.target.is_none());
    }

    #[test]
    fn held_direction_moves_target_window() {
        let mut f = Fixture::new(1);
        let win = f.windows.focus_order[0];
        f.engine
            .focus_window(&mut f.reg, &mut f.windows, Some(win));
        let before = f.windows.get(win).rect;

        f.frame(InputSnapshot::default().with_nav_input(NavInput::Menu));
        f.frame(
            InputSnapshot::default()
                .with_nav_input(NavInput::Menu)
                .with_nav_input(NavInput::DpadRight),
        );
        let after = f.windows.get(win).rect;
        assert!(after.min.x > before.min.x);
        assert!(f.engine.settings_dirty);
    }

    #[test]
    fn no_move_flag_pins_window() {
        let mut f = Fixture::new(1);
        let win = f.windows.focus_order[0];
        f.windows.get_mut(win).flags = WindowFlags::NO_MOVE;
        f.engine
            .focus_window(&mut f.reg, &mut f.windows, Some(win));
        let before = f.windows.get(win).rect;

        f.frame(InputSnapshot::default().with_nav_input(NavInput::Menu));
        f.frame(
            InputSnapshot::default()
                .with_nav_input(NavInput::Menu)
                .with_nav_input(NavInput::DpadRight),
        );
        assert_eq!(f.windows.get(win).rect, before);
    }
}
