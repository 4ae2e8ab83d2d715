#![forbid(unsafe_code)]

//! Button press protocol.
//!
//! [`UiContext::button_behavior`] is the single interaction routine behind
//! every clickable widget. It folds pointer and navigation activation into
//! one `(pressed, hovered, held)` answer per frame, so widgets never read
//! raw input themselves.

use bitflags::bitflags;
use glint_core::geometry::Rect;
use glint_core::id::WidgetId;
use glint_core::input::{Modifiers, MouseButton, NavInput, NavReadMode};

use crate::context::{ItemFlags, UiContext};
use crate::registry::InputSource;

bitflags! {
    /// Trigger and interaction variants for [`UiContext::button_behavior`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ButtonFlags: u16 {
        /// Keep firing while held, on the key-repeat cadence.
        const REPEAT                  = 1 << 0;
        /// Fire on the initial press.
        const PRESSED_ON_CLICK        = 1 << 1;
        /// Fire on release, wherever the press started.
        const PRESSED_ON_RELEASE      = 1 << 2;
        /// Fire on release, but only when the press started on the item.
        /// The default when no trigger flag is given.
        const PRESSED_ON_CLICK_RELEASE = 1 << 3;
        /// Fire on double-click.
        const PRESSED_ON_DOUBLE_CLICK = 1 << 4;
        /// Treat pointer hover in child windows as hover on this item.
        const FLATTEN_CHILDREN        = 1 << 5;
        /// Hover only counts when this item already held hover last frame
        /// (or nothing did), letting a later item overlap this one.
        const ALLOW_OVERLAP           = 1 << 6;
        /// Ignore pointer input while Ctrl, Shift or Alt is held.
        const NO_KEY_MODIFIERS        = 1 << 7;
        /// Fire on press without taking capture.
        const NO_HOLDING_ACTIVE_ID    = 1 << 8;
        /// Interact without moving keyboard/gamepad focus here.
        const NO_NAV_FOCUS            = 1 << 9;
        /// Hit-test a circle inscribed in the bounds instead of the rect.
        const CIRCLE                  = 1 << 10;
        /// Release only fires after the press was held past the configured
        /// long-press duration.
        const LONG_PRESS              = 1 << 11;
    }
}

impl ButtonFlags {
    const PRESSED_MASK: ButtonFlags = ButtonFlags::PRESSED_ON_CLICK
        .union(ButtonFlags::PRESSED_ON_RELEASE)
        .union(ButtonFlags::PRESSED_ON_CLICK_RELEASE)
        .union(ButtonFlags::PRESSED_ON_DOUBLE_CLICK);
}

/// What [`UiContext::button_behavior`] observed this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonResponse {
    /// The trigger condition fired this frame.
    pub pressed: bool,
    /// The pointer is over the item, or navigation focus highlights it.
    pub hovered: bool,
    /// The item holds pointer capture and the button is still down.
    pub held: bool,
}

impl UiContext {
    /// Run the press protocol for one item.
    ///
    /// Call after [`UiContext::item_add`] for the same `id` and bounds.
    ///
    /// # State machine
    ///
    /// A pointer press takes capture (unless `NO_HOLDING_ACTIVE_ID`) and
    /// holds it until the button goes up; the trigger flags decide which
    /// edge reports `pressed`. A navigation activation takes capture with a
    /// nav source and holds it while the confirm input is down. Capture is
    /// released here, never by the engine.
    pub fn button_behavior(
        &mut self,
        bb: Rect,
        id: WidgetId,
        flags: ButtonFlags,
    ) -> ButtonResponse {
        let Some(win_id) = self.current_window else {
            debug_assert!(false, "button_behavior outside a window");
            return ButtonResponse::default();
        };

        if self.item_flags.contains(ItemFlags::DISABLED) {
            if self.registry.active_id == id {
                self.registry.clear_active_id();
            }
            return ButtonResponse::default();
        }

        let mut flags = flags;
        if !flags.intersects(ButtonFlags::PRESSED_MASK) {
            flags |= ButtonFlags::PRESSED_ON_CLICK_RELEASE;
        }

        // With flattened children, hover anywhere in this window's tree
        // counts as hover here for the duration of the test.
        let backup_hovered_window = self.hovered_window;
        let flatten_hovered = flags.contains(ButtonFlags::FLATTEN_CHILDREN)
            && self
                .hovered_window
                .is_some_and(|h| self.windows.root_of(h) == self.windows.root_of(win_id));
        if flatten_hovered {
            self.hovered_window = Some(win_id);
        }
        let mut hovered = self.item_hoverable(bb, id);
        if flatten_hovered {
            self.hovered_window = backup_hovered_window;
        }

        if hovered
            && flags.contains(ButtonFlags::CIRCLE)
            && let Some(pos) = self.input.snapshot.mouse_pos
        {
            let center = bb.center();
            let radius = 0.5 * bb.width().min(bb.height());
            let d = pos - center;
            if d.x * d.x + d.y * d.y > radius * radius {
                hovered = false;
            }
        }

        // Overlap mode: usable only when this item already held hover, so
        // an item submitted later can claim the shared area.
        if hovered
            && flags.contains(ButtonFlags::ALLOW_OVERLAP)
            && self.registry.hovered_id_previous_frame != id
            && self.registry.hovered_id_previous_frame.is_some()
        {
            hovered = false;
        }

        let mut pressed = false;

        // --- Pointer ---
        let modifiers_ok = !flags.contains(ButtonFlags::NO_KEY_MODIFIERS)
            || !self
                .input
                .snapshot
                .modifiers
                .intersects(Modifiers::CTRL | Modifiers::SHIFT | Modifiers::ALT);
        if hovered && modifiers_ok {
            let clicked = self.input.mouse_clicked(MouseButton::Left, false);
            if flags.contains(ButtonFlags::PRESSED_ON_CLICK_RELEASE) && clicked {
                self.registry.set_active_id(id, Some(win_id));
                if !flags.contains(ButtonFlags::NO_NAV_FOCUS) {
                    self.registry.set_focus_id(id, win_id, &mut self.windows);
                }
                self.engine
                    .focus_window(&mut self.registry, &mut self.windows, Some(win_id));
            }
            if (flags.contains(ButtonFlags::PRESSED_ON_CLICK) && clicked)
                || (flags.contains(ButtonFlags::PRESSED_ON_DOUBLE_CLICK)
                    && self.input.mouse_double_clicked(MouseButton::Left))
            {
                pressed = true;
                if flags.contains(ButtonFlags::NO_HOLDING_ACTIVE_ID) {
                    self.registry.clear_active_id();
                } else {
                    self.registry.set_active_id(id, Some(win_id));
                }
                self.engine
                    .focus_window(&mut self.registry, &mut self.windows, Some(win_id));
            }
            if flags.contains(ButtonFlags::PRESSED_ON_RELEASE)
                && self.input.mouse_released(MouseButton::Left)
            {
                // Repeat mode has already fired during the hold.
                if !(flags.contains(ButtonFlags::REPEAT)
                    && self.input.mouse_down_duration_prev(MouseButton::Left)
                        >= self.input.key_repeat_delay)
                {
                    pressed = true;
                }
                self.registry.clear_active_id();
            }

            // Repeat acts while held regardless of the trigger flags.
            if flags.contains(ButtonFlags::REPEAT)
                && self.registry.active_id == id
                && self.input.mouse_down_duration(MouseButton::Left) > 0.0
                && self.input.mouse_clicked(MouseButton::Left, true)
            {
                pressed = true;
            }

            if pressed {
                self.registry.nav_disable_highlight = true;
            }
        }

        // Navigation focus reports as hovered without touching HoveredId,
        // so it never fights the pointer.
        if self.registry.nav_id == id
            && !self.registry.nav_disable_highlight
            && self.registry.nav_disable_mouse_hover
            && (self.registry.active_id.is_none() || self.registry.active_id == id)
        {
            hovered = true;
        }

        // --- Navigation activation ---
        if self.registry.nav_activate_down_id == id {
            let by_code = self.registry.nav_activate_id == id;
            let read_mode = if flags.contains(ButtonFlags::REPEAT) {
                NavReadMode::Repeat
            } else {
                NavReadMode::Pressed
            };
            let by_inputs = self.input.nav_pressed(NavInput::Activate, read_mode);
            if by_code || by_inputs {
                pressed = true;
            }
            if by_code || by_inputs || self.registry.active_id == id {
                // Route through the activate hint so capture records a nav
                // source, the equivalent of holding the mouse button.
                self.registry.nav_activate_id = id;
                self.registry.set_active_id(id, Some(win_id));
                if (by_code || by_inputs) && !flags.contains(ButtonFlags::NO_NAV_FOCUS) {
                    self.registry.set_focus_id(id, win_id, &mut self.windows);
                }
                self.registry.set_active_id_allow_nav_dirs(0b1111);
            }
        }

        // --- Capture bookkeeping ---
        let mut held = false;
        if self.registry.active_id == id {
            match self.registry.active_id_source {
                InputSource::Pointer => {
                    if self.registry.active_id_is_just_activated
                        && let Some(pos) = self.input.snapshot.mouse_pos
                    {
                        self.registry.active_id_click_offset = pos - bb.min;
                    }
                    if self.input.mouse_down(MouseButton::Left) {
                        held = true;
                    } else {
                        if hovered && flags.contains(ButtonFlags::PRESSED_ON_CLICK_RELEASE) {
                            let repeat_already_fired = flags.contains(ButtonFlags::REPEAT)
                                && self.input.mouse_down_duration_prev(MouseButton::Left)
                                    >= self.input.key_repeat_delay;
                            let long_press_pending = flags.contains(ButtonFlags::LONG_PRESS)
                                && self.input.mouse_down_duration_prev(MouseButton::Left)
                                    < self.config.long_press_duration;
                            if !repeat_already_fired && !long_press_pending {
                                pressed = true;
                            }
                        }
                        self.registry.clear_active_id();
                    }
                    if !flags.contains(ButtonFlags::NO_NAV_FOCUS) {
                        self.registry.nav_disable_highlight = true;
                    }
                }
                InputSource::Nav => {
                    if self.registry.nav_activate_down_id != id {
                        self.registry.clear_active_id();
                    }
                }
            }
        }

        if pressed && self.registry.active_id == id {
            self.registry.active_id_has_been_pressed = true;
        }

        ButtonResponse {
            pressed,
            hovered,
            held,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::WindowFlags;
    use glint_core::geometry::{Rect, Vec2};
    use glint_core::input::{InputSnapshot, Key};

    const WIN: Rect = Rect::from_ltrb(0.0, 0.0, 300.0, 300.0);
    const BB: Rect = Rect::from_ltrb(10.0, 10.0, 110.0, 40.0);
    const ID: WidgetId = WidgetId(7);

    fn over() -> Vec2 {
        Vec2::new(50.0, 25.0)
    }

    fn frame(ctx: &mut UiContext, snapshot: InputSnapshot, flags: ButtonFlags) -> ButtonResponse {
        frame_dt(ctx, snapshot, flags, 0.016)
    }

    fn frame_dt(
        ctx: &mut UiContext,
        snapshot: InputSnapshot,
        flags: ButtonFlags,
        dt: f32,
    ) -> ButtonResponse {
        ctx.begin_frame(snapshot, dt);
        ctx.begin_window(1, WIN, WindowFlags::empty());
        ctx.item_add(ID, BB);
        let response = ctx.button_behavior(BB, ID, flags);
        ctx.end_window();
        ctx.end_frame();
        response
    }

    /// Window must have been submitted once before hover can land on it.
    fn warmed_up() -> UiContext {
        let mut ctx = UiContext::new();
        frame(
            &mut ctx,
            InputSnapshot::default().with_mouse_pos(over()),
            ButtonFlags::empty(),
        );
        ctx
    }

    // --- Pointer triggers ---

    #[test]
    fn click_release_fires_on_release_over_item() {
        let mut ctx = warmed_up();
        let hover = InputSnapshot::default().with_mouse_pos(over());

        let r = frame(
            &mut ctx,
            hover
                .clone()
                .with_mouse_down(MouseButton::Left)
                .with_mouse_clicked(MouseButton::Left),
            ButtonFlags::empty(),
        );
        assert!(!r.pressed);
        assert!(r.held);
        assert_eq!(ctx.registry().active_id(), ID);
        assert_eq!(ctx.registry().active_id_click_offset(), Vec2::new(40.0, 15.0));

        let r = frame(
            &mut ctx,
            hover.with_mouse_released(MouseButton::Left),
            ButtonFlags::empty(),
        );
        assert!(r.pressed);
        assert!(!r.held);
        assert!(ctx.registry().active_id().is_none());
    }

    #[test]
    fn release_off_item_does_not_fire() {
        let mut ctx = warmed_up();
        frame(
            &mut ctx,
            InputSnapshot::default()
                .with_mouse_pos(over())
                .with_mouse_down(MouseButton::Left)
                .with_mouse_clicked(MouseButton::Left),
            ButtonFlags::empty(),
        );
        let off = Vec2::new(200.0, 200.0);
        let r = frame(
            &mut ctx,
            InputSnapshot::default()
                .with_mouse_pos(off)
                .with_mouse_released(MouseButton::Left),
            ButtonFlags::empty(),
        );
        assert!(!r.pressed);
        assert!(ctx.registry().active_id().is_none());
    }

    #[test]
    fn pressed_on_click_fires_immediately() {
        let mut ctx = warmed_up();
        let r = frame(
            &mut ctx,
            InputSnapshot::default()
                .with_mouse_pos(over())
                .with_mouse_down(MouseButton::Left)
                .with_mouse_clicked(MouseButton::Left),
            ButtonFlags::PRESSED_ON_CLICK,
        );
        assert!(r.pressed);
        assert_eq!(ctx.registry().active_id(), ID);
    }

    #[test]
    fn repeat_fires_while_held_and_suppresses_release() {
        let mut ctx = warmed_up();
        let held = InputSnapshot::default()
            .with_mouse_pos(over())
            .with_mouse_down(MouseButton::Left);

        let r = frame_dt(
            &mut ctx,
            held.clone().with_mouse_clicked(MouseButton::Left),
            ButtonFlags::REPEAT,
            0.1,
        );
        assert!(!r.pressed);

        // Repeat delay is 0.25s; the pulse lands once the hold crosses it.
        let mut fired = false;
        for _ in 0..3 {
            fired |= frame_dt(&mut ctx, held.clone(), ButtonFlags::REPEAT, 0.1).pressed;
        }
        assert!(fired);

        let r = frame_dt(
            &mut ctx,
            InputSnapshot::default()
                .with_mouse_pos(over())
                .with_mouse_released(MouseButton::Left),
            ButtonFlags::REPEAT,
            0.1,
        );
        assert!(!r.pressed, "repeat mode trumps the release fire");
    }

    // --- Long press ---

    #[test]
    fn long_press_blocks_short_release() {
        let mut ctx = warmed_up();
        let held = InputSnapshot::default()
            .with_mouse_pos(over())
            .with_mouse_down(MouseButton::Left);
        frame_dt(
            &mut ctx,
            held.clone().with_mouse_clicked(MouseButton::Left),
            ButtonFlags::LONG_PRESS,
            0.1,
        );
        frame_dt(&mut ctx, held, ButtonFlags::LONG_PRESS, 0.1);
        let r = frame_dt(
            &mut ctx,
            InputSnapshot::default()
                .with_mouse_pos(over())
                .with_mouse_released(MouseButton::Left),
            ButtonFlags::LONG_PRESS,
            0.1,
        );
        assert!(!r.pressed);
        assert!(ctx.registry().active_id().is_none());
    }

    #[test]
    fn long_press_fires_after_threshold() {
        let mut ctx = warmed_up();
        let held = InputSnapshot::default()
            .with_mouse_pos(over())
            .with_mouse_down(MouseButton::Left);
        frame_dt(
            &mut ctx,
            held.clone().with_mouse_clicked(MouseButton::Left),
            ButtonFlags::LONG_PRESS,
            0.1,
        );
        for _ in 0..4 {
            frame_dt(&mut ctx, held.clone(), ButtonFlags::LONG_PRESS, 0.1);
        }
        let r = frame_dt(
            &mut ctx,
            InputSnapshot::default()
                .with_mouse_pos(over())
                .with_mouse_released(MouseButton::Left),
            ButtonFlags::LONG_PRESS,
            0.1,
        );
        assert!(r.pressed);
    }

    // --- Navigation ---

    #[test]
    fn nav_activate_presses_and_holds_with_nav_source() {
        let mut ctx = UiContext::new();
        ctx.input_mut().nav_keyboard_active = true;
        // Two frames so the default-init result lands on the item.
        frame(&mut ctx, InputSnapshot::default(), ButtonFlags::empty());
        frame(&mut ctx, InputSnapshot::default(), ButtonFlags::empty());
        assert_eq!(ctx.nav_id(), ID);

        let r = frame(
            &mut ctx,
            InputSnapshot::default().with_key(Key::Space),
            ButtonFlags::empty(),
        );
        assert!(r.pressed);
        assert_eq!(ctx.registry().active_id(), ID);
        assert_eq!(ctx.registry().active_id_source(), InputSource::Nav);

        let r = frame(&mut ctx, InputSnapshot::default(), ButtonFlags::empty());
        assert!(!r.pressed);
        assert!(ctx.registry().active_id().is_none());
    }

    #[test]
    fn request_activate_presses_programmatically() {
        let mut ctx = UiContext::new();
        frame(&mut ctx, InputSnapshot::default(), ButtonFlags::empty());
        frame(&mut ctx, InputSnapshot::default(), ButtonFlags::empty());
        assert_eq!(ctx.nav_id(), ID);

        ctx.request_activate(ID);
        let r = frame(&mut ctx, InputSnapshot::default(), ButtonFlags::empty());
        assert!(r.pressed);
    }

    // --- Hit testing variants ---

    #[test]
    fn circle_flag_rejects_corners() {
        let square = Rect::from_ltrb(10.0, 10.0, 110.0, 110.0);
        let mut ctx = UiContext::new();
        let run = |ctx: &mut UiContext, pos: Vec2| {
            ctx.begin_frame(InputSnapshot::default().with_mouse_pos(pos), 0.016);
            ctx.begin_window(1, WIN, WindowFlags::empty());
            ctx.item_add(ID, square);
            let r = ctx.button_behavior(square, ID, ButtonFlags::CIRCLE);
            ctx.end_window();
            ctx.end_frame();
            r
        };
        run(&mut ctx, Vec2::new(15.0, 15.0));
        let corner = run(&mut ctx, Vec2::new(15.0, 15.0));
        assert!(!corner.hovered);
        let center = run(&mut ctx, Vec2::new(60.0, 60.0));
        assert!(center.hovered);
    }

    #[test]
    fn disabled_item_reports_nothing_and_drops_capture() {
        let mut ctx = warmed_up();
        frame(
            &mut ctx,
            InputSnapshot::default()
                .with_mouse_pos(over())
                .with_mouse_down(MouseButton::Left)
                .with_mouse_clicked(MouseButton::Left),
            ButtonFlags::empty(),
        );
        assert_eq!(ctx.registry().active_id(), ID);

        ctx.begin_frame(
            InputSnapshot::default()
                .with_mouse_pos(over())
                .with_mouse_down(MouseButton::Left),
            0.016,
        );
        ctx.begin_window(1, WIN, WindowFlags::empty());
        ctx.push_item_flag(ItemFlags::DISABLED, true);
        ctx.item_add(ID, BB);
        let r = ctx.button_behavior(BB, ID, ButtonFlags::empty());
        ctx.pop_item_flag();
        ctx.end_window();
        ctx.end_frame();
        assert_eq!(r, ButtonResponse::default());
        assert!(ctx.registry().active_id().is_none());
    }

    #[test]
    fn modifier_held_blocks_when_flagged() {
        let mut ctx = warmed_up();
        let r = frame(
            &mut ctx,
            InputSnapshot::default()
                .with_mouse_pos(over())
                .with_mouse_down(MouseButton::Left)
                .with_mouse_clicked(MouseButton::Left)
                .with_modifiers(Modifiers::CTRL),
            ButtonFlags::PRESSED_ON_CLICK | ButtonFlags::NO_KEY_MODIFIERS,
        );
        assert!(!r.pressed);
        assert!(ctx.registry().active_id().is_none());
    }
}
