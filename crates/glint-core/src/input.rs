#![forbid(unsafe_code)]

//! Per-frame input snapshot and cross-frame input state.
//!
//! The host samples input once per frame into an immutable [`InputSnapshot`].
//! [`InputState`] consumes one snapshot per frame and derives everything the
//! navigation runtime needs: key/button down durations, key-repeat pulses,
//! and the abstract navigation-input vector ([`NavInput`]) normalized from
//! both the keyboard (via a configurable binding table) and a host-supplied
//! gamepad array.
//!
//! # Invariants
//!
//! 1. A snapshot is never mutated after `begin_frame` consumes it.
//! 2. All durations advance by the host-supplied `dt`; this module owns no
//!    clock.
//! 3. A duration of `-1.0` means "not down"; `0.0` means "pressed this
//!    frame". Duration queries rely on this encoding.

use ahash::AHashMap;
use bitflags::bitflags;

use crate::geometry::Vec2;

bitflags! {
    /// Modifier keys held during a frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// Key codes the core cares about.
///
/// This is deliberately small: the navigation core only reads keys that the
/// binding table or the engine itself consults. Everything else stays with
/// the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A regular character key.
    Char(char),
    Tab,
    Left,
    Right,
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    Enter,
    Escape,
    Space,
    Backspace,
    Delete,
    /// Function key (F1-F24).
    F(u8),
}

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Extra1,
    Extra2,
}

impl MouseButton {
    /// Number of tracked buttons.
    pub const COUNT: usize = 5;

    /// Index into the per-button arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Abstract navigation input, normalized from keyboard and gamepad.
///
/// The `Dpad*` entries come from the gamepad; the `Key*` entries mirror the
/// keyboard arrows so the engine can listen to either. The remaining entries
/// are shared actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NavInput {
    /// Confirm / press the focused item (gamepad A, keyboard Space).
    Activate,
    /// Cancel / back out (gamepad B, keyboard Escape).
    Cancel,
    /// Text-input the focused item (gamepad Y, keyboard Enter).
    Input,
    /// Windowing trigger / layer toggle (gamepad X/menu).
    Menu,
    DpadLeft,
    DpadRight,
    DpadUp,
    DpadDown,
    /// Cycle focus to the previous window while windowing (gamepad L1).
    FocusPrev,
    /// Cycle focus to the next window while windowing (gamepad R1).
    FocusNext,
    /// Slow-tweak modifier (gamepad L2).
    TweakSlow,
    /// Fast-tweak modifier (gamepad R2).
    TweakFast,
    /// Keyboard windowing/layer-toggle key (Alt).
    KeyMenu,
    KeyLeft,
    KeyRight,
    KeyUp,
    KeyDown,
}

impl NavInput {
    /// Number of navigation inputs.
    pub const COUNT: usize = 17;

    /// Index into the per-input arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// How a navigation input's duration is turned into a boolean pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavReadMode {
    /// True only on the first frame the input is down.
    Pressed,
    /// True only on the frame the input is released.
    Released,
    /// Standard key repeat.
    Repeat,
    /// Slower repeat, for window cycling.
    RepeatSlow,
    /// Faster repeat, for value tweaking.
    RepeatFast,
}

/// Key → navigation-input mapping table.
#[derive(Debug, Clone)]
pub struct NavBindings {
    entries: Vec<(Key, NavInput)>,
}

impl NavBindings {
    /// An empty binding table (gamepad-only navigation).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add or replace a binding.
    pub fn bind(&mut self, key: Key, input: NavInput) {
        self.entries.retain(|(k, _)| *k != key);
        self.entries.push((key, input));
    }

    /// Iterate over all bindings.
    pub fn iter(&self) -> impl Iterator<Item = (Key, NavInput)> + '_ {
        self.entries.iter().copied()
    }
}

impl Default for NavBindings {
    /// Default keyboard mapping: Space activates, Enter inputs, Escape
    /// cancels, arrows move.
    fn default() -> Self {
        Self {
            entries: vec![
                (Key::Space, NavInput::Activate),
                (Key::Enter, NavInput::Input),
                (Key::Escape, NavInput::Cancel),
                (Key::Left, NavInput::KeyLeft),
                (Key::Right, NavInput::KeyRight),
                (Key::Up, NavInput::KeyUp),
                (Key::Down, NavInput::KeyDown),
            ],
        }
    }
}

/// Immutable pre-sampled input for one frame.
#[derive(Debug, Clone)]
pub struct InputSnapshot {
    /// Size of the host viewport, in logical pixels.
    pub display_size: Vec2,
    /// Pointer position, `None` when the pointer is absent or invalid.
    pub mouse_pos: Option<Vec2>,
    /// Per-button held state.
    pub mouse_down: [bool; MouseButton::COUNT],
    /// Per-button "went down this frame".
    pub mouse_clicked: [bool; MouseButton::COUNT],
    /// Per-button "went up this frame".
    pub mouse_released: [bool; MouseButton::COUNT],
    /// Per-button "second click within the double-click window".
    pub mouse_double_clicked: [bool; MouseButton::COUNT],
    /// Wheel deltas (x = horizontal).
    pub wheel: Vec2,
    /// Modifier keys held.
    pub modifiers: Modifiers,
    /// Keys currently held down.
    pub keys_down: Vec<Key>,
    /// Raw gamepad contributions to the navigation-input vector, `0.0..=1.0`.
    pub nav_gamepad: [f32; NavInput::COUNT],
}

impl Default for InputSnapshot {
    fn default() -> Self {
        Self {
            display_size: Vec2::new(1280.0, 720.0),
            mouse_pos: None,
            mouse_down: [false; MouseButton::COUNT],
            mouse_clicked: [false; MouseButton::COUNT],
            mouse_released: [false; MouseButton::COUNT],
            mouse_double_clicked: [false; MouseButton::COUNT],
            wheel: Vec2::ZERO,
            modifiers: Modifiers::NONE,
            keys_down: Vec::new(),
            nav_gamepad: [0.0; NavInput::COUNT],
        }
    }
}

impl InputSnapshot {
    /// Snapshot with a key held down.
    #[must_use]
    pub fn with_key(mut self, key: Key) -> Self {
        if !self.keys_down.contains(&key) {
            self.keys_down.push(key);
        }
        self
    }

    /// Snapshot with the pointer at `pos`.
    #[must_use]
    pub fn with_mouse_pos(mut self, pos: Vec2) -> Self {
        self.mouse_pos = Some(pos);
        self
    }

    /// Snapshot with a button held (does not set clicked).
    #[must_use]
    pub fn with_mouse_down(mut self, button: MouseButton) -> Self {
        self.mouse_down[button.index()] = true;
        self
    }

    /// Snapshot with a button clicked this frame (also held).
    #[must_use]
    pub fn with_mouse_clicked(mut self, button: MouseButton) -> Self {
        self.mouse_down[button.index()] = true;
        self.mouse_clicked[button.index()] = true;
        self
    }

    /// Snapshot with a button released this frame.
    #[must_use]
    pub fn with_mouse_released(mut self, button: MouseButton) -> Self {
        self.mouse_down[button.index()] = false;
        self.mouse_released[button.index()] = true;
        self
    }

    /// Snapshot with modifier keys held.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Snapshot with a raw gamepad nav input held at full strength.
    #[must_use]
    pub fn with_nav_input(mut self, input: NavInput) -> Self {
        self.nav_gamepad[input.index()] = 1.0;
        self
    }

    /// True if `key` is held.
    #[must_use]
    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }
}

/// Number of repeat pulses to emit for a key held for `t` seconds, given the
/// duration at the previous frame `t_prev`.
///
/// Returns 1 on the initial press (`t == 0`), then one pulse each time the
/// repeat interval elapses past the initial delay.
#[must_use]
pub fn typematic_repeat_amount(t: f32, t_prev: f32, delay: f32, rate: f32) -> i32 {
    if t == 0.0 {
        return 1;
    }
    if t <= delay || rate <= 0.0 {
        return 0;
    }
    let count = ((t - delay) / rate) as i32 - ((t_prev - delay) / rate) as i32;
    count.max(0)
}

/// Cross-frame input state: durations, repeat, and the nav-input vector.
#[derive(Debug)]
pub struct InputState {
    /// This frame's snapshot.
    pub snapshot: InputSnapshot,
    /// Host-supplied elapsed time for this frame, in seconds.
    pub dt: f32,
    /// Accumulated time, in seconds.
    pub time: f64,
    /// Frame counter.
    pub frame: u64,

    /// Delay before key repeat starts, in seconds.
    pub key_repeat_delay: f32,
    /// Interval between key repeats, in seconds.
    pub key_repeat_rate: f32,
    /// Whether keyboard-driven navigation is enabled.
    pub nav_keyboard_active: bool,
    /// Whether gamepad-driven navigation is enabled.
    pub nav_gamepad_active: bool,

    /// Keyboard binding table applied each `begin_frame`.
    pub bindings: NavBindings,

    /// Pointer position at the previous frame.
    pub mouse_pos_prev: Option<Vec2>,

    key_duration: AHashMap<Key, f32>,
    key_duration_prev: AHashMap<Key, f32>,
    mouse_down_duration: [f32; MouseButton::COUNT],
    mouse_down_duration_prev: [f32; MouseButton::COUNT],
    nav_down_duration: [f32; NavInput::COUNT],
    nav_down_duration_prev: [f32; NavInput::COUNT],
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            snapshot: InputSnapshot::default(),
            dt: 0.0,
            time: 0.0,
            frame: 0,
            key_repeat_delay: 0.25,
            key_repeat_rate: 0.05,
            nav_keyboard_active: true,
            nav_gamepad_active: true,
            bindings: NavBindings::default(),
            mouse_pos_prev: None,
            key_duration: AHashMap::new(),
            key_duration_prev: AHashMap::new(),
            mouse_down_duration: [-1.0; MouseButton::COUNT],
            mouse_down_duration_prev: [-1.0; MouseButton::COUNT],
            nav_down_duration: [-1.0; NavInput::COUNT],
            nav_down_duration_prev: [-1.0; NavInput::COUNT],
        }
    }
}

impl InputState {
    /// Consume this frame's snapshot and advance all durations by `dt`.
    pub fn begin_frame(&mut self, snapshot: InputSnapshot, dt: f32) {
        debug_assert!(dt >= 0.0, "elapsed time must be non-negative");
        self.mouse_pos_prev = self.snapshot.mouse_pos;
        self.dt = dt;
        self.time += f64::from(dt);
        self.frame += 1;

        // Key durations: -1 = up, 0 = pressed this frame.
        std::mem::swap(&mut self.key_duration, &mut self.key_duration_prev);
        self.key_duration.clear();
        for &key in &snapshot.keys_down {
            let prev = self.key_duration_prev.get(&key).copied().unwrap_or(-1.0);
            let dur = if prev < 0.0 { 0.0 } else { prev + dt };
            self.key_duration.insert(key, dur);
        }

        // Mouse button durations.
        self.mouse_down_duration_prev = self.mouse_down_duration;
        for i in 0..MouseButton::COUNT {
            self.mouse_down_duration[i] = if snapshot.mouse_down[i] {
                if self.mouse_down_duration_prev[i] < 0.0 {
                    0.0
                } else {
                    self.mouse_down_duration_prev[i] + dt
                }
            } else {
                -1.0
            };
        }

        // Navigation-input vector: gamepad raw values plus keyboard bindings.
        let mut raw = snapshot.nav_gamepad;
        if !self.nav_gamepad_active {
            raw = [0.0; NavInput::COUNT];
        }
        if self.nav_keyboard_active {
            for (key, input) in self.bindings.iter() {
                if snapshot.key_down(key) {
                    raw[input.index()] = 1.0;
                }
            }
            // Alt doubles as the keyboard layer-toggle key, unless Ctrl
            // turns the combination into a shortcut.
            if snapshot.modifiers.contains(Modifiers::ALT)
                && !snapshot.modifiers.contains(Modifiers::CTRL)
            {
                raw[NavInput::KeyMenu.index()] = 1.0;
            }
        }
        self.nav_down_duration_prev = self.nav_down_duration;
        for i in 0..NavInput::COUNT {
            self.nav_down_duration[i] = if raw[i] > 0.0 {
                if self.nav_down_duration_prev[i] < 0.0 {
                    0.0
                } else {
                    self.nav_down_duration_prev[i] + dt
                }
            } else {
                -1.0
            };
        }

        self.snapshot = snapshot;
    }

    // --- Keyboard queries ---

    /// True if `key` is held this frame.
    #[must_use]
    pub fn key_down(&self, key: Key) -> bool {
        self.snapshot.key_down(key)
    }

    /// How long `key` has been held, `-1.0` if up.
    #[must_use]
    pub fn key_down_duration(&self, key: Key) -> f32 {
        self.key_duration.get(&key).copied().unwrap_or(-1.0)
    }

    /// True on the initial press and, when `repeat` is set, on each repeat
    /// pulse thereafter.
    #[must_use]
    pub fn key_pressed(&self, key: Key, repeat: bool) -> bool {
        let t = self.key_down_duration(key);
        if t == 0.0 {
            return true;
        }
        if repeat && t > 0.0 {
            return typematic_repeat_amount(
                t,
                t - self.dt,
                self.key_repeat_delay,
                self.key_repeat_rate,
            ) > 0;
        }
        false
    }

    // --- Mouse queries ---

    /// True if `button` is held this frame.
    #[must_use]
    pub fn mouse_down(&self, button: MouseButton) -> bool {
        self.snapshot.mouse_down[button.index()]
    }

    /// True if `button` went down this frame; with `repeat`, also true on
    /// repeat pulses while held.
    #[must_use]
    pub fn mouse_clicked(&self, button: MouseButton, repeat: bool) -> bool {
        if self.snapshot.mouse_clicked[button.index()] {
            return true;
        }
        let t = self.mouse_down_duration[button.index()];
        if repeat && t > 0.0 {
            return typematic_repeat_amount(
                t,
                t - self.dt,
                self.key_repeat_delay,
                // Held mouse buttons repeat at twice the keyboard cadence.
                self.key_repeat_rate * 0.5,
            ) > 0;
        }
        false
    }

    /// True if `button` went up this frame.
    #[must_use]
    pub fn mouse_released(&self, button: MouseButton) -> bool {
        self.snapshot.mouse_released[button.index()]
    }

    /// True if `button` double-clicked this frame.
    #[must_use]
    pub fn mouse_double_clicked(&self, button: MouseButton) -> bool {
        self.snapshot.mouse_double_clicked[button.index()]
    }

    /// How long `button` has been held, `-1.0` if up.
    #[must_use]
    pub fn mouse_down_duration(&self, button: MouseButton) -> f32 {
        self.mouse_down_duration[button.index()]
    }

    /// `button`'s held duration at the previous frame, `-1.0` if up.
    #[must_use]
    pub fn mouse_down_duration_prev(&self, button: MouseButton) -> f32 {
        self.mouse_down_duration_prev[button.index()]
    }

    // --- Navigation-input queries ---

    /// Analog value of a navigation input (`0.0` when up).
    #[must_use]
    pub fn nav_amount(&self, input: NavInput) -> f32 {
        if self.nav_down_duration[input.index()] >= 0.0 {
            1.0
        } else {
            0.0
        }
    }

    /// True if a navigation input is held.
    #[must_use]
    pub fn nav_down(&self, input: NavInput) -> bool {
        self.nav_down_duration[input.index()] >= 0.0
    }

    /// Read a navigation input as a boolean pulse.
    #[must_use]
    pub fn nav_pressed(&self, input: NavInput, mode: NavReadMode) -> bool {
        let t = self.nav_down_duration[input.index()];
        let t_prev = self.nav_down_duration_prev[input.index()];
        if t < 0.0 {
            return mode == NavReadMode::Released && t_prev >= 0.0;
        }
        match mode {
            NavReadMode::Pressed => t == 0.0,
            NavReadMode::Released => false,
            NavReadMode::Repeat => {
                typematic_repeat_amount(
                    t,
                    t - self.dt,
                    self.key_repeat_delay * 0.80,
                    self.key_repeat_rate * 0.80,
                ) > 0
            }
            NavReadMode::RepeatSlow => {
                typematic_repeat_amount(
                    t,
                    t - self.dt,
                    self.key_repeat_delay * 1.25,
                    self.key_repeat_rate * 2.00,
                ) > 0
            }
            NavReadMode::RepeatFast => {
                typematic_repeat_amount(
                    t,
                    t - self.dt,
                    self.key_repeat_delay * 0.72,
                    self.key_repeat_rate * 0.30,
                ) > 0
            }
        }
    }

    /// True if either of two navigation inputs reads as pressed.
    #[must_use]
    pub fn nav_pressed_any_of_two(&self, a: NavInput, b: NavInput, mode: NavReadMode) -> bool {
        self.nav_pressed(a, mode) || self.nav_pressed(b, mode)
    }
}
