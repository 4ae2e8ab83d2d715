#![forbid(unsafe_code)]

//! Windows as seen by the navigation core.
//!
//! A [`Window`] is re-submitted every frame by the host, but its per-layer
//! navigation slots (`nav_last_ids`, `nav_rect_rel`) deliberately persist
//! across frames: they are the only widget-adjacent state not rebuilt from
//! scratch, so directional focus survives the immediate-mode teardown.
//!
//! [`Windows`] is an arena keyed by an opaque window key. Windows are never
//! removed; inactive ones simply stop being submitted and are skipped by
//! hover and focus scans.

use ahash::AHashMap;
use bitflags::bitflags;
use glint_core::geometry::{Rect, Vec2};
use glint_core::id::WidgetId;

bitflags! {
    /// Behavior flags for a window, as far as navigation is concerned.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct WindowFlags: u32 {
        /// The windowing overlay may not reposition this window.
        const NO_MOVE       = 1 << 0;
        /// Navigation inputs are ignored while this window has focus.
        const NO_NAV_INPUTS = 1 << 1;
        /// Skipped when cycling window focus.
        const NO_NAV_FOCUS  = 1 << 2;
        /// A transient popup; closed by Cancel.
        const POPUP         = 1 << 3;
        /// A modal popup; blocks hover elsewhere and cannot be
        /// Cancel-closed or windowed away from.
        const MODAL         = 1 << 4;
        /// A child region embedded in a parent window.
        const CHILD_WINDOW  = 1 << 5;
        /// A child window opened from a menu.
        const CHILD_MENU    = 1 << 6;
        /// Items join the parent's navigation graph as siblings.
        const NAV_FLATTENED = 1 << 7;
        /// The window carries a menu bar (a Menu nav layer).
        const MENU_BAR      = 1 << 8;
    }
}

/// Independent focus track within a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavLayer {
    /// Regular widget content.
    #[default]
    Main = 0,
    /// Menu bar / alt-layer content.
    Menu = 1,
}

impl NavLayer {
    /// Index into per-layer arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Bit used in layer-active masks.
    #[inline]
    pub const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// The other layer.
    #[inline]
    pub const fn flipped(self) -> NavLayer {
        match self {
            NavLayer::Main => NavLayer::Menu,
            NavLayer::Menu => NavLayer::Main,
        }
    }
}

/// Handle to a window in the [`Windows`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(u32);

impl WindowId {
    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Sentinel used for "no pending focus-counter request".
pub(crate) const FOCUS_REQUEST_NONE: i32 = i32::MAX;

/// One window's geometry and navigation state.
#[derive(Debug)]
pub struct Window {
    /// Opaque key the host submits the window under.
    pub key: u64,
    /// Arena handle of this window.
    pub id: WindowId,
    /// Outer geometry in screen coordinates.
    pub rect: Rect,
    /// Current scroll offset.
    pub scroll: Vec2,
    /// Content size; larger than `rect` when the window scrolls.
    pub content_size: Vec2,
    /// Visible clipping bounds in screen coordinates.
    pub clip_rect: Rect,
    /// Navigation behavior flags.
    pub flags: WindowFlags,
    /// Enclosing window, when submitted inside another window.
    pub parent: Option<WindowId>,
    /// Top-level ancestor (self for top-level windows and popups).
    pub root: WindowId,
    /// The id this window occupies as an item in its parent.
    pub child_id: WidgetId,
    /// Child nav window to restore when focus returns to this root.
    pub nav_last_child_window: Option<WindowId>,

    /// Last focused item per nav layer. Persists across frames.
    pub nav_last_ids: [WidgetId; 2],
    /// Window-relative rect of the focused item per layer. Persists.
    pub nav_rect_rel: [Rect; 2],

    /// Frame this window was last submitted.
    pub(crate) last_frame_active: Option<u64>,
    /// Submitted this frame.
    pub(crate) active: bool,
    /// Was submitted the previous frame.
    pub(crate) was_active: bool,
    /// First frame of (re)appearance.
    pub(crate) appearing: bool,

    // Per-frame submission cursor, reset by `begin_window`.
    pub(crate) nav_layer_current: NavLayer,
    pub(crate) nav_layer_active_mask: u8,
    pub(crate) nav_layer_active_mask_next: u8,
    pub(crate) last_item_id: WidgetId,
    pub(crate) last_item_rect: Rect,

    // Tab-traversal counters. The running counters also serve as the
    // previous frame's totals when `begin_window` computes wraparound.
    pub(crate) focus_idx_all_counter: i32,
    pub(crate) focus_idx_tab_counter: i32,
    pub(crate) focus_idx_all_request_current: i32,
    pub(crate) focus_idx_tab_request_current: i32,
    pub(crate) focus_idx_all_request_next: i32,
    pub(crate) focus_idx_tab_request_next: i32,
}

impl Window {
    fn new(key: u64, id: WindowId) -> Self {
        Self {
            key,
            id,
            rect: Rect::ZERO,
            scroll: Vec2::ZERO,
            content_size: Vec2::ZERO,
            clip_rect: Rect::ZERO,
            flags: WindowFlags::empty(),
            parent: None,
            root: id,
            child_id: WidgetId(key),
            nav_last_child_window: None,
            nav_last_ids: [WidgetId::NONE; 2],
            nav_rect_rel: [Rect::ZERO; 2],
            last_frame_active: None,
            active: false,
            was_active: false,
            appearing: false,
            nav_layer_current: NavLayer::Main,
            nav_layer_active_mask: 0,
            nav_layer_active_mask_next: 0,
            last_item_id: WidgetId::NONE,
            last_item_rect: Rect::ZERO,
            focus_idx_all_counter: -1,
            focus_idx_tab_counter: -1,
            focus_idx_all_request_current: FOCUS_REQUEST_NONE,
            focus_idx_tab_request_current: FOCUS_REQUEST_NONE,
            focus_idx_all_request_next: FOCUS_REQUEST_NONE,
            focus_idx_tab_request_next: FOCUS_REQUEST_NONE,
        }
    }

    /// Current nav layer being submitted.
    #[inline]
    pub fn nav_layer(&self) -> NavLayer {
        self.nav_layer_current
    }

    /// True if the content overflows the window vertically or horizontally.
    #[inline]
    pub fn has_scroll(&self) -> bool {
        self.content_size.y > self.rect.height() || self.content_size.x > self.rect.width()
    }

    /// Maximum scroll offset, clamped at zero.
    pub fn scroll_max(&self) -> Vec2 {
        Vec2::new(
            (self.content_size.x - self.rect.width()).max(0.0),
            (self.content_size.y - self.rect.height()).max(0.0),
        )
    }
}

/// Arena of all windows the host has ever submitted.
#[derive(Debug, Default)]
pub struct Windows {
    windows: Vec<Window>,
    by_key: AHashMap<u64, WindowId>,
    /// Focus order, least recently focused first. Doubles as z-order.
    pub focus_order: Vec<WindowId>,
}

impl Windows {
    /// Look up a window.
    #[inline]
    pub fn get(&self, id: WindowId) -> &Window {
        &self.windows[id.index()]
    }

    /// Look up a window mutably.
    #[inline]
    pub fn get_mut(&mut self, id: WindowId) -> &mut Window {
        &mut self.windows[id.index()]
    }

    /// Find a window by its submission key.
    #[must_use]
    pub fn find(&self, key: u64) -> Option<WindowId> {
        self.by_key.get(&key).copied()
    }

    /// Find or create the window for `key`. Returns `(id, created)`.
    pub(crate) fn ensure(&mut self, key: u64) -> (WindowId, bool) {
        if let Some(id) = self.by_key.get(&key) {
            return (*id, false);
        }
        let id = WindowId(self.windows.len() as u32);
        self.windows.push(Window::new(key, id));
        self.by_key.insert(key, id);
        self.focus_order.push(id);
        (id, true)
    }

    /// Top-level ancestor of `id`.
    #[must_use]
    pub fn root_of(&self, id: WindowId) -> WindowId {
        self.get(id).root
    }

    /// Move `id`'s root to the front of the focus order.
    pub(crate) fn bring_to_focus_front(&mut self, id: WindowId) {
        let root = self.root_of(id);
        if self.focus_order.last() == Some(&root) {
            return;
        }
        self.focus_order.retain(|w| *w != root);
        self.focus_order.push(root);
    }

    /// Follow `nav_last_child_window` links down from a root.
    #[must_use]
    pub fn restore_last_child_nav(&self, id: WindowId) -> WindowId {
        self.get(id).nav_last_child_window.unwrap_or(id)
    }

    /// True if `id` can receive focus from the windowing overlay.
    pub(crate) fn is_nav_focusable(&self, id: WindowId, nav_window: Option<WindowId>) -> bool {
        let w = self.get(id);
        (w.active || w.was_active)
            && w.root == w.id
            && (!w.flags.contains(WindowFlags::NO_NAV_FOCUS) || Some(id) == nav_window)
    }

    /// Scan the focus order from `start` toward `stop` (exclusive) in steps
    /// of `dir`, returning the first nav-focusable window.
    pub(crate) fn find_nav_focusable(
        &self,
        start: i32,
        stop: i32,
        dir: i32,
        nav_window: Option<WindowId>,
    ) -> Option<WindowId> {
        debug_assert!(dir == 1 || dir == -1);
        let mut i = start;
        while i != stop && i >= 0 && (i as usize) < self.focus_order.len() {
            let id = self.focus_order[i as usize];
            if self.is_nav_focusable(id, nav_window) {
                return Some(id);
            }
            i += dir;
        }
        None
    }

    /// Index of `id` in the focus order.
    pub(crate) fn focus_index(&self, id: WindowId) -> Option<i32> {
        self.focus_order.iter().position(|w| *w == id).map(|i| i as i32)
    }

    /// Roll per-frame activity: what was active becomes "was active".
    pub(crate) fn new_frame(&mut self) {
        for w in &mut self.windows {
            w.was_active = w.active;
            w.active = false;
        }
    }

    /// Iterate all windows.
    pub fn iter(&self) -> impl Iterator<Item = &Window> {
        self.windows.iter()
    }
}

/// One open popup.
#[derive(Debug, Clone, Copy)]
pub struct PopupEntry {
    /// The popup's window.
    pub window: WindowId,
    /// Nav window to restore when this popup closes.
    pub backup_nav_window: Option<WindowId>,
}

/// Stack of open popups, bottom first.
#[derive(Debug, Default)]
pub struct PopupStack {
    entries: Vec<PopupEntry>,
}

impl PopupStack {
    /// Number of open popups.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no popup is open.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The topmost open popup.
    #[must_use]
    pub fn top(&self) -> Option<&PopupEntry> {
        self.entries.last()
    }

    /// The topmost open modal popup's window, if any.
    #[must_use]
    pub fn topmost_modal(&self, windows: &Windows) -> Option<WindowId> {
        self.entries
            .iter()
            .rev()
            .find(|e| windows.get(e.window).flags.contains(WindowFlags::MODAL))
            .map(|e| e.window)
    }

    /// Drop entries whose window stopped being submitted. A popup that the
    /// host no longer begins is closed, not leaked; a vanished modal must
    /// not keep blocking hover in every other window.
    pub(crate) fn prune_inactive(&mut self, windows: &Windows) {
        self.entries.retain(|e| windows.get(e.window).was_active);
    }

    pub(crate) fn push(&mut self, window: WindowId, backup_nav_window: Option<WindowId>) {
        self.entries.push(PopupEntry {
            window,
            backup_nav_window,
        });
    }

    /// Close popups so that `remaining` stay open. Returns the window that
    /// should receive focus back.
    pub(crate) fn close_to_level(&mut self, remaining: usize) -> Option<WindowId> {
        debug_assert!(remaining < self.entries.len());
        let backup = self.entries[remaining].backup_nav_window;
        self.entries.truncate(remaining);
        match self.entries.last() {
            Some(e) => Some(e.window),
            None => backup,
        }
    }

    /// Close every popup that does not contain `window` in its chain.
    pub(crate) fn close_over_window(&mut self, windows: &Windows, window: WindowId) {
        let root = windows.root_of(window);
        self.entries
            .retain(|e| windows.root_of(e.window) == root || e.window == window);
    }

    /// Entry at `index` from the bottom.
    pub(crate) fn entry(&self, index: usize) -> &PopupEntry {
        &self.entries[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena_with(n: usize) -> Windows {
        let mut w = Windows::default();
        for key in 0..n as u64 {
            let (id, created) = w.ensure(key);
            assert!(created);
            let win = w.get_mut(id);
            win.active = true;
        }
        w
    }

    #[test]
    fn ensure_is_idempotent() {
        let mut w = Windows::default();
        let (a, created_a) = w.ensure(7);
        let (b, created_b) = w.ensure(7);
        assert!(created_a);
        assert!(!created_b);
        assert_eq!(a, b);
    }

    #[test]
    fn bring_to_focus_front_reorders() {
        let mut w = arena_with(3);
        let first = w.focus_order[0];
        w.bring_to_focus_front(first);
        assert_eq!(*w.focus_order.last().unwrap(), first);
        assert_eq!(w.focus_order.len(), 3);
    }

    #[test]
    fn find_nav_focusable_skips_flagged_windows() {
        let mut w = arena_with(3);
        let skip = w.focus_order[1];
        w.get_mut(skip).flags = WindowFlags::NO_NAV_FOCUS;
        // Scan from front toward the back.
        let found = w.find_nav_focusable(2, -1, -1, None);
        assert_eq!(found, Some(w.focus_order[2]));
        let found = w.find_nav_focusable(1, -1, -1, None);
        assert_eq!(found, Some(w.focus_order[0]));
    }

    #[test]
    fn nav_window_is_focusable_despite_flag() {
        let mut w = arena_with(1);
        let id = w.focus_order[0];
        w.get_mut(id).flags = WindowFlags::NO_NAV_FOCUS;
        assert!(!w.is_nav_focusable(id, None));
        assert!(w.is_nav_focusable(id, Some(id)));
    }

    #[test]
    fn popup_close_to_level_restores_backup() {
        let mut windows = arena_with(3);
        let a = windows.focus_order[0];
        let b = windows.focus_order[1];
        let host = windows.focus_order[2];
        let _ = &mut windows;

        let mut popups = PopupStack::default();
        popups.push(a, Some(host));
        popups.push(b, Some(a));
        assert_eq!(popups.len(), 2);

        // Closing the top popup focuses the one below.
        assert_eq!(popups.close_to_level(1), Some(a));
        // Closing the last popup focuses the original backup.
        assert_eq!(popups.close_to_level(0), Some(host));
        assert!(popups.is_empty());
    }

    #[test]
    fn topmost_modal_found() {
        let mut windows = arena_with(2);
        let a = windows.focus_order[0];
        let b = windows.focus_order[1];
        windows.get_mut(b).flags = WindowFlags::POPUP | WindowFlags::MODAL;

        let mut popups = PopupStack::default();
        popups.push(a, None);
        assert_eq!(popups.topmost_modal(&windows), None);
        popups.push(b, None);
        assert_eq!(popups.topmost_modal(&windows), Some(b));
    }

    #[test]
    fn nav_layer_flip_and_bits() {
        assert_eq!(NavLayer::Main.flipped(), NavLayer::Menu);
        assert_eq!(NavLayer::Menu.flipped(), NavLayer::Main);
        assert_eq!(NavLayer::Main.bit() | NavLayer::Menu.bit(), 0b11);
    }

    #[test]
    fn scroll_max_clamps_at_zero() {
        let mut w = Windows::default();
        let (id, _) = w.ensure(1);
        let win = w.get_mut(id);
        win.rect = Rect::from_ltrb(0.0, 0.0, 100.0, 100.0);
        win.content_size = Vec2::new(50.0, 300.0);
        assert_eq!(win.scroll_max(), Vec2::new(0.0, 200.0));
    }
}
