//! Property-based invariant tests for the navigation core.
//!
//! All properties drive whole frames through the public `UiContext` API;
//! scoring internals are exercised only through the results they produce.
//!
//! 1. Replaying an identical frame script yields an identical focus trail.
//! 2. Focus never points at an id that was not submitted.
//! 3. Down walks a disjoint column top-to-bottom, one item per press.
//! 4. Down pressed k times then Up k times returns to the top of a column.
//! 5. Tab cycles focus stops with modular wraparound in both directions.
//! 6. The hovered id, when set, names an item containing the cursor, and
//!    hover resolution is deterministic.

use glint_nav::{
    ButtonFlags, InputSnapshot, Key, Modifiers, Rect, UiContext, Vec2, WidgetId, WindowFlags,
};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

const COLUMN_W: f32 = 120.0;

/// A vertical stack of disjoint full-width rects separated by positive gaps.
fn column() -> impl Strategy<Value = Vec<Rect>> {
    proptest::collection::vec((1.0f32..30.0, 5.0f32..30.0), 3..8).prop_map(|segments| {
        let mut y = 0.0f32;
        segments
            .into_iter()
            .map(|(gap, h)| {
                let top = y + gap;
                y = top + h;
                Rect::from_ltrb(0.0, top, COLUMN_W, y)
            })
            .collect()
    })
}

/// Arbitrary, possibly overlapping rects on a coarse grid inside a
/// 200x200 window.
fn rect_soup() -> impl Strategy<Value = Vec<Rect>> {
    proptest::collection::vec((0u32..10, 0u32..10, 1u32..6, 1u32..6), 2..16).prop_map(|cells| {
        cells
            .into_iter()
            .map(|(cx, cy, w, h)| {
                let x = cx as f32 * 12.0;
                let y = cy as f32 * 12.0;
                Rect::from_ltrb(x, y, (x + w as f32 * 8.0).min(200.0), (y + h as f32 * 8.0).min(200.0))
            })
            .collect()
    })
}

fn script_key(index: u8) -> Key {
    match index % 8 {
        0 => Key::Down,
        1 => Key::Up,
        2 => Key::Left,
        3 => Key::Right,
        4 => Key::Tab,
        5 => Key::Escape,
        6 => Key::PageDown,
        _ => Key::PageUp,
    }
}

fn item_id(index: usize) -> WidgetId {
    WidgetId(10 + index as u64)
}

fn keyboard_ctx() -> UiContext {
    let mut ctx = UiContext::new();
    ctx.input_mut().nav_keyboard_active = true;
    ctx
}

/// Submits every rect as a focusable item in one window, one frame.
fn submit_frame(ctx: &mut UiContext, snapshot: InputSnapshot, win: Rect, rects: &[Rect]) {
    ctx.begin_frame(snapshot, 0.016);
    ctx.begin_window(1, win, WindowFlags::empty());
    for (i, r) in rects.iter().enumerate() {
        let id = item_id(i);
        ctx.focusable_item_register(id);
        ctx.item_add(id, *r);
    }
    ctx.end_window();
    ctx.end_frame();
}

/// Plays a key script from a fresh context and records `nav_id` after
/// every settled press. Each press frame is followed by a release frame
/// so repeat state never leaks between presses.
fn run_script(rects: &[Rect], win: Rect, script: &[u8]) -> Vec<WidgetId> {
    let mut ctx = keyboard_ctx();
    submit_frame(&mut ctx, InputSnapshot::default(), win, rects);
    submit_frame(&mut ctx, InputSnapshot::default(), win, rects);
    let mut trail = vec![ctx.nav_id()];
    for &index in script {
        let snap = InputSnapshot::default().with_key(script_key(index));
        submit_frame(&mut ctx, snap, win, rects);
        submit_frame(&mut ctx, InputSnapshot::default(), win, rects);
        trail.push(ctx.nav_id());
    }
    trail
}

fn soup_window() -> Rect {
    Rect::from_ltrb(0.0, 0.0, 200.0, 200.0)
}

fn column_window(rects: &[Rect]) -> Rect {
    let bottom = rects.last().map_or(10.0, |r| r.max.y + 10.0);
    Rect::from_ltrb(0.0, 0.0, COLUMN_W, bottom)
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Identical scripts produce identical focus trails
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn replayed_script_gives_identical_trail(
        rects in rect_soup(),
        script in proptest::collection::vec(any::<u8>(), 0..12),
    ) {
        let first = run_script(&rects, soup_window(), &script);
        let second = run_script(&rects, soup_window(), &script);
        prop_assert_eq!(first, second);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Focus only lands on submitted ids
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn focus_only_lands_on_submitted_ids(
        rects in rect_soup(),
        script in proptest::collection::vec(any::<u8>(), 0..16),
    ) {
        let trail = run_script(&rects, soup_window(), &script);
        for nav_id in trail {
            prop_assert!(
                nav_id.is_none()
                    || (0..rects.len()).any(|i| item_id(i) == nav_id),
                "focus escaped the submitted set: {:?}",
                nav_id
            );
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Down walks a disjoint column in order
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn down_walks_a_column_in_order(rects in column(), presses in 1usize..10) {
        let win = column_window(&rects);
        let mut ctx = keyboard_ctx();
        submit_frame(&mut ctx, InputSnapshot::default(), win, &rects);
        submit_frame(&mut ctx, InputSnapshot::default(), win, &rects);
        prop_assert_eq!(ctx.nav_id(), item_id(0));

        for press in 0..presses {
            let snap = InputSnapshot::default().with_key(Key::Down);
            submit_frame(&mut ctx, snap, win, &rects);
            submit_frame(&mut ctx, InputSnapshot::default(), win, &rects);
            // Saturates at the bottom: no candidate lies below the last item.
            let expected = (press + 1).min(rects.len() - 1);
            prop_assert_eq!(ctx.nav_id(), item_id(expected));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Down k then Up k returns to the top
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn down_then_up_returns_to_the_top(rects in column(), presses in 1usize..10) {
        let win = column_window(&rects);
        let mut ctx = keyboard_ctx();
        submit_frame(&mut ctx, InputSnapshot::default(), win, &rects);
        submit_frame(&mut ctx, InputSnapshot::default(), win, &rects);

        for key in [Key::Down, Key::Up] {
            for _ in 0..presses {
                let snap = InputSnapshot::default().with_key(key);
                submit_frame(&mut ctx, snap, win, &rects);
                submit_frame(&mut ctx, InputSnapshot::default(), win, &rects);
            }
        }
        prop_assert_eq!(ctx.nav_id(), item_id(0));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Tab cycles focus stops with wraparound
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn tab_cycles_stops_with_wraparound(
        rects in column(),
        presses in 1usize..12,
        backward in any::<bool>(),
    ) {
        let win = column_window(&rects);
        let n = rects.len();
        let mut ctx = keyboard_ctx();
        submit_frame(&mut ctx, InputSnapshot::default(), win, &rects);
        submit_frame(&mut ctx, InputSnapshot::default(), win, &rects);
        prop_assert_eq!(ctx.nav_id(), item_id(0));

        for press in 1..=presses {
            let mut snap = InputSnapshot::default().with_key(Key::Tab);
            if backward {
                snap = snap.with_modifiers(Modifiers::SHIFT);
            }
            submit_frame(&mut ctx, snap, win, &rects);
            submit_frame(&mut ctx, InputSnapshot::default(), win, &rects);
            let expected = if backward {
                (n - (press % n)) % n
            } else {
                press % n
            };
            prop_assert_eq!(ctx.nav_id(), item_id(expected));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Hovered id contains the cursor, deterministically
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn hovered_id_contains_the_cursor(
        rects in rect_soup(),
        mx in 0.0f32..220.0,
        my in 0.0f32..220.0,
    ) {
        let pos = Vec2::new(mx, my);
        let run = || {
            let mut ctx = UiContext::new();
            let frame = |ctx: &mut UiContext| {
                let snap = InputSnapshot::default().with_mouse_pos(pos);
                ctx.begin_frame(snap, 0.016);
                ctx.begin_window(1, soup_window(), WindowFlags::empty());
                for (i, r) in rects.iter().enumerate() {
                    let id = item_id(i);
                    ctx.item_add(id, *r);
                    ctx.button_behavior(*r, id, ButtonFlags::empty());
                }
                ctx.end_window();
                ctx.end_frame();
            };
            frame(&mut ctx);
            frame(&mut ctx);
            ctx.registry().hovered_id()
        };

        let hovered = run();
        if hovered.is_some() {
            let owner = (0..rects.len()).find(|&i| item_id(i) == hovered);
            prop_assert!(owner.is_some_and(|i| rects[i].contains(pos)),
                "hovered {:?} does not contain {:?}", hovered, pos);
        }
        prop_assert_eq!(run(), hovered);
    }
}
