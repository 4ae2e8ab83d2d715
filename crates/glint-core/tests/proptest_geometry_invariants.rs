//! Property-based invariant tests for the geometry primitives.
//!
//! All coordinates are generated on an integer grid so f32 arithmetic is
//! exact and equality assertions are meaningful.
//!
//! 1. `clip_with` never produces an inverted rect and stays inside bounds.
//! 2. `clip_with` is idempotent.
//! 3. `union` contains both operands.
//! 4. `overlaps` is symmetric; `contains_rect` implies `overlaps` for
//!    positive-area rects.
//! 5. `expand` round-trips; `translate` preserves size and round-trips.
//! 6. A contained point implies overlap with any rect containing it.

use glint_core::geometry::{Rect, Vec2};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn grid_rect() -> impl Strategy<Value = Rect> {
    (-50i32..50, -50i32..50, 0i32..60, 0i32..60).prop_map(|(x, y, w, h)| {
        Rect::from_min_size(Vec2::new(x as f32, y as f32), Vec2::new(w as f32, h as f32))
    })
}

fn grid_point() -> impl Strategy<Value = Vec2> {
    (-60i32..120, -60i32..120).prop_map(|(x, y)| Vec2::new(x as f32, y as f32))
}

// ═════════════════════════════════════════════════════════════════════════
// 1 + 2. Clipping stays inside bounds and is idempotent
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn clip_stays_inside_bounds(r in grid_rect(), bounds in grid_rect()) {
        let clipped = r.clip_with(&bounds);
        prop_assert!(!clipped.is_inverted());
        prop_assert!(bounds.contains_rect(&clipped),
            "{:?} escaped {:?}", clipped, bounds);
    }

    #[test]
    fn clip_is_idempotent(r in grid_rect(), bounds in grid_rect()) {
        let once = r.clip_with(&bounds);
        prop_assert_eq!(once.clip_with(&bounds), once);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Union contains both operands
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn union_contains_both(a in grid_rect(), b in grid_rect()) {
        let u = a.union(&b);
        prop_assert!(u.contains_rect(&a));
        prop_assert!(u.contains_rect(&b));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Overlap symmetry and containment implication
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn overlap_is_symmetric(a in grid_rect(), b in grid_rect()) {
        prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
    }

    #[test]
    fn containment_implies_overlap(outer in grid_rect(), inner in grid_rect()) {
        if outer.contains_rect(&inner) && inner.width() > 0.0 && inner.height() > 0.0 {
            prop_assert!(outer.overlaps(&inner));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Expand and translate round-trip on the integer grid
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn expand_round_trips(r in grid_rect(), amount in 0i32..20) {
        let a = amount as f32;
        prop_assert_eq!(r.expand(a).expand(-a), r);
    }

    #[test]
    fn translate_preserves_size_and_round_trips(r in grid_rect(), d in grid_point()) {
        let moved = r.translate(d);
        prop_assert_eq!(moved.size(), r.size());
        prop_assert_eq!(moved.translate(Vec2::ZERO - d), r);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. A contained point overlaps
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn contained_point_implies_overlap(r in grid_rect(), p in grid_point()) {
        if r.contains(p) {
            // Max edges are exclusive, so a unit cell anchored at a
            // contained point always intersects.
            let cell = Rect::from_min_size(p, Vec2::splat(1.0));
            prop_assert!(r.overlaps(&cell), "point {:?} inside {:?} but no overlap", p, r);
        }
    }
}
