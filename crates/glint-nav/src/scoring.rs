#![forbid(unsafe_code)]

//! Spatial scoring for directional moves.
//!
//! Every focusable item submitted while a move request is pending becomes a
//! candidate. A candidate is scored against the scoring rectangle (the
//! focused item's rect, or a collapsed seed rect) along three metrics:
//!
//! - `dist_box`: gap between bounding boxes, with the cross-axis gap
//!   dampened so in-axis distance dominates.
//! - `dist_center`: L1 distance between centers, the first tie-breaker.
//! - `dist_axial`: pure in-axis distance, a last-resort fallback that only
//!   applies inside menu layers.
//!
//! The best candidate must sit in the quadrant matching the move direction.
//! Remaining ties resolve by submission order so items stacked at the same
//! position link deterministically.
//!
//! # Invariants
//!
//! 1. Scoring is pure: the same candidate set and parameters always produce
//!    the same winner, regardless of submission interleaving of losers.
//! 2. A candidate on a different nav layer never scores.
//! 3. Distances in a cleared [`NavMoveResult`] are `f32::MAX`, so any scored
//!    candidate beats an empty slot.

use glint_core::geometry::{lerp, Dir, Rect, Vec2};
use glint_core::id::WidgetId;

use crate::window::{NavLayer, WindowFlags, WindowId};

/// Fraction of an item's height that must be visible for it to join the
/// visible-set result used by page moves.
pub(crate) const VISIBLE_RATIO: f32 = 0.70;

/// Best candidate found so far for one result slot.
#[derive(Debug, Clone, Copy)]
pub struct NavMoveResult {
    /// Winning item, `NONE` while the slot is empty.
    pub id: WidgetId,
    /// Window the winning item was submitted in.
    pub window: Option<WindowId>,
    /// Box-gap metric of the winner.
    pub dist_box: f32,
    /// Center-distance metric of the winner.
    pub dist_center: f32,
    /// Axial-fallback metric of the winner.
    pub dist_axial: f32,
    /// Winner's rect, relative to its window's top-left corner.
    pub rect_rel: Rect,
}

impl Default for NavMoveResult {
    fn default() -> Self {
        Self {
            id: WidgetId::NONE,
            window: None,
            dist_box: f32::MAX,
            dist_center: f32::MAX,
            dist_axial: f32::MAX,
            rect_rel: Rect::ZERO,
        }
    }
}

impl NavMoveResult {
    /// Reset the slot to empty.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// True once any candidate has been recorded.
    #[inline]
    pub fn has_result(&self) -> bool {
        self.id.is_some()
    }
}

/// One focusable item captured during submission, with enough geometry to be
/// re-scored after the frame (for wrap-around moves).
#[derive(Debug, Clone, Copy)]
pub(crate) struct Candidate {
    pub id: WidgetId,
    pub window: WindowId,
    /// Item bounds in screen coordinates.
    pub bb: Rect,
    pub layer: NavLayer,
    /// Clipping bounds of the item's window.
    pub clip_rect: Rect,
    /// The window's top-left corner, for deriving `rect_rel`.
    pub window_pos: Vec2,
    /// Submitted in a flattened child of the nav window; such items must be
    /// visible through the child's clip rect to score at all.
    pub crossing_flattened: bool,
}

impl Candidate {
    /// Item rect relative to its window.
    pub fn rect_rel(&self) -> Rect {
        self.bb
            .translate(Vec2::new(-self.window_pos.x, -self.window_pos.y))
    }
}

/// Inputs to [`score_item`], fixed for the duration of one move request.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScoreParams {
    pub move_dir: Dir,
    /// Direction used for cross-axis visibility clamping. Differs from
    /// `move_dir` for page moves.
    pub clip_dir: Dir,
    /// Reference rectangle in screen coordinates.
    pub scoring_rect: Rect,
    pub nav_id: WidgetId,
    pub nav_layer: NavLayer,
    /// Flags of the nav window, gating the axial menu fallback.
    pub nav_window_flags: WindowFlags,
}

/// Signed gap between two intervals; zero when they overlap.
#[inline]
fn dist_interval(a0: f32, a1: f32, b0: f32, b1: f32) -> f32 {
    if a1 < b0 {
        return a1 - b0;
    }
    if b1 < a0 {
        return a0 - b1;
    }
    0.0
}

/// Quadrant of a delta vector, biased toward the dominant axis.
#[inline]
fn dir_quadrant_from_delta(dx: f32, dy: f32) -> Dir {
    if dx.abs() > dy.abs() {
        if dx > 0.0 { Dir::Right } else { Dir::Left }
    } else if dy > 0.0 {
        Dir::Down
    } else {
        Dir::Up
    }
}

/// Clamp the cross axis of `r` into `clip_rect`.
///
/// Clipping on the movement axis would give all off-screen items identical
/// scores; clamping only across it keeps items in other columns (or rows)
/// from being reached by an in-axis move.
fn clamp_to_visible_for_move_dir(move_dir: Dir, r: &mut Rect, clip_rect: &Rect) {
    if move_dir.is_horizontal() {
        r.min.y = r.min.y.clamp(clip_rect.min.y, clip_rect.max.y);
        r.max.y = r.max.y.clamp(clip_rect.min.y, clip_rect.max.y);
    } else {
        r.min.x = r.min.x.clamp(clip_rect.min.x, clip_rect.max.x);
        r.max.x = r.max.x.clamp(clip_rect.min.x, clip_rect.max.x);
    }
}

/// Score one candidate against `result`, updating the stored distances when
/// it wins. Returns true when the caller should record the candidate's
/// identity and rect into the slot.
pub(crate) fn score_item(
    result: &mut NavMoveResult,
    cand: &Candidate,
    params: &ScoreParams,
) -> bool {
    if cand.layer != params.nav_layer {
        return false;
    }

    let curr = params.scoring_rect;
    let mut bb = cand.bb;

    // Items reached through a flattened child border count as fully clipped
    // unless visible, so hidden children never capture an in-parent move.
    if cand.crossing_flattened {
        if !cand.clip_rect.overlaps(&bb) {
            return false;
        }
        bb = bb.clip_with(&cand.clip_rect);
    }

    clamp_to_visible_for_move_dir(params.clip_dir, &mut bb, &cand.clip_rect);

    // Box gap. The vertical interval is shrunk toward the middle 60% so rows
    // that merely graze each other vertically still read as "same row".
    let mut dbx = dist_interval(bb.min.x, bb.max.x, curr.min.x, curr.max.x);
    let dby = dist_interval(
        lerp(bb.min.y, bb.max.y, 0.2),
        lerp(bb.min.y, bb.max.y, 0.8),
        lerp(curr.min.y, curr.max.y, 0.2),
        lerp(curr.min.y, curr.max.y, 0.8),
    );
    if dby != 0.0 && dbx != 0.0 {
        // Diagonal gap: dampen the horizontal term so the vertical distance
        // dominates, keeping column changes expensive.
        dbx = (dbx / 1000.0) + if dbx > 0.0 { 1.0 } else { -1.0 };
    }
    let dist_box = dbx.abs() + dby.abs();

    let dcx = (bb.min.x + bb.max.x) - (curr.min.x + curr.max.x);
    let dcy = (bb.min.y + bb.max.y) - (curr.min.y + curr.max.y);
    let dist_center = dcx.abs() + dcy.abs();

    let (quadrant, dax, day, dist_axial);
    if dbx != 0.0 || dby != 0.0 {
        dax = dbx;
        day = dby;
        dist_axial = dist_box;
        quadrant = dir_quadrant_from_delta(dbx, dby);
    } else if dcx != 0.0 || dcy != 0.0 {
        dax = dcx;
        day = dcy;
        dist_axial = dist_center;
        quadrant = dir_quadrant_from_delta(dcx, dcy);
    } else {
        // Same box, same center. Link by submission order: the currently
        // focused item came earlier, so treat later items as rightward.
        dax = 0.0;
        day = 0.0;
        dist_axial = f32::MAX;
        quadrant = if cand.id < params.nav_id {
            Dir::Left
        } else {
            Dir::Right
        };
    }

    let mut new_best = false;
    if quadrant == params.move_dir {
        if dist_box < result.dist_box {
            result.dist_box = dist_box;
            result.dist_center = dist_center;
            return true;
        }
        if dist_box == result.dist_box {
            if dist_center < result.dist_center {
                result.dist_center = dist_center;
                new_best = true;
            } else if dist_center == result.dist_center {
                // Final tie-breaker: nudge later items down/right by an
                // infinitesimal amount so equal stacks link in submission
                // order along the move axis.
                let tie = if params.move_dir.is_horizontal() {
                    dby
                } else {
                    dbx
                };
                if tie < 0.0 {
                    new_best = true;
                }
            }
        }
    }

    // Axial fallback, menu layers only: with no quadrant match at all, allow
    // any in-axis motion so sparse menu bars stay traversable.
    if result.dist_box == f32::MAX
        && dist_axial < result.dist_axial
        && params.nav_layer == NavLayer::Menu
        && !params.nav_window_flags.contains(WindowFlags::CHILD_MENU)
    {
        let in_axis = match params.move_dir {
            Dir::Left => dax < 0.0,
            Dir::Right => dax > 0.0,
            Dir::Up => day < 0.0,
            Dir::Down => day > 0.0,
        };
        if in_axis {
            result.dist_axial = dist_axial;
            new_best = true;
        }
    }

    new_best
}
