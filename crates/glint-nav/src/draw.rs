#![forbid(unsafe_code)]

//! Render hooks.
//!
//! The core never draws; hosts hand in a [`DrawSink`] and the helpers here
//! emit the focus highlight and the windowing overlay as plain primitives.

use glint_core::geometry::{Rect, Vec2};
use glint_core::id::WidgetId;

use bitflags::bitflags;

use crate::context::UiContext;

/// Straight-alpha RGBA color, components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    #[must_use]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with `alpha` multiplied in.
    #[must_use]
    pub fn fade(self, alpha: f32) -> Self {
        Self {
            a: self.a * alpha,
            ..self
        }
    }
}

/// Focus ring color.
pub const NAV_HIGHLIGHT: Color = Color::rgba(0.26, 0.59, 0.98, 1.0);
/// Full-screen dim behind the windowing overlay.
pub const OVERLAY_DIM: Color = Color::rgba(0.10, 0.10, 0.10, 0.60);
/// Border around the overlay's highlighted window.
pub const OVERLAY_HIGHLIGHT: Color = Color::rgba(1.0, 1.0, 1.0, 0.70);

bitflags! {
    /// Variants for [`render_nav_highlight`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NavHighlightFlags: u8 {
        /// Thin one-pixel ring instead of the default thick one.
        const TYPE_THIN   = 1 << 0;
        /// Draw even while the highlight is suppressed by pointer use.
        const ALWAYS_DRAW = 1 << 1;
    }
}

/// Primitive sink the host implements on top of its renderer.
pub trait DrawSink {
    /// Axis-aligned rectangle; `filled` false means outline of `thickness`.
    fn add_rect(&mut self, rect: Rect, color: Color, filled: bool, thickness: f32);
    /// Circle outline (or disc when `filled`).
    fn add_circle(&mut self, center: Vec2, radius: f32, color: Color, filled: bool);
    /// Line segment.
    fn add_line(&mut self, a: Vec2, b: Vec2, color: Color, thickness: f32);
    /// Text run anchored at its top-left corner.
    fn add_text(&mut self, pos: Vec2, color: Color, text: &str);
}

/// Draw the focus ring around `bb` if `id` currently holds navigation
/// focus and the highlight is not suppressed by pointer interaction.
pub fn render_nav_highlight(
    ctx: &UiContext,
    sink: &mut dyn DrawSink,
    bb: Rect,
    id: WidgetId,
    flags: NavHighlightFlags,
) {
    if id.is_none() || id != ctx.nav_id() {
        return;
    }
    if ctx.registry().highlight_disabled() && !flags.contains(NavHighlightFlags::ALWAYS_DRAW) {
        return;
    }
    if flags.contains(NavHighlightFlags::TYPE_THIN) {
        sink.add_rect(bb, NAV_HIGHLIGHT, false, 1.0);
    } else {
        let ring = bb.expand(2.0);
        sink.add_rect(ring, NAV_HIGHLIGHT, false, 2.0);
    }
}

/// Draw the window-cycling overlay: a screen dim that fades in after the
/// gesture delay plus a border around the window that would be focused.
///
/// No-op until the overlay's highlight alpha rises above zero.
pub fn render_windowing_overlay(ctx: &UiContext, sink: &mut dyn DrawSink) {
    let windowing = ctx.windowing();
    let alpha = windowing.highlight_alpha();
    if alpha <= 0.0 {
        return;
    }
    let display = Rect::from_min_size(Vec2::ZERO, ctx.input().snapshot.display_size);
    sink.add_rect(display, OVERLAY_DIM.fade(alpha), true, 0.0);
    if let Some(target) = windowing.target() {
        let rect = ctx.window(target).rect.expand(3.0);
        sink.add_rect(rect, OVERLAY_HIGHLIGHT.fade(alpha), false, 2.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::WindowFlags;
    use glint_core::input::InputSnapshot;

    #[derive(Default)]
    struct RecordingSink {
        rects: Vec<(Rect, Color, bool)>,
    }

    impl DrawSink for RecordingSink {
        fn add_rect(&mut self, rect: Rect, color: Color, filled: bool, _thickness: f32) {
            self.rects.push((rect, color, filled));
        }
        fn add_circle(&mut self, _center: Vec2, _radius: f32, _color: Color, _filled: bool) {}
        fn add_line(&mut self, _a: Vec2, _b: Vec2, _color: Color, _thickness: f32) {}
        fn add_text(&mut self, _pos: Vec2, _color: Color, _text: &str) {}
    }

    const WIN: Rect = Rect::from_ltrb(0.0, 0.0, 200.0, 200.0);
    const BB: Rect = Rect::from_ltrb(10.0, 10.0, 110.0, 40.0);
    const ID: WidgetId = WidgetId(3);

    fn frame(ctx: &mut UiContext) {
        ctx.begin_frame(InputSnapshot::default(), 0.016);
        ctx.begin_window(1, WIN, WindowFlags::empty());
        ctx.item_add(ID, BB);
        ctx.end_window();
        ctx.end_frame();
    }

    #[test]
    fn highlight_draws_only_for_focused_id() {
        let mut ctx = UiContext::new();
        frame(&mut ctx);
        frame(&mut ctx);
        assert_eq!(ctx.nav_id(), ID);

        let mut sink = RecordingSink::default();
        render_nav_highlight(&ctx, &mut sink, BB, WidgetId(99), NavHighlightFlags::empty());
        assert!(sink.rects.is_empty());
        render_nav_highlight(&ctx, &mut sink, BB, ID, NavHighlightFlags::empty());
        assert_eq!(sink.rects.len(), 1);
        assert!(!sink.rects[0].2);
    }

    #[test]
    fn overlay_silent_at_zero_alpha() {
        let mut ctx = UiContext::new();
        frame(&mut ctx);
        let mut sink = RecordingSink::default();
        render_windowing_overlay(&ctx, &mut sink);
        assert!(sink.rects.is_empty());
    }
}
