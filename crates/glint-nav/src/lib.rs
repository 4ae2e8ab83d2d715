#![forbid(unsafe_code)]

//! Navigation runtime: interaction registry, press protocol, and
//! directional navigation for Glint.
//!
//! # Role in Glint
//! `glint-nav` is the interaction layer of an immediate-mode UI. The host
//! submits windows and item rectangles every frame; this crate decides who
//! is hovered, who holds capture, where keyboard/gamepad focus sits, and
//! how focus moves in response to directional input.
//!
//! # Primary responsibilities
//! - **InteractionRegistry**: ActiveId / HoveredId / NavId and their timers.
//! - **Button protocol**: `button_behavior`, one routine behind every
//!   clickable widget, merging pointer and navigation activation.
//! - **Directional navigation**: spatial scoring of candidate rectangles,
//!   wrap/loop handling, page moves, and default-focus initialization.
//! - **Windowing overlay**: window cycling (Ctrl+Tab, gamepad menu hold)
//!   and the menu-layer toggle.
//! - **Render hooks**: `DrawSink` primitives for the focus ring and the
//!   overlay, so the core stays renderer-agnostic.
//!
//! # Frame protocol
//! ```text
//! ctx.begin_frame(snapshot, dt);
//!   ctx.begin_window(..); ctx.item_add(..); ctx.button_behavior(..); ...
//! ctx.end_frame();
//! ```
//! Requests raised by one frame (directional moves, init, wrap) are scored
//! against that frame's submissions and applied at the next `begin_frame`,
//! which is what makes a retained widget tree unnecessary.

pub mod button;
pub mod context;
pub mod draw;
pub mod engine;
pub mod registry;
pub mod scoring;
pub mod window;
pub mod windowing;

pub use button::{ButtonFlags, ButtonResponse};
pub use context::{ItemFlags, NavConfig, UiContext};
pub use draw::{Color, DrawSink, NavHighlightFlags, render_nav_highlight, render_windowing_overlay};
pub use engine::NavMoveFlags;
pub use registry::{InputSource, InteractionRegistry};
pub use scoring::NavMoveResult;
pub use window::{NavLayer, PopupEntry, PopupStack, Window, WindowFlags, WindowId, Windows};
pub use windowing::WindowingState;

// The shared vocabulary types, so hosts depend on one crate.
pub use glint_core::geometry::{Dir, Rect, Vec2};
pub use glint_core::id::WidgetId;
pub use glint_core::input::{
    InputSnapshot, InputState, Key, Modifiers, MouseButton, NavInput, NavReadMode,
};
pub use glint_core::metrics::Metrics;
