#![forbid(unsafe_code)]

//! Core: geometry, identity, and per-frame input for Glint.
//!
//! # Role in Glint
//! `glint-core` is the input layer. It owns the shared vocabulary types
//! (rectangles, directions, widget identities) and the per-frame input
//! snapshot that the navigation runtime consumes.
//!
//! # Primary responsibilities
//! - **Geometry**: `Vec2`/`Rect` primitives used for hit testing and scoring.
//! - **WidgetId**: opaque, equality-comparable identity handle.
//! - **InputSnapshot**: immutable pre-sampled input for one frame.
//! - **InputState**: cross-frame duration tracking and the abstract
//!   navigation-input vector (keyboard/gamepad normalization, key repeat).
//!
//! # How it fits in the system
//! The runtime (`glint-nav`) consumes `glint-core` types and drives the
//! interaction registry and navigation engine. Nothing in this crate holds a
//! clock: all timers advance from a host-supplied elapsed-time value.

pub mod geometry;
pub mod id;
pub mod input;
pub mod logging;
pub mod metrics;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};
