#![forbid(unsafe_code)]

//! Logging facade.
//!
//! Re-exports the `tracing` macros so downstream crates can write
//! `glint_core::debug!(...)` without depending on `tracing` directly.
//! Only compiled when the `tracing` feature is enabled.

#[cfg(feature = "tracing")]
pub use tracing::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};
