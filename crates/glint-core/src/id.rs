#![forbid(unsafe_code)]

//! Opaque widget identity.
//!
//! Identities are produced by an external id-stack hashing collaborator;
//! this crate never inspects their provenance. The only requirements are
//! equality comparison and per-frame stability. `0` is reserved as the
//! "no widget" sentinel.

/// Opaque, per-frame-stable handle for one interactive element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct WidgetId(pub u64);

impl WidgetId {
    /// The "no widget" sentinel.
    pub const NONE: WidgetId = WidgetId(0);

    /// True if this is the sentinel.
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// True if this refers to an actual widget.
    #[inline]
    pub const fn is_some(self) -> bool {
        self.0 != 0
    }
}

impl std::fmt::Display for WidgetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
