//! Reduced-motion gate.
//!
//! Read once when the context is created and never re-evaluated: a user who
//! flips the OS preference mid-session keeps the behaviour chosen at load.

use crate::host::Host;
use serde::{Deserialize, Serialize};

/// Media query for the reduced-motion accessibility preference
pub const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

/// Media query for devices with a hover-capable pointer
pub const HOVER_QUERY: &str = "(hover: hover)";

/// Resolved motion preference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionPreference {
    reduced: bool,
}

impl MotionPreference {
    /// Evaluate the reduced-motion media query once
    #[must_use]
    pub fn detect<P: Host>(host: &P) -> Self {
        let reduced = host.media_matches(REDUCED_MOTION_QUERY);
        tracing::debug!(reduced, "motion preference resolved");
        Self { reduced }
    }

    /// Full motion allowed
    #[must_use]
    pub const fn full() -> Self {
        Self { reduced: false }
    }

    /// Reduced motion requested
    #[must_use]
    pub const fn reduced() -> Self {
        Self { reduced: true }
    }

    /// Whether motion should be suppressed
    #[must_use]
    pub const fn is_reduced(self) -> bool {
        self.reduced
    }
}
