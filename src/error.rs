//! Recoverable layout conditions.
//!
//! Nothing in the mapping engine is fatal: every condition below degrades
//! to "fewer working lights" and is reported back to the control loop.

use core::fmt;

use heapless::Vec;

/// Maximum number of warnings kept in a single [`LayoutReport`]
pub const MAX_REPORTED_WARNINGS: usize = 8;

/// Which limit was hit when a light could not be mapped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityKind {
    /// The configured light ceiling (or buffer capacity) was reached
    LightCeiling,
    /// A physical index or pool group does not fit the 14-bit payload
    PackedRange,
    /// A virtual index exceeds the addressable table size
    VirtualIndex,
    /// All pin groups are in use
    Pins,
}

/// Recoverable condition raised while laying out lights
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutError {
    /// A light was ignored because a limit was reached
    CapacityExceeded { kind: CapacityKind, index: usize },
    /// Growing an indirection table or pool failed, the previous size is kept
    Allocation { requested: usize },
    /// Bounded lock acquisition timed out and fell back to blocking
    LockContention,
    /// A layout call was made outside of the pass it belongs to
    InvalidPass,
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded { kind, index } => {
                write!(f, "capacity exceeded ({kind:?}) at index {index}")
            }
            Self::Allocation { requested } => {
                write!(f, "allocation of {requested} entries failed")
            }
            Self::LockContention => f.write_str("buffer lock contended"),
            Self::InvalidPass => f.write_str("call is not valid in the current layout pass"),
        }
    }
}

/// Outcome of one [`crate::PhysicalLayer::run_pending_layout`] call
#[derive(Debug, Clone, Default)]
pub struct LayoutReport {
    /// Physical discovery ran
    pub physical: bool,
    /// Virtual projection ran
    pub virtual_pass: bool,
    /// Lights discovered in the physical pass (or kept from the last one)
    pub lights: usize,
    warnings: Vec<LayoutError, MAX_REPORTED_WARNINGS>,
    dropped: usize,
}

impl LayoutReport {
    /// Returns true if neither pass ran
    pub const fn is_idle(&self) -> bool {
        !self.physical && !self.virtual_pass
    }

    /// Record a recoverable warning
    ///
    /// Warnings past the report capacity are only counted.
    pub fn warn(&mut self, warning: LayoutError) {
        if self.warnings.push(warning).is_err() {
            self.dropped += 1;
        }
    }

    /// Recorded warnings, oldest first
    pub fn warnings(&self) -> &[LayoutError] {
        &self.warnings
    }

    /// Number of warnings that did not fit in the report
    pub const fn dropped_warnings(&self) -> usize {
        self.dropped
    }

    /// Returns true if no warning was raised
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.dropped == 0
    }
}
