//! Pin groups found during physical discovery.
//!
//! Light sources close a group of consecutive lights with `next_pin`.
//! Drivers with several data lines send each group on its own pin.

use heapless::Vec;

use crate::error::{CapacityKind, LayoutError};

/// Maximum number of pin groups
pub const MAX_PINS: usize = 20;

/// Where a pin group is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinAssignment {
    /// GPIO named by the light source
    Gpio(u8),
    /// Next driver output in discovery order
    Output(u8),
}

/// Consecutive lights sent on one pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinGroup {
    pub pin: PinAssignment,
    /// Physical index of the first light
    pub start: usize,
    pub nr_of_lights: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PinTable {
    groups: Vec<PinGroup, MAX_PINS>,
    closed: usize,
}

impl PinTable {
    pub const fn new() -> Self {
        Self {
            groups: Vec::new(),
            closed: 0,
        }
    }

    pub fn reset(&mut self) {
        self.groups.clear();
        self.closed = 0;
    }

    pub fn groups(&self) -> &[PinGroup] {
        &self.groups
    }

    /// Close the lights registered since the last group.
    ///
    /// `lights` is the number of lights registered so far. Empty groups
    /// still take a pin so explicit pins keep their order.
    pub fn advance(&mut self, pin: Option<u8>, lights: usize) -> Result<(), LayoutError> {
        let ordinal = u8::try_from(self.groups.len()).unwrap_or(u8::MAX);
        let group = PinGroup {
            pin: pin.map_or(PinAssignment::Output(ordinal), PinAssignment::Gpio),
            start: self.closed,
            nr_of_lights: lights.saturating_sub(self.closed),
        };
        self.closed = lights;
        self.groups.push(group).map_err(|_| LayoutError::CapacityExceeded {
            kind: CapacityKind::Pins,
            index: MAX_PINS,
        })
    }

    /// Close a trailing group that no `next_pin` call ended
    pub fn finish(&mut self, lights: usize) -> Result<(), LayoutError> {
        if lights > self.closed {
            self.advance(None, lights)
        } else {
            Ok(())
        }
    }
}
