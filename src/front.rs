//! Front buffer shared between the layout engine and the output task.
//!
//! The physical layer renders into its own working buffer and never hands
//! that buffer to another task. What the output side transmits is a
//! snapshot in the [`FrontBuffer`]: position triples after discovery, or
//! the colors of the last [`publish`](crate::PhysicalLayer::publish).
//! Every snapshot change happens together with its readiness transition,
//! under the gate lock, so a driver never sees positions as colors or a
//! frame copied halfway through a pass.

use core::cell::RefCell;

use alloc::vec::Vec;
use critical_section::Mutex;
use embassy_time::Duration;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::channels::{ChannelLayout, LightPreset};
use crate::coord::Coord3D;
use crate::gate::{Acquisition, BufferReadiness, DEFAULT_LOCK_TIMEOUT, ReadinessGate};
use crate::lights::Lights;
use crate::output::OutputFrame;
use crate::pins::PinTable;

/// One frame as the output side sees it
#[derive(Debug)]
pub struct FrameSnapshot {
    channels: Vec<u8>,
    len: usize,
    layout: ChannelLayout,
    nr_of_lights: usize,
    size: Coord3D,
    pins: PinTable,
}

impl FrameSnapshot {
    pub const fn new() -> Self {
        Self {
            channels: Vec::new(),
            len: 0,
            layout: LightPreset::Rgb.layout(),
            nr_of_lights: 0,
            size: Coord3D::ZERO,
            pins: PinTable::new(),
        }
    }

    /// Bytes the snapshot can hold without allocating
    pub fn capacity(&self) -> usize {
        self.channels.len()
    }

    /// Grow the storage to `capacity` bytes.
    ///
    /// Returns false, keeping the old storage, if the heap cannot hold it.
    pub fn ensure_capacity(&mut self, capacity: usize) -> bool {
        if capacity <= self.channels.len() {
            return true;
        }
        if self
            .channels
            .try_reserve_exact(capacity - self.channels.len())
            .is_err()
        {
            return false;
        }
        self.channels.resize(capacity, 0);
        true
    }

    /// Bytes in use
    pub fn channels(&self) -> &[u8] {
        &self.channels[..self.len]
    }

    /// Driver view of the snapshot
    pub fn as_frame(&self) -> OutputFrame<'_> {
        OutputFrame {
            channels: self.channels(),
            layout: &self.layout,
            nr_of_lights: self.nr_of_lights,
            size: self.size,
            pins: self.pins.groups(),
        }
    }

    /// Copy another snapshot without allocating; bytes past the capacity
    /// are cut off
    pub(crate) fn copy_from(&mut self, other: &Self) {
        self.fill(other.channels(), other.layout, other.nr_of_lights, other.size, &other.pins);
    }

    fn fill(
        &mut self,
        channels: &[u8],
        layout: ChannelLayout,
        nr_of_lights: usize,
        size: Coord3D,
        pins: &PinTable,
    ) {
        let len = channels.len().min(self.channels.len());
        self.channels[..len].copy_from_slice(&channels[..len]);
        self.len = len;
        self.layout = layout;
        self.nr_of_lights = nr_of_lights;
        self.size = size;
        self.pins.clone_from(pins);
    }

    /// Black frame over every light, replacing position data
    fn blank(&mut self) {
        let len = self
            .nr_of_lights
            .saturating_mul(self.layout.stride())
            .min(self.channels.len());
        self.channels[..len].fill(0);
        self.len = len;
    }
}

impl Default for FrameSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

/// Readiness gate plus the snapshot it guards
pub struct FrontBuffer {
    gate: ReadinessGate,
    frame: Mutex<RefCell<FrameSnapshot>>,
}

impl FrontBuffer {
    pub const fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    /// Front buffer whose lock is tried for `timeout` before waiting
    /// without a bound
    pub const fn with_lock_timeout(timeout: Duration) -> Self {
        Self {
            gate: ReadinessGate::new(timeout),
            frame: Mutex::new(RefCell::new(FrameSnapshot::new())),
        }
    }

    pub const fn gate(&self) -> &ReadinessGate {
        &self.gate
    }

    pub fn readiness(&self) -> BufferReadiness {
        self.gate.readiness()
    }

    /// Bytes the shared snapshot can hold
    pub fn capacity(&self) -> usize {
        critical_section::with(|cs| self.frame.borrow_ref(cs).capacity())
    }

    /// Size the shared snapshot for a buffer of `capacity` bytes.
    ///
    /// The allocation happens outside the critical section.
    pub(crate) fn allocate(&self, capacity: usize) -> bool {
        if capacity <= self.capacity() {
            return true;
        }
        let mut storage = Vec::new();
        if storage.try_reserve_exact(capacity).is_err() {
            #[cfg(feature = "esp32-log")]
            println!("[moonmap] no room for a {} byte front buffer", capacity);
            return false;
        }
        storage.resize(capacity, 0);

        critical_section::with(|cs| {
            let mut frame = self.frame.borrow_ref_mut(cs);
            if frame.channels.len() < capacity {
                core::mem::swap(&mut frame.channels, &mut storage);
                frame.len = 0;
            }
        });
        true
    }

    /// Store the position triples of a finished discovery and move to
    /// `readiness` in the same step
    pub(crate) fn publish_positions(
        &self,
        positions: &[u8],
        lights: &Lights,
        pins: &PinTable,
        readiness: BufferReadiness,
    ) -> Acquisition {
        let (acquisition, ()) = self.gate.with_lock_cs(|cs, state| {
            self.frame.borrow_ref_mut(cs).fill(
                positions,
                *lights.layout(),
                lights.nr_of_lights(),
                lights.size(),
                pins,
            );
            *state = readiness;
        });
        acquisition
    }

    /// Copy the colors in use to the snapshot.
    ///
    /// Refused (returns false) unless the state is
    /// [`BufferReadiness::Ready`], so unacknowledged positions are never
    /// overwritten.
    pub(crate) fn publish(&self, lights: &Lights, pins: &PinTable) -> (Acquisition, bool) {
        self.gate.with_lock_cs(|cs, state| {
            if *state != BufferReadiness::Ready {
                return false;
            }
            let used = lights.nr_of_channels().min(lights.channels().len());
            self.frame.borrow_ref_mut(cs).fill(
                &lights.channels()[..used],
                *lights.layout(),
                lights.nr_of_lights(),
                lights.size(),
                pins,
            );
            true
        })
    }

    /// Take the current frame into `local`.
    ///
    /// Returns the state found. Post-layout states are acknowledged: the
    /// positions are copied out, the shared snapshot is blanked and the
    /// state moves to [`BufferReadiness::Ready`]. Nothing is copied while a
    /// pass is in progress.
    pub fn consume(&self, local: &mut FrameSnapshot) -> (Acquisition, BufferReadiness) {
        // allocate before taking the lock
        if !local.ensure_capacity(self.capacity()) {
            #[cfg(feature = "esp32-log")]
            println!("[moonmap] output copy truncated to {} bytes", local.capacity());
        }

        self.gate.with_lock_cs(|cs, state| {
            let found = *state;
            match found {
                BufferReadiness::InProgress => {}
                BufferReadiness::Ready => local.copy_from(&self.frame.borrow_ref(cs)),
                BufferReadiness::PositionsReady | BufferReadiness::PositionsEmpty => {
                    let mut frame = self.frame.borrow_ref_mut(cs);
                    local.copy_from(&frame);
                    frame.blank();
                    *state = BufferReadiness::Ready;
                }
            }
            found
        })
    }
}

impl Default for FrontBuffer {
    fn default() -> Self {
        Self::new()
    }
}
