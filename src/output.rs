//! Output scheduling and the driver contract.
//!
//! Provides portable frame pacing without async/await or platform-specific timers.
//! The caller is responsible for sleeping/waiting between frames.

use embassy_time::{Duration, Instant};

use crate::channels::ChannelLayout;
use crate::coord::Coord3D;
use crate::front::{FrameSnapshot, FrontBuffer};
use crate::gate::BufferReadiness;
use crate::pins::PinGroup;

/// Default target frame rate (90 FPS).
pub const DEFAULT_FPS: u32 = 90;

/// Default frame duration based on target FPS.
pub const DEFAULT_FRAME_DURATION: Duration = Duration::from_millis(1000 / DEFAULT_FPS as u64);

/// Everything a driver needs to transmit one frame
#[derive(Debug, Clone, Copy)]
pub struct OutputFrame<'a> {
    /// Bytes in use, `nr_of_lights * channels_per_light`
    pub channels: &'a [u8],
    pub layout: &'a ChannelLayout,
    pub nr_of_lights: usize,
    pub size: Coord3D,
    pub pins: &'a [PinGroup],
}

/// Abstract light driver trait
///
/// Implement this trait to support different hardware platforms and
/// network protocols.
pub trait OutputDriver {
    /// Transmit one frame of channel data
    fn write(&mut self, frame: &OutputFrame<'_>);

    /// Called once after discovery with the position of every light.
    ///
    /// Positions are packed as `[x, y, z]` byte triples back to back,
    /// `3 * nr_of_lights` bytes whatever the channel layout, each axis
    /// clamped to 255.
    fn on_positions(&mut self, _frame: &OutputFrame<'_>) {}
}

/// What happened in one scheduler tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame was handed to the driver
    Written,
    /// A physical pass is running, nothing was sent
    Skipped,
    /// A post-layout state was acknowledged instead of sending a frame
    Acknowledged(BufferReadiness),
}

/// Result of a frame tick operation.
#[derive(Debug, Clone, Copy)]
pub struct FrameResult {
    pub outcome: FrameOutcome,
    /// The deadline for the next frame.
    pub next_deadline: Instant,
    /// How long to wait until the next frame (may be zero if behind schedule).
    pub sleep_duration: Duration,
}

/// Portable output scheduler that manages timing without async.
///
/// This scheduler:
/// - Tracks frame timing with drift correction
/// - Copies the shared frame under the readiness lock
/// - Calls the driver outside the lock
/// - Returns timing info so the caller can sleep appropriately
///
/// It only needs the [`FrontBuffer`], so it can run on another task than
/// the physical layer.
///
/// # Usage
///
/// ```ignore
/// static FRONT: FrontBuffer = FrontBuffer::new();
///
/// // output task
/// let mut scheduler = OutputScheduler::new(driver);
/// loop {
///     let now = get_current_time_ms();
///     let result = scheduler.tick(Instant::from_millis(now), &FRONT);
///
///     // Platform-specific sleep
///     sleep_ms(result.sleep_duration.as_millis() as u64);
/// }
/// ```
pub struct OutputScheduler<O: OutputDriver> {
    output: O,
    local: FrameSnapshot,
    next_frame: Instant,
    frame_duration: Duration,
}

impl<O: OutputDriver> OutputScheduler<O> {
    /// Create a new output scheduler.
    ///
    /// Uses `DEFAULT_FRAME_DURATION` (90 FPS) for frame timing.
    pub fn new(driver: O) -> Self {
        Self::with_frame_duration(driver, DEFAULT_FRAME_DURATION)
    }

    /// Create a new output scheduler with custom frame duration.
    pub fn with_frame_duration(driver: O, frame_duration: Duration) -> Self {
        Self {
            output: driver,
            local: FrameSnapshot::new(),
            next_frame: Instant::from_millis(0),
            frame_duration,
        }
    }

    /// Process one frame and return timing information.
    ///
    /// This method:
    /// 1. Applies drift correction if we've fallen too far behind
    /// 2. Skips the frame while a physical pass runs
    /// 3. Hands positions to the driver once, acknowledging the pass
    /// 4. Otherwise writes the last published frame
    /// 5. Returns the deadline for the next frame
    pub fn tick(&mut self, now: Instant, front: &FrontBuffer) -> FrameResult {
        // Drift correction: if we've fallen too far behind, reset to now
        // This prevents catch-up bursts after long stalls
        let max_drift = Duration::from_millis(self.frame_duration.as_millis() * 2);
        if now.as_millis() > self.next_frame.as_millis() + max_drift.as_millis() {
            self.next_frame = now;
        }

        let (_, found) = front.consume(&mut self.local);
        let outcome = match found {
            BufferReadiness::InProgress => FrameOutcome::Skipped,
            BufferReadiness::PositionsReady | BufferReadiness::PositionsEmpty => {
                self.output.on_positions(&self.local.as_frame());
                FrameOutcome::Acknowledged(found)
            }
            BufferReadiness::Ready => {
                self.output.write(&self.local.as_frame());
                FrameOutcome::Written
            }
        };

        // Calculate next frame deadline
        self.next_frame += self.frame_duration;

        // Calculate sleep duration (may be zero if we're behind)
        let sleep_duration = if self.next_frame.as_millis() > now.as_millis() {
            Duration::from_millis(self.next_frame.as_millis() - now.as_millis())
        } else {
            Duration::from_millis(0)
        };

        FrameResult {
            outcome,
            next_deadline: self.next_frame,
            sleep_duration,
        }
    }

    /// Get a reference to the driver.
    pub fn driver(&self) -> &O {
        &self.output
    }

    /// Get a mutable reference to the driver.
    pub fn driver_mut(&mut self) -> &mut O {
        &mut self.output
    }
}
