//! Buffer readiness state and the short lock around its transitions.
//!
//! The layout engine and the output task agree on a readiness state: while
//! it is [`BufferReadiness::InProgress`] no frame may be transmitted, and
//! the two post-layout states hold position data until the output side
//! acknowledges them. Transitions, and the frame copies that go with them,
//! happen under one lock.

use core::cell::Cell;

use critical_section::{CriticalSection, Mutex};
use embassy_time::{Duration, Instant};

#[cfg(feature = "esp32-log")]
use esp_println::println;

/// Default bound for the first lock attempt
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(100);

/// What the physical buffer currently contains
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum BufferReadiness {
    /// Color data, safe to transmit
    #[default]
    Ready = 0,
    /// A physical pass is writing position data
    InProgress = 1,
    /// Discovery finished with at least one light, not yet acknowledged
    PositionsReady = 2,
    /// Discovery finished without lights, not yet acknowledged
    PositionsEmpty = 3,
}

impl BufferReadiness {
    /// Returns true for the post-layout states the output side acknowledges
    pub const fn needs_ack(self) -> bool {
        matches!(self, Self::PositionsReady | Self::PositionsEmpty)
    }

    /// Returns true if effects may render: no pass is running and no
    /// position data waits for the output side
    pub const fn accepts_effects(self) -> bool {
        matches!(self, Self::Ready | Self::PositionsEmpty)
    }
}

/// How the gate lock was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    /// Within the timeout
    Bounded,
    /// The timeout passed and the caller waited without a bound
    Contended,
}

impl Acquisition {
    pub const fn is_contended(self) -> bool {
        matches!(self, Self::Contended)
    }
}

/// Readiness state guarded by a try-lock with bounded acquisition.
pub struct ReadinessGate {
    locked: Mutex<Cell<bool>>,
    state: Mutex<Cell<BufferReadiness>>,
    contention: Mutex<Cell<u32>>,
    timeout: Duration,
}

impl ReadinessGate {
    pub const fn new(timeout: Duration) -> Self {
        Self {
            locked: Mutex::new(Cell::new(false)),
            state: Mutex::new(Cell::new(BufferReadiness::Ready)),
            contention: Mutex::new(Cell::new(0)),
            timeout,
        }
    }

    /// Current state, without taking the lock
    pub fn readiness(&self) -> BufferReadiness {
        critical_section::with(|cs| self.state.borrow(cs).get())
    }

    /// Number of acquisitions that ran past the timeout
    pub fn contention_events(&self) -> u32 {
        critical_section::with(|cs| self.contention.borrow(cs).get())
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Set a new state under the lock
    pub fn transition(&self, to: BufferReadiness) -> Acquisition {
        let (acquisition, ()) = self.with_lock(|state| *state = to);
        acquisition
    }

    /// Move a post-layout state back to [`BufferReadiness::Ready`].
    ///
    /// Returns the state that was acknowledged, if any.
    pub fn acknowledge(&self) -> (Acquisition, Option<BufferReadiness>) {
        self.with_lock(|state| {
            let previous = *state;
            if previous.needs_ack() {
                *state = BufferReadiness::Ready;
                Some(previous)
            } else {
                None
            }
        })
    }

    /// Run `f` with the state while holding the lock.
    ///
    /// The lock is tried until the timeout passes. After that the
    /// contention is recorded and the caller spins until it gets the lock;
    /// the critical section is never skipped.
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut BufferReadiness) -> R) -> (Acquisition, R) {
        self.with_lock_cs(|_, state| f(state))
    }

    /// Like [`Self::with_lock`], handing `f` the critical section so it can
    /// touch other shared cells in the same step
    pub(crate) fn with_lock_cs<R>(
        &self,
        f: impl FnOnce(CriticalSection<'_>, &mut BufferReadiness) -> R,
    ) -> (Acquisition, R) {
        let acquisition = self.acquire();

        let result = critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut state = cell.get();
            let result = f(cs, &mut state);
            cell.set(state);
            result
        });

        critical_section::with(|cs| self.locked.borrow(cs).set(false));
        (acquisition, result)
    }

    fn try_acquire(&self) -> bool {
        critical_section::with(|cs| {
            let locked = self.locked.borrow(cs);
            if locked.get() {
                false
            } else {
                locked.set(true);
                true
            }
        })
    }

    fn acquire(&self) -> Acquisition {
        if self.try_acquire() {
            return Acquisition::Bounded;
        }

        let started = Instant::now();
        while started.elapsed() < self.timeout {
            if self.try_acquire() {
                return Acquisition::Bounded;
            }
            core::hint::spin_loop();
        }

        critical_section::with(|cs| {
            let count = self.contention.borrow(cs);
            count.set(count.get().saturating_add(1));
        });
        #[cfg(feature = "esp32-log")]
        println!(
            "[moonmap] buffer lock not acquired within {} ms, waiting",
            self.timeout.as_millis()
        );

        while !self.try_acquire() {
            core::hint::spin_loop();
        }
        Acquisition::Contended
    }

    #[cfg(test)]
    fn set_locked(&self, locked: bool) {
        critical_section::with(|cs| self.locked.borrow(cs).set(locked));
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_TIMEOUT)
    }
}
