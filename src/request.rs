//! Layout requests shared between tasks.
//!
//! Any task (a web handler, a button interrupt, the control loop itself)
//! can ask for a relayout. Requests only set flags; the control loop
//! drains them at the start of [`crate::PhysicalLayer::run_pending_layout`],
//! so many requests in one tick coalesce into one relayout.
//! Thread/interrupt safe via critical sections.

use core::cell::Cell;

use critical_section::Mutex;

const FLAG_PHYSICAL: u8 = 1 << 0;
const FLAG_VIRTUAL: u8 = 1 << 1;

/// Which layout pass to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    /// Rediscover the physical lights. Always followed by a virtual pass,
    /// since every layer derives its size from the physical bounding box.
    Physical,
    /// Rebuild the indirection tables from the last physical discovery
    Virtual,
}

impl LayoutKind {
    const fn flags(self) -> u8 {
        match self {
            Self::Physical => FLAG_PHYSICAL | FLAG_VIRTUAL,
            Self::Virtual => FLAG_VIRTUAL,
        }
    }
}

/// Passes waiting to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingLayout {
    pub physical: bool,
    pub virtual_pass: bool,
}

impl PendingLayout {
    const fn from_flags(flags: u8) -> Self {
        Self {
            physical: flags & FLAG_PHYSICAL != 0,
            virtual_pass: flags & FLAG_VIRTUAL != 0,
        }
    }

    const fn flags(self) -> u8 {
        let mut flags = 0;
        if self.physical {
            flags |= FLAG_PHYSICAL;
        }
        if self.virtual_pass {
            flags |= FLAG_VIRTUAL;
        }
        flags
    }

    /// Add a request
    pub fn request(&mut self, kind: LayoutKind) {
        *self = Self::from_flags(self.flags() | kind.flags());
    }

    /// Combine with other pending passes
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        Self::from_flags(self.flags() | other.flags())
    }

    pub const fn is_empty(self) -> bool {
        !self.physical && !self.virtual_pass
    }
}

/// Layout request flags that can be set from any task.
pub struct LayoutRequests {
    inner: Mutex<Cell<u8>>,
}

impl LayoutRequests {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new(0)),
        }
    }

    /// Get a requester handle.
    ///
    /// Multiple requesters can coexist; they set the same flags.
    pub const fn requester(&self) -> LayoutRequester<'_> {
        LayoutRequester { requests: self }
    }

    /// Request a pass. Repeated requests before the next drain are merged.
    pub fn request(&self, kind: LayoutKind) {
        critical_section::with(|cs| {
            let flags = self.inner.borrow(cs);
            flags.set(flags.get() | kind.flags());
        });
    }

    /// Passes requested so far, without clearing them
    pub fn peek(&self) -> PendingLayout {
        critical_section::with(|cs| PendingLayout::from_flags(self.inner.borrow(cs).get()))
    }

    /// Take and clear every pending request
    pub fn take(&self) -> PendingLayout {
        critical_section::with(|cs| PendingLayout::from_flags(self.inner.borrow(cs).replace(0)))
    }
}

impl Default for LayoutRequests {
    fn default() -> Self {
        Self::new()
    }
}

/// A requester handle for [`LayoutRequests`].
///
/// This is a lightweight reference that can be copied and passed around.
#[derive(Clone, Copy)]
pub struct LayoutRequester<'a> {
    requests: &'a LayoutRequests,
}

impl LayoutRequester<'_> {
    pub fn request(&self, kind: LayoutKind) {
        self.requests.request(kind);
    }
}
