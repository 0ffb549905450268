//! Indirection table and many-physical pool.
//!
//! Both structures keep their backing storage between layout passes and
//! only move a logical "used" length, so a relayout does not fragment a
//! small heap. Growth is fallible: when an allocation fails the previous
//! contents and logical size stay intact.

use alloc::vec::Vec;

use crate::error::{CapacityKind, LayoutError};
use crate::physmap::{MAX_PAYLOAD, PackedPhysMap, PhysMapEntry, Rgb14};

/// Largest number of slots a single indirection table can address
pub const MAX_VIRTUAL_LIGHTS: usize = u16::MAX as usize + 1;

/// Groups of physical indices sharing one virtual slot
#[derive(Debug, Default)]
pub struct ManyPhysicalPool {
    groups: Vec<Vec<u16>>,
    used: usize,
}

impl ManyPhysicalPool {
    pub const fn new() -> Self {
        Self {
            groups: Vec::new(),
            used: 0,
        }
    }

    /// Number of groups in use
    pub const fn len(&self) -> usize {
        self.used
    }

    pub const fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Number of groups with backing storage, used or not
    pub fn capacity(&self) -> usize {
        self.groups.len()
    }

    /// Forget all groups, keeping their storage for the next pass
    pub fn reset(&mut self) {
        self.used = 0;
    }

    /// Members of a group, in insertion order
    pub fn members(&self, group: u16) -> &[u16] {
        let group = usize::from(group);
        if group >= self.used {
            return &[];
        }
        &self.groups[group]
    }

    /// Open a new group seeded with two physical indices
    ///
    /// Returns the new group index.
    pub fn push_group(&mut self, first: u16, second: u16) -> Result<u16, LayoutError> {
        let Ok(index) = u16::try_from(self.used) else {
            return Err(capacity_error(self.used));
        };
        if index > MAX_PAYLOAD {
            return Err(capacity_error(self.used));
        }

        if self.used < self.groups.len() {
            let group = &mut self.groups[self.used];
            group.clear();
            group
                .try_reserve(2)
                .map_err(|_| LayoutError::Allocation { requested: 2 })?;
            group.push(first);
            group.push(second);
        } else {
            self.groups
                .try_reserve(1)
                .map_err(|_| LayoutError::Allocation {
                    requested: self.groups.len() + 1,
                })?;
            let mut group = Vec::new();
            group
                .try_reserve(2)
                .map_err(|_| LayoutError::Allocation { requested: 2 })?;
            group.push(first);
            group.push(second);
            self.groups.push(group);
        }

        self.used += 1;
        Ok(index)
    }

    /// Append a physical index to an existing group
    pub fn append(&mut self, group: u16, physical: u16) -> Result<(), LayoutError> {
        let index = usize::from(group);
        if index >= self.used {
            return Err(capacity_error(index));
        }
        let members = &mut self.groups[index];
        members
            .try_reserve(1)
            .map_err(|_| LayoutError::Allocation {
                requested: members.len() + 1,
            })?;
        members.push(physical);
        Ok(())
    }
}

const fn capacity_error(index: usize) -> LayoutError {
    LayoutError::CapacityExceeded {
        kind: CapacityKind::PackedRange,
        index,
    }
}

/// Virtual index to physical mapping of one layer
#[derive(Debug, Default)]
pub struct IndirectionTable {
    slots: Vec<PackedPhysMap>,
    used: usize,
}

impl IndirectionTable {
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            used: 0,
        }
    }

    /// Logical number of slots
    pub const fn len(&self) -> usize {
        self.used
    }

    pub const fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Number of slots with backing storage
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Drop the logical size to zero, keeping the backing storage
    pub fn reset(&mut self) {
        self.used = 0;
    }

    /// Make sure `len` slots are in use, growing the backing storage if needed.
    ///
    /// Newly exposed slots start as empty [`PhysMapEntry::NoPhysical`].
    /// On failure the table keeps its previous logical size.
    pub fn ensure_len(&mut self, len: usize) -> Result<(), LayoutError> {
        if len <= self.used {
            return Ok(());
        }
        if len > MAX_VIRTUAL_LIGHTS {
            return Err(LayoutError::CapacityExceeded {
                kind: CapacityKind::VirtualIndex,
                index: len - 1,
            });
        }
        if len > self.slots.len() {
            self.slots
                .try_reserve(len - self.slots.len())
                .map_err(|_| LayoutError::Allocation { requested: len })?;
            self.slots.resize(len, PackedPhysMap::EMPTY);
        }
        // slots past the old logical end may hold data of a previous pass
        self.slots[self.used..len].fill(PackedPhysMap::EMPTY);
        self.used = len;
        Ok(())
    }

    /// Entry at `index`, `None` past the logical end
    pub fn get(&self, index: usize) -> Option<PhysMapEntry> {
        if index >= self.used {
            return None;
        }
        Some(self.slots[index].unpack())
    }

    /// Entries in virtual index order
    pub fn entries(&self) -> impl Iterator<Item = PhysMapEntry> + '_ {
        self.slots[..self.used].iter().map(|slot| slot.unpack())
    }

    /// Packed entries, the form stored in memory
    pub fn packed(&self) -> &[PackedPhysMap] {
        &self.slots[..self.used]
    }

    /// Add a physical light to a slot.
    ///
    /// The slot kind only moves forward: `NoPhysical -> OnePhysical ->
    /// ManyPhysical`. Promotion from `NoPhysical` discards the color cache.
    /// On error the slot keeps its previous state.
    pub fn insert(
        &mut self,
        index: usize,
        physical: u16,
        pool: &mut ManyPhysicalPool,
    ) -> Result<(), LayoutError> {
        let Some(current) = self.get(index) else {
            return Err(LayoutError::CapacityExceeded {
                kind: CapacityKind::VirtualIndex,
                index,
            });
        };

        let next = match current {
            PhysMapEntry::NoPhysical(_) => PhysMapEntry::OnePhysical(physical),
            PhysMapEntry::OnePhysical(first) => {
                if physical > MAX_PAYLOAD {
                    return Err(capacity_error(usize::from(physical)));
                }
                PhysMapEntry::ManyPhysical(pool.push_group(first, physical)?)
            }
            PhysMapEntry::ManyPhysical(group) => {
                pool.append(group, physical)?;
                return Ok(());
            }
        };

        let packed = next
            .pack()
            .ok_or_else(|| capacity_error(usize::from(physical)))?;
        self.slots[index] = packed;
        Ok(())
    }

    /// Store a color in a virtual-only slot.
    ///
    /// Slots backed by physical lights are left alone.
    pub fn store_cache(&mut self, index: usize, cache: Rgb14) {
        if let Some(PhysMapEntry::NoPhysical(_)) = self.get(index) {
            if let Some(packed) = PhysMapEntry::NoPhysical(cache).pack() {
                self.slots[index] = packed;
            }
        }
    }

    /// Count slots per kind
    pub fn stats(&self, pool: &ManyPhysicalPool) -> MappingStats {
        let mut stats = MappingStats::default();
        for entry in self.entries() {
            match entry {
                PhysMapEntry::NoPhysical(_) => stats.zero += 1,
                PhysMapEntry::OnePhysical(_) => stats.one += 1,
                PhysMapEntry::ManyPhysical(group) => {
                    stats.many_slots += 1;
                    stats.many_lights += pool.members(group).len();
                }
            }
        }
        stats
    }
}

/// Summary of a layer's mapping after a virtual pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MappingStats {
    /// Slots without a physical light
    pub zero: usize,
    /// Slots with exactly one physical light
    pub one: usize,
    /// Slots with several physical lights
    pub many_slots: usize,
    /// Physical lights behind the many-physical slots
    pub many_lights: usize,
    /// Physical lights that a modifier excluded
    pub suppressed: usize,
    /// Physical lights dropped because the table could not hold them
    pub unmapped: usize,
}
