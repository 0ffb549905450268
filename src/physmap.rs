//! Per-slot mapping record and its 16-bit packed form.
//!
//! In memory the record is the [`PhysMapEntry`] sum type. Indirection
//! tables hold tens of thousands of slots, so they store the
//! [`PackedPhysMap`] form instead: 2 bits of kind and 14 bits of payload.

use crate::color::Rgb;

/// Largest value that fits the 14-bit payload
pub const MAX_PAYLOAD: u16 = (1 << 14) - 1;

const KIND_SHIFT: u16 = 14;
const KIND_NO_PHYSICAL: u16 = 0;
const KIND_ONE_PHYSICAL: u16 = 1;
const KIND_MANY_PHYSICAL: u16 = 2;

/// Color cache of a virtual-only slot, quantized to 5/5/4 bits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rgb14(u16);

impl Rgb14 {
    pub const BLACK: Self = Self(0);

    /// Quantize a color, rounding to the nearest representable step
    pub fn from_rgb(color: Rgb) -> Self {
        let r = u16::from(color.r.saturating_add(3) >> 3);
        let g = u16::from(color.g.saturating_add(3) >> 3);
        let b = u16::from(color.b.saturating_add(7) >> 4);
        Self((r << 9) | (g << 4) | b)
    }

    /// Expand back to 8 bits per channel
    #[allow(clippy::cast_possible_truncation)]
    pub const fn to_rgb(self) -> Rgb {
        Rgb {
            r: (((self.0 >> 9) & 0x1F) << 3) as u8,
            g: (((self.0 >> 4) & 0x1F) << 3) as u8,
            b: ((self.0 & 0x0F) << 4) as u8,
        }
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    const fn from_bits(bits: u16) -> Self {
        Self(bits & MAX_PAYLOAD)
    }
}

/// How a virtual slot maps onto the physical buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysMapEntry {
    /// No physical light, only a lossy color cache
    NoPhysical(Rgb14),
    /// Exactly one physical light index
    OnePhysical(u16),
    /// Group index into the layer's many-physical pool
    ManyPhysical(u16),
}

/// Kind discriminator of a [`PhysMapEntry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MapKind {
    NoPhysical,
    OnePhysical,
    ManyPhysical,
}

impl Default for PhysMapEntry {
    fn default() -> Self {
        Self::NoPhysical(Rgb14::BLACK)
    }
}

impl PhysMapEntry {
    pub const fn kind(self) -> MapKind {
        match self {
            Self::NoPhysical(_) => MapKind::NoPhysical,
            Self::OnePhysical(_) => MapKind::OnePhysical,
            Self::ManyPhysical(_) => MapKind::ManyPhysical,
        }
    }

    /// Returns true if at least one physical light backs this slot
    pub const fn is_mapped(self) -> bool {
        !matches!(self, Self::NoPhysical(_))
    }

    /// Pack into the 16-bit table form.
    ///
    /// Returns `None` if the payload does not fit 14 bits.
    pub const fn pack(self) -> Option<PackedPhysMap> {
        let (kind, payload) = match self {
            Self::NoPhysical(cache) => (KIND_NO_PHYSICAL, cache.bits()),
            Self::OnePhysical(index) => (KIND_ONE_PHYSICAL, index),
            Self::ManyPhysical(group) => (KIND_MANY_PHYSICAL, group),
        };
        if payload > MAX_PAYLOAD {
            return None;
        }
        Some(PackedPhysMap((kind << KIND_SHIFT) | payload))
    }
}

/// 16-bit packed [`PhysMapEntry`].
///
/// The payload is only ever interpreted through [`PackedPhysMap::unpack`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(transparent)]
pub struct PackedPhysMap(u16);

impl PackedPhysMap {
    pub const EMPTY: Self = Self(0);

    pub const fn unpack(self) -> PhysMapEntry {
        let payload = self.0 & MAX_PAYLOAD;
        match self.0 >> KIND_SHIFT {
            KIND_ONE_PHYSICAL => PhysMapEntry::OnePhysical(payload),
            KIND_MANY_PHYSICAL => PhysMapEntry::ManyPhysical(payload),
            // the fourth tag value is never written
            _ => PhysMapEntry::NoPhysical(Rgb14::from_bits(payload)),
        }
    }

    /// Raw 16-bit form
    pub const fn to_bits(self) -> u16 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_keeps_kind_and_payload() {
        let one = PhysMapEntry::OnePhysical(MAX_PAYLOAD).pack().unwrap();
        assert_eq!(one.unpack(), PhysMapEntry::OnePhysical(MAX_PAYLOAD));

        let many = PhysMapEntry::ManyPhysical(7).pack().unwrap();
        assert_eq!(many.to_bits(), (2 << 14) | 7);
        assert_eq!(many.unpack().kind(), MapKind::ManyPhysical);
    }

    #[test]
    fn pack_rejects_wide_payloads() {
        assert_eq!(PhysMapEntry::OnePhysical(MAX_PAYLOAD + 1).pack(), None);
        assert_eq!(PhysMapEntry::ManyPhysical(u16::MAX).pack(), None);
    }

    #[test]
    fn empty_slot_is_black_cache() {
        assert_eq!(
            PackedPhysMap::EMPTY.unpack(),
            PhysMapEntry::NoPhysical(Rgb14::BLACK)
        );
    }

    #[test]
    fn rgb14_quantization_is_bounded() {
        for value in (0..=255u8).step_by(5) {
            let color = Rgb { r: value, g: 255 - value, b: value };
            let back = Rgb14::from_rgb(color).to_rgb();
            assert!(color.r.abs_diff(back.r) <= 7, "r {value}");
            assert!(color.g.abs_diff(back.g) <= 7, "g {value}");
            assert!(color.b.abs_diff(back.b) <= 15, "b {value}");
        }
    }
}
