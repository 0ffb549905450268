//! Modifier system with compile-time known modifier variants
//!
//! Built-in modifiers live in an enum to avoid heap allocations. Modifiers
//! from outside the crate implement [`Modifier`] and are attached through
//! [`ModifierSlot::Custom`].
//!
//! A modifier can take part in three places:
//! - size transform, once per virtual pass, before any light is placed
//! - placement transform, once per physical light during the virtual pass
//! - frame transform, on every pixel read or write while rendering
//!
//! A hook that sets [`Coord3D::SUPPRESSED`] removes the position from the
//! layer; later modifiers are not called for it.

mod checkerboard;
mod circle;
mod mirror;
mod multiply;
mod pinwheel;
mod ripple_yz;
mod rotate;
mod transpose;

use core::fmt;

use alloc::boxed::Box;
use embassy_time::Instant;

pub use checkerboard::CheckerboardModifier;
pub use circle::CircleModifier;
pub use mirror::MirrorModifier;
pub use multiply::MultiplyModifier;
pub use pinwheel::PinwheelModifier;
pub use ripple_yz::RippleYZModifier;
pub use rotate::{RotateDirection, RotateModifier};
pub use transpose::TransposeModifier;

use crate::coord::Coord3D;

const MODIFIER_NAME_MIRROR: &str = "mirror";
const MODIFIER_NAME_MULTIPLY: &str = "multiply";
const MODIFIER_NAME_CHECKERBOARD: &str = "checkerboard";
const MODIFIER_NAME_TRANSPOSE: &str = "transpose";
const MODIFIER_NAME_CIRCLE: &str = "circle";
const MODIFIER_NAME_PINWHEEL: &str = "pinwheel";
const MODIFIER_NAME_ROTATE: &str = "rotate";
const MODIFIER_NAME_RIPPLE_YZ: &str = "ripple_yz";
const MODIFIER_NAME_CUSTOM: &str = "custom";

const MODIFIER_ID_MIRROR: u8 = 0;
const MODIFIER_ID_MULTIPLY: u8 = 1;
const MODIFIER_ID_CHECKERBOARD: u8 = 2;
const MODIFIER_ID_TRANSPOSE: u8 = 3;
const MODIFIER_ID_CIRCLE: u8 = 4;
const MODIFIER_ID_PINWHEEL: u8 = 5;
const MODIFIER_ID_ROTATE: u8 = 6;
const MODIFIER_ID_RIPPLE_YZ: u8 = 7;

/// Logical geometry of a virtual layer while modifiers reshape it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerGeometry {
    pub size: Coord3D,
    pub start: Coord3D,
    pub middle: Coord3D,
    pub end: Coord3D,
    /// Number of axes longer than one light (0 to 3)
    pub dimension: u8,
}

impl LayerGeometry {
    /// Geometry covering a whole box
    pub fn from_size(size: Coord3D) -> Self {
        Self {
            size,
            start: Coord3D::ZERO,
            middle: size / 2,
            end: size - Coord3D::ONE,
            dimension: size.dimension(),
        }
    }
}

impl Default for LayerGeometry {
    fn default() -> Self {
        Self::from_size(Coord3D::ONE)
    }
}

/// Coordinate transform plugged into a virtual layer
///
/// Every hook is optional. Modifiers are only called from the control loop
/// that owns the layout and need not be thread safe.
pub trait Modifier {
    /// Must run during size and placement transforms
    fn affects_layout(&self) -> bool {
        true
    }

    /// Must run on every pixel access; changing such a modifier requests a
    /// physical pass as well
    fn affects_rendering(&self) -> bool {
        false
    }

    /// Reshape the layer before lights are placed
    fn transform_size(&mut self, _geometry: &mut LayerGeometry) {}

    /// Move, fold or suppress one physical light
    fn transform_placement(&mut self, _position: &mut Coord3D, _geometry: &LayerGeometry) {}

    /// Move or suppress a pixel at render time
    fn transform_frame(&self, _position: &mut Coord3D, _geometry: &LayerGeometry) {}

    /// Advance time driven state
    fn tick(&mut self, _now: Instant) {}
}

/// Known modifier ids that can be requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ModifierId {
    Mirror = MODIFIER_ID_MIRROR,
    Multiply = MODIFIER_ID_MULTIPLY,
    Checkerboard = MODIFIER_ID_CHECKERBOARD,
    Transpose = MODIFIER_ID_TRANSPOSE,
    Circle = MODIFIER_ID_CIRCLE,
    Pinwheel = MODIFIER_ID_PINWHEEL,
    Rotate = MODIFIER_ID_ROTATE,
    RippleYZ = MODIFIER_ID_RIPPLE_YZ,
}

impl ModifierId {
    pub fn from_raw(value: u8) -> Option<Self> {
        Some(match value {
            MODIFIER_ID_MIRROR => Self::Mirror,
            MODIFIER_ID_MULTIPLY => Self::Multiply,
            MODIFIER_ID_CHECKERBOARD => Self::Checkerboard,
            MODIFIER_ID_TRANSPOSE => Self::Transpose,
            MODIFIER_ID_CIRCLE => Self::Circle,
            MODIFIER_ID_PINWHEEL => Self::Pinwheel,
            MODIFIER_ID_ROTATE => Self::Rotate,
            MODIFIER_ID_RIPPLE_YZ => Self::RippleYZ,
            _ => return None,
        })
    }

    /// Slot with default settings
    pub fn to_slot(self) -> ModifierSlot {
        match self {
            Self::Mirror => ModifierSlot::Mirror(MirrorModifier::default()),
            Self::Multiply => ModifierSlot::Multiply(MultiplyModifier::default()),
            Self::Checkerboard => ModifierSlot::Checkerboard(CheckerboardModifier::default()),
            Self::Transpose => ModifierSlot::Transpose(TransposeModifier::default()),
            Self::Circle => ModifierSlot::Circle(CircleModifier::default()),
            Self::Pinwheel => ModifierSlot::Pinwheel(PinwheelModifier::default()),
            Self::Rotate => ModifierSlot::Rotate(RotateModifier::default()),
            Self::RippleYZ => ModifierSlot::RippleYZ(RippleYZModifier::default()),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mirror => MODIFIER_NAME_MIRROR,
            Self::Multiply => MODIFIER_NAME_MULTIPLY,
            Self::Checkerboard => MODIFIER_NAME_CHECKERBOARD,
            Self::Transpose => MODIFIER_NAME_TRANSPOSE,
            Self::Circle => MODIFIER_NAME_CIRCLE,
            Self::Pinwheel => MODIFIER_NAME_PINWHEEL,
            Self::Rotate => MODIFIER_NAME_ROTATE,
            Self::RippleYZ => MODIFIER_NAME_RIPPLE_YZ,
        }
    }

    pub fn parse_from_str(s: &str) -> Option<Self> {
        match s {
            MODIFIER_NAME_MIRROR => Some(Self::Mirror),
            MODIFIER_NAME_MULTIPLY => Some(Self::Multiply),
            MODIFIER_NAME_CHECKERBOARD => Some(Self::Checkerboard),
            MODIFIER_NAME_TRANSPOSE => Some(Self::Transpose),
            MODIFIER_NAME_CIRCLE => Some(Self::Circle),
            MODIFIER_NAME_PINWHEEL => Some(Self::Pinwheel),
            MODIFIER_NAME_ROTATE => Some(Self::Rotate),
            MODIFIER_NAME_RIPPLE_YZ => Some(Self::RippleYZ),
            _ => None,
        }
    }
}

/// Modifier slot - enum containing all possible modifiers
pub enum ModifierSlot {
    Mirror(MirrorModifier),
    Multiply(MultiplyModifier),
    Checkerboard(CheckerboardModifier),
    Transpose(TransposeModifier),
    Circle(CircleModifier),
    Pinwheel(PinwheelModifier),
    Rotate(RotateModifier),
    RippleYZ(RippleYZModifier),
    /// Modifier implemented outside of this crate
    Custom(Box<dyn Modifier>),
}

impl ModifierSlot {
    /// Id of a built-in modifier, `None` for custom ones
    pub fn id(&self) -> Option<ModifierId> {
        Some(match self {
            Self::Mirror(_) => ModifierId::Mirror,
            Self::Multiply(_) => ModifierId::Multiply,
            Self::Checkerboard(_) => ModifierId::Checkerboard,
            Self::Transpose(_) => ModifierId::Transpose,
            Self::Circle(_) => ModifierId::Circle,
            Self::Pinwheel(_) => ModifierId::Pinwheel,
            Self::Rotate(_) => ModifierId::Rotate,
            Self::RippleYZ(_) => ModifierId::RippleYZ,
            Self::Custom(_) => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        self.id().map_or(MODIFIER_NAME_CUSTOM, ModifierId::as_str)
    }

    fn as_modifier(&self) -> &(dyn Modifier + 'static) {
        match self {
            Self::Mirror(modifier) => modifier,
            Self::Multiply(modifier) => modifier,
            Self::Checkerboard(modifier) => modifier,
            Self::Transpose(modifier) => modifier,
            Self::Circle(modifier) => modifier,
            Self::Pinwheel(modifier) => modifier,
            Self::Rotate(modifier) => modifier,
            Self::RippleYZ(modifier) => modifier,
            Self::Custom(modifier) => modifier.as_ref(),
        }
    }

    fn as_modifier_mut(&mut self) -> &mut (dyn Modifier + 'static) {
        match self {
            Self::Mirror(modifier) => modifier,
            Self::Multiply(modifier) => modifier,
            Self::Checkerboard(modifier) => modifier,
            Self::Transpose(modifier) => modifier,
            Self::Circle(modifier) => modifier,
            Self::Pinwheel(modifier) => modifier,
            Self::Rotate(modifier) => modifier,
            Self::RippleYZ(modifier) => modifier,
            Self::Custom(modifier) => modifier.as_mut(),
        }
    }
}

impl Modifier for ModifierSlot {
    fn affects_layout(&self) -> bool {
        self.as_modifier().affects_layout()
    }

    fn affects_rendering(&self) -> bool {
        self.as_modifier().affects_rendering()
    }

    fn transform_size(&mut self, geometry: &mut LayerGeometry) {
        self.as_modifier_mut().transform_size(geometry);
    }

    fn transform_placement(&mut self, position: &mut Coord3D, geometry: &LayerGeometry) {
        self.as_modifier_mut().transform_placement(position, geometry);
    }

    fn transform_frame(&self, position: &mut Coord3D, geometry: &LayerGeometry) {
        self.as_modifier().transform_frame(position, geometry);
    }

    fn tick(&mut self, now: Instant) {
        self.as_modifier_mut().tick(now);
    }
}

impl fmt::Debug for ModifierSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ModifierSlot").field(&self.name()).finish()
    }
}

impl From<ModifierId> for ModifierSlot {
    fn from(id: ModifierId) -> Self {
        id.to_slot()
    }
}
