//! Integer 3D coordinates used by light sources, layers and modifiers.

use core::ops::{Add, AddAssign, Div, DivAssign, Mul, Rem, Sub};

/// Sentinel value for the x axis of a position that does not participate
/// in mapping or rendering.
pub const OUT_OF_RANGE: i32 = i32::MAX;

/// A point (or a size) in a 3D integer coordinate space
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Coord3D {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Coord3D {
    pub const ZERO: Self = Self::new(0, 0, 0);
    pub const ONE: Self = Self::new(1, 1, 1);

    /// Position that is excluded from mapping (`{OUT_OF_RANGE, 0, 0}`)
    pub const SUPPRESSED: Self = Self::new(OUT_OF_RANGE, 0, 0);

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Point on the x axis
    pub const fn line(x: i32) -> Self {
        Self::new(x, 0, 0)
    }

    /// Point in the z = 0 plane
    pub const fn xy(x: i32, y: i32) -> Self {
        Self::new(x, y, 0)
    }

    /// Marks this position as not participating
    pub fn suppress(&mut self) {
        self.x = OUT_OF_RANGE;
    }

    /// Returns true if a hook set the out-of-range sentinel
    pub const fn is_suppressed(self) -> bool {
        self.x == OUT_OF_RANGE
    }

    /// Component-wise maximum
    #[must_use]
    pub fn maximum(self, rhs: Self) -> Self {
        Self::new(self.x.max(rhs.x), self.y.max(rhs.y), self.z.max(rhs.z))
    }

    /// Component-wise minimum
    #[must_use]
    pub fn minimum(self, rhs: Self) -> Self {
        Self::new(self.x.min(rhs.x), self.y.min(rhs.y), self.z.min(rhs.z))
    }

    /// Wraps the point into `[0, size)` on every axis.
    ///
    /// Axes with a non-positive size collapse to 0.
    #[must_use]
    pub fn wrap(self, size: Self) -> Self {
        const fn wrap_axis(value: i32, size: i32) -> i32 {
            if size <= 0 { 0 } else { value.rem_euclid(size) }
        }
        Self::new(
            wrap_axis(self.x, size.x),
            wrap_axis(self.y, size.y),
            wrap_axis(self.z, size.z),
        )
    }

    /// Returns true if the point lies outside the box `[0, size)`
    pub const fn is_out_of_bounds(self, size: Self) -> bool {
        self.x < 0
            || self.y < 0
            || self.z < 0
            || self.x >= size.x
            || self.y >= size.y
            || self.z >= size.z
    }

    /// Number of points inside the box described by this size.
    ///
    /// Negative extents count as 0.
    #[allow(clippy::cast_sign_loss)]
    pub fn volume(self) -> usize {
        let x = self.x.max(0) as usize;
        let y = self.y.max(0) as usize;
        let z = self.z.max(0) as usize;
        x.saturating_mul(y).saturating_mul(z)
    }

    /// Number of axes with an extent larger than 1
    pub fn dimension(self) -> u8 {
        u8::from(self.x > 1) + u8::from(self.y > 1) + u8::from(self.z > 1)
    }

    /// Euclidean distance to `other`, computed without overflowing
    #[allow(clippy::cast_precision_loss)]
    pub fn distance(self, other: Self) -> f32 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        let dz = i64::from(self.z) - i64::from(other.z);
        libm::sqrtf((dx * dx + dy * dy + dz * dz) as f32)
    }

    /// Replaces zero or negative components with 1, used before dividing
    #[must_use]
    pub fn at_least_one(self) -> Self {
        self.maximum(Self::ONE)
    }
}

impl Add for Coord3D {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Coord3D {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Coord3D {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul for Coord3D {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::new(self.x * rhs.x, self.y * rhs.y, self.z * rhs.z)
    }
}

/// Component-wise division, divisor components must be non-zero
impl Div for Coord3D {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        Self::new(self.x / rhs.x, self.y / rhs.y, self.z / rhs.z)
    }
}

impl Div<i32> for Coord3D {
    type Output = Self;

    fn div(self, rhs: i32) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl DivAssign for Coord3D {
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

/// Component-wise remainder, divisor components must be non-zero
impl Rem for Coord3D {
    type Output = Self;

    fn rem(self, rhs: Self) -> Self {
        Self::new(self.x % rhs.x, self.y % rhs.y, self.z % rhs.z)
    }
}
