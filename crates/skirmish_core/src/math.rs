//! Fixed-point math utilities for deterministic simulation.
//!
//! All simulation arithmetic uses fixed-point numbers so that two runs
//! with identical inputs produce bit-identical state on every platform.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// `1 / sqrt(2)`, the sine and cosine of a 45° turn.
pub const FRAC_1_SQRT_2: Fixed = Fixed::from_bits(3_037_000_500);

/// Build a fixed-point value from tenths (`tenths(25)` is 2.5).
///
/// Keeps stat tables and defaults free of float literals.
#[must_use]
pub fn tenths(value: i32) -> Fixed {
    Fixed::from_num(value) / Fixed::from_num(10)
}

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from whole world units.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        fixed_sqrt(self.distance_squared(other))
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x * other.x + self.y * other.y
    }

    /// Vector length.
    #[must_use]
    pub fn length(self) -> Fixed {
        fixed_sqrt(self.dot(self))
    }

    /// Multiply both components by a scalar.
    #[must_use]
    pub fn scaled(self, factor: Fixed) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Rotate by the angle whose cosine and sine are given.
    ///
    /// Positive angles turn counter-clockwise in a y-up frame.
    #[must_use]
    pub fn rotated(self, cos: Fixed, sin: Fixed) -> Self {
        Self::new(
            self.x * cos - self.y * sin,
            self.x * sin + self.y * cos,
        )
    }

    /// Normalize vector using fixed-point math.
    ///
    /// Axis-aligned vectors normalize exactly because the square root
    /// is exact for perfect squares.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == Fixed::ZERO {
            return Self::ZERO;
        }
        Self::new(self.x / len, self.y / len)
    }
}

/// Square root of a fixed-point number, rounded down to the nearest
/// representable value.
///
/// Works on the raw bits: `sqrt(b / 2^32) = sqrt(b * 2^32) / 2^32`, so an
/// integer square root of the widened bit pattern gives the exact result
/// for perfect squares.
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let widened = u128::from(value.to_bits().unsigned_abs()) << 32;
    let root = isqrt(widened);
    // root <= sqrt(2^95), always fits in i64
    Fixed::from_bits(i64::try_from(root).unwrap_or(i64::MAX))
}

/// Integer square root by Newton iteration, starting above the root.
fn isqrt(n: u128) -> u128 {
    if n < 2 {
        return n;
    }
    let bits = 128 - n.leading_zeros();
    let mut x = 1_u128 << ((bits + 1) / 2);
    loop {
        let y = (x + n / x) / 2;
        if y >= x {
            return x;
        }
        x = y;
    }
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_distance_squared() {
        let a = Vec2Fixed::from_ints(3, 0);
        let b = Vec2Fixed::from_ints(0, 4);
        // 3² + 4² = 25
        assert_eq!(a.distance_squared(b), Fixed::from_num(25));
        assert_eq!(a.distance(b), Fixed::from_num(5));
    }

    #[test]
    fn test_fixed_sqrt_exact_for_perfect_squares() {
        for n in [1, 4, 9, 100, 1024, 1_000_000] {
            let root = fixed_sqrt(Fixed::from_num(n));
            assert_eq!(root * root, Fixed::from_num(n), "sqrt({n})");
        }
        assert_eq!(fixed_sqrt(Fixed::ZERO), Fixed::ZERO);
        assert_eq!(fixed_sqrt(Fixed::from_num(-4)), Fixed::ZERO);
    }

    #[test]
    fn test_fixed_sqrt_fractional() {
        let root = fixed_sqrt(Fixed::from_num(2));
        let err = (root * root - Fixed::from_num(2)).abs();
        assert!(err < Fixed::from_num(1) / Fixed::from_num(1_000_000));
    }

    #[test]
    fn test_fixed_determinism() {
        let a = Fixed::from_num(1) / Fixed::from_num(3);
        let b = Fixed::from_num(1) / Fixed::from_num(3);
        assert_eq!(a, b);
        assert_eq!(a * Fixed::from_num(7), b * Fixed::from_num(7));
    }

    #[test]
    fn test_tenths() {
        assert_eq!(tenths(25), Fixed::from_num(2.5));
        assert_eq!(tenths(40), Fixed::from_num(4));
    }

    #[test]
    fn test_normalize_axis_aligned_is_exact() {
        let v = Vec2Fixed::from_ints(10, 0).normalize();
        assert_eq!(v, Vec2Fixed::from_ints(1, 0));

        let v = Vec2Fixed::from_ints(0, -7).normalize();
        assert_eq!(v, Vec2Fixed::from_ints(0, -1));

        assert_eq!(Vec2Fixed::ZERO.normalize(), Vec2Fixed::ZERO);
    }

    #[test]
    fn test_vec2_normalize_preserves_direction() {
        let norm = Vec2Fixed::from_ints(3, 4).normalize();
        let one = Fixed::from_num(1);
        let epsilon = one / Fixed::from_num(10000);
        assert!((norm.dot(norm) - one).abs() < epsilon);
        let ratio_diff = (norm.x * Fixed::from_num(4)) - (norm.y * Fixed::from_num(3));
        assert!(ratio_diff.abs() < epsilon, "direction not preserved: {ratio_diff:?}");
    }

    #[test]
    fn test_rotation_quarter_turns() {
        let east = Vec2Fixed::from_ints(1, 0);
        let north = east.rotated(Fixed::ZERO, Fixed::from_num(1));
        assert_eq!(north, Vec2Fixed::from_ints(0, 1));
        let west = east.rotated(Fixed::from_num(-1), Fixed::ZERO);
        assert_eq!(west, Vec2Fixed::from_ints(-1, 0));
    }

    #[test]
    fn test_rotation_eighth_turn_keeps_length() {
        let east = Vec2Fixed::from_ints(1, 0);
        let diagonal = east.rotated(FRAC_1_SQRT_2, FRAC_1_SQRT_2);
        assert_eq!(diagonal.x, diagonal.y);
        let epsilon = Fixed::from_num(1) / Fixed::from_num(10000);
        assert!((diagonal.length() - Fixed::from_num(1)).abs() < epsilon);
    }
}
