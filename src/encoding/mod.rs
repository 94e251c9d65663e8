//! # Quantized Encodings
//!
//! Lossy mappings used to shrink values before they are written as event
//! fields, typically turning a unit direction into two bytes.
//!
//! An [`Encoding`] is a pair of static conversions. Encodings compose by type:
//! [`NormalizedVec2Bytes<Octahedral>`](normalized::NormalizedVec2Bytes) maps a unit
//! [`Vec3`] to a `(u8, u8)` pair by first mapping it onto the unit square.
//!
//! ```rust
//! use eventwire::encoding::{Encoding, NormalizedVec2Bytes, Octahedral, Vec3};
//!
//! let up = Vec3::new(0.0, 1.0, 0.0);
//! let packed = NormalizedVec2Bytes::<Octahedral>::encode(up);
//! let unpacked: Vec3 = NormalizedVec2Bytes::<Octahedral>::decode(packed);
//! assert!(unpacked.distance(up) < 0.01);
//! ```

pub mod normalized;
pub mod octahedral;

pub use normalized::{NormalizedByte, NormalizedVec2Bytes};
pub use octahedral::Octahedral;

use std::ops::{Add, Mul, Sub};

/// A lossy, stateless conversion between two representations.
pub trait Encoding<From, To> {
    fn encode(value: From) -> To;
    fn decode(value: To) -> From;
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub const fn splat(v: f32) -> Self {
        Self { x: v, y: v }
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Unit vector in the same direction. The zero vector maps to itself.
    pub fn normalize(self) -> Self {
        let length = self.length();
        if length == 0.0 {
            return self;
        }
        self * (1.0 / length)
    }

    pub fn abs(self) -> Self {
        Vec3::new(self.x.abs(), self.y.abs(), self.z.abs())
    }

    pub fn distance(self, other: Vec3) -> f32 {
        (self - other).length()
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}
