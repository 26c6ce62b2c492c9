// SPDX-License-Identifier: GPL-3.0-only

//! Point, normal and texture coordinate value types
//!
//! The zero vector is the canonical "invalid" sentinel for all three.

use std::ops::{Add, AddAssign, Neg, Sub};

/// 3D point in millimeters (depth camera frame unless stated otherwise)
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Unit surface normal, or zero when no normal could be estimated
pub type Normal3 = Point3;

/// Normalized [0,1] position in the color image; (0,0) when invalid
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TexCoord {
    pub u: f32,
    pub v: f32,
}

impl Point3 {
    pub const ZERO: Point3 = Point3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn cross(self, other: Point3) -> Point3 {
        Point3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    #[inline]
    pub fn dot(self, other: Point3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// True for the zero sentinel
    #[inline]
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    /// Scaled to unit length, or `None` when shorter than `min_length`
    #[inline]
    pub fn normalized(self, min_length: f32) -> Option<Point3> {
        let len = self.length();
        if len < min_length {
            return None;
        }
        Some(Point3::new(self.x / len, self.y / len, self.z / len))
    }
}

impl Add for Point3 {
    type Output = Point3;

    fn add(self, rhs: Point3) -> Point3 {
        Point3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Point3 {
    fn add_assign(&mut self, rhs: Point3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Point3 {
    type Output = Point3;

    fn sub(self, rhs: Point3) -> Point3 {
        Point3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Point3 {
    type Output = Point3;

    fn neg(self) -> Point3 {
        Point3::new(-self.x, -self.y, -self.z)
    }
}

impl TexCoord {
    pub const ZERO: TexCoord = TexCoord { u: 0.0, v: 0.0 };

    pub const fn new(u: f32, v: f32) -> Self {
        Self { u, v }
    }

    /// Integer pixel position in an image of the given size, clamped to bounds
    ///
    /// `flip_v` samples from a bottom-up row order.
    pub fn to_pixel(self, width: u32, height: u32, flip_v: bool) -> (u32, u32) {
        let v = if flip_v { 1.0 - self.v } else { self.v };
        let px = (self.u * width as f32).max(0.0) as u32;
        let py = (v * height as f32).max(0.0) as u32;
        (
            px.min(width.saturating_sub(1)),
            py.min(height.saturating_sub(1)),
        )
    }
}
