//! Linear Algebra Primitives
//!
//! Minimal 3D math for the collision and dynamics core: vectors, quaternions
//! and 3x3 rotation matrices over `f32`.
//!
//! # Types
//!
//! - `Vec3`: 3D vector (positions, velocities, axes, extents)
//! - `Quat`: rotation quaternion (authoritative orientation state)
//! - `Mat3`: 3x3 rotation matrix (cached per body, fed to the SAT tests)
//!
//! # NaN Discipline
//!
//! Normalization of a near-zero vector is the one operation in this module
//! that can manufacture non-finite values. Hot paths therefore use
//! [`Vec3::try_normalize`], which reports failure instead of dividing by a
//! vanishing length. Plain [`Vec3::normalize`] is reserved for inputs already
//! known to be well-formed.

use core::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

/// Squared-length threshold below which a vector cannot be safely normalized.
pub const NORMALIZE_EPSILON: f32 = 1.0e-8;

// ============================================================================
// Vec3
// ============================================================================

/// 3D vector of `f32` components.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct Vec3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vec3 {
    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    /// All-ones vector
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);
    /// Unit X axis
    pub const UNIT_X: Self = Self::new(1.0, 0.0, 0.0);
    /// Unit Y axis
    pub const UNIT_Y: Self = Self::new(0.0, 1.0, 0.0);
    /// Unit Z axis
    pub const UNIT_Z: Self = Self::new(0.0, 0.0, 1.0);

    /// Create a vector from components.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Vector with all components set to `v`.
    #[inline]
    pub const fn splat(v: f32) -> Self {
        Self::new(v, v, v)
    }

    /// Dot product.
    #[inline]
    pub fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    /// Cross product.
    #[inline]
    pub fn cross(self, rhs: Self) -> Self {
        Self::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    /// Squared length.
    #[inline]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Euclidean length.
    #[inline]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Component-wise absolute value.
    #[inline]
    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs(), self.z.abs())
    }

    /// Normalize. The caller must guarantee a non-vanishing length.
    #[inline]
    pub fn normalize(self) -> Self {
        self / self.length()
    }

    /// Normalize, or `None` when the squared length is below
    /// [`NORMALIZE_EPSILON`] or not finite.
    #[inline]
    pub fn try_normalize(self) -> Option<Self> {
        let len_sq = self.length_squared();
        if len_sq < NORMALIZE_EPSILON || !len_sq.is_finite() {
            return None;
        }
        Some(self / len_sq.sqrt())
    }

    /// Whether every component is a finite number.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Vec3 {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl MulAssign<f32> for Vec3 {
    #[inline]
    fn mul_assign(&mut self, rhs: f32) {
        *self = *self * rhs;
    }
}

impl Div<f32> for Vec3 {
    type Output = Self;

    #[inline]
    fn div(self, rhs: f32) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

// ============================================================================
// Quat
// ============================================================================

/// Rotation quaternion.
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct Quat {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
    /// Scalar component
    pub w: f32,
}

impl Quat {
    /// Identity rotation
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Create a quaternion from raw components.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle` radians about a unit `axis`.
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let half = angle * 0.5;
        let s = half.sin();
        Self::new(axis.x * s, axis.y * s, axis.z * s, half.cos())
    }

    /// Squared norm of the quaternion.
    #[inline]
    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w
    }

    /// Renormalize. Identity is returned for a degenerate quaternion so that
    /// orientation state can never become non-finite.
    pub fn normalize(self) -> Self {
        let len_sq = self.length_squared();
        if len_sq < NORMALIZE_EPSILON || !len_sq.is_finite() {
            return Self::IDENTITY;
        }
        let inv = 1.0 / len_sq.sqrt();
        Self::new(self.x * inv, self.y * inv, self.z * inv, self.w * inv)
    }

    /// Hamilton product `self * rhs` (apply `rhs` first, then `self`).
    pub fn mul_quat(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }

    /// Rotate a vector by this quaternion.
    pub fn rotate_vec(self, v: Vec3) -> Vec3 {
        // v' = v + 2 * q_vec x (q_vec x v + w * v)
        let qv = Vec3::new(self.x, self.y, self.z);
        let t = qv.cross(v) * 2.0;
        v + t * self.w + qv.cross(t)
    }
}

impl Default for Quat {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ============================================================================
// Mat3
// ============================================================================

/// 3x3 matrix stored as three column vectors.
///
/// For a rotation matrix the columns are the rotated local axes, which is
/// exactly the form the SAT box tests and the bounds projection consume.
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct Mat3 {
    /// First column (rotated local X axis)
    pub x: Vec3,
    /// Second column (rotated local Y axis)
    pub y: Vec3,
    /// Third column (rotated local Z axis)
    pub z: Vec3,
}

impl Mat3 {
    /// Identity matrix
    pub const IDENTITY: Self = Self {
        x: Vec3::UNIT_X,
        y: Vec3::UNIT_Y,
        z: Vec3::UNIT_Z,
    };

    /// Create a matrix from three column vectors.
    #[inline]
    pub const fn from_cols(x: Vec3, y: Vec3, z: Vec3) -> Self {
        Self { x, y, z }
    }

    /// Build the rotation matrix of a unit quaternion.
    pub fn from_quat(q: Quat) -> Self {
        let xx = q.x * q.x;
        let yy = q.y * q.y;
        let zz = q.z * q.z;
        let xy = q.x * q.y;
        let xz = q.x * q.z;
        let yz = q.y * q.z;
        let wx = q.w * q.x;
        let wy = q.w * q.y;
        let wz = q.w * q.z;

        Self::from_cols(
            Vec3::new(1.0 - 2.0 * (yy + zz), 2.0 * (xy + wz), 2.0 * (xz - wy)),
            Vec3::new(2.0 * (xy - wz), 1.0 - 2.0 * (xx + zz), 2.0 * (yz + wx)),
            Vec3::new(2.0 * (xz + wy), 2.0 * (yz - wx), 1.0 - 2.0 * (xx + yy)),
        )
    }

    /// Transpose (the inverse, for a rotation matrix).
    pub fn transposed(&self) -> Self {
        Self::from_cols(
            Vec3::new(self.x.x, self.y.x, self.z.x),
            Vec3::new(self.x.y, self.y.y, self.z.y),
            Vec3::new(self.x.z, self.y.z, self.z.z),
        )
    }

    /// Row `i` of the matrix.
    #[inline]
    pub fn row(&self, i: usize) -> Vec3 {
        match i {
            0 => Vec3::new(self.x.x, self.y.x, self.z.x),
            1 => Vec3::new(self.x.y, self.y.y, self.z.y),
            _ => Vec3::new(self.x.z, self.y.z, self.z.z),
        }
    }

    /// Column `i` of the matrix.
    #[inline]
    pub fn col(&self, i: usize) -> Vec3 {
        match i {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }
}

impl Default for Mat3 {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Vec3> for Mat3 {
    type Output = Vec3;

    #[inline]
    fn mul(self, v: Vec3) -> Vec3 {
        self.x * v.x + self.y * v.y + self.z * v.z
    }
}

impl Mul<Mat3> for Mat3 {
    type Output = Mat3;

    fn mul(self, rhs: Mat3) -> Mat3 {
        Mat3::from_cols(self * rhs.x, self * rhs.y, self * rhs.z)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1.0e-5;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < EPS
    }

    fn approx_vec(a: Vec3, b: Vec3) -> bool {
        approx(a.x, b.x) && approx(a.y, b.y) && approx(a.z, b.z)
    }

    #[test]
    fn test_vec3_ops() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Vec3::new(3.0, 3.0, 3.0));
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert!(approx(a.dot(b), 32.0));
    }

    #[test]
    fn test_cross_right_handed() {
        assert!(approx_vec(Vec3::UNIT_X.cross(Vec3::UNIT_Y), Vec3::UNIT_Z));
        assert!(approx_vec(Vec3::UNIT_Y.cross(Vec3::UNIT_Z), Vec3::UNIT_X));
    }

    #[test]
    fn test_try_normalize_zero() {
        assert!(Vec3::ZERO.try_normalize().is_none());
        let tiny = Vec3::splat(1.0e-6);
        assert!(tiny.try_normalize().is_none());
    }

    #[test]
    fn test_try_normalize_unit() {
        let v = Vec3::new(3.0, 4.0, 0.0).try_normalize().unwrap();
        assert!(approx(v.length(), 1.0));
        assert!(approx_vec(v, Vec3::new(0.6, 0.8, 0.0)));
    }

    #[test]
    fn test_try_normalize_nan() {
        let v = Vec3::new(f32::NAN, 0.0, 0.0);
        assert!(v.try_normalize().is_none());
    }

    #[test]
    fn test_quat_identity_rotation() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert!(approx_vec(Quat::IDENTITY.rotate_vec(v), v));
    }

    #[test]
    fn test_quat_axis_angle() {
        // 90 degrees about Z: X axis maps to Y axis
        let q = Quat::from_axis_angle(Vec3::UNIT_Z, core::f32::consts::FRAC_PI_2);
        assert!(approx_vec(q.rotate_vec(Vec3::UNIT_X), Vec3::UNIT_Y));
    }

    #[test]
    fn test_quat_normalize_degenerate() {
        let q = Quat::new(0.0, 0.0, 0.0, 0.0).normalize();
        assert_eq!(q, Quat::IDENTITY);
    }

    #[test]
    fn test_mat3_from_quat_matches_rotate_vec() {
        let q = Quat::from_axis_angle(Vec3::new(1.0, 1.0, 0.0).normalize(), 0.7);
        let m = Mat3::from_quat(q);
        let v = Vec3::new(-2.0, 0.5, 3.0);
        assert!(approx_vec(m * v, q.rotate_vec(v)));
    }

    #[test]
    fn test_mat3_transpose_is_inverse() {
        let q = Quat::from_axis_angle(Vec3::UNIT_Y, 1.3);
        let m = Mat3::from_quat(q);
        let mi = m.transposed();
        let v = Vec3::new(4.0, -1.0, 2.0);
        assert!(approx_vec(mi * (m * v), v));
    }

    #[test]
    fn test_mat3_rows_and_cols() {
        let m = Mat3::from_cols(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(4.0, 5.0, 6.0),
            Vec3::new(7.0, 8.0, 9.0),
        );
        assert_eq!(m.row(0), Vec3::new(1.0, 4.0, 7.0));
        assert_eq!(m.col(2), Vec3::new(7.0, 8.0, 9.0));
    }
}
