//! Quaternion helpers on top of [`cgmath::Quaternion`].
//!
//! Two embeddings of 3D points coexist:
//! - [`embed`] puts the point in the imaginary part, `(0, x, y, z)`. Analytic
//!   fields and the voxel grid use this one.
//! - [`embed_slice`] fills the four components in `(w, i, j, k)` order with
//!   `(x, y, z, slice)`. Fractal estimators use it so that the constant and
//!   the slice share the array layout of their parameter record.

use cgmath::{InnerSpace, One};

use crate::vec::{Point3, Quat, Vec3};

/// Pure quaternion `(0, x, y, z)`
#[must_use]
pub fn embed(p: Point3) -> Quat {
    Quat::new(0.0, p.x, p.y, p.z)
}

/// Quaternion `(x, y, z, slice)` in `(w, i, j, k)` order
#[must_use]
pub fn embed_slice(p: Point3, slice: f64) -> Quat {
    Quat::new(p.x, p.y, p.z, slice)
}

/// Quaternion from a `[w, x, y, z]` array
#[must_use]
pub fn from_wxyz(c: [f64; 4]) -> Quat {
    Quat::new(c[0], c[1], c[2], c[3])
}

/// Squared norm `w² + x² + y² + z²`
#[must_use]
pub fn norm2(q: Quat) -> f64 {
    q.magnitude2()
}

#[must_use]
pub fn norm(q: Quat) -> f64 {
    q.magnitude()
}

/// Integer power by repeated squaring.
///
/// Quaternion multiplication is associative and powers of one quaternion
/// commute, so the grouping does not change the result beyond rounding.
#[must_use]
pub fn powi(q: Quat, n: u32) -> Quat {
    let mut result = Quat::one();
    let mut base = q;
    let mut n = n;
    while n > 0 {
        if n & 1 == 1 {
            result = result * base;
        }
        n >>= 1;
        if n > 0 {
            base = base * base;
        }
    }
    result
}

/// Component of the pure quaternion `r` along the pure unit quaternion `axis`.
///
/// For pure quaternions `r·a + a·r = −2 (r ⋅ a)`, so this is `(r ⋅ a) a`
/// computed with quaternion products only.
#[must_use]
pub fn project_onto_axis(r: Quat, axis: Quat) -> Quat {
    -((r * axis + axis * r) * axis) / 2.0
}

/// Pure unit quaternion along `v`, `None` for a zero or non-finite vector
#[must_use]
pub fn unit_axis(v: Vec3) -> Option<Quat> {
    let len = v.magnitude();
    if len > 0.0 && len.is_finite() {
        let v = v / len;
        Some(Quat::new(0.0, v.x, v.y, v.z))
    } else {
        None
    }
}
