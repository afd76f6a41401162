use crate::Real;
use cgmath::{self, InnerSpace};

// 3D
pub type Vec3 = cgmath::Vector3<Real>;
pub type Point3 = cgmath::Point3<Real>;
pub type Vec3i = cgmath::Vector3<i64>;
pub type Vec3f = cgmath::Vector3<f32>;

// 4D
pub type Quat = cgmath::Quaternion<Real>;

/// Check if the vector contains a NaN/Inf value
#[must_use]
pub fn is_finite(v: &Vec3) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}

/// Unit normal of the triangle `(p0, p1, p2)` following the right-hand rule.
///
/// Returns `None` when the triangle has no area (collinear or repeated
/// vertices) or when a coordinate is not finite.
#[must_use]
pub fn triangle_normal(p0: &Point3, p1: &Point3, p2: &Point3) -> Option<Vec3> {
    let n = (*p1 - *p0).cross(*p2 - *p0);
    let len = n.magnitude();
    if len > 0.0 && len.is_finite() {
        Some(n / len)
    } else {
        None
    }
}

/// Narrow a vector to single precision for file formats storing `f32`
#[must_use]
pub fn to_f32(v: &Vec3) -> Vec3f {
    Vec3f::new(v.x as f32, v.y as f32, v.z as f32)
}
