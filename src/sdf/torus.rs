use std::collections::HashMap;

use tinyjson::JsonValue;

use crate::{
    Error,
    json::{json_to_f64, json_to_vec3},
    quaternion::{embed, norm2, project_onto_axis, unit_axis},
    vec::{Point3, Quat, Vec3},
};

use super::sdf_object::{DistanceField, check_arguments};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TorusParameters {
    pub center: Point3,
    /// Axis of revolution, any non-zero length
    pub axis: Vec3,
    pub major_radius: f64,
    pub minor_radius: f64,
}

impl Default for TorusParameters {
    fn default() -> Self {
        Self {
            center: Point3::new(0.0, 0.0, 0.0),
            axis: Vec3::new(1.0, 0.0, 0.0),
            major_radius: 1.0,
            minor_radius: 0.1,
        }
    }
}

/// Exact signed-distance torus around an arbitrary axis.
pub struct SdfTorus {
    params: TorusParameters,
    center: Quat,
    axis: Quat,
}

impl SdfTorus {
    pub fn new(params: TorusParameters) -> crate::Result<Self> {
        let axis = unit_axis(params.axis).ok_or_else(|| {
            Error::InvalidParameter(
                "axis".to_string(),
                format!("must be a finite non-zero vector, got {:?}", params.axis),
            )
        })?;
        Ok(Self {
            params,
            center: embed(params.center),
            axis,
        })
    }

    pub fn from_json(json: &HashMap<String, JsonValue>) -> crate::Result<Self> {
        check_arguments(
            "torus",
            json,
            &["center", "axis", "major_radius", "minor_radius"],
        )?;
        let defaults = TorusParameters::default();
        let center = json_to_vec3(json, "center", Vec3::new(0.0, 0.0, 0.0))?;
        let axis = json_to_vec3(json, "axis", defaults.axis)?;
        let major_radius = json_to_f64(json, "major_radius", defaults.major_radius)?;
        let minor_radius = json_to_f64(json, "minor_radius", defaults.minor_radius)?;

        Self::new(TorusParameters {
            center: Point3::new(center.x, center.y, center.z),
            axis,
            major_radius,
            minor_radius,
        })
    }

    #[must_use]
    pub const fn params(&self) -> &TorusParameters {
        &self.params
    }
}

impl DistanceField for SdfTorus {
    fn name(&self) -> &'static str {
        "torus"
    }

    fn signed_distance(&self, p: Point3) -> f64 {
        let r = embed(p) - self.center;
        let r_parallel = project_onto_axis(r, self.axis);
        let d_parallel2 = norm2(r_parallel);
        let d_perpendicular = norm2(r - r_parallel).sqrt();
        let ring = d_perpendicular - self.params.major_radius;
        ring.mul_add(ring, d_parallel2).sqrt() - self.params.minor_radius
    }
}

#[cfg(test)]
mod tests {
    use cgmath::assert_abs_diff_eq;

    use super::{SdfTorus, TorusParameters};
    use crate::{
        sdf::DistanceField,
        vec::{Point3, Vec3},
    };

    #[test]
    fn distance_around_x_axis() {
        let torus = SdfTorus::new(TorusParameters::default()).unwrap();
        // On the core circle
        assert_abs_diff_eq!(
            torus.signed_distance(Point3::new(0.0, 1.0, 0.0)),
            -0.1,
            epsilon = 1e-12
        );
        // Along the axis, the closest point of the tube is the circle of radius 1
        assert_abs_diff_eq!(
            torus.signed_distance(Point3::new(0.0, 0.0, 0.0)),
            0.9,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            torus.signed_distance(Point3::new(1.0, 0.0, 2.0)),
            2.0f64.sqrt() - 0.1,
            epsilon = 1e-12
        );
    }

    #[test]
    fn axis_length_does_not_matter() {
        let a = SdfTorus::new(TorusParameters {
            axis: Vec3::new(0.0, 0.0, 5.0),
            ..TorusParameters::default()
        })
        .unwrap();
        let b = SdfTorus::new(TorusParameters {
            axis: Vec3::new(0.0, 0.0, 1.0),
            ..TorusParameters::default()
        })
        .unwrap();
        let p = Point3::new(0.4, -1.3, 0.2);
        assert_abs_diff_eq!(a.signed_distance(p), b.signed_distance(p), epsilon = 1e-12);
    }

    #[test]
    fn zero_axis_is_rejected() {
        let params = TorusParameters {
            axis: Vec3::new(0.0, 0.0, 0.0),
            ..TorusParameters::default()
        };
        assert!(SdfTorus::new(params).is_err());
    }
}
