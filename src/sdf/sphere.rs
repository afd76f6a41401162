use std::collections::HashMap;

use tinyjson::JsonValue;

use crate::{
    Error,
    json::{json_to_f64, json_to_vec3},
    quaternion::{embed, norm},
    vec::{Point3, Quat, Vec3},
};

use super::sdf_object::{DistanceField, check_arguments};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphereParameters {
    pub center: Point3,
    pub radius: f64,
}

impl Default for SphereParameters {
    fn default() -> Self {
        Self {
            center: Point3::new(0.0, 0.0, 0.0),
            radius: 1.0,
        }
    }
}

/// Exact signed-distance sphere.
pub struct SdfSphere {
    params: SphereParameters,
    center: Quat,
}

impl SdfSphere {
    #[must_use]
    pub fn new(params: SphereParameters) -> Self {
        Self {
            params,
            center: embed(params.center),
        }
    }

    pub fn from_json(json: &HashMap<String, JsonValue>) -> crate::Result<Self> {
        check_arguments("sphere", json, &["center", "radius"])?;
        let defaults = SphereParameters::default();
        let center = json_to_vec3(json, "center", Vec3::new(0.0, 0.0, 0.0))?;
        let radius = json_to_f64(json, "radius", defaults.radius)?;
        if !radius.is_finite() {
            return Err(Error::InvalidParameter(
                "radius".to_string(),
                format!("must be finite, got {radius}"),
            ));
        }

        Ok(Self::new(SphereParameters {
            center: Point3::new(center.x, center.y, center.z),
            radius,
        }))
    }

    #[must_use]
    pub const fn params(&self) -> &SphereParameters {
        &self.params
    }
}

impl DistanceField for SdfSphere {
    fn name(&self) -> &'static str {
        "sphere"
    }

    fn signed_distance(&self, p: Point3) -> f64 {
        norm(embed(p) - self.center) - self.params.radius
    }
}
