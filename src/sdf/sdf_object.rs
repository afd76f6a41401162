use std::collections::HashMap;

use rayon::prelude::*;
use tinyjson::JsonValue;

use crate::{Error, vec::Point3};

use super::{
    fractal::FractalDistanceEstimator,
    sphere::SdfSphere,
    torus::SdfTorus,
};

/// Names accepted by [`json_to_distance_field`]
pub const DISTANCE_FUNCTIONS: [&str; 4] = ["sphere", "torus", "quaternion_julia", "julia"];

/// Trait implemented by implicit surfaces that expose a signed distance function.
///
/// Implementations must be pure: the same point always yields the same value,
/// and evaluation has no side effects. Negative values are inside.
pub trait DistanceField: Send + Sync {
    /// Registry name of the field
    fn name(&self) -> &'static str;

    /// Evaluate the signed distance at a world-space point.
    fn signed_distance(&self, p: Point3) -> f64;

    /// Evaluate many points at once, writing into `out` (same length as `points`).
    ///
    /// The default implementation spreads the scalar evaluation over the rayon
    /// pool. Fields with per-step shared state override it.
    fn signed_distance_batch(&self, points: &[Point3], out: &mut [f64]) {
        assert_eq!(points.len(), out.len(), "batch output has the wrong length");
        points
            .par_iter()
            .zip(out.par_iter_mut())
            .for_each(|(p, d)| *d = self.signed_distance(*p));
    }

    /// Whether `|d|` never exceeds the true distance to the surface.
    ///
    /// Block pruning in the voxelizer is only exact for such fields.
    fn is_lower_bound(&self) -> bool {
        true
    }
}

/// Refuse arguments the field does not understand, the way a keyword call would.
pub(super) fn check_arguments(
    function: &str,
    args: &HashMap<String, JsonValue>,
    known: &[&str],
) -> crate::Result<()> {
    // Sorted so the reported name does not depend on hash order
    let mut names: Vec<&String> = args.keys().collect();
    names.sort();
    match names.into_iter().find(|name| !known.contains(&name.as_str())) {
        Some(name) => Err(Error::UnknownParameter(function.to_string(), name.clone())),
        None => Ok(()),
    }
}

/// Create a [`DistanceField`] from its registry name and named arguments.
pub fn json_to_distance_field(
    name: &str,
    args: &HashMap<String, JsonValue>,
) -> crate::Result<Box<dyn DistanceField>> {
    match name {
        "sphere" => Ok(Box::new(SdfSphere::from_json(args)?)),
        "torus" => Ok(Box::new(SdfTorus::from_json(args)?)),
        "quaternion_julia" => Ok(Box::new(FractalDistanceEstimator::from_json(args)?)),
        "julia" => Ok(Box::new(FractalDistanceEstimator::from_legacy_json(args)?)),
        _ => Err(Error::UnknownDistanceFunction(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{DISTANCE_FUNCTIONS, json_to_distance_field};
    use crate::{Error, json::parse_object, vec::Point3};

    #[test]
    fn every_registered_name_builds_with_defaults() {
        for name in DISTANCE_FUNCTIONS {
            let args = if name == "julia" {
                parse_object(r#"{"c": [-0.2, 0.6, 0.2, 0.0]}"#).unwrap()
            } else {
                HashMap::new()
            };
            let field = json_to_distance_field(name, &args).unwrap();
            assert_eq!(field.name(), name);
        }
    }

    #[test]
    fn unknown_function_is_rejected() {
        let err = json_to_distance_field("mandelbox", &HashMap::new()).err().unwrap();
        assert!(matches!(err, Error::UnknownDistanceFunction(name) if name == "mandelbox"));
    }

    #[test]
    fn unknown_argument_is_rejected() {
        let args = parse_object(r#"{"radius": 1.0, "radus": 2.0}"#).unwrap();
        let err = json_to_distance_field("sphere", &args).err().unwrap();
        assert!(matches!(err, Error::UnknownParameter(f, a) if f == "sphere" && a == "radus"));
    }

    #[test]
    fn default_batch_matches_scalar() {
        let args = parse_object(r#"{"radius": 0.7, "center": [0.1, 0.0, -0.2]}"#).unwrap();
        let field = json_to_distance_field("sphere", &args).unwrap();
        let points: Vec<Point3> = (0..50)
            .map(|i| Point3::new(f64::from(i) * 0.05 - 1.0, 0.3, -0.1))
            .collect();
        let mut out = vec![0.0; points.len()];
        field.signed_distance_batch(&points, &mut out);
        for (p, d) in points.iter().zip(&out) {
            assert_eq!(field.signed_distance(*p).to_bits(), d.to_bits());
        }
    }
}
