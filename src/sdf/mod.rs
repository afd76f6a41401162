pub mod fractal;
pub mod sdf_object;
pub mod sphere;
pub mod torus;

pub use fractal::{EscapeState, FractalDistanceEstimator, FractalParameters};
pub use sdf_object::{DISTANCE_FUNCTIONS, DistanceField, json_to_distance_field};
pub use sphere::{SdfSphere, SphereParameters};
pub use torus::{SdfTorus, TorusParameters};
