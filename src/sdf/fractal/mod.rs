pub mod julia;

pub use julia::{EscapeState, FractalDistanceEstimator, FractalParameters};
