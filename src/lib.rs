#[macro_use]
extern crate quick_error;

pub type Real = f64;

pub mod constants {
    use crate::Real;
    pub const SQRT_THREE: Real = 1.732_050_807_568_877_2;
    /// Default ceiling on the number of voxel cells allocated by one call.
    ///
    /// Peak memory is about two bytes per cell (the `i8` grid and the boolean
    /// mask) plus the buffers of one slice of block centers, at most `side²`
    /// points and their field state.
    pub const DEFAULT_MAX_CELLS: usize = 1 << 30;
    /// Size of the binary STL header in bytes
    pub const STL_HEADER_SIZE: usize = 80;
}

quick_error! {
    #[derive(Debug)]
    pub enum Error {
        /// Distance function name not present in the registry
        UnknownDistanceFunction(name: String) {
            display("Unknown distance function {:?} (options are: {})", name, sdf::DISTANCE_FUNCTIONS.join(", "))
        }
        /// Required parameter absent
        MissingParameter(function: String, name: &'static str) {
            display("Distance function {} requires the {:?} argument", function, name)
        }
        /// Parameter not understood by the distance function
        UnknownParameter(function: String, name: String) {
            display("Distance function {} got an unexpected argument {:?}", function, name)
        }
        /// Parameter present but unusable
        InvalidParameter(name: String, reason: String) {
            display("Invalid value for {}: {}", name, reason)
        }
        /// Size, levels or resolution that must be strictly positive
        NonPositive(name: &'static str) {
            display("{} must be strictly positive", name)
        }
        /// Grid would exceed the configured memory ceiling
        TooManyCells(levels: u32, cells: u128, max: usize) {
            display("Subdivision depth {} needs {} cells, above the ceiling of {}", levels, cells, max)
        }
        /// STL header does not fit
        HeaderTooLong(len: usize) {
            display("STL header is {} bytes long, at most {} are allowed", len, constants::STL_HEADER_SIZE)
        }
        /// Face referencing a vertex that does not exist
        FaceIndexOutOfRange(face: usize, index: u32, vertices: usize) {
            display("Face {} references vertex {} but the mesh only has {} vertices", face, index, vertices)
        }
        /// Truncated or malformed STL stream
        InvalidStl(reason: String) {
            display("Invalid binary STL: {}", reason)
        }
        /// Fuse two json failed
        FailedPatchJson(json: tinyjson::JsonValue, target: tinyjson::JsonValue) {
            display("Impossible to patch this JSON part {:?} to this one {:?}", json, target)
        }
        /// I/O failure
        Io(err: std::io::Error) {
            from()
            display("I/O error: {}", err)
            source(err)
        }
        /// Other error
        Other(err: Box<dyn std::error::Error>) {
            source(&**err)
        }
    }
}
pub type Result<T> = std::result::Result<T, Error>;

pub mod aabb;
pub mod array3d;
pub mod config;
pub mod extract;
pub mod json;
pub mod mesh;
pub mod quaternion;
pub mod sdf;
pub mod stl;
pub mod utils;
pub mod vec;
pub mod voxelizer;
