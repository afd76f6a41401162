use std::collections::HashMap;

use log::{info, warn};
use tinyjson::JsonValue;

use crate::{
    Error,
    constants::{DEFAULT_MAX_CELLS, STL_HEADER_SIZE},
    json::{json_to_bool, json_to_f64, json_to_string, json_to_u32, json_to_vec3, parse_object},
    sdf::{DistanceField, json_to_distance_field},
    vec::{Point3, Vec3},
    voxelizer::VoxelizerSettings,
};

const KNOWN_KEYS: [&str; 10] = [
    "distance_function",
    "arguments",
    "levels",
    "size",
    "center",
    "cutoff",
    "max_cells",
    "header",
    "dense",
    "mesh_arguments",
];

/// Everything needed to turn a distance function into a solid.
///
/// ```json
/// {
///     "distance_function": "quaternion_julia",
///     "arguments": {"cx": -0.2, "cy": 0.6, "cz": 0.2},
///     "levels": 5,
///     "size": 3.0
/// }
/// ```
pub struct SolidConfig {
    pub distance_function: String,
    pub field: Box<dyn DistanceField>,
    pub voxelizer: VoxelizerSettings,
    /// STL header, the exporter default when absent
    pub header: Option<String>,
    /// Sample every voxel instead of pruning
    pub dense: bool,
}

impl SolidConfig {
    /// Build the configuration, reporting every mistake before any sampling happens.
    pub fn from_json(json: &HashMap<String, JsonValue>) -> crate::Result<Self> {
        let mut keys: Vec<&String> = json.keys().collect();
        keys.sort();
        if let Some(key) = keys.into_iter().find(|k| !KNOWN_KEYS.contains(&k.as_str())) {
            return Err(Error::UnknownParameter("configuration".to_string(), key.clone()));
        }
        if json.contains_key("mesh_arguments") {
            warn!("`mesh_arguments` is ignored, the voxel face extractor has no parameters");
        }

        let distance_function = match json.get("distance_function") {
            None => {
                return Err(Error::MissingParameter(
                    "configuration".to_string(),
                    "distance_function",
                ));
            }
            Some(_) => json_to_string(json, "distance_function", "")?,
        };
        let empty = HashMap::new();
        let arguments = match json.get("arguments") {
            None | Some(JsonValue::Null) => &empty,
            Some(JsonValue::Object(args)) => args,
            Some(v) => {
                return Err(Error::InvalidParameter(
                    "arguments".to_string(),
                    format!("expected an object, got {v:?}"),
                ));
            }
        };
        let field = json_to_distance_field(&distance_function, arguments)?;

        let defaults = VoxelizerSettings::default();
        let center = json_to_vec3(json, "center", Vec3::new(0.0, 0.0, 0.0))?;
        let max_cells = json_to_f64(json, "max_cells", DEFAULT_MAX_CELLS as f64)?;
        if max_cells.is_nan() || max_cells < 1.0 || max_cells.fract() != 0.0 || max_cells > usize::MAX as f64 {
            return Err(Error::InvalidParameter(
                "max_cells".to_string(),
                format!("expected a positive integer, got {max_cells}"),
            ));
        }
        let voxelizer = VoxelizerSettings {
            levels: json_to_u32(json, "levels", defaults.levels)?,
            size: json_to_f64(json, "size", defaults.size)?,
            center: Point3::new(center.x, center.y, center.z),
            cutoff: json_to_f64(json, "cutoff", defaults.cutoff)?,
            max_cells: max_cells as usize,
        };
        voxelizer.validate()?;

        let header = match json.get("header") {
            None | Some(JsonValue::Null) => None,
            Some(_) => Some(json_to_string(json, "header", "")?),
        };
        let header_len = header.as_ref().map_or(0, String::len);
        if header_len > STL_HEADER_SIZE {
            return Err(Error::HeaderTooLong(header_len));
        }
        let dense = json_to_bool(json, "dense", false)?;

        info!(
            "Configuration: `{distance_function}`, {} levels, size {}{}",
            voxelizer.levels,
            voxelizer.size,
            if dense { ", dense sampling" } else { "" }
        );
        Ok(Self {
            distance_function,
            field,
            voxelizer,
            header,
            dense,
        })
    }

    pub fn from_json_str(contents: &str) -> crate::Result<Self> {
        Self::from_json(&parse_object(contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::SolidConfig;
    use crate::{Error, constants::DEFAULT_MAX_CELLS, vec::Point3};

    #[test]
    fn defaults() {
        let config = SolidConfig::from_json_str(r#"{"distance_function": "sphere"}"#).unwrap();
        assert_eq!(config.distance_function, "sphere");
        assert_eq!(config.field.name(), "sphere");
        assert_eq!(config.voxelizer.levels, 5);
        assert_eq!(config.voxelizer.size, 2.0);
        assert_eq!(config.voxelizer.center, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(config.voxelizer.cutoff, 0.0);
        assert_eq!(config.voxelizer.max_cells, DEFAULT_MAX_CELLS);
        assert_eq!(config.header, None);
        assert!(!config.dense);
    }

    #[test]
    fn full_configuration() {
        let config = SolidConfig::from_json_str(
            r#"{
                "distance_function": "quaternion_julia",
                "arguments": {"cx": -0.2, "cy": 0.6, "cz": 0.2, "iterations": 20},
                "levels": 3,
                "size": 3,
                "center": [0.5, 0, 0],
                "cutoff": -0.5,
                "max_cells": 100000,
                "header": "julia",
                "dense": true,
                "mesh_arguments": {"level": 0}
            }"#,
        )
        .unwrap();
        assert_eq!(config.field.name(), "quaternion_julia");
        assert_eq!(config.voxelizer.levels, 3);
        assert_eq!(config.voxelizer.size, 3.0);
        assert_eq!(config.voxelizer.center, Point3::new(0.5, 0.0, 0.0));
        assert_eq!(config.voxelizer.cutoff, -0.5);
        assert_eq!(config.voxelizer.max_cells, 100_000);
        assert_eq!(config.header.as_deref(), Some("julia"));
        assert!(config.dense);
    }

    #[test]
    fn null_arguments_use_field_defaults() {
        let config =
            SolidConfig::from_json_str(r#"{"distance_function": "torus", "arguments": null}"#).unwrap();
        assert_eq!(config.field.name(), "torus");
    }

    #[test]
    fn configuration_errors() {
        let err = |s: &str| SolidConfig::from_json_str(s).err().unwrap();
        assert!(matches!(err(r#"{"levels": 3}"#), Error::MissingParameter(_, "distance_function")));
        assert!(matches!(
            err(r#"{"distance_function": "mandelbulb"}"#),
            Error::UnknownDistanceFunction(_)
        ));
        assert!(matches!(
            err(r#"{"distance_function": "sphere", "arguments": {"radius": 1, "color": 2}}"#),
            Error::UnknownParameter(_, name) if name == "color"
        ));
        assert!(matches!(
            err(r#"{"distance_function": "julia"}"#),
            Error::MissingParameter(_, "c")
        ));
        assert!(matches!(
            err(r#"{"distance_function": "sphere", "size": 0}"#),
            Error::NonPositive("size")
        ));
        assert!(matches!(
            err(r#"{"distance_function": "sphere", "levels": 0}"#),
            Error::NonPositive("levels")
        ));
        assert!(matches!(
            err(r#"{"distance_function": "sphere", "levels": 2.5}"#),
            Error::InvalidParameter(name, _) if name == "levels"
        ));
        assert!(matches!(
            err(r#"{"distance_function": "sphere", "levels": 4, "max_cells": 1000}"#),
            Error::TooManyCells(4, _, 1000)
        ));
        assert!(matches!(
            err(r#"{"distance_function": "sphere", "sise": 2}"#),
            Error::UnknownParameter(_, name) if name == "sise"
        ));
        assert!(matches!(
            err(r#"{"distance_function": "sphere", "arguments": [1, 2]}"#),
            Error::InvalidParameter(name, _) if name == "arguments"
        ));
        assert!(matches!(err("[1, 2]"), Error::InvalidParameter(_, _)));
        assert!(matches!(err("{"), Error::Other(_)));
    }
}
