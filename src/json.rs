use std::collections::HashMap;

use tinyjson::JsonValue;

use crate::{Error, vec::Vec3};

fn invalid(name: &str, expected: &str, value: &JsonValue) -> Error {
    Error::InvalidParameter(name.to_string(), format!("expected {expected}, got {value:?}"))
}

pub fn json_to_f64(json: &HashMap<String, JsonValue>, name: &str, default: f64) -> crate::Result<f64> {
    match json.get(name) {
        None => Ok(default),
        Some(JsonValue::Number(v)) => Ok(*v),
        Some(v) => Err(invalid(name, "a number", v)),
    }
}

/// Read a whole number. Fractional values are refused rather than truncated.
pub fn json_to_u32(json: &HashMap<String, JsonValue>, name: &str, default: u32) -> crate::Result<u32> {
    match json.get(name) {
        None => Ok(default),
        Some(JsonValue::Number(v)) if v.fract() == 0.0 && *v >= 0.0 && *v <= f64::from(u32::MAX) => {
            Ok(*v as u32)
        }
        Some(v) => Err(invalid(name, "a non-negative integer", v)),
    }
}

pub fn json_to_bool(json: &HashMap<String, JsonValue>, name: &str, default: bool) -> crate::Result<bool> {
    match json.get(name) {
        None => Ok(default),
        Some(JsonValue::Boolean(v)) => Ok(*v),
        Some(v) => Err(invalid(name, "a boolean", v)),
    }
}

pub fn json_to_string(json: &HashMap<String, JsonValue>, name: &str, default: &str) -> crate::Result<String> {
    match json.get(name) {
        None => Ok(default.to_string()),
        Some(JsonValue::String(v)) => Ok(v.clone()),
        Some(v) => Err(invalid(name, "a string", v)),
    }
}

fn json_to_numbers(name: &str, value: &JsonValue, dim: usize) -> crate::Result<Vec<f64>> {
    match value {
        JsonValue::Array(vs) if vs.len() == dim => vs
            .iter()
            .map(|v| match v {
                JsonValue::Number(x) => Ok(*x),
                _ => Err(invalid(name, "an array of numbers", value)),
            })
            .collect(),
        _ => Err(invalid(name, &format!("an array of {dim} numbers"), value)),
    }
}

struct JsonVec3(Vec3);
impl TryFrom<(&str, &JsonValue)> for JsonVec3 {
    type Error = crate::Error;

    fn try_from((name, value): (&str, &JsonValue)) -> Result<Self, Self::Error> {
        match value {
            JsonValue::Number(v) => Ok(Self(Vec3::new(*v, *v, *v))),
            _ => {
                let v = json_to_numbers(name, value, 3)?;
                Ok(Self(Vec3::new(v[0], v[1], v[2])))
            }
        }
    }
}

pub fn json_to_vec3(json: &HashMap<String, JsonValue>, name: &str, default: Vec3) -> crate::Result<Vec3> {
    json.get(name).map_or(Ok(default), |value| {
        JsonVec3::try_from((name, value)).map(|v| v.0)
    })
}

/// Read a `[w, x, y, z]` array
pub fn json_to_vec4(json: &HashMap<String, JsonValue>, name: &str) -> crate::Result<Option<[f64; 4]>> {
    json.get(name)
        .map(|value| json_to_numbers(name, value, 4).map(|v| [v[0], v[1], v[2], v[3]]))
        .transpose()
}

// Merge two JSON
pub fn merge_json(
    json: &mut HashMap<String, JsonValue>,
    add: &HashMap<String, JsonValue>,
) -> crate::Result<()> {
    for (name, value) in add {
        // Two case now:
        // 1) If both values are objects, we can call this function recursively
        // 2) Otherwise, we replace the value
        match (json.get_mut(name), value) {
            (Some(JsonValue::Object(child)), JsonValue::Object(add_child)) => {
                merge_json(child, add_child)?;
            }
            (Some(json_child), JsonValue::Object(_)) => {
                return Err(Error::FailedPatchJson(json_child.clone(), value.clone()));
            }
            (Some(json_child), _) => *json_child = value.clone(),
            (None, _) => {
                json.insert(name.clone(), value.clone());
            }
        }
    }

    Ok(())
}

/// Parse a JSON document whose root must be an object
pub fn parse_object(contents: &str) -> crate::Result<HashMap<String, JsonValue>> {
    let value: JsonValue = contents.parse().map_err(|err| Error::Other(Box::new(err)))?;
    match value {
        JsonValue::Object(map) => Ok(map),
        other => Err(Error::InvalidParameter(
            "configuration".to_string(),
            format!("root must be an object, got {other:?}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tinyjson::JsonValue;

    use super::{json_to_f64, json_to_u32, json_to_vec3, json_to_vec4, merge_json, parse_object};
    use crate::{Error, vec::Vec3};

    fn object(s: &str) -> HashMap<String, JsonValue> {
        parse_object(s).unwrap()
    }

    #[test]
    fn json_vec_3() {
        let json = object(r#"{"center": [1.0, 2.0, 3.0]}"#);
        let v = json_to_vec3(&json, "center", Vec3::new(0.0, 0.0, 0.0)).unwrap();
        assert_eq!(v, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn json_vec_3_float() {
        let json = object(r#"{"center": 1.0}"#);
        let v = json_to_vec3(&json, "center", Vec3::new(0.0, 0.0, 0.0)).unwrap();
        assert_eq!(v, Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn json_vec_3_wrong_dimension() {
        let json = object(r#"{"center": [1.0, 2.0]}"#);
        let err = json_to_vec3(&json, "center", Vec3::new(0.0, 0.0, 0.0)).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(name, _) if name == "center"));
    }

    #[test]
    fn json_vec_4() {
        let json = object(r#"{"c": [0.1, -0.2, 0.3, 0.0]}"#);
        assert_eq!(json_to_vec4(&json, "c").unwrap(), Some([0.1, -0.2, 0.3, 0.0]));
        assert_eq!(json_to_vec4(&json, "missing").unwrap(), None);
    }

    #[test]
    fn defaults_and_type_errors() {
        let json = object(r#"{"size": "big", "levels": 4.5, "radius": 2}"#);
        assert!(json_to_f64(&json, "size", 1.0).is_err());
        assert!(json_to_u32(&json, "levels", 5).is_err());
        assert_eq!(json_to_f64(&json, "radius", 1.0).unwrap(), 2.0);
        assert_eq!(json_to_u32(&json, "iterations", 50).unwrap(), 50);
    }

    #[test]
    fn merge_nested_objects() {
        let mut json = object(r#"{"levels": 5, "arguments": {"radius": 1.0, "center": [0, 0, 0]}}"#);
        let add = object(r#"{"levels": 3, "arguments": {"radius": 0.5}}"#);
        merge_json(&mut json, &add).unwrap();
        assert_eq!(json_to_u32(&json, "levels", 0).unwrap(), 3);
        let JsonValue::Object(args) = &json["arguments"] else {
            panic!("arguments must stay an object");
        };
        assert_eq!(json_to_f64(args, "radius", 0.0).unwrap(), 0.5);
        assert!(args.contains_key("center"));
    }

    #[test]
    fn merge_object_into_scalar_fails() {
        let mut json = object(r#"{"arguments": 1}"#);
        let add = object(r#"{"arguments": {"radius": 0.5}}"#);
        assert!(matches!(
            merge_json(&mut json, &add),
            Err(Error::FailedPatchJson(_, _))
        ));
    }
}
