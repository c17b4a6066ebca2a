use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde_json::{Map, Value};

use crate::{CheckOutcome, DatasetLayout};

/// Shown in place of a missing `info.json` field.
pub const NOT_AVAILABLE: &str = "N/A";

/// Why a metadata file could not be loaded.
#[derive(thiserror::Error, Debug)]
pub enum MetadataError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// Load a JSON file whose top level must be an object. Key order is preserved.
pub fn load_json_object(path: impl AsRef<Path>) -> Result<Map<String, Value>, MetadataError> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    match serde_json::from_reader(reader)? {
        Value::Object(object) => Ok(object),
        other => Err(MetadataError::NotAnObject(json_type_name(&other))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// The fields of `meta/info.json` that get reported. Everything else is ignored.
///
/// All fields are optional: a dataset without e.g. `fps` is still valid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetInfo {
    pub name: Option<Value>,
    pub total_episodes: Option<Value>,
    pub total_frames: Option<Value>,
    pub fps: Option<Value>,
}

impl DatasetInfo {
    pub fn from_json(object: &Map<String, Value>) -> Self {
        let field = |key: &str| object.get(key).filter(|value| !value.is_null()).cloned();
        Self {
            name: field("name"),
            total_episodes: field("total_episodes"),
            total_frames: field("total_frames"),
            fps: field("fps"),
        }
    }
}

/// Human-readable rendering of a metadata value.
///
/// Strings are printed without quotes, everything else as compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(string) => string.clone(),
        other => other.to_string(),
    }
}

fn display_field(value: Option<&Value>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_owned(), display_value)
}

/// The items listed under one modality of `meta/modality.json`.
///
/// Arrays list their elements and objects their keys. Anything else is a single item.
pub fn modality_items(items: &Value) -> Vec<String> {
    match items {
        Value::Array(elements) => elements.iter().map(display_value).collect(),
        Value::Object(object) => object.keys().cloned().collect(),
        scalar => vec![display_value(scalar)],
    }
}

/// Load and print the contents of `info.json`, `modality.json` and `stats.json`.
///
/// Fails on the first file that cannot be loaded. Missing optional fields never fail.
pub fn check_metadata(layout: &DatasetLayout) -> CheckOutcome {
    let mut outcome = CheckOutcome::new("Checking Metadata");

    let info_path = layout.info_path();
    let info = match load_json_object(&info_path) {
        Ok(info) => DatasetInfo::from_json(&info),
        Err(err) => return outcome.fail(loading_error(&info_path, &err)),
    };

    outcome.header("Dataset Info");
    outcome.text(format!("Dataset name: {}", display_field(info.name.as_ref())));
    outcome.text(format!(
        "Total episodes: {}",
        display_field(info.total_episodes.as_ref())
    ));
    outcome.text(format!(
        "Total frames: {}",
        display_field(info.total_frames.as_ref())
    ));
    outcome.text(format!("FPS: {}", display_field(info.fps.as_ref())));

    let modality_path = layout.modality_path();
    let modalities = match load_json_object(&modality_path) {
        Ok(modalities) => modalities,
        Err(err) => return outcome.fail(loading_error(&modality_path, &err)),
    };

    outcome.header("Modalities");
    for (modality, items) in &modalities {
        outcome.text(format!("{modality}:"));
        for item in modality_items(items) {
            outcome.text(format!("  - {item}"));
        }
    }

    let stats_path = layout.stats_path();
    let stats = match load_json_object(&stats_path) {
        Ok(stats) => stats,
        Err(err) => return outcome.fail(loading_error(&stats_path, &err)),
    };

    outcome.header("Statistics");
    for (key, values) in &stats {
        if let Value::Object(nested) = values {
            outcome.text(format!("{key}:"));
            for (inner_key, inner_value) in nested {
                outcome.text(format!("  {inner_key}: {}", display_value(inner_value)));
            }
        } else {
            outcome.text(format!("{key}: {}", display_value(values)));
        }
    }

    outcome
}

fn loading_error(path: &Path, err: &MetadataError) -> String {
    gr_log::debug!("Failed to load {path:?}: {err}");
    format!("Error loading {}: {err}", path.display())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_modality_items() {
        assert_eq!(
            modality_items(&json!(["left_arm", "right_arm"])),
            vec!["left_arm", "right_arm"]
        );
        assert_eq!(
            modality_items(&json!({"left_hand": {"start": 0, "end": 6}, "waist": {}})),
            vec!["left_hand", "waist"]
        );
        assert_eq!(
            modality_items(&json!([{"key": "ego_view"}])),
            vec![r#"{"key":"ego_view"}"#]
        );
        assert_eq!(modality_items(&json!(3)), vec!["3"]);
    }

    #[test]
    fn test_info_ignores_null_and_unknown_fields() {
        let object = json!({"name": "pick_n_place", "fps": null, "robot_type": "gr1"});
        let info = DatasetInfo::from_json(object.as_object().unwrap());

        assert_eq!(info.name, Some(json!("pick_n_place")));
        assert_eq!(info.fps, None);
        assert_eq!(display_field(info.fps.as_ref()), NOT_AVAILABLE);
    }

    #[test]
    fn test_load_json_object_rejects_arrays() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("info.json");
        std::fs::write(&path, "[1, 2]").unwrap();

        let err = load_json_object(&path).unwrap_err();
        assert!(matches!(err, MetadataError::NotAnObject("an array")));
        assert_eq!(err.to_string(), "expected a JSON object, found an array");
    }

    #[test]
    fn test_load_json_object_keeps_key_order() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("stats.json");
        std::fs::write(&path, r#"{"zeta": 1, "alpha": 2, "mid": 3}"#).unwrap();

        let object = load_json_object(&path).unwrap();
        assert_eq!(
            object.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["zeta", "alpha", "mid"]
        );
    }
}
