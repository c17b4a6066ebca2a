use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Embodiment whose modality configuration is used unless told otherwise.
pub const DEFAULT_EMBODIMENT: &str = "gr1";

#[derive(thiserror::Error, Debug)]
pub enum CheckpointError {
    #[error("Failed to read {0:?}: {1}")]
    Io(PathBuf, std::io::Error),

    #[error("Failed to parse {0:?}: {1}")]
    Json(PathBuf, serde_json::Error),

    #[error("{path:?} has no {key:?} entry")]
    MissingKey { path: PathBuf, key: String },
}

/// Constructor arguments of the policy, from `config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Passed through to the policy untouched.
    pub model_args: Map<String, Value>,
}

/// How the policy slices the data of one embodiment into model inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModalityConfig {
    /// Frame offsets, relative to the current frame, fed to the model.
    pub delta_indices: Vec<i64>,

    /// Dataset keys belonging to this modality, e.g. `video.ego_view`.
    pub modality_keys: Vec<String>,
}

/// The files of an exported checkpoint.
///
/// ```text
/// .
/// ├── config.json
/// ├── experiment_cfg
/// │  └── metadata.json
/// └── pytorch_model.bin
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointDir {
    model_dir: PathBuf,
}

impl CheckpointDir {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
        }
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.model_dir.join("config.json")
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.model_dir.join("experiment_cfg").join("metadata.json")
    }

    pub fn weights_path(&self) -> PathBuf {
        self.model_dir.join("pytorch_model.bin")
    }

    /// Where evaluation results are written.
    pub fn results_path(&self) -> PathBuf {
        self.model_dir.join("test_results.json")
    }

    pub fn load_config(&self) -> Result<ModelConfig, CheckpointError> {
        read_json(&self.config_path())
    }

    /// The modality configuration stored for `embodiment` in `experiment_cfg/metadata.json`.
    pub fn load_modality_config(&self, embodiment: &str) -> Result<ModalityConfig, CheckpointError> {
        let path = self.metadata_path();
        let metadata: Map<String, Value> = read_json(&path)?;

        let missing = |key: &str| CheckpointError::MissingKey {
            path: path.clone(),
            key: key.to_owned(),
        };

        let modality_config = metadata
            .get(embodiment)
            .ok_or_else(|| missing(embodiment))?
            .get("modality_config")
            .ok_or_else(|| missing(&format!("{embodiment}.modality_config")))?;

        ModalityConfig::deserialize(modality_config)
            .map_err(|err| CheckpointError::Json(path.clone(), err))
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CheckpointError> {
    let file = File::open(path).map_err(|err| CheckpointError::Io(path.to_owned(), err))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|err| CheckpointError::Json(path.to_owned(), err))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, contents: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_load_modality_config() {
        let tmp = tempfile::tempdir().unwrap();
        let checkpoint = CheckpointDir::new(tmp.path());
        write(
            &checkpoint.metadata_path(),
            r#"{"gr1": {"modality_config": {"delta_indices": [0, 1], "modality_keys": ["action.left_arm"]}}}"#,
        );

        assert_eq!(
            checkpoint.load_modality_config("gr1").unwrap(),
            ModalityConfig {
                delta_indices: vec![0, 1],
                modality_keys: vec!["action.left_arm".to_owned()],
            }
        );
        assert!(matches!(
            checkpoint.load_modality_config("so100"),
            Err(CheckpointError::MissingKey { key, .. }) if key == "so100"
        ));
    }

    #[test]
    fn test_modality_config_rejects_unknown_fields() {
        let tmp = tempfile::tempdir().unwrap();
        let checkpoint = CheckpointDir::new(tmp.path());
        write(
            &checkpoint.metadata_path(),
            r#"{"gr1": {"modality_config": {"delta_indices": [0], "modality_keys": [], "stride": 2}}}"#,
        );

        assert!(matches!(
            checkpoint.load_modality_config("gr1"),
            Err(CheckpointError::Json(..))
        ));
    }

    #[test]
    fn test_config_requires_model_args() {
        let tmp = tempfile::tempdir().unwrap();
        let checkpoint = CheckpointDir::new(tmp.path());

        assert!(matches!(
            checkpoint.load_config(),
            Err(CheckpointError::Io(..))
        ));

        write(&checkpoint.config_path(), r#"{"architectures": ["GR00T"]}"#);
        let err = checkpoint.load_config().unwrap_err();
        assert!(err.to_string().contains("model_args"), "{err}");

        write(
            &checkpoint.config_path(),
            r#"{"model_args": {"action_horizon": 16}, "architectures": ["GR00T"]}"#,
        );
        let config = checkpoint.load_config().unwrap();
        assert_eq!(config.model_args["action_horizon"], 16);
    }
}
