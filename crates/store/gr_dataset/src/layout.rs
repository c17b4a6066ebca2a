use std::path::{Path, PathBuf};

/// Subdirectories every dataset root must contain, in the order they are checked.
pub const REQUIRED_DIRS: [&str; 3] = ["data", "meta", "videos"];

/// Files that must exist under `meta/`, in the order they are checked.
pub const REQUIRED_META_FILES: [&str; 3] = ["info.json", "modality.json", "stats.json"];

/// Extension of the tabular episode files under `data/`.
pub const PARQUET_EXTENSION: &str = ".parquet";

/// Extensions of the media files under `videos/`.
pub const VIDEO_EXTENSIONS: [&str; 3] = [".mp4", ".avi", ".mov"];

/// Paths of a robot-demonstration dataset on disk.
///
/// ```text
/// .
/// ├── data
/// │  ├── episode_000000.parquet
/// │  └── …
/// ├── meta
/// │  ├── info.json
/// │  ├── modality.json
/// │  └── stats.json
/// └── videos
///     ├── episode_000000.mp4
///     └── …
/// ```
///
/// `LeRobot` v2 datasets nest both `data/` and `videos/` one or two levels deeper
/// (`data/chunk-000/…`); see [`crate::CheckOptions::recursive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLayout {
    root: PathBuf,
}

impl DatasetLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    pub fn meta_dir(&self) -> PathBuf {
        self.root.join("meta")
    }

    pub fn videos_dir(&self) -> PathBuf {
        self.root.join("videos")
    }

    pub fn info_path(&self) -> PathBuf {
        self.meta_dir().join("info.json")
    }

    pub fn modality_path(&self) -> PathBuf {
        self.meta_dir().join("modality.json")
    }

    pub fn stats_path(&self) -> PathBuf {
        self.meta_dir().join("stats.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_rooted() {
        let layout = DatasetLayout::new("/datasets/robot_sim.PickNPlace");

        assert_eq!(
            layout.data_dir(),
            Path::new("/datasets/robot_sim.PickNPlace/data")
        );
        assert_eq!(
            layout.stats_path(),
            Path::new("/datasets/robot_sim.PickNPlace/meta/stats.json")
        );
    }
}
