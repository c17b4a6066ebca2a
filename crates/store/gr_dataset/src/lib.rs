//! Verification of robot-demonstration datasets stored in the `data/meta/videos` layout.
//!
//! Every check is independent and best-effort: it never returns an error, it returns a
//! [`CheckOutcome`] carrying a pass/fail flag and the lines to show the user.
//! [`verify_dataset`] runs all of them, even after earlier ones failed, so that a single run
//! reports as many problems as possible.

mod diagnostic;
mod files;
mod layout;
mod metadata;
mod report;
mod structure;

pub use self::diagnostic::{CheckOutcome, Diagnostic, marker};
pub use self::files::{
    PREVIEW_LIMIT, ParquetReadError, ParquetSummary, check_data_files, check_video_files,
    format_schema, list_files_with_extensions,
};
pub use self::layout::{
    DatasetLayout, PARQUET_EXTENSION, REQUIRED_DIRS, REQUIRED_META_FILES, VIDEO_EXTENSIONS,
};
pub use self::metadata::{
    DatasetInfo, MetadataError, NOT_AVAILABLE, check_metadata, display_value, load_json_object,
    modality_items,
};
pub use self::report::{DatasetReport, verify_dataset};
pub use self::structure::check_structure;

/// Knobs for the file checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckOptions {
    /// Also look for parquet and video files in nested directories, such as the
    /// `data/chunk-000/` directories of `LeRobot` v2 datasets.
    pub recursive: bool,
}
