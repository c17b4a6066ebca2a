use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::datatypes::{Schema, SchemaRef};
use itertools::Itertools as _;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use walkdir::WalkDir;

use gr_log::ResultExt as _;

use crate::{CheckOptions, CheckOutcome, DatasetLayout, PARQUET_EXTENSION, VIDEO_EXTENSIONS};

/// How many file names / columns are shown before the output is cut short.
pub const PREVIEW_LIMIT: usize = 5;

/// List the regular files in `dir` whose name ends with one of `extensions`.
///
/// Returns paths relative to `dir`, with `/` separators, sorted. With `recursive`,
/// nested directories are searched too; otherwise only the top level is.
pub fn list_files_with_extensions(
    dir: &Path,
    extensions: &[&str],
    recursive: bool,
) -> std::io::Result<Vec<String>> {
    let matches_extension =
        |name: &str| extensions.iter().any(|extension| name.ends_with(extension));

    let mut files = Vec::new();

    if recursive {
        // Surface an unreadable root the same way the non-recursive branch does.
        std::fs::read_dir(dir)?;

        for entry in WalkDir::new(dir).min_depth(1).follow_links(true) {
            let Some(entry) = entry.warn_on_err_once("Skipping unreadable entry") else {
                continue;
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(dir) else {
                continue;
            };
            let relative = relative
                .components()
                .map(|component| component.as_os_str().to_string_lossy())
                .join("/");
            if matches_extension(&relative) {
                files.push(relative);
            }
        }
    } else {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if matches_extension(&name) && entry.path().is_file() {
                files.push(name);
            }
        }
    }

    files.sort();
    gr_log::debug!("Found {} {extensions:?} file(s) in {dir:?}", files.len());
    Ok(files)
}

/// Why a parquet file could not be summarized.
#[derive(thiserror::Error, Debug)]
pub enum ParquetReadError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),
}

/// Schema and size of a parquet file, read from its footer without decoding any rows.
#[derive(Debug, Clone)]
pub struct ParquetSummary {
    pub schema: SchemaRef,
    pub num_rows: i64,
}

impl ParquetSummary {
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ParquetReadError> {
        let file = File::open(path.as_ref())?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        Ok(Self {
            schema: builder.schema().clone(),
            num_rows: builder.metadata().file_metadata().num_rows(),
        })
    }
}

/// One `name: type` line per field.
pub fn format_schema(schema: &Schema) -> String {
    schema
        .fields()
        .iter()
        .map(|field| format!("{}: {}", field.name(), field.data_type()))
        .join("\n")
}

/// List the parquet files under `data/` and inspect the first one.
///
/// Only the lexicographically-first file is opened; the rest are just listed.
pub fn check_data_files(layout: &DatasetLayout, options: &CheckOptions) -> CheckOutcome {
    let mut outcome = CheckOutcome::new("Checking Data Files");
    let data_dir = layout.data_dir();

    let parquet_files =
        match list_files_with_extensions(&data_dir, &[PARQUET_EXTENSION], options.recursive) {
            Ok(files) => files,
            Err(err) => {
                return outcome.fail(format!(
                    "Error listing data directory {}: {err}",
                    data_dir.display()
                ));
            }
        };

    let Some(first_file) = parquet_files.first() else {
        return outcome.fail("No parquet files found in data directory");
    };

    outcome.text(format!("Found {} parquet files:", parquet_files.len()));
    for file in &parquet_files {
        outcome.text(format!("- {file}"));
    }

    let first_path: PathBuf = data_dir.join(first_file);
    let summary = match ParquetSummary::read(&first_path) {
        Ok(summary) => summary,
        Err(err) => {
            gr_log::debug!("Failed to read {first_path:?}: {err}");
            return outcome.fail(format!("Error reading parquet file: {err}"));
        }
    };

    outcome.blank();
    outcome.text(format!(
        "First parquet file schema: {}",
        format_schema(&summary.schema)
    ));
    outcome.text(format!("Number of rows: {}", summary.num_rows));
    outcome.blank();
    outcome.text("First few columns:");
    let fields = summary.schema.fields();
    for field in fields.iter().take(PREVIEW_LIMIT) {
        outcome.text(format!("- {}: {}", field.name(), field.data_type()));
    }
    if fields.len() > PREVIEW_LIMIT {
        outcome.text("...");
    }

    outcome
}

/// Count the video files under `videos/`. They are never decoded.
pub fn check_video_files(layout: &DatasetLayout, options: &CheckOptions) -> CheckOutcome {
    let outcome = CheckOutcome::new("Checking Video Files");
    let videos_dir = layout.videos_dir();

    if !videos_dir.is_dir() {
        return outcome.fail("Videos directory not found");
    }

    let listing = list_files_with_extensions(&videos_dir, &VIDEO_EXTENSIONS, options.recursive);
    report_video_files(outcome, &videos_dir, listing)
}

fn report_video_files(
    mut outcome: CheckOutcome,
    videos_dir: &Path,
    listing: std::io::Result<Vec<String>>,
) -> CheckOutcome {
    let video_files = match listing {
        Ok(files) => files,
        Err(err) => {
            return outcome.fail(format!(
                "Error listing videos directory {}: {err}",
                videos_dir.display()
            ));
        }
    };

    if video_files.is_empty() {
        return outcome.fail("No video files found");
    }

    outcome.text(format!("Found {} video files", video_files.len()));
    outcome.text("First few video files:");
    for file in video_files.iter().take(PREVIEW_LIMIT) {
        outcome.text(format!("- {file}"));
    }

    outcome
}
