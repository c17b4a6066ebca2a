use std::fmt;
use std::path::{Path, PathBuf};

use crate::diagnostic::write_lines;
use crate::{
    CheckOptions, CheckOutcome, DatasetLayout, Diagnostic, check_data_files, check_metadata,
    check_structure, check_video_files, marker,
};

/// The outcome of every check run against one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetReport {
    pub root: PathBuf,
    pub structure: CheckOutcome,
    pub metadata: CheckOutcome,
    pub data_files: CheckOutcome,
    pub video_files: CheckOutcome,
}

/// Run all four checks against the dataset at `root`.
///
/// The checks don't short-circuit each other: a missing `meta/` directory is reported by the
/// structure check and then again by the metadata check.
pub fn verify_dataset(root: impl AsRef<Path>, options: &CheckOptions) -> DatasetReport {
    let layout = DatasetLayout::new(root.as_ref());
    gr_log::debug!("Verifying dataset at {:?} ({options:?})", layout.root());

    DatasetReport {
        root: layout.root().to_path_buf(),
        structure: check_structure(&layout),
        metadata: check_metadata(&layout),
        data_files: check_data_files(&layout, options),
        video_files: check_video_files(&layout, options),
    }
}

impl DatasetReport {
    /// Each check together with its label in the summary.
    pub fn checks(&self) -> [(&'static str, &CheckOutcome); 4] {
        [
            ("Dataset structure", &self.structure),
            ("Metadata", &self.metadata),
            ("Data files", &self.data_files),
            ("Video files", &self.video_files),
        ]
    }

    /// Did every check pass?
    pub fn is_valid(&self) -> bool {
        self.checks().iter().all(|(_, outcome)| outcome.passed)
    }

    fn summary_lines(&self) -> Vec<Diagnostic> {
        let mut lines = vec![Diagnostic::Header("Summary".to_owned())];
        lines.extend(self.checks().iter().map(|(label, outcome)| {
            Diagnostic::Text(format!("{label}: {}", marker(outcome.passed)))
        }));
        lines.push(Diagnostic::Blank);
        lines.push(if self.is_valid() {
            Diagnostic::Success("Dataset appears to be valid and properly structured!".to_owned())
        } else {
            Diagnostic::Failure(
                "There are issues with the dataset. Please check the messages above.".to_owned(),
            )
        });
        lines
    }
}

impl fmt::Display for DatasetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dataset path: {}", self.root.display())?;
        for (_, outcome) in self.checks() {
            write_lines(f, &outcome.lines)?;
        }
        write_lines(f, &self.summary_lines())
    }
}
