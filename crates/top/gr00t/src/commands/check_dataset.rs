use std::path::PathBuf;

use gr_dataset::{CheckOptions, verify_dataset};

// ---

#[derive(Debug, Clone, clap::Parser)]
pub struct CheckDatasetCommand {
    /// Root directory of the dataset.
    path: PathBuf,

    /// Also look for parquet and video files in subdirectories, e.g. `data/chunk-000/`.
    #[clap(long)]
    recursive: bool,
}

impl CheckDatasetCommand {
    pub fn run(self) -> anyhow::Result<u8> {
        let Self { path, recursive } = self;

        let report = verify_dataset(&path, &CheckOptions { recursive });

        // The report is the output of this command, so it goes to stdout rather than the log.
        print!("{report}");

        Ok(if report.is_valid() { 0 } else { 1 })
    }
}
