mod check_dataset;
mod eval;

use clap::Subcommand;

pub use self::check_dataset::CheckDatasetCommand;
pub use self::eval::EvalCommand;

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Verify that a directory has the data/meta/videos layout of a training dataset.
    ///
    /// Prints a report, and exits with a non-zero code if any check failed.
    ///
    /// Example: `gr00t check-dataset ./demo_data/robot_sim.PickNPlace`
    CheckDataset(CheckDatasetCommand),

    /// Load a trained checkpoint and evaluate its loss over the test split.
    ///
    /// Results are written to `test_results.json` inside the checkpoint directory.
    ///
    /// Example: `gr00t eval ./checkpoints/gr00t-n1 --embodiment gr1 --device cpu`
    Eval(EvalCommand),
}

impl Commands {
    /// Returns the process exit code.
    pub fn run(self) -> anyhow::Result<u8> {
        match self {
            Self::CheckDataset(cmd) => cmd.run(),
            Self::Eval(cmd) => cmd.run(),
        }
    }
}
