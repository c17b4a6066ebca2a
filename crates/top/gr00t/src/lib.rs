//! The `gr00t` command line tool.
//!
//! * `gr00t check-dataset <ROOT>` verifies the layout of a dataset.
//! * `gr00t eval <MODEL_DIR>` evaluates a trained checkpoint.
//!
//! Log verbosity is controlled with `RUST_LOG`, see [`gr_log::setup_logging`].

mod commands;

pub use self::commands::{CheckDatasetCommand, Commands, EvalCommand};

/// Tools for GR00T robot-learning datasets and checkpoints.
#[derive(Debug, clap::Parser)]
#[clap(author, version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

/// Run the tool with the given command line, and return the process exit code.
pub fn run<I, T>(args: I) -> anyhow::Result<u8>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    use clap::Parser as _;
    let args = Args::parse_from(args);
    args.command.run()
}
