use std::path::PathBuf;

use gr_eval::{
    CheckpointDir, DEFAULT_EMBODIMENT, DEFAULT_NUM_BATCHES, DeviceChoice, EvalError, EvalOptions,
    ModuleRegistry, Policy, UnlinkedPolicy, UnlinkedPolicyFactory, load_policy, run_evaluation,
};

// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DeviceArg {
    /// CUDA if available, else the CPU.
    Auto,
    Cpu,
    Cuda,
}

impl From<DeviceArg> for DeviceChoice {
    fn from(device: DeviceArg) -> Self {
        match device {
            DeviceArg::Auto => Self::Auto,
            DeviceArg::Cpu => Self::Cpu,
            DeviceArg::Cuda => Self::Cuda,
        }
    }
}

#[derive(Debug, Clone, clap::Parser)]
pub struct EvalCommand {
    /// Directory of the trained checkpoint.
    model_dir: PathBuf,

    /// Which embodiment's modality configuration to use.
    #[clap(long, default_value = DEFAULT_EMBODIMENT)]
    embodiment: String,

    #[clap(long, value_enum, default_value_t = DeviceArg::Auto)]
    device: DeviceArg,

    /// Stop after this many test batches.
    #[clap(long, default_value_t = DEFAULT_NUM_BATCHES)]
    num_batches: usize,

    /// Don't register stand-ins for the flash-attention kernels.
    ///
    /// Only useful with a model backend that brings its own kernels.
    #[clap(long)]
    no_flash_attn_stubs: bool,
}

impl EvalCommand {
    /// Returns the process exit code.
    pub fn run(self) -> anyhow::Result<u8> {
        let Self {
            model_dir,
            embodiment,
            device,
            num_batches,
            no_flash_attn_stubs,
        } = self;

        let registry = if no_flash_attn_stubs {
            ModuleRegistry::new()
        } else {
            ModuleRegistry::with_flash_attn_stubs()
        };

        let options = EvalOptions {
            embodiment,
            device: device.into(),
            num_batches,
        };
        let checkpoint = CheckpointDir::new(model_dir);

        let mut loaded = load_policy(&checkpoint, &options, &UnlinkedPolicyFactory, &registry)?;

        // TODO: wire up a loader for the test split of the dataset.
        let test_batches: Option<Vec<anyhow::Result<<UnlinkedPolicy as Policy>::Batch>>> = None;

        match run_evaluation(
            &checkpoint,
            &mut loaded.policy,
            test_batches,
            loaded.device,
            &options,
        ) {
            Ok(_) => Ok(0),
            // Already logged by `run_evaluation`.
            Err(EvalError::DataSourceNotImplemented) => Ok(1),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser as _;

    use super::*;

    #[test]
    fn test_defaults() {
        let cmd = EvalCommand::parse_from(["eval", "./checkpoint"]);
        assert_eq!(cmd.model_dir, PathBuf::from("./checkpoint"));
        assert_eq!(cmd.embodiment, "gr1");
        assert_eq!(cmd.device, DeviceArg::Auto);
        assert_eq!(cmd.num_batches, 10);
        assert!(!cmd.no_flash_attn_stubs);
    }

    #[test]
    fn test_flags() {
        let cmd = EvalCommand::parse_from([
            "eval",
            "./checkpoint",
            "--embodiment",
            "so100",
            "--device",
            "cuda",
            "--num-batches",
            "3",
            "--no-flash-attn-stubs",
        ]);
        assert_eq!(cmd.embodiment, "so100");
        assert_eq!(DeviceChoice::from(cmd.device), DeviceChoice::Cuda);
        assert_eq!(cmd.num_batches, 3);
        assert!(cmd.no_flash_attn_stubs);
    }
}
