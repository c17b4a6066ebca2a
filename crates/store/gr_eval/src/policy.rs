use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::{AttentionKernels, Device, ModalityConfig};

/// What [`Policy::compute_loss`] reports for one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LossOutput {
    pub loss: f64,

    /// Auxiliary metrics, in the order the policy reports them.
    pub metrics: IndexMap<String, f64>,
}

/// A trained policy, as far as evaluation is concerned.
///
/// The model itself lives elsewhere; this is the boundary the harness talks to.
pub trait Policy {
    /// One batch of the test set.
    type Batch;

    /// Load checkpoint weights from `path`.
    fn load_weights(&mut self, path: &Path) -> anyhow::Result<()>;

    /// Switch to inference behavior (no dropout etc).
    fn set_eval_mode(&mut self);

    /// Move every tensor of `batch` onto `device`, leaving everything else alone.
    fn batch_to_device(&self, batch: Self::Batch, device: Device) -> anyhow::Result<Self::Batch>;

    fn compute_loss(&mut self, batch: &Self::Batch) -> anyhow::Result<LossOutput>;
}

/// Everything a policy is constructed from.
#[derive(Debug, Clone)]
pub struct PolicyInit {
    pub model_dir: PathBuf,
    pub modality_config: ModalityConfig,
    pub device: Device,

    /// `model_args` from `config.json`.
    pub model_args: Map<String, Value>,

    pub kernels: AttentionKernels,
}

/// Constructs policies. Implemented by whatever model backend is linked in.
pub trait PolicyFactory {
    type Policy: Policy;

    fn cuda_available(&self) -> bool {
        false
    }

    fn build(&self, init: PolicyInit) -> anyhow::Result<Self::Policy>;
}

// ---

/// The policy used when no model backend is linked into the binary.
///
/// It can be constructed and loaded, so checkpoints can be inspected, but it cannot
/// compute a loss.
#[derive(Debug)]
pub struct UnlinkedPolicy {
    init: PolicyInit,
    weights: Option<PathBuf>,
    eval_mode: bool,
}

impl UnlinkedPolicy {
    pub fn init(&self) -> &PolicyInit {
        &self.init
    }

    /// The weights file passed to [`Policy::load_weights`], if any.
    pub fn weights(&self) -> Option<&Path> {
        self.weights.as_deref()
    }

    pub fn is_eval_mode(&self) -> bool {
        self.eval_mode
    }
}

impl Policy for UnlinkedPolicy {
    type Batch = Map<String, Value>;

    fn load_weights(&mut self, path: &Path) -> anyhow::Result<()> {
        let metadata = std::fs::metadata(path)?;
        anyhow::ensure!(metadata.is_file(), "{path:?} is not a file");
        gr_log::debug!("Weights at {path:?} are {} bytes", metadata.len());
        self.weights = Some(path.to_owned());
        Ok(())
    }

    fn set_eval_mode(&mut self) {
        self.eval_mode = true;
    }

    fn batch_to_device(&self, batch: Self::Batch, _device: Device) -> anyhow::Result<Self::Batch> {
        Ok(batch)
    }

    fn compute_loss(&mut self, _batch: &Self::Batch) -> anyhow::Result<LossOutput> {
        anyhow::bail!(
            "No model backend is linked into this binary, so the policy in {:?} cannot compute a loss",
            self.init.model_dir
        )
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UnlinkedPolicyFactory;

impl PolicyFactory for UnlinkedPolicyFactory {
    type Policy = UnlinkedPolicy;

    fn build(&self, init: PolicyInit) -> anyhow::Result<Self::Policy> {
        gr_log::debug!(
            "Building unlinked policy with {} model argument(s) and modality keys {:?}",
            init.model_args.len(),
            init.modality_config.modality_keys
        );
        Ok(UnlinkedPolicy {
            init,
            weights: None,
            eval_mode: false,
        })
    }
}
