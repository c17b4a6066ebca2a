use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use indicatif::ProgressBar;

use crate::{
    CheckpointDir, CheckpointError, DEFAULT_EMBODIMENT, Device, DeviceChoice, KernelError,
    ModuleRegistry, Policy, PolicyFactory, PolicyInit,
};

/// How many batches are evaluated unless told otherwise.
pub const DEFAULT_NUM_BATCHES: usize = 10;

#[derive(thiserror::Error, Debug)]
pub enum EvalError {
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    Kernels(#[from] KernelError),

    #[error("CUDA was requested, but the policy backend reports no CUDA device")]
    CudaUnavailable,

    #[error("Failed to construct the policy")]
    BuildPolicy(#[source] anyhow::Error),

    #[error("Failed to load weights from {path:?}")]
    LoadWeights {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// No test data source has been wired up. Nothing was evaluated.
    #[error("Test dataloader not implemented. Please implement dataset loading.")]
    DataSourceNotImplemented,

    #[error("The test data source yielded no batches")]
    EmptyDataSource,

    #[error("Evaluation failed on batch {batch}")]
    Batch {
        batch: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to write results to {0:?}: {1}")]
    WriteResults(PathBuf, std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalOptions {
    /// Selects the block of `experiment_cfg/metadata.json` to read.
    pub embodiment: String,

    pub device: DeviceChoice,

    /// Evaluation stops after this many batches.
    pub num_batches: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            embodiment: DEFAULT_EMBODIMENT.to_owned(),
            device: DeviceChoice::default(),
            num_batches: DEFAULT_NUM_BATCHES,
        }
    }
}

/// Averaged metrics. `loss` always comes last.
pub type EvalMetrics = IndexMap<String, f64>;

/// A freshly constructed policy.
#[derive(Debug)]
pub struct LoadedPolicy<P> {
    pub policy: P,
    pub device: Device,

    /// `None` if no weights file was found and the policy is randomly initialized.
    pub weights: Option<PathBuf>,
}

/// Construct the policy stored in `checkpoint`.
///
/// A missing weights file is not an error: the policy keeps its random initialization.
pub fn load_policy<F: PolicyFactory>(
    checkpoint: &CheckpointDir,
    options: &EvalOptions,
    factory: &F,
    registry: &ModuleRegistry,
) -> Result<LoadedPolicy<F::Policy>, EvalError> {
    let device = options
        .device
        .resolve(factory.cuda_available())
        .ok_or(EvalError::CudaUnavailable)?;
    gr_log::info!("Using device: {device}");

    gr_log::info!("Loading model from {}", checkpoint.model_dir().display());

    let config = checkpoint.load_config()?;
    let modality_config = checkpoint.load_modality_config(&options.embodiment)?;
    let kernels = registry.resolve_attention_kernels()?;

    let mut policy = factory
        .build(PolicyInit {
            model_dir: checkpoint.model_dir().to_owned(),
            modality_config,
            device,
            model_args: config.model_args,
            kernels,
        })
        .map_err(EvalError::BuildPolicy)?;

    let weights_path = checkpoint.weights_path();
    let weights = if weights_path.exists() {
        policy
            .load_weights(&weights_path)
            .map_err(|source| EvalError::LoadWeights {
                path: weights_path.clone(),
                source,
            })?;
        gr_log::info!("Loaded weights from {}", weights_path.display());
        Some(weights_path)
    } else {
        gr_log::warn!(
            "No weights found at {}, using random initialization",
            weights_path.display()
        );
        None
    };

    policy.set_eval_mode();

    Ok(LoadedPolicy {
        policy,
        device,
        weights,
    })
}

/// Compute the loss over at most `num_batches` batches of `batches`.
///
/// Each metric is averaged over the batches that reported it. The loss is averaged over
/// all evaluated batches and stored under `loss`.
///
/// The divisor is the number of batches actually evaluated, not `num_batches`, so a source
/// that runs out early still yields a true mean.
pub fn evaluate<P, I>(
    policy: &mut P,
    batches: I,
    device: Device,
    num_batches: usize,
) -> Result<EvalMetrics, EvalError>
where
    P: Policy,
    I: IntoIterator<Item = anyhow::Result<P::Batch>>,
{
    policy.set_eval_mode();

    let progress = ProgressBar::new(num_batches as u64).with_message("Evaluating");

    let mut total_loss = 0.0;
    let mut evaluated = 0_usize;
    let mut collected: IndexMap<String, Vec<f64>> = IndexMap::new();

    for (index, batch) in batches.into_iter().take(num_batches).enumerate() {
        let on_error = |source: anyhow::Error| EvalError::Batch {
            batch: index,
            source,
        };

        let batch = policy
            .batch_to_device(batch.map_err(on_error)?, device)
            .map_err(on_error)?;
        let output = policy.compute_loss(&batch).map_err(on_error)?;

        total_loss += output.loss;
        for (name, value) in output.metrics {
            collected.entry(name).or_default().push(value);
        }

        evaluated += 1;
        progress.inc(1);
    }
    progress.finish_and_clear();

    if evaluated == 0 {
        return Err(EvalError::EmptyDataSource);
    }

    let mut metrics: EvalMetrics = collected
        .into_iter()
        .map(|(name, values)| {
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            (name, mean)
        })
        .collect();
    // `shift_remove` keeps the order of the remaining metrics.
    metrics.shift_remove("loss");
    metrics.insert("loss".to_owned(), total_loss / evaluated as f64);

    Ok(metrics)
}

/// Evaluate `policy` over `data_source`, and save the results next to the checkpoint.
///
/// There is no test split loader yet, so callers pass `None`. That is reported as
/// [`EvalError::DataSourceNotImplemented`] before any work is done.
pub fn run_evaluation<P, I>(
    checkpoint: &CheckpointDir,
    policy: &mut P,
    data_source: Option<I>,
    device: Device,
    options: &EvalOptions,
) -> Result<EvalMetrics, EvalError>
where
    P: Policy,
    I: IntoIterator<Item = anyhow::Result<P::Batch>>,
{
    let Some(data_source) = data_source else {
        let err = EvalError::DataSourceNotImplemented;
        gr_log::error!("{err}");
        return Err(err);
    };

    gr_log::info!("Starting evaluation...");
    let metrics = evaluate(policy, data_source, device, options.num_batches)?;

    gr_log::info!("=== Evaluation Results ===");
    for (name, value) in &metrics {
        gr_log::info!("{name}: {value:.4}");
    }

    let results_path = checkpoint.results_path();
    save_results(&results_path, &metrics)?;
    gr_log::info!("Results saved to {}", results_path.display());

    Ok(metrics)
}

/// Write `metrics` as pretty-printed JSON.
pub fn save_results(path: &Path, metrics: &EvalMetrics) -> Result<(), EvalError> {
    let json = serde_json::to_string_pretty(metrics)
        .map_err(|err| EvalError::WriteResults(path.to_owned(), err.into()))?;
    std::fs::write(path, json).map_err(|err| EvalError::WriteResults(path.to_owned(), err))
}
