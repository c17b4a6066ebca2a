//! Evaluation of trained GR00T policies.
//!
//! * [`CheckpointDir`] reads the configuration of an exported checkpoint.
//! * [`ModuleRegistry`] provides the optional flash-attention kernels to the policy, or inert
//!   stand-ins for them.
//! * [`load_policy`] and [`run_evaluation`] drive a [`Policy`] built by a [`PolicyFactory`].
//!
//! The model itself is not part of this crate. It is reached through the [`Policy`] trait.

mod checkpoint;
mod device;
mod harness;
pub mod kernels;
mod policy;

pub use self::checkpoint::{
    CheckpointDir, CheckpointError, DEFAULT_EMBODIMENT, ModalityConfig, ModelConfig,
};
pub use self::device::{Device, DeviceChoice};
pub use self::harness::{
    DEFAULT_NUM_BATCHES, EvalError, EvalMetrics, EvalOptions, LoadedPolicy, evaluate,
    load_policy, run_evaluation, save_results,
};
pub use self::kernels::{AttentionKernels, KernelError, ModuleRegistry};
pub use self::policy::{
    LossOutput, Policy, PolicyFactory, PolicyInit, UnlinkedPolicy, UnlinkedPolicyFactory,
};
