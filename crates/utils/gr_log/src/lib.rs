//! Text logging (nothing to do with recordings) for the gr00t tools.
//!
//! * `trace`: spammy things
//! * `debug`: things that might be useful when debugging
//! * `info`: things that we want to show to users
//! * `warn`: problems that we can recover from
//! * `error`: problems that lead to loss of functionality or data
//!
//! The `warn_once` etc macros are for when you want to suppress repeated
//! logging of the exact same message.

mod error_chain;
mod result_extensions;
mod setup;

pub use error_chain::{format_error, format_error_ref};
pub use log::{Level, LevelFilter};
pub use log_once::{debug_once, error_once, info_once, trace_once, warn_once};
pub use result_extensions::ResultExt;
pub use setup::{DEFAULT_LOG_FILTER, setup_logging};

// The `log` macros are re-exported so that downstream crates only depend on `gr_log`:
pub use log::{debug, error, info, log, log_enabled, trace, warn};
