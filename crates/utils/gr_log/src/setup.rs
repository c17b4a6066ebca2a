//! Function to setup logging in binaries.

use std::sync::Once;

/// Used when `RUST_LOG` is not set.
///
/// The noisy arrow/parquet internals are capped at `warn`.
pub const DEFAULT_LOG_FILTER: &str = "info,parquet=warn,arrow=warn";

/// Install an `env_logger` that honours `RUST_LOG`, falling back to [`DEFAULT_LOG_FILTER`].
///
/// Safe to call more than once; only the first call has an effect.
pub fn setup_logging() {
    static SETUP: Once = Once::new();

    SETUP.call_once(|| {
        let env = env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER);

        let mut builder = env_logger::Builder::from_env(env);
        builder.format_timestamp_millis();

        if let Err(err) = builder.try_init() {
            // Someone (probably a test harness) already installed a logger. Keep theirs.
            eprintln!("gr_log: logger already installed: {err}");
        }
    });
}
