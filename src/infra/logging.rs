//! Logger initialisation shared by the binaries.

/// Install `env_logger` with `info` (or `debug` when `verbose`) as the
/// default filter. `RUST_LOG` takes precedence. Safe to call twice.
pub fn init(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .try_init();
}
