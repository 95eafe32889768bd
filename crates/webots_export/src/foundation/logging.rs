//! Logging utilities and structured logging support

/// Initialize the logging system
///
/// Honours `RUST_LOG`; falls back to `default_filter` when it is unset.
pub fn init(default_filter: &str) {
    let env = env_logger::Env::default().default_filter_or(default_filter);
    // A second initialisation (e.g. from tests) is harmless.
    let _ = env_logger::Builder::from_env(env).try_init();
}
