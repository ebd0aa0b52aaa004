//! Process-wide `tracing` setup.

use tracing::Level;

use crate::config::LogSettings;

/// Install the global subscriber at the level named by `log.level`.
///
/// Only the first call in a process takes effect; later calls are ignored.
pub fn init(settings: &LogSettings) {
    init_at(level_from_str(&settings.level));
}

/// Install the global subscriber at a fixed level. The smoke-test clients
/// load no configuration and use this directly.
pub fn init_at(level: Level) {
    // targets and thread ids at debug and below
    let verbose = level >= Level::DEBUG;
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(verbose)
        .with_thread_ids(verbose)
        .try_init();
}

/// `error`, `warn`, `info`, `debug` or `trace` in any case, or `1`-`5`.
/// Anything else is `info`.
pub(crate) fn level_from_str(level: &str) -> Level {
    level.trim().parse().unwrap_or(Level::INFO)
}
