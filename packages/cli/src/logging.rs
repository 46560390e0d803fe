//! Logger setup.

use indicatif::MultiProgress;

/// Initializes `pretty_env_logger` wrapped in `indicatif-log-bridge` so
/// that log lines are suspended while the spinner redraws.
///
/// Defaults to `warn` when `RUST_LOG` is unset. Returns the
/// [`MultiProgress`] the spinner must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Warn)
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok();

    log::set_max_level(level);

    multi
}
