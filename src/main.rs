//! applog demo
//!
//! Loads logger configuration from `config/` and `APP_*` environment
//! variables, installs the resulting logger process-wide and emits a few
//! entries inside a span.

use applog::{log_debug, log_info, log_warn, Config, LogManager, Logger};

fn main() -> anyhow::Result<()> {
    let config = Config::load().map_err(|e| {
        eprintln!("Failed to load configuration: {e}");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    let manager = LogManager::new().install_global(true);
    manager.register_default_config(config);
    manager.initialize(None)?;

    let logger = manager.new_logger("demo");
    log_info!(logger, "Starting applog demo v{}", env!("CARGO_PKG_VERSION"));

    {
        let span = tracing::info_span!("request", path = "/health");
        let _entered = span.enter();
        log_debug!(logger, "checking dependencies");
        log_info!(logger, "request handled");
    }

    manager.set_level("warn")?;
    log_info!(logger, "this entry is filtered out");
    log_warn!(logger, "level raised to warn");

    logger.sync();

    Ok(())
}
