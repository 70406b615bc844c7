//! Logger lifecycle management.
//!
//! A [`LogManager`] is an explicit, caller-owned handle: it holds the default
//! configuration, the options resolved by the first successful
//! initialization and the loggers built from them. Installing the dispatcher
//! as the process-wide `tracing` default is opt-in.
//!
//! Lifecycle: `Unconfigured → Configured` on the first successful
//! [`LogManager::initialize`]; later calls succeed without changing anything.
//! [`LogManager::set_level`] adjusts the threshold in place.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

use crate::config::Config;
use crate::error::{LogError, LogResult};
use crate::level::Severity;
use crate::logger::{BaseLogger, Logger, TracedLogger};
use crate::logging::{build_dispatch, SharedWriter};
use crate::options::LoggerOptions;

/// Minimum severity forwarded into the active span by managed loggers.
pub const TRACE_LEVEL: Severity = Severity::Info;

/// Lifecycle entry with structured fields, written through `$base`'s
/// dispatcher and tagged like the entries of its loggers.
macro_rules! lifecycle {
    ($base:expr, $severity:expr, $level:expr, $($fields:tt)+) => {
        tracing::dispatcher::with_default($base.dispatch(), || {
            tracing::event!(
                $level,
                id = $base.app_id(),
                severity = $severity.as_str(),
                $($fields)+
            )
        })
    };
}

struct Installed {
    options: Arc<LoggerOptions>,
    base: BaseLogger,
    traced: TracedLogger,
}

/// Owns the logger configuration and installed loggers of an application.
pub struct LogManager {
    writer: SharedWriter,
    install_global: bool,
    default_config: RwLock<Option<Config>>,
    installed: RwLock<Option<Installed>>,
}

impl LogManager {
    /// Manager writing to stderr, without touching the global dispatcher.
    pub fn new() -> Self {
        Self::from_writer(SharedWriter::stderr())
    }

    /// Manager writing formatted entries to `make_writer`.
    pub fn with_writer<M>(make_writer: M) -> Self
    where
        M: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        Self::from_writer(SharedWriter::new(make_writer))
    }

    fn from_writer(writer: SharedWriter) -> Self {
        Self {
            writer,
            install_global: false,
            default_config: RwLock::new(None),
            installed: RwLock::new(None),
        }
    }

    /// Install the dispatcher as the process-wide `tracing` default on
    /// initialization. At most one manager per process can do so.
    pub fn install_global(mut self, install: bool) -> Self {
        self.install_global = install;
        self
    }

    /// Register the configuration used when `initialize` is given none.
    pub fn register_default_config(&self, config: Config) {
        *self
            .default_config
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(config);
    }

    /// Configuration registered with [`LogManager::register_default_config`].
    pub fn default_config(&self) -> Option<Config> {
        self.default_config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Build and install loggers from `config`, or from the registered
    /// default when `config` is `None`.
    ///
    /// Once options have been resolved, further calls return `Ok(())` and
    /// keep the existing loggers, whatever config they are given. On error
    /// nothing is installed.
    pub fn initialize(&self, config: Option<&Config>) -> LogResult<()> {
        let config = match config {
            Some(config) => config.clone(),
            None => self.default_config().ok_or(LogError::MissingConfig)?,
        };

        let mut installed = self
            .installed
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(current) = installed.as_ref() {
            lifecycle!(
                current.base,
                Severity::Debug,
                Level::DEBUG,
                ignored_app_id = %config.app.id,
                "logger already initialized, ignoring configuration"
            );
            return Ok(());
        }

        let options = Arc::new(LoggerOptions::resolve(&config.log)?);
        let dispatch = build_dispatch(&options, self.writer.clone());

        if self.install_global {
            tracing::dispatcher::set_global_default(dispatch.clone())
                .map_err(|err| LogError::GlobalInstall(err.to_string()))?;
        }

        let base = BaseLogger::new(dispatch, options.level.clone())
            .with_app_id(&config.app.id)
            .with_development(options.development)
            .with_sink(self.writer.clone());
        base.sync();

        let traced = TracedLogger::new(base.clone(), TRACE_LEVEL);
        traced.sync();

        lifecycle!(
            base,
            Severity::Debug,
            Level::DEBUG,
            encoding = %options.encoding,
            threshold = %options.level.level(),
            development = options.development,
            "logger initialized"
        );

        *installed = Some(Installed {
            options,
            base,
            traced,
        });

        Ok(())
    }

    /// Traced logger scoped with `name`.
    ///
    /// Falls back to a logger that discards everything when nothing has been
    /// initialized.
    pub fn new_logger(&self, name: &str) -> TracedLogger {
        match self
            .installed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            Some(installed) => installed.traced.named(name),
            None => TracedLogger::noop().named(name),
        }
    }

    /// Change the minimum severity of every logger built by this manager.
    ///
    /// The change is reported at the new severity, so the entry always
    /// passes the threshold it announces.
    pub fn set_level(&self, level: &str) -> LogResult<()> {
        let severity: Severity = level.parse()?;

        let installed = self
            .installed
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let installed = installed.as_ref().ok_or(LogError::NotInitialized)?;

        let previous = installed.options.level.level();
        installed.options.level.set_level(severity);

        let base = &installed.base;
        macro_rules! level_changed {
            ($level:expr) => {
                lifecycle!(
                    base,
                    severity,
                    $level,
                    from = %previous,
                    to = %severity,
                    "log level changed"
                )
            };
        }
        match severity {
            Severity::Debug => level_changed!(Level::DEBUG),
            Severity::Info => level_changed!(Level::INFO),
            Severity::Warn => level_changed!(Level::WARN),
            Severity::Error | Severity::DPanic | Severity::Panic | Severity::Fatal => {
                level_changed!(Level::ERROR)
            }
        }

        Ok(())
    }

    /// Options resolved by the first successful initialization.
    pub fn options(&self) -> Option<Arc<LoggerOptions>> {
        self.installed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|installed| installed.options.clone())
    }

    /// Whether a call to [`LogManager::initialize`] has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.installed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}
