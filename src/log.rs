//! Logging abstraction for engine components.
//!
//! Engines never talk to a global logging facade directly. They hold an
//! `Arc<dyn Logger>` handed in at construction, so callers decide where
//! diagnostics go:
//!
//! - [`TracingLogger`]: delegates to the `tracing` crate (production default)
//! - [`NoOpLogger`]: discards everything (tests, benchmarks)

use std::fmt::Arguments;

/// Log level for filtering messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Verbose debugging information
    Trace,
    /// Debugging information
    Debug,
    /// General information
    Info,
    /// Warning messages
    Warn,
    /// Error messages
    Error,
}

/// Logging interface injected into engine components.
///
/// Implementations must be `Send + Sync` so a single logger can be shared
/// across parallel tile workers.
///
/// # Example
///
/// ```
/// use aoi_proximity::log::{Logger, NoOpLogger};
/// use aoi_proximity::log_info;
/// use std::sync::Arc;
///
/// let logger: Arc<dyn Logger> = Arc::new(NoOpLogger);
/// log_info!(logger, "engine ready");
/// ```
pub trait Logger: Send + Sync {
    /// Log a message at the specified level.
    fn log(&self, level: LogLevel, args: Arguments<'_>);

    /// Log a trace-level message.
    fn trace(&self, args: Arguments<'_>) {
        self.log(LogLevel::Trace, args);
    }

    /// Log a debug-level message.
    fn debug(&self, args: Arguments<'_>) {
        self.log(LogLevel::Debug, args);
    }

    /// Log an info-level message.
    fn info(&self, args: Arguments<'_>) {
        self.log(LogLevel::Info, args);
    }

    /// Log a warning-level message.
    fn warn(&self, args: Arguments<'_>) {
        self.log(LogLevel::Warn, args);
    }

    /// Log an error-level message.
    fn error(&self, args: Arguments<'_>) {
        self.log(LogLevel::Error, args);
    }
}

#[macro_export]
macro_rules! log_trace {
    ($logger:expr, $($arg:tt)*) => {
        $logger.trace(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $logger.warn(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)*) => {
        $logger.error(format_args!($($arg)*))
    };
}

/// A logger that discards all messages.
///
/// Used by unit tests and benchmarks where log output is noise.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    #[inline]
    fn log(&self, _level: LogLevel, _args: Arguments<'_>) {}
}

/// Logger implementation that delegates to the `tracing` crate.
///
/// Emits through whatever subscriber the host application installed;
/// installing one is the application's responsibility, not this crate's.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    /// Create a new tracing logger adapter.
    pub fn new() -> Self {
        Self
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        match level {
            LogLevel::Trace => tracing::trace!("{}", args),
            LogLevel::Debug => tracing::debug!("{}", args),
            LogLevel::Info => tracing::info!("{}", args),
            LogLevel::Warn => tracing::warn!("{}", args),
            LogLevel::Error => tracing::error!("{}", args),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_loggers_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NoOpLogger>();
        assert_send_sync::<TracingLogger>();
    }

    #[test]
    fn test_noop_logger_discards_all_levels() {
        let logger: Arc<dyn Logger> = Arc::new(NoOpLogger);
        logger.trace(format_args!("trace"));
        logger.debug(format_args!("debug"));
        logger.info(format_args!("info"));
        logger.warn(format_args!("warn"));
        logger.error(format_args!("error"));
    }

    #[test]
    fn test_macros_accept_format_args() {
        let logger: Arc<dyn Logger> = Arc::new(NoOpLogger);
        log_trace!(logger, "value = {}", 42);
        log_debug!(logger, "value = {}", 42);
        log_info!(logger, "value = {}", 42);
        log_warn!(logger, "value = {}", 42);
        log_error!(logger, "value = {}", 42);
    }

    #[test]
    fn test_tracing_logger_as_trait_object() {
        let logger: Box<dyn Logger> = Box::new(TracingLogger::new());
        logger.info(format_args!("no subscriber installed, message dropped"));
    }
}
