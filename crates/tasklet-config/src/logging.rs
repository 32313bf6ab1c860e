//! Structured logging utilities for the tailing/watermarking tasklet crates.
//!
//! Provides consistent logging with component prefixes and structured fields.
//!
//! # Usage
//!
//! ```ignore
//! use tasklet_config::logging::*;
//!
//! log_tail_info!("file opened", path = %path.display());
//! log_watermark_debug!("watermark accepted", value = watermark.value());
//! ```

/// Component identifiers for log filtering.
pub struct Component;

impl Component {
    pub const TAIL: &'static str = "TAIL";
    pub const WATERMARK: &'static str = "WATERMARK";
    pub const CLI: &'static str = "CLI";
}

/// Log levels for runtime configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

// === TAIL logging macros ===

#[macro_export]
macro_rules! log_tail_error {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::error!(component = "TAIL", $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_tail_warn {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::warn!(component = "TAIL", $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_tail_info {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::info!(component = "TAIL", $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_tail_debug {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::debug!(component = "TAIL", $($key = $value,)* $msg)
    };
}

// === WATERMARK logging macros ===

#[macro_export]
macro_rules! log_watermark_error {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::error!(component = "WATERMARK", $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_watermark_warn {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::warn!(component = "WATERMARK", $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_watermark_info {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::info!(component = "WATERMARK", $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_watermark_debug {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::debug!(component = "WATERMARK", $($key = $value,)* $msg)
    };
}

// === CLI logging macros ===

#[macro_export]
macro_rules! log_cli_info {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::info!(component = "CLI", $($key = $value,)* $msg)
    };
}

#[macro_export]
macro_rules! log_cli_debug {
    ($msg:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::debug!(component = "CLI", $($key = $value,)* $msg)
    };
}

/// Initialize logging with the given level filter. Call this once at application startup.
pub fn init_logging(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_constants() {
        assert_eq!(Component::TAIL, "TAIL");
        assert_eq!(Component::WATERMARK, "WATERMARK");
        assert_eq!(Component::CLI, "CLI");
    }
}
