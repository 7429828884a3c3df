//! Structured logging setup using the tracing crate
//!
//! ## Log Format Options
//!
//! The output format is controlled by the `LOG_FORMAT` environment variable:
//!
//! - `json` - structured JSON for log aggregation systems
//! - `pretty` - human-readable with colors and indentation
//! - `compact` - terminal-friendly, colors with minimal spacing
//!
//! ## Environment Variables
//!
//! - `LOG_LEVEL`: log level (ERROR, WARN, INFO, DEBUG, TRACE) - defaults to INFO
//! - `LOG_FORMAT`: output format (json, pretty, compact) - defaults to compact
//! - `RUST_LOG`: overrides log filtering (env_logger format)

use std::env;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log output format options
#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    /// JSON format for structured logging (machine-readable)
    Json,
    /// Pretty format with colors and indentation (human-readable)
    Pretty,
    /// Compact format with colors but minimal spacing (terminal-friendly)
    Compact,
}

impl LogFormat {
    /// Parse log format from string
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Compact,
        }
    }
}

/// Initialize logging with manual configuration
pub fn init_logging(level: Level, format: LogFormat) {
    let mut filter = EnvFilter::new(level.to_string())
        // Reduce noise from dependencies
        .add_directive("rumqttc=warn".parse().unwrap())
        .add_directive("tokio=warn".parse().unwrap());

    // Allow RUST_LOG to override
    if let Ok(rust_log) = env::var("RUST_LOG") {
        filter = EnvFilter::new(rust_log);
    }

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => {
            subscriber.with(fmt::layer().json()).init();
        }
        LogFormat::Pretty => {
            subscriber.with(fmt::layer().pretty().with_ansi(true)).init();
        }
        LogFormat::Compact => {
            subscriber
                .with(fmt::layer().compact().with_ansi(true).with_target(false))
                .init();
        }
    }
}

/// Initialize logging from environment variables
pub fn init_default_logging() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string());

    let level = match log_level.to_uppercase().as_str() {
        "ERROR" => Level::ERROR,
        "WARN" => Level::WARN,
        "INFO" => Level::INFO,
        "DEBUG" => Level::DEBUG,
        "TRACE" => Level::TRACE,
        _ => Level::INFO,
    };

    let format = env::var("LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());
    init_logging(level, LogFormat::parse(&format));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert!(matches!(LogFormat::parse("json"), LogFormat::Json));
        assert!(matches!(LogFormat::parse("JSON"), LogFormat::Json));
        assert!(matches!(LogFormat::parse("pretty"), LogFormat::Pretty));
        assert!(matches!(LogFormat::parse("compact"), LogFormat::Compact));
    }

    #[test]
    fn test_log_format_parse_invalid_defaults_to_compact() {
        assert!(matches!(LogFormat::parse("invalid"), LogFormat::Compact));
        assert!(matches!(LogFormat::parse(""), LogFormat::Compact));
    }
}
