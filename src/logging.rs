//! # Structured Logging Module
//!
//! Environment-aware structured logging for the dispatch core. Human-readable
//! console output by default, JSON lines when `LIFT_LOG_FORMAT=json`.

use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::elevator::{Direction, ElevatorId};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration.
///
/// `RUST_LOG` takes precedence over the environment default level. Calling this
/// more than once, or after another global subscriber was installed, is harmless.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));
        let json = use_json_format();

        let layer = if json {
            fmt::layer()
                .with_target(true)
                .with_thread_names(true)
                .with_level(true)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_names(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            environment = %environment,
            json = json,
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var("LIFT_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        "test" => "warn".to_string(),
        _ => "debug".to_string(),
    }
}

fn use_json_format() -> bool {
    std::env::var("LIFT_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Log structured data for a dispatch operation
pub fn log_dispatch_operation(
    operation: &str,
    unit_id: Option<ElevatorId>,
    floor: Option<i32>,
    direction: Option<Direction>,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        unit_id = unit_id,
        floor = floor,
        direction = ?direction,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "🛗 DISPATCH_OPERATION"
    );
}
