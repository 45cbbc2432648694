//! Structured logging.
//!
//! `RUST_LOG` wins when set. Otherwise the level comes from configuration,
//! raised to `debug` in debug mode. Production emits JSON lines.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{AppConfig, ObservabilityConfig};

/// Default filter directive for a level.
pub fn default_directive(level: &str) -> String {
    format!("bracket_service={level},tower_http={level}")
}

fn effective_level<'a>(observability: &'a ObservabilityConfig, app: &AppConfig) -> &'a str {
    if app.debug {
        "debug"
    } else {
        observability.log_level.as_str()
    }
}

/// Install the global subscriber. Call once at startup.
pub fn init_logging(observability: &ObservabilityConfig, app: &AppConfig) {
    let level = effective_level(observability, app);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    let (json, plain) = if app.environment.is_production() {
        (Some(tracing_subscriber::fmt::layer().json().with_current_span(true)), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer().with_target(true)))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(plain)
        .init();
}
