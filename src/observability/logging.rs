//! Structured logging setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Filter directive used when `RUST_LOG` is not set.
pub fn default_directive(config: &ObservabilityConfig) -> String {
    let level = if config.debug_logging {
        "debug"
    } else {
        config.log_level.as_str()
    };
    format!("connectivity_monitor={},monitor_cli={},tower_http=info", level, level)
}

/// Install the global tracing subscriber. Call once, from a binary.
pub fn init_logging(config: &ObservabilityConfig) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(config).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_logging_overrides_level() {
        let mut config = ObservabilityConfig::default();
        config.log_level = "warn".to_string();
        assert!(default_directive(&config).starts_with("connectivity_monitor=warn"));

        config.debug_logging = true;
        assert!(default_directive(&config).starts_with("connectivity_monitor=debug"));
    }
}
