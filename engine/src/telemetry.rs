//! Telemetry and observability
//!
//! Sets up `tracing-subscriber` for structured logging. The effective
//! level is resolved here from the `--log` flag and the configured
//! level, with a `RUST_LOG` env var overriding both. Debug builds log
//! pretty terminal output; release builds log JSON with span context.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter target for this crate's own events
const CRATE_TARGET: &str = "valet_engine";

const DEFAULT_LEVEL: &str = "info";

/// CLI flag wins over config; both fall back to "info"
fn effective_level<'a>(cli_level: Option<&'a str>, config_level: Option<&'a str>) -> &'a str {
    cli_level.or(config_level).unwrap_or(DEFAULT_LEVEL)
}

/// Install the global tracing subscriber.
///
/// `cli_level` is the `--log` flag, `config_level` the configured
/// `log_level`; a `RUST_LOG` env var overrides both. Subsequent calls
/// are no-ops.
pub fn init_telemetry(cli_level: Option<&str>, config_level: Option<&str>) {
    let level = effective_level(cli_level, config_level);
    let default_filter = format!("{},{}={}", level, CRATE_TARGET, level);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    #[cfg(debug_assertions)]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_target(false))
            .try_init()
            .ok();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_current_span(true))
            .try_init()
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flag_wins_over_config_level() {
        assert_eq!(effective_level(Some("debug"), Some("warn")), "debug");
        assert_eq!(effective_level(None, Some("warn")), "warn");
        assert_eq!(effective_level(None, None), "info");
    }
}
