//! Logging setup.
//!
//! The filter comes from `NAUTILUS_TMSU_DEBUG` (`info` when unset). The
//! extension's "verbose debug" level maps onto `trace`.

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "NAUTILUS_TMSU_DEBUG";

static INIT: OnceCell<()> = OnceCell::new();

/// Install the global subscriber. Safe to call more than once; only the first
/// call has any effect.
pub fn init() {
    INIT.get_or_init(|| {
        let raw = std::env::var(LOG_ENV).unwrap_or_default();
        let filter = EnvFilter::try_new(filter_directive(&raw))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        // A host may already have installed a subscriber
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();

        tracing::info!("Initializing nautilus-tmsu: {}", env!("CARGO_PKG_VERSION"));
    });
}

/// Translate the env value into an `EnvFilter` directive
pub fn filter_directive(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return "info".to_string();
    }
    if raw.eq_ignore_ascii_case("debug_verbose") || raw == "9" {
        return "trace".to_string();
    }
    raw.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive() {
        assert_eq!(filter_directive(""), "info");
        assert_eq!(filter_directive("  "), "info");
        assert_eq!(filter_directive("DEBUG"), "debug");
        assert_eq!(filter_directive("DEBUG_VERBOSE"), "trace");
        assert_eq!(filter_directive("9"), "trace");
        assert_eq!(filter_directive("nautilus_tmsu=trace"), "nautilus_tmsu=trace");
    }

    #[test]
    fn test_init_twice() {
        init();
        init();
    }
}
