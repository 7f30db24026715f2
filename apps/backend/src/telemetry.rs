//! Tracing setup.

use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber.
///
/// `RUST_LOG` wins when set; otherwise `level` applies to this workspace's
/// crates with sqlx kept at `warn`. Returns `false` when a subscriber was
/// already installed (repeat calls, test binaries), which is not an error.
pub fn init_tracing(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

fn default_directives(level: &str) -> String {
    format!("{level},tillpoint={level},sqlx=warn")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_harmless() {
        init_tracing("debug");
        assert!(!init_tracing("debug"));
    }

    #[test]
    fn test_default_directives() {
        assert_eq!(default_directives("info"), "info,tillpoint=info,sqlx=warn");
    }
}
