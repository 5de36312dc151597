//! Logging initialization

use serde::{Deserialize, Serialize};
use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Logging profile, selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Human-readable output, debug level
    #[default]
    Development,
    /// JSON lines, info level
    Production,
    /// No output; tests install their own capture layer
    Test,
}

static INIT_ONCE: Once = Once::new();

/// Initialize the global subscriber
///
/// Only the first call has an effect. `RUST_LOG` overrides the profile's
/// default filter.
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| match profile {
        Profile::Development => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new("dusker=debug")),
                )
                .with_writer(std::io::stderr)
                .init();
        }
        Profile::Production => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new("dusker=info")),
                )
                .with_writer(std::io::stderr)
                .init();
        }
        Profile::Test => {
            tracing_subscriber::registry().init();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_parses_from_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            profile: Profile,
        }
        let w: Wrapper = toml::from_str("profile = \"production\"").unwrap();
        assert_eq!(w.profile, Profile::Production);
    }

    #[test]
    fn test_default_profile() {
        assert_eq!(Profile::default(), Profile::Development);
    }
}
