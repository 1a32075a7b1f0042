//! Environment-driven runtime settings and log initialisation.

use std::env;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// `APP_BIND_ADDR`
    pub bind_addr: String,
    /// `APP_BODY_LIMIT`, in bytes.
    pub body_limit: usize,
    /// `APP_ROOT_NAMESPACE`, the scanner root.
    pub root_namespace: String,
}

impl Settings {
    /// Read settings from the process environment.
    /// `default_root` is used when `APP_ROOT_NAMESPACE` is unset.
    pub fn from_env(default_root: &str) -> Self {
        Self::from_lookup(default_root, |key| env::var(key).ok())
    }

    pub fn from_lookup(default_root: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let body_limit = match lookup("APP_BODY_LIMIT") {
            None => DEFAULT_BODY_LIMIT,
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "APP_BODY_LIMIT is not a byte count, using default");
                DEFAULT_BODY_LIMIT
            }),
        };
        Settings {
            bind_addr: lookup("APP_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            body_limit,
            root_namespace: lookup("APP_ROOT_NAMESPACE").unwrap_or_else(|| default_root.into()),
        }
    }
}

/// Process startup: load `.env`, install the subscriber, then read settings so
/// that warnings about bad values are logged.
pub fn init(default_directive: &str, default_root: &str) -> Settings {
    dotenvy::dotenv().ok();
    init_tracing(default_directive);
    Settings::from_env(default_root)
}

/// Install the fmt subscriber filtered by `RUST_LOG`, falling back to `default_directive`.
/// Does nothing if a global subscriber is already set.
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
