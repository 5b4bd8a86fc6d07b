use std::sync::LazyLock;

use axum_extra::extract::cookie::Key;
use figment::Figment;
use figment::providers::{Env, Serialized};
use serde::{Deserialize, Serialize};

/// Minimum length for the cookie-encryption secret. `Key::derive_from`
/// requires at least 32 bytes of input material.
pub const MIN_SESSION_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// SQLite connection string, e.g. `sqlite:spendlog.sqlite`.
    pub database_url: String,
    /// Address the HTTP server binds to.
    pub listen_addr: String,
    /// Default log filter when `RUST_LOG` is unset.
    pub loglevel: String,
    /// Secret used to derive the private-cookie key. Must be set via
    /// `SPENDLOG_SESSION_SECRET` and be at least 32 bytes long.
    pub session_secret: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:spendlog.sqlite".to_string(),
            listen_addr: "127.0.0.1:8000".to_string(),
            loglevel: "info".to_string(),
            session_secret: String::new(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Env::prefixed("SPENDLOG_"))
            .extract()
    }

    /// Derive the cookie-encryption key from the configured secret.
    pub fn session_key(&self) -> Result<Key, String> {
        if self.session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(format!(
                "SPENDLOG_SESSION_SECRET must be at least {} bytes",
                MIN_SESSION_SECRET_LEN
            ));
        }
        Ok(Key::derive_from(self.session_secret.as_bytes()))
    }
}

pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Config::load().unwrap_or_else(|e| {
        eprintln!("invalid configuration: {e}");
        std::process::exit(1);
    })
});
