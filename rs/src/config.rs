/*
 * Responsibility
 * - Server settings from the environment (PORT, request timeout, key refresh interval)
 * - Verifier settings are delegated to `ssd_jwt_auth::VerifierConfig`
 */
use std::net::SocketAddr;
use std::time::Duration;

use ssd_jwt_auth::{ConfigError, VerifierConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub request_timeout: Duration,
    // None disables periodic reloading of the key directory.
    pub key_refresh: Option<Duration>,
    pub verifier: VerifierConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = match std::env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            Err(_) => 3000,
        };
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let request_timeout = Duration::from_secs(seconds_var("REQUEST_TIMEOUT_SECONDS", 30)?);

        let key_refresh = match seconds_var("SSD_JWT_KEY_REFRESH_SECONDS", 300)? {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Ok(Self {
            addr,
            app_env: AppEnv::from_env(),
            request_timeout,
            key_refresh,
            verifier: VerifierConfig::from_env()?,
        })
    }
}

fn seconds_var(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        Err(_) => Ok(default),
    }
}
