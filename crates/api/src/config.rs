//! Server settings from the environment (`.env` is loaded first by `main`).

use std::fmt::Display;
use std::str::FromStr;

use pchart_core::operation::{parse_operation_steps, DEFAULT_OPERATION_STEPS};

use crate::auth::jwt::JwtConfig;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// How long the notification router gets to drain after the server stops.
    pub shutdown_timeout_secs: u64,
    /// Operation codes every new production order runs through, in order.
    pub operation_steps: Vec<String>,
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// | Env var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `3000`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                    |
    /// | `OPERATION_STEPS`       | `OP10,OP20,OP30,OP40`   |
    ///
    /// plus the `JWT_*` variables read by [`JwtConfig`].
    ///
    /// # Panics
    ///
    /// On any value that does not parse, so misconfiguration stops startup.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".to_string())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        let steps_raw = lookup("OPERATION_STEPS").unwrap_or_else(|| DEFAULT_OPERATION_STEPS.join(","));
        let operation_steps = parse_operation_steps(&steps_raw)
            .unwrap_or_else(|e| panic!("OPERATION_STEPS is invalid: {e}"));

        Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parsed(&lookup, "PORT", 3000),
            cors_origins,
            request_timeout_secs: parsed(&lookup, "REQUEST_TIMEOUT_SECS", 30),
            shutdown_timeout_secs: parsed(&lookup, "SHUTDOWN_TIMEOUT_SECS", 30),
            operation_steps,
            jwt: JwtConfig::from_lookup(&lookup),
        }
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} '{raw}' is invalid: {e}")),
        None => default,
    }
}
