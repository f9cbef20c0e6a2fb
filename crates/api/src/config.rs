use chrono_tz::Tz;
use zonal_core::lease::LEASE_SWEEP_INTERVAL_SECS;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Interval between expired-lease sweeps in seconds (default: `60`).
    pub lock_sweep_interval_secs: u64,
    /// Timezone that defines the quota day (default: `UTC`).
    pub quota_timezone: Tz,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                    |
    /// |----------------------------|----------------------------|
    /// | `HOST`                     | `0.0.0.0`                  |
    /// | `PORT`                     | `3000`                     |
    /// | `CORS_ORIGINS`             | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`    | `30`                       |
    /// | `LOCK_SWEEP_INTERVAL_SECS` | `60`                       |
    /// | `QUOTA_TIMEZONE`           | `UTC`                      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let lock_sweep_interval_secs: u64 = std::env::var("LOCK_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| LEASE_SWEEP_INTERVAL_SECS.to_string())
            .parse()
            .expect("LOCK_SWEEP_INTERVAL_SECS must be a valid u64");

        let quota_timezone: Tz = std::env::var("QUOTA_TIMEZONE")
            .unwrap_or_else(|_| "UTC".into())
            .parse()
            .expect("QUOTA_TIMEZONE must be a valid IANA timezone name");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            lock_sweep_interval_secs,
            quota_timezone,
        }
    }
}
