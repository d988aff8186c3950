use std::time::Duration;

/// A configuration that loads but cannot run correctly.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "ETL_ENGINE_TIMEOUT_SECS ({engine_secs}) must be shorter than \
         REQUEST_TIMEOUT_SECS ({request_secs})"
    )]
    EngineTimeoutNotShorter { engine_secs: u64, request_secs: u64 },
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development. In production,
/// override via environment variables.
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
    /// Base URL of the external ETL engine (default: `http://etl:8000`).
    pub etl_service_url: String,
    /// Per-call timeout for requests to the ETL engine (default: `25`).
    pub etl_engine_timeout_secs: u64,
    /// PostgreSQL URL. When unset the in-memory job store is used.
    pub database_url: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                 |
    /// |---------------------------|-------------------------|
    /// | `HOST`                    | `0.0.0.0`               |
    /// | `PORT`                    | `3000`                  |
    /// | `CORS_ORIGINS`            | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                    |
    /// | `ETL_SERVICE_URL`         | `http://etl:8000`       |
    /// | `ETL_ENGINE_TIMEOUT_SECS` | `25`                    |
    /// | `DATABASE_URL`            | unset                   |
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

        let etl_service_url =
            std::env::var("ETL_SERVICE_URL").unwrap_or_else(|_| "http://etl:8000".into());

        let etl_engine_timeout_secs: u64 = std::env::var("ETL_ENGINE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "25".into())
            .parse()
            .expect("ETL_ENGINE_TIMEOUT_SECS must be a valid u64");

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            etl_service_url,
            etl_engine_timeout_secs,
            database_url,
        }
    }

    /// Reject settings under which a request can time out while its engine
    /// call is still in flight.
    ///
    /// Submission finishes its store writes even then, but the caller would
    /// get a 408 instead of the recorded job.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.etl_engine_timeout_secs >= self.request_timeout_secs {
            return Err(ConfigError::EngineTimeoutNotShorter {
                engine_secs: self.etl_engine_timeout_secs,
                request_secs: self.request_timeout_secs,
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn etl_engine_timeout(&self) -> Duration {
        Duration::from_secs(self.etl_engine_timeout_secs)
    }
}
