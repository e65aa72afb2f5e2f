use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
    pub database: Option<DatabaseConfig>,
    pub security: SecurityConfig,
    pub sweep: SweepConfig,
}

/// Which allocation store adapter to run against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Database connection pool configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

/// Security configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Shared secret expected as `Authorization: Bearer <token>` on the API.
    /// When unset every authenticated call is rejected.
    pub payment_check_token: Option<String>,
}

/// Revocation sweep configuration
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// True when the allocation's stored deadline already includes the grace period.
    /// When false the sweep adds the grace period on top of the stored deadline.
    pub grace_applied_at_creation: bool,
    /// Upper bound for a triggered sweep before the request gives up
    pub request_timeout: Duration,
    /// Run the in-process fallback scheduler
    pub scheduler_enabled: bool,
    /// Hour of day (UTC) for the daily scheduled run
    pub run_hour_utc: u32,
    /// Delay before the first scheduled run after startup
    pub startup_delay: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let storage = StorageBackend::from_env()?;
        let database = match storage {
            StorageBackend::Postgres => Some(DatabaseConfig::from_env()?),
            StorageBackend::Memory => None,
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            storage,
            database,
            security: SecurityConfig::from_env(),
            sweep: SweepConfig::from_env()?,
        })
    }
}

impl StorageBackend {
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(ConfigError::InvalidStorageBackend(other.to_string())),
        }
    }
}

impl DatabaseConfig {
    /// Load database configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)?;

        Ok(Self {
            url,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .unwrap_or(1),
            acquire_timeout: Duration::from_secs(
                env::var("DATABASE_ACQUIRE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            ),
            idle_timeout: Duration::from_secs(
                env::var("DATABASE_IDLE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "600".to_string())
                    .parse()
                    .unwrap_or(600),
            ),
            max_lifetime: Duration::from_secs(
                env::var("DATABASE_MAX_LIFETIME_SECS")
                    .unwrap_or_else(|_| "1800".to_string())
                    .parse()
                    .unwrap_or(1800),
            ),
        })
    }
}

impl SecurityConfig {
    /// Load security configuration from environment variables
    pub fn from_env() -> Self {
        let payment_check_token = env::var("PAYMENT_CHECK_TOKEN")
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Self {
            payment_check_token,
        }
    }
}

impl SweepConfig {
    /// Load sweep configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let run_hour_utc: u32 = env::var("SWEEP_RUN_HOUR_UTC")
            .unwrap_or_else(|_| "6".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidRunHour)?;

        if run_hour_utc > 23 {
            return Err(ConfigError::InvalidRunHour);
        }

        Ok(Self {
            grace_applied_at_creation: env_flag("SWEEP_GRACE_APPLIED_AT_CREATION"),
            request_timeout: Duration::from_secs(
                env::var("SWEEP_REQUEST_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .unwrap_or(60),
            ),
            scheduler_enabled: env_flag("SWEEP_SCHEDULER_ENABLED"),
            run_hour_utc,
            startup_delay: Duration::from_secs(
                env::var("SWEEP_STARTUP_DELAY_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .unwrap_or(30),
            ),
        })
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            grace_applied_at_creation: false,
            request_timeout: Duration::from_secs(60),
            scheduler_enabled: false,
            run_hour_utc: 6,
            startup_delay: Duration::from_secs(30),
        }
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidRunHour,
    InvalidStorageBackend(String),
    MissingDatabaseUrl,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "PORT must be a valid number"),
            ConfigError::InvalidRunHour => {
                write!(f, "SWEEP_RUN_HOUR_UTC must be an hour between 0 and 23")
            }
            ConfigError::InvalidStorageBackend(value) => {
                write!(
                    f,
                    "STORAGE_BACKEND must be 'postgres' or 'memory', got '{}'",
                    value
                )
            }
            ConfigError::MissingDatabaseUrl => {
                write!(
                    f,
                    "DATABASE_URL environment variable is required for the postgres backend"
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}
