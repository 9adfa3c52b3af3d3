//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `PRODO_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_ACQUIRE_TIMEOUT_MS, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_EMBEDDING_DIM,
    DEFAULT_MAX_CONCURRENT, DEFAULT_MEMORY_CACHE_CAPACITY, DEFAULT_QUERY_CACHE_CAPACITY,
    DEFAULT_QUERY_CACHE_TTL_SECS, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_BACKOFF,
    DEFAULT_RETRY_DELAY_MS, DEFAULT_WORKER_COUNT,
};
use crate::retry::RetryPolicy;

/// Service configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `PRODO_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Directory for metadata documents (index summaries, query logs, jobs). Default: `./.data`.
    pub data_path: PathBuf,

    /// Dimension of every stored vector. Default: `384`.
    pub embedding_dim: usize,

    /// Directory holding `config.json`, `tokenizer.json` and `model.safetensors`.
    /// When unset the deterministic stub embedder is used.
    pub model_path: Option<PathBuf>,

    /// Max entries in the in-memory embedding tier. Default: `4096`.
    pub memory_cache_capacity: usize,

    /// Directory for the content-addressed embedding disk tier. Unset disables the tier.
    pub disk_cache_path: Option<PathBuf>,

    /// Lifetime of a cached query answer. Default: `300s`.
    pub query_cache_ttl: Duration,

    /// Max cached query answers. Default: `1024`.
    pub query_cache_capacity: usize,

    /// Max concurrent heavy operations admitted by the gate. Default: `2`.
    pub max_concurrent: usize,

    /// How long a caller waits for admission before being rejected. Default: `500ms`.
    pub acquire_timeout: Duration,

    /// If true, index requests are queued and answered with a job id. Default: `false`.
    pub background_indexing: bool,

    /// Number of background indexing workers. Default: `1`.
    pub worker_count: usize,

    /// Chunk window in characters. Default: `2000`.
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks. Default: `200`.
    pub chunk_overlap: usize,

    /// Qdrant endpoint URL. Default: `http://localhost:6334`.
    pub qdrant_url: String,

    /// Qdrant collection holding every repository namespace.
    pub collection: String,

    /// Model name passed to the generation client.
    pub generator_model: String,

    /// Retry policy wrapped around embedding inference.
    pub retry: RetryPolicy,
}

/// Default listen port used when `PRODO_PORT` is not set.
pub const DEFAULT_PORT: u16 = 8080;
/// Default Qdrant URL used when `PRODO_QDRANT_URL` is not set.
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";
/// Default collection name used when `PRODO_COLLECTION` is not set.
pub const DEFAULT_COLLECTION: &str = "repo-code-index";
/// Default generator model used when `PRODO_GENERATOR_MODEL` is not set.
pub const DEFAULT_GENERATOR_MODEL: &str = "gemini-2.5-pro";

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            data_path: PathBuf::from("./.data"),
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            model_path: None,
            memory_cache_capacity: DEFAULT_MEMORY_CACHE_CAPACITY,
            disk_cache_path: None,
            query_cache_ttl: Duration::from_secs(DEFAULT_QUERY_CACHE_TTL_SECS),
            query_cache_capacity: DEFAULT_QUERY_CACHE_CAPACITY,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            acquire_timeout: Duration::from_millis(DEFAULT_ACQUIRE_TIMEOUT_MS),
            background_indexing: false,
            worker_count: DEFAULT_WORKER_COUNT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            qdrant_url: DEFAULT_QDRANT_URL.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            generator_model: DEFAULT_GENERATOR_MODEL.to_string(),
            retry: RetryPolicy::new(
                DEFAULT_RETRY_ATTEMPTS,
                Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
                DEFAULT_RETRY_BACKOFF,
            ),
        }
    }
}

impl Config {
    pub const ENV_PORT: &'static str = "PRODO_PORT";
    const ENV_BIND_ADDR: &'static str = "PRODO_BIND_ADDR";
    const ENV_DATA_PATH: &'static str = "PRODO_DATA_PATH";
    const ENV_EMBEDDING_DIM: &'static str = "PRODO_EMBEDDING_DIM";
    const ENV_MODEL_PATH: &'static str = "PRODO_MODEL_PATH";
    const ENV_MEMORY_CACHE_CAPACITY: &'static str = "PRODO_MEMORY_CACHE_CAPACITY";
    const ENV_DISK_CACHE_PATH: &'static str = "PRODO_DISK_CACHE_PATH";
    const ENV_QUERY_CACHE_TTL_SECS: &'static str = "PRODO_QUERY_CACHE_TTL_SECS";
    const ENV_QUERY_CACHE_CAPACITY: &'static str = "PRODO_QUERY_CACHE_CAPACITY";
    const ENV_MAX_CONCURRENT: &'static str = "PRODO_MAX_CONCURRENT";
    const ENV_ACQUIRE_TIMEOUT_MS: &'static str = "PRODO_ACQUIRE_TIMEOUT_MS";
    const ENV_BACKGROUND_INDEXING: &'static str = "PRODO_BACKGROUND_INDEXING";
    const ENV_WORKER_COUNT: &'static str = "PRODO_WORKER_COUNT";
    const ENV_CHUNK_SIZE: &'static str = "PRODO_CHUNK_SIZE";
    const ENV_CHUNK_OVERLAP: &'static str = "PRODO_CHUNK_OVERLAP";
    const ENV_QDRANT_URL: &'static str = "PRODO_QDRANT_URL";
    const ENV_COLLECTION: &'static str = "PRODO_COLLECTION";
    const ENV_GENERATOR_MODEL: &'static str = "PRODO_GENERATOR_MODEL";
    const ENV_RETRY_ATTEMPTS: &'static str = "PRODO_RETRY_ATTEMPTS";
    const ENV_RETRY_DELAY_MS: &'static str = "PRODO_RETRY_DELAY_MS";
    const ENV_RETRY_BACKOFF: &'static str = "PRODO_RETRY_BACKOFF";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let data_path = Self::parse_path_from_env(Self::ENV_DATA_PATH, defaults.data_path);
        let embedding_dim =
            Self::parse_usize_from_env(Self::ENV_EMBEDDING_DIM, defaults.embedding_dim);
        let model_path = Self::parse_optional_path_from_env(Self::ENV_MODEL_PATH);
        let memory_cache_capacity = Self::parse_usize_from_env(
            Self::ENV_MEMORY_CACHE_CAPACITY,
            defaults.memory_cache_capacity,
        );
        let disk_cache_path = Self::parse_optional_path_from_env(Self::ENV_DISK_CACHE_PATH);
        let query_cache_ttl = Duration::from_secs(Self::parse_u64_from_env(
            Self::ENV_QUERY_CACHE_TTL_SECS,
            defaults.query_cache_ttl.as_secs(),
        ));
        let query_cache_capacity = Self::parse_usize_from_env(
            Self::ENV_QUERY_CACHE_CAPACITY,
            defaults.query_cache_capacity,
        );
        let max_concurrent =
            Self::parse_usize_from_env(Self::ENV_MAX_CONCURRENT, defaults.max_concurrent);
        let acquire_timeout = Duration::from_millis(Self::parse_u64_from_env(
            Self::ENV_ACQUIRE_TIMEOUT_MS,
            defaults.acquire_timeout.as_millis() as u64,
        ));
        let background_indexing =
            Self::parse_bool_from_env(Self::ENV_BACKGROUND_INDEXING, defaults.background_indexing);
        let worker_count =
            Self::parse_usize_from_env(Self::ENV_WORKER_COUNT, defaults.worker_count);
        let chunk_size = Self::parse_usize_from_env(Self::ENV_CHUNK_SIZE, defaults.chunk_size);
        let chunk_overlap =
            Self::parse_usize_from_env(Self::ENV_CHUNK_OVERLAP, defaults.chunk_overlap);
        let qdrant_url = Self::parse_string_from_env(Self::ENV_QDRANT_URL, defaults.qdrant_url);
        let collection = Self::parse_string_from_env(Self::ENV_COLLECTION, defaults.collection);
        let generator_model =
            Self::parse_string_from_env(Self::ENV_GENERATOR_MODEL, defaults.generator_model);

        let retry = RetryPolicy::new(
            u32::try_from(Self::parse_u64_from_env(
                Self::ENV_RETRY_ATTEMPTS,
                u64::from(defaults.retry.max_attempts()),
            ))
            .unwrap_or(u32::MAX),
            Duration::from_millis(Self::parse_u64_from_env(
                Self::ENV_RETRY_DELAY_MS,
                defaults.retry.initial_delay().as_millis() as u64,
            )),
            env::var(Self::ENV_RETRY_BACKOFF)
                .ok()
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|v| v.is_finite() && *v >= 1.0)
                .unwrap_or(defaults.retry.backoff_multiplier()),
        );

        Ok(Self {
            port,
            bind_addr,
            data_path,
            embedding_dim,
            model_path,
            memory_cache_capacity,
            disk_cache_path,
            query_cache_ttl,
            query_cache_capacity,
            max_concurrent,
            acquire_timeout,
            background_indexing,
            worker_count,
            chunk_size,
            chunk_overlap,
            qdrant_url,
            collection,
            generator_model,
            retry,
        })
    }

    /// Validates paths and basic invariants (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding_dim == 0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_EMBEDDING_DIM,
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_CHUNK_SIZE,
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_CHUNK_OVERLAP,
                reason: format!(
                    "overlap {} must be smaller than chunk size {}",
                    self.chunk_overlap, self.chunk_size
                ),
            });
        }

        if self.max_concurrent == 0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_MAX_CONCURRENT,
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.worker_count == 0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_WORKER_COUNT,
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.data_path.exists() && !self.data_path.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: self.data_path.clone(),
            });
        }

        if let Some(ref path) = self.disk_cache_path
            && path.exists()
            && !path.is_dir()
        {
            return Err(ConfigError::NotADirectory { path: path.clone() });
        }

        if let Some(ref path) = self.model_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name).map(PathBuf::from).unwrap_or(default)
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name).unwrap_or(default)
    }

    fn parse_u64_from_env(var_name: &str, default: u64) -> u64 {
        env::var(var_name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn parse_usize_from_env(var_name: &str, default: usize) -> usize {
        env::var(var_name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn parse_bool_from_env(var_name: &str, default: bool) -> bool {
        env::var(var_name)
            .map(|s| matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(default)
    }
}
