use std::env;
use std::path::PathBuf;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub langbase: LangbaseConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub request: RequestConfig,
    pub pipes: PipeConfig,
    pub quality: QualityConfig,
}

/// Langbase API configuration
#[derive(Debug, Clone)]
pub struct LangbaseConfig {
    pub api_key: String,
    pub base_url: String,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

/// Pipe name configuration, one pipe per crew role
#[derive(Debug, Clone)]
pub struct PipeConfig {
    pub coordinator: String,
    pub researcher: String,
    pub analyst: String,
    pub writer: String,
}

/// Quality-feedback loop configuration.
///
/// `max_retries` bounds the quality retry loop; it is independent of the
/// transport-level retry count in [`RequestConfig`].
#[derive(Debug, Clone)]
pub struct QualityConfig {
    pub threshold: f64,
    pub max_retries: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let langbase = LangbaseConfig {
            api_key: env::var("LANGBASE_API_KEY").map_err(|_| AppError::Config {
                message: "LANGBASE_API_KEY is required".to_string(),
            })?,
            base_url: env::var("LANGBASE_BASE_URL")
                .unwrap_or_else(|_| "https://api.langbase.com".to_string()),
        };

        let database = DatabaseConfig {
            path: PathBuf::from(
                env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/research.db".to_string()),
            ),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let request = RequestConfig {
            timeout_ms: env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60000),
            max_retries: env::var("MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            retry_delay_ms: env::var("RETRY_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1000),
        };

        let pipes = PipeConfig {
            coordinator: env::var("PIPE_COORDINATOR")
                .unwrap_or_else(|_| "research-coordinator-v1".to_string()),
            researcher: env::var("PIPE_RESEARCHER")
                .unwrap_or_else(|_| "research-retrieval-v1".to_string()),
            analyst: env::var("PIPE_ANALYST").unwrap_or_else(|_| "research-analyst-v1".to_string()),
            writer: env::var("PIPE_WRITER").unwrap_or_else(|_| "research-writer-v1".to_string()),
        };

        let quality = QualityConfig {
            threshold: env::var("QUALITY_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.65),
            max_retries: env::var("QUALITY_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
        };

        Ok(Config {
            langbase,
            database,
            logging,
            request,
            pipes,
            quality,
        })
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 60000,
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            coordinator: "research-coordinator-v1".to_string(),
            researcher: "research-retrieval-v1".to_string(),
            analyst: "research-analyst-v1".to_string(),
            writer: "research-writer-v1".to_string(),
        }
    }
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            threshold: 0.65,
            max_retries: 2,
        }
    }
}
