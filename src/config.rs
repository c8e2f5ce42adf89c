use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct EstimatorConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// In-memory storage when unset.
    pub database_url: Option<String>,
    pub estimator: EstimatorConfig,
    pub max_upload_bytes: usize,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = match std::env::var("APP_PORT") {
            Ok(v) => v.parse::<u16>()?,
            Err(_) => 8080,
        };
        let estimator = EstimatorConfig {
            api_key: std::env::var("GEMINI_API_KEY")
                .or_else(|_| std::env::var("API_KEY"))
                .ok(),
            model: env_or("GEMINI_MODEL", "gemini-2.5-flash"),
            base_url: env_or(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com/v1beta",
            ),
            timeout_secs: env_parsed("ESTIMATOR_TIMEOUT_SECS", 30),
        };
        Ok(Self {
            host: env_or("APP_HOST", "0.0.0.0"),
            port,
            database_url: std::env::var("DATABASE_URL").ok(),
            estimator,
            max_upload_bytes: env_parsed("MAX_UPLOAD_BYTES", 20 * 1024 * 1024),
        })
    }
}
