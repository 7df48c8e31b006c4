use anyhow::{Context, Result};
use config::{Config, Environment, File, Source};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Single-variable override for the backend location.
pub const API_URL_ENV: &str = "RMS_API_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Defaults, then `config.toml` (if present), then `RMS__SECTION__KEY`
    /// environment variables, then `RMS_API_URL`.
    pub fn load() -> Result<Self> {
        Self::layered(File::with_name("config").required(false))
    }

    fn layered<S>(file: S) -> Result<Self>
    where
        S: Source + Send + Sync + 'static,
    {
        let mut config: AppConfig = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(file)
            .add_source(
                Environment::with_prefix("RMS")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .context("reading configuration sources")?
            .try_deserialize()
            .context("parsing configuration")?;

        if let Ok(url) = std::env::var(API_URL_ENV) {
            config.api.base_url = url;
        }
        config.api.base_url = config.api.base_url.trim_end_matches('/').to_string();
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            static_dir: "static".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: 30,
            user_agent: "faculty-rms/0.1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub device_cookie_name: String,
    /// Lifetime of the auth cookie in hours.
    pub max_age_hours: i64,
    pub secure_cookies: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "rms_auth".to_string(),
            device_cookie_name: "rms_device".to_string(),
            max_age_hours: 24,
            secure_cookies: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: String,
    pub file_prefix: String,
    pub json_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info,tower_http=warn,hyper=warn".to_string(),
            directory: "logs".to_string(),
            file_prefix: "rms-dashboard.log".to_string(),
            json_file: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn partial_file_keeps_defaults_for_missing_sections() {
        let file = File::from_str(
            r#"
            [api]
            base_url = "https://rms.uni.test/api/"
            timeout_secs = 5
            "#,
            FileFormat::Toml,
        );
        let config = AppConfig::layered(file).unwrap();
        if std::env::var(API_URL_ENV).is_err() {
            assert_eq!(config.api.base_url, "https://rms.uni.test/api");
        }
        assert_eq!(config.api.timeout(), Duration::from_secs(5));
        assert_eq!(config.session.cookie_name, "rms_auth");
        assert_eq!(config.server.bind.port(), 3000);
    }

    #[test]
    fn defaults_point_at_local_backend() {
        let config = AppConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert!(config.logging.json_file);
    }
}
