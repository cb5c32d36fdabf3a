//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use quill_core::QueryMatching;
use quill_infra::{DatabaseConfig, InMemoryJobQueueConfig, JwtConfig, MailgunConfig, RateLimitConfig};

/// Every six hours, at the top of the hour.
pub const DEFAULT_RECOVERY_SWEEP_CRON: &str = "0 0 */6 * * *";

/// How recovery mail leaves the server.
#[derive(Debug, Clone)]
pub enum MailTransport {
    Mailgun(MailgunConfig),
    /// Log messages instead of delivering them.
    Log,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    /// Settings document on disk; `None` keeps settings in memory only.
    pub settings_path: Option<PathBuf>,
    /// Seed values for a blog that has not been installed yet.
    pub blog_name: Option<String>,
    pub blog_hostname: Option<String>,
    pub search_matching: QueryMatching,
    pub recovery_sweep_cron: String,
    pub request_timeout: Duration,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
    pub jobs: InMemoryJobQueueConfig,
    pub mail: MailTransport,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database: None,
            settings_path: None,
            blog_name: None,
            blog_hostname: None,
            search_matching: QueryMatching::default(),
            recovery_sweep_cron: DEFAULT_RECOVERY_SWEEP_CRON.to_string(),
            request_timeout: Duration::from_secs(5),
            jwt: JwtConfig::default(),
            rate_limit: RateLimitConfig::default(),
            jobs: InMemoryJobQueueConfig::default(),
            mail: MailTransport::Log,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let search_matching = match env::var("SEARCH_QUERY_MATCHING") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "Unknown SEARCH_QUERY_MATCHING, using whole-query matching");
                QueryMatching::default()
            }),
            Err(_) => defaults.search_matching,
        };

        let mail = match env::var("MAIL_TRANSPORT").map(|v| v.to_lowercase()) {
            Ok(v) if v == "log" => MailTransport::Log,
            _ => MailTransport::Mailgun(MailgunConfig::from_env()),
        };

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            database: DatabaseConfig::from_env(),
            settings_path: match env::var("SETTINGS_PATH") {
                Ok(path) if path.is_empty() => None,
                Ok(path) => Some(PathBuf::from(path)),
                Err(_) => Some(PathBuf::from("settings.json")),
            },
            blog_name: non_empty_var("BLOG_NAME"),
            blog_hostname: non_empty_var("BLOG_HOSTNAME"),
            search_matching,
            recovery_sweep_cron: non_empty_var("RECOVERY_SWEEP_CRON")
                .unwrap_or(defaults.recovery_sweep_cron),
            request_timeout: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            jwt: JwtConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
            jobs: InMemoryJobQueueConfig::from_env(),
            mail,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
