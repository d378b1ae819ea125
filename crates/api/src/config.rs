//! Application configuration loaded from environment variables.

use std::path::PathBuf;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: PostgreSQL connection string; unset runs on the in-memory store
/// - `SESSION_SECRET`: key for signing session tokens; unset uses a random per-process key
/// - `APP_URL`: public storefront URL used in payment redirects (default: `"http://localhost:3000"`)
/// - `UPLOAD_DIR`: root directory for uploaded files (default: `"public/uploads"`)
/// - `ALLOW_ADMIN_BOOTSTRAP`: enables `POST /api/create-admin` (default: `false`)
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub session_secret: Option<String>,
    pub app_url: String,
    pub upload_dir: PathBuf,
    pub allow_admin_bootstrap: bool,
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: non_empty_var("HOST").unwrap_or(defaults.host),
            port: non_empty_var("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: non_empty_var("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: non_empty_var("DATABASE_URL"),
            session_secret: non_empty_var("SESSION_SECRET"),
            app_url: non_empty_var("APP_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.app_url),
            upload_dir: non_empty_var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            allow_admin_bootstrap: non_empty_var("ALLOW_ADMIN_BOOTSTRAP")
                .is_some_and(|v| parse_flag(&v)),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            session_secret: None,
            app_url: "http://localhost:3000".to_string(),
            upload_dir: PathBuf::from("public/uploads"),
            allow_admin_bootstrap: false,
        }
    }
}

// Secrets stay out of startup logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("database_url", &self.database_url.as_ref().map(|_| "***"))
            .field("session_secret", &self.session_secret.as_ref().map(|_| "***"))
            .field("app_url", &self.app_url)
            .field("upload_dir", &self.upload_dir)
            .field("allow_admin_bootstrap", &self.allow_admin_bootstrap)
            .finish()
    }
}
