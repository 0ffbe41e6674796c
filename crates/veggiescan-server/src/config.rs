use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Allowed CORS origins. Empty means any origin (development mode).
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Full connection URL. Defaults to a SQLite file under `data_dir`.
    #[serde(default)]
    pub url: Option<String>,
}

impl DatabaseConfig {
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) if !url.is_empty() => url.clone(),
            _ => format!("sqlite://{}/veggiescan.db?mode=rwc", self.data_dir),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret. A random one is generated per process when unset.
    #[serde(default)]
    pub jwt_secret: Option<String>,
    #[serde(default = "default_token_expire_secs")]
    pub token_expire_secs: u64,
    /// Administrator seeded into an empty users table
    #[serde(default = "default_admin_email")]
    pub default_admin_email: String,
    #[serde(default = "default_admin_username")]
    pub default_admin_username: String,
    #[serde(default = "default_admin_password")]
    pub default_admin_password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_expire_secs: default_token_expire_secs(),
            default_admin_email: default_admin_email(),
            default_admin_username: default_admin_username(),
            default_admin_password: default_admin_password(),
        }
    }
}

/// Vision model endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Skip the remote model entirely and answer from the mock table.
    #[serde(default)]
    pub mock_mode: bool,
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,
    #[serde(default = "default_ai_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_ai_timeout_secs")]
    pub timeout_secs: u64,
    /// Bound on the `/models` check behind health and status endpoints
    #[serde(default = "default_ai_health_timeout_secs")]
    pub health_timeout_secs: u64,
    #[serde(default = "default_ai_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_ai_temperature")]
    pub temperature: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            mock_mode: false,
            base_url: default_ai_base_url(),
            model: default_ai_model(),
            api_key: None,
            timeout_secs: default_ai_timeout_secs(),
            health_timeout_secs: default_ai_health_timeout_secs(),
            max_tokens: default_ai_max_tokens(),
            temperature: default_ai_temperature(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Admin uploads are archived here as `{sha256}.jpg`
    #[serde(default = "default_dataset_dir")]
    pub dataset_dir: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            dataset_dir: default_dataset_dir(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_http_port() -> u16 {
    8000
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_token_expire_secs() -> u64 {
    1800
}

fn default_admin_email() -> String {
    "admin@veggiescan.local".to_string()
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_password() -> String {
    "changeme".to_string()
}

fn default_ai_base_url() -> String {
    "http://localhost:1234/v1".to_string()
}

fn default_ai_model() -> String {
    "google/gemma-3-4b".to_string()
}

fn default_ai_timeout_secs() -> u64 {
    30
}

fn default_ai_health_timeout_secs() -> u64 {
    5
}

fn default_ai_max_tokens() -> usize {
    500
}

fn default_ai_temperature() -> f32 {
    0.1
}

fn default_dataset_dir() -> String {
    "dataset".to_string()
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            cors_allowed_origins: Vec::new(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            ai: AiConfig::default(),
            scan: ScanConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path, e))?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.http_port, 8000);
        assert!(config.cors_allowed_origins.is_empty());
        assert_eq!(
            config.database.connection_url(),
            "sqlite://data/veggiescan.db?mode=rwc"
        );
        assert!(config.auth.jwt_secret.is_none());
        assert_eq!(config.auth.token_expire_secs, 1800);
        assert!(!config.ai.mock_mode);
        assert_eq!(config.ai.base_url, "http://localhost:1234/v1");
        assert_eq!(config.ai.model, "google/gemma-3-4b");
        assert_eq!(config.ai.timeout_secs, 30);
        assert_eq!(config.ai.health_timeout_secs, 5);
        assert_eq!(config.ai.max_tokens, 500);
        assert_eq!(config.scan.dataset_dir, "dataset");
        assert_eq!(config.scan.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn sections_override_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            http_port = 9000
            cors_allowed_origins = ["http://localhost:3000"]

            [database]
            data_dir = "/var/lib/veggiescan"

            [auth]
            jwt_secret = "s3cret"
            token_expire_secs = 60

            [ai]
            mock_mode = true
            model = "llava"
            api_key = "sk-test"
            temperature = 0.0

            [scan]
            dataset_dir = "/srv/dataset"
            "#,
        )
        .unwrap();
        assert_eq!(config.http_port, 9000);
        assert_eq!(config.cors_allowed_origins.len(), 1);
        assert_eq!(
            config.database.connection_url(),
            "sqlite:///var/lib/veggiescan/veggiescan.db?mode=rwc"
        );
        assert_eq!(config.auth.jwt_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.auth.token_expire_secs, 60);
        // untouched keys inside an overridden section keep their defaults
        assert_eq!(config.auth.default_admin_username, "admin");
        assert!(config.ai.mock_mode);
        assert_eq!(config.ai.model, "llava");
        assert_eq!(config.ai.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.ai.max_tokens, 500);
        assert_eq!(config.scan.dataset_dir, "/srv/dataset");
    }

    #[test]
    fn explicit_database_url_wins() {
        let db = DatabaseConfig {
            data_dir: "data".to_string(),
            url: Some("sqlite::memory:".to_string()),
        };
        assert_eq!(db.connection_url(), "sqlite::memory:");
    }

    #[test]
    fn load_reports_missing_file() {
        let err = ServerConfig::load("/nonexistent/veggiescan.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/veggiescan.toml"));
    }
}
