use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Placeholder shipped in sample configs; refused outside local development.
pub const PLACEHOLDER_SECRET: &str = "changethis";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub bootstrap: BootstrapConfig,

    pub startup: StartupConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Local,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "staging" => Ok(Self::Staging),
            "production" => Ok(Self::Production),
            other => anyhow::bail!("Unknown environment '{other}'"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_url: String,

    pub log_level: String,

    /// "pretty" or "json"
    pub log_format: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,

    pub environment: Environment,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:data/stockroom.db".to_string(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
            environment: Environment::Local,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub api_prefix: String,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            api_prefix: "/api/v1".to_string(),
            cors_allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// HMAC key used to sign access tokens. Empty means "generate one per process".
    pub secret_key: String,

    /// JWT signing algorithm: HS256, HS384 or HS512
    pub algorithm: String,

    pub access_token_expire_minutes: u64,

    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            algorithm: "HS256".to_string(),
            // 60 minutes * 24 hours * 8 days
            access_token_expire_minutes: 60 * 24 * 8,
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub first_superuser: String,

    pub first_superuser_password: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            first_superuser: "admin@example.com".to_string(),
            first_superuser_password: PLACEHOLDER_SECRET.to_string(),
        }
    }
}

/// Database readiness probe run before the pool is opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupConfig {
    pub max_tries: u32,

    pub wait_seconds: u64,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            max_tries: 60 * 5,
            wait_seconds: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            security: SecurityConfig::default(),
            bootstrap: BootstrapConfig::default(),
            startup: StartupConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    /// Loads the first config file found (or defaults), then applies `.env`
    /// and `STOCKROOM_*` overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load_from_path(path)?,
            None => Self::load_from_default_paths()?,
        };

        dotenvy::dotenv().ok();
        config.apply_env_overrides(|key| std::env::var(key).ok())?;

        Ok(config)
    }

    fn load_from_default_paths() -> Result<Self> {
        for path in &Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// `lookup` abstracts the process environment so overrides are testable.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("STOCKROOM_DATABASE_URL") {
            self.general.database_url = url;
        }
        if let Some(level) = lookup("STOCKROOM_LOG_LEVEL") {
            self.general.log_level = level;
        }
        if let Some(env) = lookup("STOCKROOM_ENVIRONMENT") {
            self.general.environment = env.parse()?;
        }
        if let Some(port) = lookup("STOCKROOM_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("Invalid STOCKROOM_PORT: {port}"))?;
        }
        if let Some(secret) = lookup("STOCKROOM_SECRET_KEY") {
            self.security.secret_key = secret;
        }
        if let Some(email) = lookup("STOCKROOM_FIRST_SUPERUSER") {
            self.bootstrap.first_superuser = email;
        }
        if let Some(password) = lookup("STOCKROOM_FIRST_SUPERUSER_PASSWORD") {
            self.bootstrap.first_superuser_password = password;
        }
        Ok(())
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("stockroom").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".stockroom").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    /// Writes the default config to `explicit`, or `./config.toml` when no path is given.
    pub fn create_default_if_missing(explicit: Option<&Path>) -> Result<bool> {
        let path = explicit.map_or_else(Self::default_config_path, Path::to_path_buf);
        if path.exists() {
            Ok(false)
        } else {
            Self::default().save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        crate::security::token::parse_algorithm(&self.security.algorithm)?;

        if self.security.access_token_expire_minutes == 0 {
            anyhow::bail!("security.access_token_expire_minutes must be > 0");
        }
        crate::security::token::token_ttl(self.security.access_token_expire_minutes)?;

        if self.startup.max_tries == 0 {
            anyhow::bail!("startup.max_tries must be > 0");
        }

        if self.bootstrap.first_superuser.trim().is_empty() {
            anyhow::bail!("bootstrap.first_superuser cannot be empty");
        }

        if !self.server.api_prefix.starts_with('/') {
            anyhow::bail!("server.api_prefix must start with '/'");
        }

        self.check_default_secret("security.secret_key", &self.security.secret_key)?;
        self.check_default_secret(
            "bootstrap.first_superuser_password",
            &self.bootstrap.first_superuser_password,
        )?;

        Ok(())
    }

    fn check_default_secret(&self, name: &str, value: &str) -> Result<()> {
        if value != PLACEHOLDER_SECRET {
            return Ok(());
        }

        if self.general.environment == Environment::Local {
            warn!("The value of {name} is \"{PLACEHOLDER_SECRET}\", change it before deploying");
            Ok(())
        } else {
            anyhow::bail!(
                "The value of {name} is \"{PLACEHOLDER_SECRET}\", it must be changed in {}",
                self.general.environment.as_str()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.api_prefix, "/api/v1");
        assert_eq!(config.security.algorithm, "HS256");
        assert_eq!(config.security.access_token_expire_minutes, 11_520);
        assert_eq!(config.startup.max_tries, 300);
        assert_eq!(config.general.environment, Environment::Local);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[security]"));
        assert!(toml_str.contains("[bootstrap]"));
        assert!(toml_str.contains("environment = \"local\""));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"
            environment = "staging"

            [security]
            secret_key = "s3cret"
            access_token_expire_minutes = 30
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.general.environment, Environment::Staging);
        assert_eq!(config.security.access_token_expire_minutes, 30);

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.security.algorithm, "HS256");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env_overrides(|key| match key {
                "STOCKROOM_DATABASE_URL" => Some("sqlite::memory:".to_string()),
                "STOCKROOM_ENVIRONMENT" => Some("Production".to_string()),
                "STOCKROOM_PORT" => Some("9000".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.general.database_url, "sqlite::memory:");
        assert_eq!(config.general.environment, Environment::Production);
        assert_eq!(config.server.port, 9000);

        let bad_port = config.apply_env_overrides(|key| {
            (key == "STOCKROOM_PORT").then(|| "not-a-port".to_string())
        });
        assert!(bad_port.is_err());
    }

    #[test]
    fn test_placeholder_secrets_rejected_outside_local() {
        let mut config = Config::default();
        config.security.secret_key = PLACEHOLDER_SECRET.to_string();
        assert!(config.validate().is_ok());

        config.general.environment = Environment::Production;
        assert!(config.validate().is_err());

        config.security.secret_key = "a-real-secret".to_string();
        // bootstrap password still holds the placeholder
        assert!(config.validate().is_err());

        config.bootstrap.first_superuser_password = "another-real-secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_create_default_at_explicit_path() {
        let dir = std::env::temp_dir().join(format!("stockroom-init-{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("stockroom.toml");
        assert!(Config::load_from_path(&path).is_err());

        assert!(Config::create_default_if_missing(Some(&path)).unwrap());
        assert!(path.exists());
        assert!(!Path::new("nested/stockroom.toml").exists());

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.server.port, Config::default().server.port);

        std::fs::write(&path, "[server]\nport = 9100\n").unwrap();
        assert!(!Config::create_default_if_missing(Some(&path)).unwrap());
        assert_eq!(Config::load_from_path(&path).unwrap().server.port, 9100);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_rejects_out_of_range_expiry() {
        let mut config = Config::default();
        config.security.access_token_expire_minutes = u64::MAX;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_algorithm() {
        let mut config = Config::default();
        config.security.algorithm = "RS999".to_string();
        assert!(config.validate().is_err());
    }
}
