use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use anyhow::Result;

use crate::content::AllowedExtensions;
use crate::utils::limits::{BYTES_PER_MB, DEFAULT_MAX_UPLOAD_MB};

pub const DEFAULT_CONFIG_FILE: &str = "linkdrop.toml";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEV_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub data_directory: PathBuf,
    pub listen_address: String,
    /// Prefix of every issued download link.
    pub base_url: String,
    pub token_secret: String,
    pub max_upload_mb: u64,
    pub allowed_extensions: Vec<String>,
    pub auto_create_directories: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_directory: PathBuf::from("./uploads"),
            listen_address: format!("0.0.0.0:{}", DEFAULT_PORT),
            base_url: format!("http://localhost:{}", DEFAULT_PORT),
            token_secret: DEV_SECRET.to_string(),
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
            allowed_extensions: [".txt", ".pdf", ".png", ".jpg", ".jpeg", ".zip"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            auto_create_directories: true,
        }
    }
}

impl ServerConfig {
    /// Defaults, then the TOML file if present, then the environment.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let config_file = config_path.unwrap_or(DEFAULT_CONFIG_FILE);

        let mut config = if std::path::Path::new(config_file).exists() {
            let content = std::fs::read_to_string(config_file)?;
            let config: ServerConfig = toml::from_str(&content)?;
            tracing::debug!("Loaded config from {}", config_file);
            config
        } else if config_path.is_some() {
            anyhow::bail!("config file {} not found", config_file);
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override fields from `BASE_URL`, `DATA_DIR`, `TOKEN_SECRET`,
    /// `MAX_UPLOAD_MB` and `PORT`. Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(base_url) = get("BASE_URL") {
            self.base_url = base_url;
        }
        if let Some(dir) = get("DATA_DIR") {
            self.data_directory = dir.into();
        }
        if let Some(secret) = get("TOKEN_SECRET") {
            self.token_secret = secret;
        }
        if let Some(mb) = get("MAX_UPLOAD_MB") {
            match mb.trim().parse::<u64>() {
                Ok(n) if n > 0 => self.max_upload_mb = n,
                _ => tracing::warn!("Ignoring invalid MAX_UPLOAD_MB={:?}", mb),
            }
        }
        if let Some(port) = get("PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => self.listen_address = format!("0.0.0.0:{}", port),
                Err(_) => tracing::warn!("Ignoring invalid PORT={:?}", port),
            }
        }
    }

    pub fn save(&self, config_path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn ensure_directories(&self) -> Result<()> {
        if self.auto_create_directories && !self.data_directory.exists() {
            std::fs::create_dir_all(&self.data_directory)?;
            tracing::info!("Created data directory: {:?}", self.data_directory);
        }
        Ok(())
    }

    pub fn max_upload_bytes(&self) -> usize {
        usize::try_from(self.max_upload_mb.saturating_mul(BYTES_PER_MB)).unwrap_or(usize::MAX)
    }

    pub fn allowed(&self) -> AllowedExtensions {
        AllowedExtensions::new(&self.allowed_extensions)
    }

    /// Base URL without a trailing slash.
    pub fn link_prefix(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.token_secret == DEV_SECRET
    }
}
