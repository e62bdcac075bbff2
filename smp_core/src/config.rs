use std::path::{Path, PathBuf};

use iroh::SecretKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::info;
use url::Url;

static DATA_DIR_NAME: &str = "peppol_smp";
static SMP_DB_NAME: &str = "smp_db.sqlite";
static CONFIG_FILE_NAME: &str = "config.json";
static SIGNING_KEY_NAME: &str = "signing_key.pem";

static DEFAULT_BASE_URL: &str = "http://localhost:8080";

pub const BASE_URL_ENV: &str = "SMP_BASE_URL";
pub const SIGNING_KEY_ENV: &str = "SMP_SIGNING_KEY";
pub const SIGNING_CERT_ENV: &str = "SMP_SIGNING_CERT";

// data_dir_path
// |- peppol_smp
//    |- smp_db.sqlite
//    |- config.json
//    |- signing_key.pem (provisioned by the operator)

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no data directory available on this platform")]
    NoDataDir,

    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config file: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid base url {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

fn default_secret_key() -> SecretKey {
    SecretKey::generate(&mut rand::rng())
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SmpConfig {
    /// Secret key for the node's iroh endpoint.
    #[serde(default = "default_secret_key")]
    pub(crate) secret_key: SecretKey,

    pub(crate) database_path: PathBuf,

    /// Public base URL used to build ServiceMetadataReference hrefs.
    pub base_url: String,

    pub signing_key_path: PathBuf,

    #[serde(default)]
    pub signing_certificate_path: Option<PathBuf>,
}

impl SmpConfig {
    /// Config rooted at `data_dir` with a fresh node key.
    pub fn new(data_dir: &Path, base_url: impl Into<String>) -> Self {
        SmpConfig {
            secret_key: default_secret_key(),
            database_path: data_dir.join(SMP_DB_NAME),
            base_url: base_url.into(),
            signing_key_path: data_dir.join(SIGNING_KEY_NAME),
            signing_certificate_path: None,
        }
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn with_database_path(mut self, database_path: impl Into<PathBuf>) -> Self {
        self.database_path = database_path.into();
        self
    }

    pub fn with_signing_key(
        mut self,
        key_path: impl Into<PathBuf>,
        certificate_path: Option<PathBuf>,
    ) -> Self {
        self.signing_key_path = key_path.into();
        self.signing_certificate_path = certificate_path;
        self
    }

    /// Applies `SMP_BASE_URL`, `SMP_SIGNING_KEY` and `SMP_SIGNING_CERT`.
    pub fn apply_env_overrides(self) -> Self {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(base_url) = lookup(BASE_URL_ENV) {
            self.base_url = base_url;
        }
        if let Some(key_path) = lookup(SIGNING_KEY_ENV) {
            self.signing_key_path = PathBuf::from(key_path);
        }
        if let Some(cert_path) = lookup(SIGNING_CERT_ENV) {
            self.signing_certificate_path = Some(PathBuf::from(cert_path));
        }
        self
    }

    /// Base URL must be an absolute http(s) URL without query or fragment.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: reason.to_owned(),
        };

        let url = Url::parse(&self.base_url).map_err(|e| invalid(&e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("query and fragment are not allowed"));
        }
        Ok(())
    }
}

/// Gets the existing config or initializes a new one if it doesn't exist
pub async fn get_or_init() -> Result<SmpConfig, ConfigError> {
    let data_dir = dirs::data_dir().ok_or(ConfigError::NoDataDir)?;
    load_or_init(&data_dir.join(DATA_DIR_NAME)).await
}

/// Same as [`get_or_init`] but rooted at an explicit directory.
pub async fn load_or_init(smp_dir: &Path) -> Result<SmpConfig, ConfigError> {
    let config_path = smp_dir.join(CONFIG_FILE_NAME);

    fs::create_dir_all(smp_dir).await?;

    let config = if fs::try_exists(&config_path).await? {
        let mut file = fs::File::open(&config_path).await?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).await?;

        serde_json::from_str::<SmpConfig>(&contents)?
    } else {
        let config = SmpConfig::new(smp_dir, DEFAULT_BASE_URL);

        let json = serde_json::to_string_pretty(&config)?;
        let mut file = fs::File::create(&config_path).await?;
        file.write_all(json.as_bytes()).await?;

        info!(path = %config_path.display(), "wrote default config");
        config
    };

    let config = config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(base_url: &str) -> SmpConfig {
        SmpConfig::new(Path::new("/var/lib/smp"), base_url)
    }

    #[test]
    fn test_new_places_files_under_data_dir() {
        let config = config("https://smp.example.com");
        assert_eq!(config.database_path(), Path::new("/var/lib/smp/smp_db.sqlite"));
        assert_eq!(
            config.signing_key_path,
            PathBuf::from("/var/lib/smp/signing_key.pem")
        );
        assert!(config.signing_certificate_path.is_none());
    }

    #[test]
    fn test_validate_base_url() {
        assert!(config("https://smp.example.com").validate().is_ok());
        assert!(config("http://localhost:8080/smp/").validate().is_ok());

        for bad in ["not a url", "ftp://smp.example.com", "https://smp.example.com/?q=1"] {
            let err = config(bad).validate().unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidBaseUrl { ref url, .. } if url == bad),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_overrides_replace_configured_values() {
        let env: HashMap<&str, &str> = [
            (BASE_URL_ENV, "https://public.example.com"),
            (SIGNING_CERT_ENV, "/etc/smp/cert.pem"),
        ]
        .into_iter()
        .collect();

        let config = config("https://smp.example.com")
            .apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.base_url, "https://public.example.com");
        assert_eq!(
            config.signing_key_path,
            PathBuf::from("/var/lib/smp/signing_key.pem")
        );
        assert_eq!(
            config.signing_certificate_path,
            Some(PathBuf::from("/etc/smp/cert.pem"))
        );
    }

    #[test]
    fn test_config_json_roundtrip_keeps_node_key() {
        let original = config("https://smp.example.com");
        let json = serde_json::to_string(&original).unwrap();
        let restored: SmpConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.secret_key.public(), original.secret_key.public());
        assert_eq!(restored.base_url, original.base_url);
    }

    #[tokio::test]
    async fn test_load_or_init_creates_then_reuses_config() {
        let dir = std::env::temp_dir().join(format!("smp-config-{}", uuid::Uuid::now_v7()));

        let created = load_or_init(&dir).await.unwrap();
        assert!(dir.join(CONFIG_FILE_NAME).exists());

        let loaded = load_or_init(&dir).await.unwrap();
        assert_eq!(loaded.secret_key.public(), created.secret_key.public());
        assert_eq!(loaded.database_path(), dir.join(SMP_DB_NAME));

        fs::remove_dir_all(&dir).await.unwrap();
    }
}
