use crate::download::MAX_DOWNLOAD_SIZE;
use crate::error::{Result, SyncError};
use crate::fingerprint::Fingerprint;
use crate::models::{Authentication, IndexFormat, Repo, RepoId};
use crate::sync::DEFAULT_CONCURRENCY;
use config::{Config, Environment, File, FileFormat};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE_NAME: &str = "config.toml";
const FDSYNC_DIR_NAME: &str = ".fdsync";
const ENV_PREFIX: &str = "FDSYNC";
const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FdsyncConfig {
    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub repos: Vec<RepoConfig>,

    #[serde(skip)]
    home: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Repositories synced at the same time
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Largest artifact accepted from a repository, in bytes
    #[serde(default = "default_max_download_size")]
    pub max_download_size: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_download_size: MAX_DOWNLOAD_SIZE,
        }
    }
}

impl SyncConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_download_size() -> u64 {
    MAX_DOWNLOAD_SIZE
}

/// A configured repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    pub name: String,
    pub address: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default)]
    pub format: IndexFormat,
}

impl RepoConfig {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            fingerprint: None,
            username: None,
            password: None,
            format: IndexFormat::default(),
        }
    }

    /// The pinned fingerprint. Spaces and colons copied from `keytool` or
    /// `apksigner` output are accepted.
    pub fn pinned_fingerprint(&self) -> Result<Option<Fingerprint>> {
        match self.fingerprint.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => Fingerprint::parse_lenient(text)
                .map(Some)
                .ok_or_else(|| SyncError::InvalidFingerprint(text.to_string())),
        }
    }

    pub fn authentication(&self) -> Option<Authentication> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(Authentication::new(username, password)),
            _ => None,
        }
    }

    pub fn to_repo(&self) -> Result<Repo> {
        Ok(Repo::new(RepoId::new(&self.name)?, &self.address)
            .with_fingerprint(self.pinned_fingerprint()?)
            .with_authentication(self.authentication())
            .with_format(self.format))
    }
}

impl FdsyncConfig {
    pub fn new(home: PathBuf) -> Self {
        Self {
            home,
            ..Default::default()
        }
    }

    /// Loads `<home>/config.toml` layered under `FDSYNC_*` environment
    /// variables, e.g. `FDSYNC_SYNC__CONCURRENCY=8`.
    pub fn load(home: &Path) -> Result<Self> {
        let config_path = home.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            log::debug!("Config file not found at {config_path:?}, using defaults");
        }

        let settings = Config::builder()
            .add_source(File::from(config_path.clone()).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| SyncError::ConfigError(format!("Failed to load {config_path:?}: {e}")))?;

        let mut config: FdsyncConfig = settings
            .try_deserialize()
            .map_err(|e| SyncError::ConfigError(format!("Invalid configuration: {e}")))?;
        config.home = home.to_path_buf();

        log::debug!("Loaded config from {config_path:?}");
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = self.home.join(CONFIG_FILE_NAME);
        fs::create_dir_all(&self.home)?;

        let contents = toml::to_string_pretty(self)
            .map_err(|e| SyncError::ConfigError(format!("Failed to serialize config: {e}")))?;

        fs::write(&config_path, contents)?;
        log::debug!("Saved config to {config_path:?}");
        Ok(())
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn find_repo(&self, name: &str) -> Result<&RepoConfig> {
        self.repos
            .iter()
            .find(|repo| repo.name == name)
            .ok_or_else(|| SyncError::RepoNotFound(name.to_string()))
    }

    pub fn add_repo(&mut self, repo: RepoConfig) -> Result<()> {
        // Validates the name and fingerprint before anything is stored.
        repo.to_repo()?;
        if self.repos.iter().any(|existing| existing.name == repo.name) {
            return Err(SyncError::ValidationError(format!(
                "Repository '{}' already exists",
                repo.name
            )));
        }
        self.repos.push(repo);
        Ok(())
    }

    pub fn remove_repo(&mut self, name: &str) -> Result<RepoConfig> {
        let position = self
            .repos
            .iter()
            .position(|repo| repo.name == name)
            .ok_or_else(|| SyncError::RepoNotFound(name.to_string()))?;
        Ok(self.repos.remove(position))
    }
}

/// `FDSYNC_HOME` when it is an absolute path, `~/.fdsync` otherwise.
pub fn fdsync_home() -> Result<PathBuf> {
    if let Ok(home) = std::env::var("FDSYNC_HOME") {
        let path = PathBuf::from(home);
        if path.is_absolute() {
            return Ok(path);
        }
    }

    home_dir()
        .map(|home| home.join(FDSYNC_DIR_NAME))
        .ok_or_else(|| SyncError::ConfigError("Unable to determine home directory".to_string()))
}

pub fn new_fdsync_config() -> Result<FdsyncConfig> {
    FdsyncConfig::load(&fdsync_home()?)
}
