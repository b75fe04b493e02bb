use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_CLIENT_SECRETS_FILE: &str = "client_secrets.json";
pub const DEFAULT_TOKEN_FILE: &str = "token.json";
/// Grants full management of the signed-in account.
pub const YOUTUBE_SCOPE: &str = "https://www.googleapis.com/auth/youtube";
pub const YOUTUBE_API_SERVICE_NAME: &str = "youtube";
pub const YOUTUBE_API_VERSION: &str = "v3";

/// Immutable run configuration, handed to the credential store and the API client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub client_secrets_path: PathBuf,
    /// Where the cached token lives. `None` means next to the executable.
    pub token_path: Option<PathBuf>,
    pub scope: String,
    pub service_name: String,
    pub service_version: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client_secrets_path: PathBuf::from(DEFAULT_CLIENT_SECRETS_FILE),
            token_path: None,
            scope: YOUTUBE_SCOPE.to_string(),
            service_name: YOUTUBE_API_SERVICE_NAME.to_string(),
            service_version: YOUTUBE_API_VERSION.to_string(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&contents)
            .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        Ok(config)
    }

    /// Default config file location, e.g. `~/.config/playlist-dedup/config.toml`
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("playlist-dedup").join("config.toml"))
    }

    /// Load the default config file if there is one, otherwise the built-in defaults.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Resolved location of the cached token.
    pub fn token_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.token_path {
            return Ok(path.clone());
        }
        let exe = std::env::current_exe().wrap_err("Failed to locate the running executable")?;
        let dir = exe.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(dir.join(DEFAULT_TOKEN_FILE))
    }

    /// Root of the REST API, e.g. `https://www.googleapis.com/youtube/v3/`
    pub fn api_base_url(&self) -> String {
        format!(
            "https://www.googleapis.com/{}/{}/",
            self.service_name, self.service_version
        )
    }
}
