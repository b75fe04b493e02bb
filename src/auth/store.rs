use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::auth::{AuthError, ClientSecrets, Credentials};
use crate::config::Config;
use crate::ports::auth::{InteractiveLogin, TokenRefresher};

/// Owns the cached token file for the duration of a run.
pub struct CredentialStore<L: InteractiveLogin, R: TokenRefresher> {
    client_secrets_path: PathBuf,
    token_path: PathBuf,
    scope: String,
    login: L,
    refresher: R,
}

impl<L: InteractiveLogin, R: TokenRefresher> CredentialStore<L, R> {
    pub fn new(config: &Config, token_path: PathBuf, login: L, refresher: R) -> Self {
        Self {
            client_secrets_path: config.client_secrets_path.clone(),
            token_path,
            scope: config.scope.clone(),
            login,
            refresher,
        }
    }

    /// Return usable credentials, preferring the cached token, then a silent
    /// refresh, then the interactive login. Writes the token file whenever the
    /// credentials changed.
    pub async fn authenticate(&self) -> Result<Credentials, AuthError> {
        let now = Utc::now();
        let credentials = match self.load_cached() {
            Some(cached) if cached.is_valid(now) => {
                tracing::debug!("Using cached credentials");
                return Ok(cached);
            }
            Some(cached) if cached.is_expired(now) && cached.refresh_token.is_some() => {
                tracing::debug!("Cached credentials expired, refreshing");
                self.refresher.refresh(&cached).await?
            }
            _ => {
                tracing::debug!("No usable cached credentials, starting interactive login");
                let secrets = ClientSecrets::from_file(&self.client_secrets_path)?;
                self.login.login(&secrets, &self.scope).await?
            }
        };

        self.save(&credentials)?;
        Ok(credentials)
    }

    pub fn token_path(&self) -> &Path {
        &self.token_path
    }

    /// An unreadable or corrupt token file counts as no token at all.
    fn load_cached(&self) -> Option<Credentials> {
        if !self.token_path.exists() {
            return None;
        }
        let contents = match std::fs::read_to_string(&self.token_path) {
            Ok(contents) => contents,
            Err(error) => {
                tracing::warn!(
                    "Failed to read token file {}: {}",
                    self.token_path.display(),
                    error
                );
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(credentials) => Some(credentials),
            Err(error) => {
                tracing::warn!(
                    "Ignoring malformed token file {}: {}",
                    self.token_path.display(),
                    error
                );
                None
            }
        }
    }

    fn save(&self, credentials: &Credentials) -> Result<(), AuthError> {
        let to_file_error = |source| AuthError::TokenFile {
            path: self.token_path.clone(),
            source,
        };
        let json = serde_json::to_string(credentials)
            .map_err(|error| to_file_error(std::io::Error::other(error)))?;
        std::fs::write(&self.token_path, json).map_err(to_file_error)?;
        tracing::debug!("Saved credentials to {}", self.token_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::auth::{MockInteractiveLogin, MockTokenRefresher};
    use chrono::Duration;
    use tempfile::TempDir;

    const SECRETS_JSON: &str = r#"{"installed":{"client_id":"cid","client_secret":"csecret","auth_uri":"https://accounts.google.com/o/oauth2/auth","token_uri":"https://oauth2.googleapis.com/token"}}"#;

    fn credentials(token: &str, expires_in: i64) -> Credentials {
        Credentials {
            token: Some(token.into()),
            refresh_token: Some("rt".into()),
            token_uri: "https://oauth2.googleapis.com/token".into(),
            client_id: "cid".into(),
            client_secret: "csecret".into(),
            scopes: vec!["https://www.googleapis.com/auth/youtube".into()],
            expiry: Some(Utc::now() + Duration::seconds(expires_in)),
        }
    }

    fn write_token(dir: &TempDir, credentials: &Credentials) -> PathBuf {
        let path = dir.path().join("token.json");
        std::fs::write(&path, serde_json::to_string(credentials).unwrap()).unwrap();
        path
    }

    fn read_token(path: &Path) -> Credentials {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    fn config_in(dir: &TempDir) -> Config {
        Config {
            client_secrets_path: dir.path().join("client_secrets.json"),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_valid_cached_token_is_used_as_is() {
        let dir = TempDir::new().unwrap();
        let cached = credentials("cached", 3600);
        let token_path = write_token(&dir, &cached);
        let before = std::fs::read_to_string(&token_path).unwrap();

        let mut login = MockInteractiveLogin::new();
        login.expect_login().never();
        let mut refresher = MockTokenRefresher::new();
        refresher.expect_refresh().never();

        let store = CredentialStore::new(&config_in(&dir), token_path.clone(), login, refresher);
        let result = store.authenticate().await.unwrap();

        assert_eq!(result, cached);
        assert_eq!(std::fs::read_to_string(&token_path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_and_saved() {
        let dir = TempDir::new().unwrap();
        let token_path = write_token(&dir, &credentials("stale", -60));

        let mut login = MockInteractiveLogin::new();
        login.expect_login().never();
        let mut refresher = MockTokenRefresher::new();
        refresher
            .expect_refresh()
            .withf(|c| c.access_token() == Some("stale"))
            .times(1)
            .returning(|_| Ok(credentials("fresh", 3600)));

        let store = CredentialStore::new(&config_in(&dir), token_path.clone(), login, refresher);
        let result = store.authenticate().await.unwrap();

        assert_eq!(result.access_token(), Some("fresh"));
        assert_eq!(read_token(&token_path).access_token(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_refresh_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        let token_path = write_token(&dir, &credentials("stale", -60));

        let mut login = MockInteractiveLogin::new();
        login.expect_login().never();
        let mut refresher = MockTokenRefresher::new();
        refresher.expect_refresh().times(1).returning(|_| {
            Err(AuthError::RefreshFailed {
                reason: "invalid_grant".into(),
            })
        });

        let store = CredentialStore::new(&config_in(&dir), token_path, login, refresher);
        let result = store.authenticate().await;

        assert!(matches!(result, Err(AuthError::RefreshFailed { .. })));
    }

    #[tokio::test]
    async fn test_missing_token_runs_interactive_login() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("client_secrets.json"), SECRETS_JSON).unwrap();
        let token_path = dir.path().join("token.json");

        let mut login = MockInteractiveLogin::new();
        login
            .expect_login()
            .withf(|secrets, scope| {
                secrets.client_id == "cid" && scope == "https://www.googleapis.com/auth/youtube"
            })
            .times(1)
            .returning(|_, _| Ok(credentials("new", 3600)));
        let mut refresher = MockTokenRefresher::new();
        refresher.expect_refresh().never();

        let store = CredentialStore::new(&config_in(&dir), token_path.clone(), login, refresher);
        let result = store.authenticate().await.unwrap();

        assert_eq!(result.access_token(), Some("new"));
        assert_eq!(read_token(&token_path), result);
    }

    #[tokio::test]
    async fn test_expired_token_without_refresh_token_runs_login() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("client_secrets.json"), SECRETS_JSON).unwrap();
        let mut stale = credentials("stale", -60);
        stale.refresh_token = None;
        let token_path = write_token(&dir, &stale);

        let mut login = MockInteractiveLogin::new();
        login
            .expect_login()
            .times(1)
            .returning(|_, _| Ok(credentials("new", 3600)));
        let mut refresher = MockTokenRefresher::new();
        refresher.expect_refresh().never();

        let store = CredentialStore::new(&config_in(&dir), token_path, login, refresher);
        assert_eq!(
            store.authenticate().await.unwrap().access_token(),
            Some("new")
        );
    }

    #[tokio::test]
    async fn test_corrupt_token_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("client_secrets.json"), SECRETS_JSON).unwrap();
        let token_path = dir.path().join("token.json");
        std::fs::write(&token_path, "{not json").unwrap();

        let mut login = MockInteractiveLogin::new();
        login
            .expect_login()
            .times(1)
            .returning(|_, _| Ok(credentials("new", 3600)));
        let refresher = MockTokenRefresher::new();

        let store = CredentialStore::new(&config_in(&dir), token_path.clone(), login, refresher);
        store.authenticate().await.unwrap();

        assert_eq!(read_token(&token_path).access_token(), Some("new"));
    }

    #[tokio::test]
    async fn test_missing_secrets_file_is_auth_error() {
        let dir = TempDir::new().unwrap();
        let token_path = dir.path().join("token.json");

        let mut login = MockInteractiveLogin::new();
        login.expect_login().never();
        let refresher = MockTokenRefresher::new();

        let store = CredentialStore::new(&config_in(&dir), token_path.clone(), login, refresher);
        let result = store.authenticate().await;

        assert!(matches!(result, Err(AuthError::SecretsUnreadable { .. })));
        assert!(!token_path.exists());
    }

    #[tokio::test]
    async fn test_aborted_login_writes_nothing() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("client_secrets.json"), SECRETS_JSON).unwrap();
        let token_path = dir.path().join("token.json");

        let mut login = MockInteractiveLogin::new();
        login
            .expect_login()
            .returning(|_, _| Err(AuthError::LoginAborted("access_denied".into())));
        let refresher = MockTokenRefresher::new();

        let store = CredentialStore::new(&config_in(&dir), token_path.clone(), login, refresher);
        let result = store.authenticate().await;

        assert!(matches!(result, Err(AuthError::LoginAborted(_))));
        assert!(!store.token_path().exists());
    }
}
