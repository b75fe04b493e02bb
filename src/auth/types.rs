use std::fmt;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;

/// Tokens this close to their expiry are treated as already expired.
const EXPIRY_SKEW_SECS: i64 = 225;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// OAuth client descriptor issued by the platform console (`client_secrets.json`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
}

/// The file nests the descriptor under the application type.
#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    pub fn from_file(path: &Path) -> Result<Self, AuthError> {
        let contents =
            std::fs::read_to_string(path).map_err(|source| AuthError::SecretsUnreadable {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_json(&contents).map_err(|reason| AuthError::SecretsInvalid {
            path: path.to_path_buf(),
            reason,
        })
    }

    fn from_json(contents: &str) -> Result<Self, String> {
        let file: ClientSecretsFile =
            serde_json::from_str(contents).map_err(|error| error.to_string())?;
        file.installed
            .or(file.web)
            .ok_or_else(|| "expected an \"installed\" or \"web\" client entry".to_string())
    }
}

/// Raw response of the token endpoint for both the code exchange and refresh grants.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Cached credential bundle, stored as `token.json`.
///
/// The layout matches the authorized-user files written by the platform's own
/// client libraries, so an existing token file keeps working.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl Credentials {
    /// Build credentials from a fresh authorization-code exchange.
    pub fn from_token_response(
        response: TokenResponse,
        secrets: &ClientSecrets,
        requested_scope: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let scope = response.scope.as_deref().unwrap_or(requested_scope);
        Self {
            token: Some(response.access_token),
            refresh_token: response.refresh_token,
            token_uri: secrets.token_uri.clone(),
            client_id: secrets.client_id.clone(),
            client_secret: secrets.client_secret.clone(),
            scopes: scope.split_whitespace().map(str::to_string).collect(),
            expiry: response
                .expires_in
                .map(|secs| now + Duration::seconds(secs)),
        }
    }

    /// Fold a refresh-grant response into these credentials.
    ///
    /// The endpoint usually omits the refresh token, in which case the old one is kept.
    pub fn apply_refresh(&mut self, response: TokenResponse, now: DateTime<Utc>) {
        self.token = Some(response.access_token);
        if let Some(refresh_token) = response.refresh_token {
            self.refresh_token = Some(refresh_token);
        }
        self.expiry = response
            .expires_in
            .map(|secs| now + Duration::seconds(secs));
    }

    pub fn access_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => now >= expiry - Duration::seconds(EXPIRY_SKEW_SECS),
            None => false,
        }
    }

    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.token.is_some() && !self.is_expired(now)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("token_uri", &self.token_uri)
            .field("client_id", &self.client_id)
            .field("scopes", &self.scopes)
            .field("expiry", &self.expiry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secrets() -> ClientSecrets {
        ClientSecrets {
            client_id: "cid".into(),
            client_secret: "csecret".into(),
            auth_uri: "https://accounts.google.com/o/oauth2/auth".into(),
            token_uri: "https://oauth2.googleapis.com/token".into(),
        }
    }

    #[test]
    fn test_client_secrets_installed_entry() {
        let json = r#"{"installed":{"client_id":"cid","project_id":"p","auth_uri":"https://accounts.google.com/o/oauth2/auth","token_uri":"https://oauth2.googleapis.com/token","client_secret":"csecret","redirect_uris":["http://localhost"]}}"#;
        assert_eq!(ClientSecrets::from_json(json).unwrap(), secrets());
    }

    #[test]
    fn test_client_secrets_without_client_entry() {
        let error = ClientSecrets::from_json(r#"{"other":{}}"#).unwrap_err();
        assert!(error.contains("installed"));
    }

    #[test]
    fn test_client_secrets_missing_file() {
        let result = ClientSecrets::from_file(Path::new("/nonexistent/client_secrets.json"));
        assert!(matches!(result, Err(AuthError::SecretsUnreadable { .. })));
    }

    #[test]
    fn test_reads_existing_token_file_layout() {
        let json = r#"{"token": "ya29.a", "refresh_token": "1//r", "token_uri": "https://oauth2.googleapis.com/token", "client_id": "cid", "client_secret": "csecret", "scopes": ["https://www.googleapis.com/auth/youtube"], "universe_domain": "googleapis.com", "account": "", "expiry": "2024-05-01T12:00:00.123456Z"}"#;
        let credentials: Credentials = serde_json::from_str(json).unwrap();

        assert_eq!(credentials.access_token(), Some("ya29.a"));
        assert_eq!(credentials.refresh_token.as_deref(), Some("1//r"));
        assert_eq!(
            credentials.expiry.unwrap().to_rfc3339(),
            "2024-05-01T12:00:00.123456+00:00"
        );
    }

    #[test]
    fn test_expiry_skew() {
        let now = Utc::now();
        let mut credentials = Credentials::from_token_response(
            TokenResponse {
                access_token: "at".into(),
                expires_in: Some(3600),
                refresh_token: Some("rt".into()),
                scope: None,
            },
            &secrets(),
            "https://www.googleapis.com/auth/youtube",
            now,
        );
        assert!(credentials.is_valid(now));

        credentials.expiry = Some(now + Duration::seconds(60));
        assert!(credentials.is_expired(now));
        assert!(!credentials.is_valid(now));

        credentials.expiry = None;
        assert!(credentials.is_valid(now));
    }

    #[test]
    fn test_apply_refresh_keeps_refresh_token() {
        let now = Utc::now();
        let mut credentials = Credentials::from_token_response(
            TokenResponse {
                access_token: "old".into(),
                expires_in: Some(0),
                refresh_token: Some("rt".into()),
                scope: Some("https://www.googleapis.com/auth/youtube".into()),
            },
            &secrets(),
            "ignored",
            now,
        );
        assert_eq!(
            credentials.scopes,
            vec!["https://www.googleapis.com/auth/youtube".to_string()]
        );

        credentials.apply_refresh(
            TokenResponse {
                access_token: "new".into(),
                expires_in: Some(3599),
                refresh_token: None,
                scope: None,
            },
            now,
        );

        assert_eq!(credentials.access_token(), Some("new"));
        assert_eq!(credentials.refresh_token.as_deref(), Some("rt"));
        assert!(credentials.is_valid(now));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let credentials = Credentials::from_token_response(
            TokenResponse {
                access_token: "very-secret".into(),
                expires_in: None,
                refresh_token: Some("also-secret".into()),
                scope: None,
            },
            &secrets(),
            "scope",
            Utc::now(),
        );
        let debug = format!("{:?}", credentials);
        assert!(!debug.contains("very-secret"));
        assert!(!debug.contains("also-secret"));
    }
}
