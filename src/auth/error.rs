use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Failed to read client secrets file {}: {source}", .path.display())]
    SecretsUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid client secrets file {}: {reason}", .path.display())]
    SecretsInvalid { path: PathBuf, reason: String },
    #[error("Authorization was not granted: {0}")]
    LoginAborted(String),
    #[error("OAuth state mismatch in authorization redirect")]
    StateMismatch,
    #[error("Interactive login failed: {0}")]
    LoginFailed(String),
    #[error("Failed to exchange authorization code: {reason}")]
    TokenExchange { reason: String },
    #[error("Failed to refresh access token: {reason}")]
    RefreshFailed { reason: String },
    #[error("Failed to write token file {}: {source}", .path.display())]
    TokenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
