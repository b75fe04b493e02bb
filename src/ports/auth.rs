use crate::auth::{AuthError, ClientSecrets, Credentials};

/// User-present login that produces brand new credentials.
///
/// Implemented by `auth::login::LoopbackLogin` in production and by mocks in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait InteractiveLogin: Send + Sync {
    async fn login(&self, secrets: &ClientSecrets, scope: &str) -> Result<Credentials, AuthError>;
}

/// Trades a refresh token for a new access token.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, credentials: &Credentials) -> Result<Credentials, AuthError>;
}
