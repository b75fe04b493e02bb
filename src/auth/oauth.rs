use std::collections::HashMap;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use sha2::{Digest, Sha256};
use url::Url;

use crate::auth::AuthError;
use crate::auth::types::{ClientSecrets, Credentials, TokenResponse};
use crate::ports::auth::TokenRefresher;

const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Generate a cryptographically secure random string for PKCE
fn generate_random_string(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            const CHARSET: &[u8] =
                b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";
            CHARSET[rng.random_range(0..CHARSET.len())] as char
        })
        .collect()
}

/// Generate PKCE code verifier (43-128 characters)
pub fn generate_code_verifier() -> String {
    generate_random_string(128)
}

/// Generate PKCE code challenge from verifier using S256 method
pub fn generate_code_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    let hash = hasher.finalize();
    URL_SAFE_NO_PAD.encode(hash)
}

/// Generate a random state parameter for CSRF protection
pub fn generate_state() -> String {
    generate_random_string(30)
}

/// Build the consent-screen URL the user has to open in a browser.
pub fn build_auth_url(
    secrets: &ClientSecrets,
    redirect_uri: &str,
    scope: &str,
    state: &str,
    code_challenge: &str,
) -> Result<Url, AuthError> {
    let mut url = Url::parse(&secrets.auth_uri)
        .map_err(|error| AuthError::LoginFailed(format!("Invalid auth_uri: {}", error)))?;
    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", &secrets.client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("scope", scope)
        .append_pair("state", state)
        .append_pair("code_challenge", code_challenge)
        .append_pair("code_challenge_method", "S256")
        // Ask for a refresh token so later runs can skip the browser.
        .append_pair("access_type", "offline");
    Ok(url)
}

async fn post_token_request(
    client: &reqwest::Client,
    token_uri: &str,
    params: &HashMap<&str, &str>,
) -> Result<TokenResponse, String> {
    let response = client
        .post(token_uri)
        .form(params)
        .timeout(TOKEN_REQUEST_TIMEOUT)
        .send()
        .await
        .map_err(|error| format!("Failed to send http request: {}", error))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or("Failed to get error text".to_string());
        return Err(format!("token endpoint returned {}: {}", status, body));
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|error| format!("Failed to parse response: {}", error))
}

/// Exchange authorization code for access token
pub async fn exchange_code_for_token(
    client: &reqwest::Client,
    secrets: &ClientSecrets,
    code: &str,
    // Must be the exact redirect URI used when the flow was started
    redirect_uri: &str,
    code_verifier: &str,
) -> Result<TokenResponse, AuthError> {
    let mut params = HashMap::new();
    params.insert("grant_type", "authorization_code");
    params.insert("code", code);
    params.insert("redirect_uri", redirect_uri);
    params.insert("client_id", secrets.client_id.as_str());
    params.insert("client_secret", secrets.client_secret.as_str());
    params.insert("code_verifier", code_verifier);

    post_token_request(client, &secrets.token_uri, &params)
        .await
        .map_err(|reason| AuthError::TokenExchange { reason })
}

/// Refresh an access token using a refresh token
pub async fn refresh_access_token(
    client: &reqwest::Client,
    credentials: &Credentials,
    refresh_token: &str,
) -> Result<TokenResponse, AuthError> {
    let mut params = HashMap::new();
    params.insert("grant_type", "refresh_token");
    params.insert("refresh_token", refresh_token);
    params.insert("client_id", credentials.client_id.as_str());
    params.insert("client_secret", credentials.client_secret.as_str());

    post_token_request(client, &credentials.token_uri, &params)
        .await
        .map_err(|reason| AuthError::RefreshFailed { reason })
}

/// Talks to the token endpoint recorded in the cached credentials.
#[derive(Default)]
pub struct OAuthHttpClient {
    client: reqwest::Client,
}

impl OAuthHttpClient {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl TokenRefresher for OAuthHttpClient {
    async fn refresh(&self, credentials: &Credentials) -> Result<Credentials, AuthError> {
        let refresh_token =
            credentials
                .refresh_token
                .as_deref()
                .ok_or_else(|| AuthError::RefreshFailed {
                    reason: "credentials carry no refresh token".to_string(),
                })?;

        let response = refresh_access_token(&self.client, credentials, refresh_token).await?;

        let mut refreshed = credentials.clone();
        refreshed.apply_refresh(response, chrono::Utc::now());
        tracing::info!("Refreshed access token");
        Ok(refreshed)
    }
}
