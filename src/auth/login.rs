use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::Html;
use axum::{Router, routing::get};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot};

use crate::auth::AuthError;
use crate::auth::oauth::{
    build_auth_url, exchange_code_for_token, generate_code_challenge, generate_code_verifier,
    generate_state,
};
use crate::auth::types::{ClientSecrets, Credentials};
use crate::ports::auth::InteractiveLogin;

const SUCCESS_PAGE: &str =
    "The authentication flow has completed. You may close this window.";
const FAILURE_PAGE: &str = "The authentication flow did not complete. You may close this window.";

/// How long to wait for the success page to reach the browser before dropping the listener.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Query parameters the authorization server appends to the redirect.
#[derive(Debug, Default, Deserialize)]
struct RedirectParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

impl RedirectParams {
    fn into_code(self, expected_state: &str) -> Result<String, AuthError> {
        if let Some(error) = self.error {
            return Err(AuthError::LoginAborted(error));
        }
        if self.state.as_deref() != Some(expected_state) {
            return Err(AuthError::StateMismatch);
        }
        self.code.ok_or_else(|| {
            AuthError::LoginFailed("redirect carried no authorization code".to_string())
        })
    }
}

struct RedirectState {
    expected_state: String,
    sender: Mutex<Option<oneshot::Sender<Result<String, AuthError>>>>,
}

async fn handle_redirect(
    State(state): State<Arc<RedirectState>>,
    Query(params): Query<RedirectParams>,
) -> Html<&'static str> {
    let result = params.into_code(&state.expected_state);
    let page = if result.is_ok() {
        SUCCESS_PAGE
    } else {
        FAILURE_PAGE
    };
    if let Some(sender) = state.sender.lock().await.take() {
        let _ = sender.send(result);
    }
    Html(page)
}

/// Serve the loopback redirect until the first hit on `/`, then shut down.
///
/// Resolves to the authorization code once the redirect carries one together
/// with `expected_state`.
async fn wait_for_redirect(
    listener: TcpListener,
    expected_state: String,
) -> Result<String, AuthError> {
    let (code_tx, code_rx) = oneshot::channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let app = Router::new()
        .route("/", get(handle_redirect))
        .with_state(Arc::new(RedirectState {
            expected_state,
            sender: Mutex::new(Some(code_tx)),
        }));

    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    let result = code_rx.await.map_err(|_| {
        AuthError::LoginFailed("redirect listener stopped before the browser returned".to_string())
    })?;

    let _ = shutdown_tx.send(());
    match tokio::time::timeout(SHUTDOWN_GRACE, server).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(error))) => tracing::warn!("Redirect listener failed: {}", error),
        Ok(Err(error)) => tracing::warn!("Redirect listener task failed: {}", error),
        Err(_) => tracing::warn!("Redirect listener did not shut down in time"),
    }

    result
}

/// Installed-app login: the user approves access in a browser, which redirects
/// back to a short-lived listener on localhost.
#[derive(Default)]
pub struct LoopbackLogin {
    client: reqwest::Client,
}

impl LoopbackLogin {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl InteractiveLogin for LoopbackLogin {
    async fn login(&self, secrets: &ClientSecrets, scope: &str) -> Result<Credentials, AuthError> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.map_err(|error| {
            AuthError::LoginFailed(format!("Failed to bind redirect listener: {}", error))
        })?;
        let port = listener
            .local_addr()
            .map_err(|error| AuthError::LoginFailed(error.to_string()))?
            .port();
        let redirect_uri = format!("http://localhost:{}/", port);

        let code_verifier = generate_code_verifier();
        let state = generate_state();
        let auth_url = build_auth_url(
            secrets,
            &redirect_uri,
            scope,
            &state,
            &generate_code_challenge(&code_verifier),
        )?;

        tracing::debug!(port, "Waiting for authorization redirect");
        println!(
            "Please visit this URL to authorize this application: {}",
            auth_url
        );

        let code = wait_for_redirect(listener, state).await?;
        let response =
            exchange_code_for_token(&self.client, secrets, &code, &redirect_uri, &code_verifier)
                .await?;

        tracing::info!("Authorization granted");
        Ok(Credentials::from_token_response(
            response,
            secrets,
            scope,
            chrono::Utc::now(),
        ))
    }
}
