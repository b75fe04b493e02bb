pub mod error;
pub mod login;
pub mod oauth;
pub mod store;
pub mod types;

pub use error::AuthError;
pub use login::LoopbackLogin;
pub use oauth::OAuthHttpClient;
pub use store::CredentialStore;
pub use types::{ClientSecrets, Credentials};
