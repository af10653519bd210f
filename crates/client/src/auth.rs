//! Authentication API

use crate::client::PortalClient;
use crate::error::ApiError;
use crate::types::{AuthResponse, Credentials, LoginForm, RegistrationRequest, User};
use reqwest::Method;
use tracing::info;

/// Authentication API service
#[derive(Debug, Clone)]
pub struct AuthApi {
    client: PortalClient,
}

impl AuthApi {
    /// Create a new auth API service
    pub fn new(client: PortalClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &PortalClient {
        &self.client
    }

    /// Exchange credentials for an access token and store it
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        // OAuth2 password flow: form fields, and the email goes in `username`
        let request = self
            .client
            .request(Method::POST, "/auth/login")
            .form(&LoginForm::from(credentials));
        let response: AuthResponse = self.client.execute(request).await?;

        self.client.tokens().set(&response.access_token);
        info!("Logged in");
        Ok(response)
    }

    /// Create a new account
    pub async fn register(&self, data: &RegistrationRequest) -> Result<User, ApiError> {
        let request = self
            .client
            .request(Method::POST, "/auth/register")
            .json(data);
        self.client.execute(request).await
    }

    /// Profile of the user the stored token belongs to
    pub async fn current_user(&self) -> Result<User, ApiError> {
        let request = self.client.request(Method::GET, "/users/me");
        self.client.execute(request).await
    }

    /// Forget the stored token. Local only.
    pub fn logout(&self) {
        self.client.tokens().clear();
        info!("Logged out");
    }

    /// Whether a token is currently stored
    pub fn is_authenticated(&self) -> bool {
        self.client.tokens().get().is_some()
    }
}
