//! Portal HTTP client

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::interceptors::{Session, attach_token, inspect_response};
use crate::runtime::Environment;
use crate::storage::TokenStore;
use reqwest::{Client, ClientBuilder, Method, RequestBuilder, Response, header};
use tracing::debug;

const USER_AGENT: &str = concat!("portal-client/", env!("CARGO_PKG_VERSION"));

/// Portal API client
///
/// Cheap to clone; clones share the connection pool and the token slot.
#[derive(Clone)]
pub struct PortalClient {
    client: Client,
    base_url: String,
    session: Session,
}

impl PortalClient {
    /// Create a client from configuration and the host's capabilities
    pub fn new(config: ClientConfig, environment: Environment) -> Result<Self, ApiError> {
        Self::builder()
            .config(config)
            .environment(environment)
            .build()
    }

    pub fn builder() -> PortalClientBuilder {
        PortalClientBuilder::default()
    }

    /// Get the base URL, including the versioned prefix
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The persisted-token slot this client reads and writes
    pub fn tokens(&self) -> &TokenStore {
        &self.session.tokens
    }

    /// Create a request builder, authenticated if a token is stored
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(method = method.as_str(), path, "Building request");
        attach_token(self.client.request(method, url), &self.session.tokens)
    }

    /// Send a request and normalize any failure
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        inspect_response(request.send().await, &self.session).await
    }

    /// Send a request and decode a JSON success body
    pub async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }
}

impl std::fmt::Debug for PortalClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalClient")
            .field("base_url", &self.base_url)
            .field("tokens", &self.session.tokens)
            .finish_non_exhaustive()
    }
}

/// Builder for PortalClient
#[derive(Default)]
pub struct PortalClientBuilder {
    config: ClientConfig,
    environment: Environment,
    user_agent: Option<String>,
}

impl PortalClientBuilder {
    /// Replace the whole configuration
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the API host (the `/api/v1` prefix is added for you)
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    /// Set the request timeout in milliseconds
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.timeout_ms = timeout_ms;
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client
    pub fn build(self) -> Result<PortalClient, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client_builder = ClientBuilder::new()
            .default_headers(headers)
            .user_agent(self.user_agent.unwrap_or_else(|| USER_AGENT.to_string()));

        #[cfg(not(target_arch = "wasm32"))]
        let client_builder = client_builder.timeout(self.config.timeout());

        let client = client_builder.build()?;
        let tokens = TokenStore::new(
            self.environment.storage().cloned(),
            self.config.token_key.clone(),
        );

        Ok(PortalClient {
            client,
            base_url: self.config.api_url(),
            session: Session {
                tokens,
                navigator: self.environment.navigator().cloned(),
                login_path: self.config.login_path,
            },
        })
    }
}
