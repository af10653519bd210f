//! Cross-cutting request and response handling
//!
//! Every request built by [`PortalClient`](crate::PortalClient) passes
//! through [`attach_token`] on the way out and [`inspect_response`] on the
//! way back.

use crate::error::ApiError;
use crate::runtime::Navigator;
use crate::storage::TokenStore;
use reqwest::{RequestBuilder, Response, StatusCode};
use std::sync::Arc;
use tracing::{debug, warn};

/// Session side effects the interceptors are allowed to perform
#[derive(Clone)]
pub(crate) struct Session {
    pub(crate) tokens: TokenStore,
    pub(crate) navigator: Option<Arc<dyn Navigator>>,
    pub(crate) login_path: String,
}

impl Session {
    /// Drop the stored token and send the user back to login
    fn expire(&self) {
        warn!("Server rejected credentials, clearing stored token");
        self.tokens.clear();
        if let Some(navigator) = &self.navigator {
            navigator.redirect(&self.login_path);
        }
    }
}

/// Outgoing: add `Authorization: Bearer <token>` when a token is stored
pub(crate) fn attach_token(request: RequestBuilder, tokens: &TokenStore) -> RequestBuilder {
    match tokens.get() {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

/// Incoming: pass 2xx through, turn everything else into an [`ApiError`]
pub(crate) async fn inspect_response(
    sent: Result<Response, reqwest::Error>,
    session: &Session,
) -> Result<Response, ApiError> {
    let response = match sent {
        Ok(response) => response,
        Err(e) => {
            debug!("Request failed without a response: {e}");
            return Err(ApiError::from(e));
        }
    };

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::UNAUTHORIZED {
        session.expire();
    }

    // A body we cannot read still leaves us with the status
    let body = response.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), "Request rejected by server");
    Err(ApiError::from_status(status, &body))
}
