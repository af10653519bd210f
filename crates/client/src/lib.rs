//! Client for the Atelier admin portal API
//!
//! [`PortalClient`] wraps a `reqwest` client bound to `{host}/api/v1`. It
//! attaches the stored bearer token to outgoing requests and turns every
//! failure into an [`ApiError`]. [`AuthApi`] builds login, registration,
//! profile lookup and logout on top of it.
//!
//! Host capabilities (token storage, page navigation) are passed in through
//! an [`Environment`] so the same code runs in a browser, a CLI or a test.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
mod interceptors;
pub mod runtime;
pub mod storage;
pub mod types;

pub use auth::AuthApi;
pub use client::{PortalClient, PortalClientBuilder};
pub use config::ClientConfig;
pub use error::{ApiError, ErrorKind};
pub use runtime::{Environment, Navigator};
pub use storage::{KeyValueStorage, MemoryStorage, StorageError, TokenStore};
pub use types::{AuthResponse, Credentials, RegistrationRequest, User, UserRole};

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;
