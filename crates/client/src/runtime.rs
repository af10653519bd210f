//! Runtime capabilities handed to the client
//!
//! A browser provides persistent storage and page navigation. Other hosts
//! may provide only storage (a CLI keeping its session on disk) or nothing
//! at all. The client never probes for these itself; whatever is missing
//! here is treated as a no-op.

use crate::storage::KeyValueStorage;
use std::sync::Arc;

/// Sends the user somewhere else, e.g. the login page
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    fn redirect(&self, path: &str);
}

/// Capabilities available to the client
#[derive(Clone, Default)]
pub struct Environment {
    storage: Option<Arc<dyn KeyValueStorage>>,
    navigator: Option<Arc<dyn Navigator>>,
}

impl Environment {
    /// No storage, no navigation
    pub fn headless() -> Self {
        Self::default()
    }

    /// `localStorage` plus `window.location`
    #[cfg(all(target_arch = "wasm32", feature = "browser"))]
    pub fn browser() -> Self {
        Self::headless()
            .with_storage(Arc::new(crate::storage::BrowserStorage))
            .with_navigator(Arc::new(browser::BrowserNavigator))
    }

    pub fn with_storage(mut self, storage: Arc<dyn KeyValueStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn storage(&self) -> Option<&Arc<dyn KeyValueStorage>> {
        self.storage.as_ref()
    }

    pub fn navigator(&self) -> Option<&Arc<dyn Navigator>> {
        self.navigator.as_ref()
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("storage", &self.storage.is_some())
            .field("navigator", &self.navigator.is_some())
            .finish()
    }
}

#[cfg(all(target_arch = "wasm32", feature = "browser"))]
pub use browser::BrowserNavigator;

#[cfg(all(target_arch = "wasm32", feature = "browser"))]
mod browser {
    use super::Navigator;
    use tracing::warn;

    /// Full page navigation through `window.location.href`
    #[derive(Debug, Clone, Copy, Default)]
    pub struct BrowserNavigator;

    impl Navigator for BrowserNavigator {
        fn redirect(&self, path: &str) {
            let Some(window) = web_sys::window() else {
                return;
            };
            if let Err(e) = window.location().set_href(path) {
                warn!("Failed to redirect to {path}: {e:?}");
            }
        }
    }
}
