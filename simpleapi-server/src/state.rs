//! Application state shared across handlers

use std::sync::Arc;

use simpleapi_core::ConnectionProvider;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    provider: ConnectionProvider,
}

impl AppState {
    pub fn new(provider: ConnectionProvider) -> Self {
        Self {
            inner: Arc::new(AppStateInner { provider }),
        }
    }

    pub fn provider(&self) -> &ConnectionProvider {
        &self.inner.provider
    }
}
