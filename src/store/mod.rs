use crate::core::FlowCrmError;

pub mod client;
pub mod wire;

pub use client::RecordClient;
pub use wire::{
    FetchParams,
    FieldSelector,
    SortType,
    DEFAULT_PAGE_LIMIT,
};

/// Credentials and endpoint for the hosted record store. Always injected
/// explicitly; nothing in the client reads the environment on its own.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub base_url: String,
    pub project_id: String,
    pub public_key: String,
}

impl StoreConfig {
    pub fn new(
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        public_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            project_id: project_id.into(),
            public_key: public_key.into(),
        }
    }

    /// Convenience for binaries that configure through the environment.
    pub fn from_env() -> Result<Self, FlowCrmError> {
        let read = |key: &str| {
            std::env::var(key)
                .map_err(|_| FlowCrmError::Custom(format!("Missing environment variable {}", key)))
        };
        Ok(Self {
            base_url: read("FLOWCRM_BASE_URL")?,
            project_id: read("FLOWCRM_PROJECT_ID")?,
            public_key: read("FLOWCRM_PUBLIC_KEY")?,
        })
    }
}
