use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::security::TokenService;
use crate::services::{AuthService, SeaOrmAuthService};

/// Everything a request handler may touch. The pool and the signing key are
/// the only process-wide resources; config is read-only after startup.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::connect(&config).await?;
        Self::with_store(config, store)
    }

    /// Builds the state around an already opened store.
    pub fn with_store(config: Config, store: Store) -> anyhow::Result<Self> {
        let tokens = TokenService::from_config(&config.security)?;
        let auth_service: Arc<dyn AuthService> =
            Arc::new(SeaOrmAuthService::new(store.clone(), tokens));

        Ok(Self {
            config: Arc::new(config),
            store,
            auth_service,
        })
    }
}
