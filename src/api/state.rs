//! Shared application state

use std::sync::Arc;

use crate::auth::{SecretHasher, TokenSigner};
use crate::config::Config;
use crate::store::BankStore;

/// State handed to every route and middleware
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BankStore>,
    pub tokens: TokenSigner,
    pub hasher: SecretHasher,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn BankStore>, config: Config) -> Self {
        Self {
            store,
            tokens: TokenSigner::new(&config.token_secret, config.token_ttl_hours),
            hasher: SecretHasher::default(),
            config: Arc::new(config),
        }
    }

    /// Replace the credential hasher (tests use cheap Argon2 costs)
    pub fn with_hasher(mut self, hasher: SecretHasher) -> Self {
        self.hasher = hasher;
        self
    }
}
