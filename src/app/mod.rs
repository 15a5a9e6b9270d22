pub mod server;
pub mod settings;

use crate::adapters::storage::FileStore;
use crate::config::ConsoleConfig;
use crate::core::resolver::BaseUrlResolver;
use std::sync::Arc;

/// Resolver backed by the settings file named in the config.
pub fn build_resolver(config: &ConsoleConfig) -> Arc<BaseUrlResolver> {
    let store = Arc::new(FileStore::new(&config.storage.path));
    Arc::new(BaseUrlResolver::new(store, config.default_url()))
}
