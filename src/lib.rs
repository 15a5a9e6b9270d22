pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{backend::BackendClient, storage::FileStore, storage::MemoryStore};
pub use config::ConsoleConfig;
pub use core::{proxy::Forwarder, resolver::BaseUrlResolver};
pub use utils::error::{ConsoleError, Result};
