//! Decides which backend origin outbound calls should target.
//!
//! Resolution walks an ordered chain of [`OriginProvider`]s on every call and
//! returns the first usable value, so an override saved at runtime is picked
//! up by the next request without a restart.

use crate::domain::ports::{KeyValueStore, OriginProvider};
use crate::utils::error::Result;
use crate::utils::validation::validate_url;
use std::sync::Arc;

/// Storage key that holds the user-supplied backend URL.
pub const OVERRIDE_KEY: &str = "apiUrl";

/// Used when neither an override nor a default is configured.
pub const FALLBACK_ORIGIN: &str = "http://localhost:3000";

/// Default compiled into the binary, if `CONSOLE_API_URL` was set at build time.
pub fn build_time_default() -> Option<String> {
    option_env!("CONSOLE_API_URL").map(str::to_string)
}

struct OverrideProvider {
    store: Arc<dyn KeyValueStore>,
}

impl OriginProvider for OverrideProvider {
    fn name(&self) -> &'static str {
        "override"
    }

    fn origin(&self) -> Option<String> {
        match self.store.get(OVERRIDE_KEY) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Could not read API URL override: {}", e);
                None
            }
        }
    }
}

struct DefaultProvider {
    value: Option<String>,
}

impl OriginProvider for DefaultProvider {
    fn name(&self) -> &'static str {
        "default"
    }

    fn origin(&self) -> Option<String> {
        self.value.clone()
    }
}

struct FallbackProvider;

impl OriginProvider for FallbackProvider {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn origin(&self) -> Option<String> {
        Some(FALLBACK_ORIGIN.to_string())
    }
}

pub struct BaseUrlResolver {
    store: Arc<dyn KeyValueStore>,
    providers: Vec<Box<dyn OriginProvider>>,
}

impl BaseUrlResolver {
    /// `default` is the deploy/build-time origin; it is captured once here.
    pub fn new(store: Arc<dyn KeyValueStore>, default: Option<String>) -> Self {
        let providers: Vec<Box<dyn OriginProvider>> = vec![
            Box::new(OverrideProvider {
                store: Arc::clone(&store),
            }),
            Box::new(DefaultProvider { value: default }),
            Box::new(FallbackProvider),
        ];

        Self { store, providers }
    }

    /// Returns the backend origin to use right now. Never fails.
    pub fn resolve(&self) -> String {
        for provider in &self.providers {
            let Some(value) = provider.origin() else {
                continue;
            };

            if value.trim().is_empty() {
                continue;
            }

            match validate_url(provider.name(), &value) {
                Ok(_) => {
                    tracing::trace!("Resolved API URL from {}: {}", provider.name(), value);
                    return value;
                }
                Err(e) => tracing::warn!("Ignoring {} API URL: {}", provider.name(), e),
            }
        }

        FALLBACK_ORIGIN.to_string()
    }

    /// Validates and persists a new override. Nothing is written on error.
    pub fn set_override(&self, url: &str) -> Result<()> {
        let url = url.trim();
        validate_url(OVERRIDE_KEY, url)?;
        self.store.set(OVERRIDE_KEY, url)?;
        tracing::info!("API URL override set to {}", url);
        Ok(())
    }

    /// The stored override as-is, without defaults applied.
    pub fn get_override(&self) -> Result<Option<String>> {
        self.store.get(OVERRIDE_KEY)
    }
}
