// Adapters layer: concrete implementations for external systems (settings storage, backend http).

pub mod backend;
pub mod storage;
