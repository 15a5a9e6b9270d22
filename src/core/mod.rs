pub mod proxy;
pub mod resolver;

pub use crate::domain::ports::{KeyValueStore, OriginProvider, ProjectApi};
pub use crate::utils::error::Result;
