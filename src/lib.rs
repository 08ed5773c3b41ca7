pub mod api;
pub mod config;
pub mod logic;
pub mod model;
pub mod seed;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;

pub use logic::{PropertyStore, StoreError, StoreResult};

// Export all model types
pub use model::*;

// Export store types
pub use store::{FileStorage, KeyValueStorage, MemoryStorage, StorageError};

pub use seed::{default_properties, STORAGE_KEY};
