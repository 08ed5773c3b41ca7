pub mod collection_store;
pub mod ordering;

pub use collection_store::*;
pub use ordering::Ordered;
