pub mod common;
pub mod filter;
pub mod property;

pub use common::*;
pub use filter::*;
pub use property::*;
