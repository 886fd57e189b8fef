pub mod config;
pub mod confusion;
pub mod data;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod schema;
pub mod table;

pub use error::{PrepError, Result};
