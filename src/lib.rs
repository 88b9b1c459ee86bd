pub mod config;
pub mod errors;
pub mod storage;

pub use config::StorageConfig;
pub use errors::{Result, StorageError};
pub use storage::*;
