pub mod config;
pub mod logging;
pub mod storage;

pub use config::{DEFAULT_CUSTOM_TOKENS_KEY, NexusConfig, validate_url};
pub use logging::{fallback_filter, init_logging, init_logging_to_dir};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
