pub mod local;
pub mod paths;

pub use local::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use paths::WalletPaths;
