pub mod entry;
pub mod memo;
pub mod store;

pub use entry::{CacheEntry, ENTRY_FORMAT_VERSION};
pub use memo::{Cached, FingerprintCache};
pub use store::{CacheError, CacheStore, DiskStore, MemoryStore};
