//! The two cache tiers consulted by the resolver: an in-process memory
//! tier and a durable file-per-key tier with expiration metadata.

pub mod durable;
pub mod memory;

pub use durable::{FileCache, Manifest, ManifestEntry};
pub use memory::MemoryCache;
