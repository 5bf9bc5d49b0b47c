//! Concrete collaborator implementations.

pub mod fs;
pub mod memory;

pub use fs::{FsMediaReader, FsObjectStore};
pub use memory::{MemoryBackend, MemoryFeed, MemoryIdentity, MemoryObjectStore};
