//! # chatku-store
//!
//! Device-local persistence for the ChatKu client.
//!
//! The bottom layer is a string key-value slot ([`KeyValueStore`]) with a
//! SQLite implementation and an in-memory one for tests. On top of it sit
//! the two best-effort caches the client uses: [`MessageCache`] for the
//! last known message snapshot and [`SessionStore`] for auto-login. Both
//! replace their value wholesale on every write and never surface storage
//! errors to the caller.

mod codec;
pub mod database;
pub mod kv;
pub mod message_cache;
pub mod migrations;
pub mod session_store;
pub mod slot;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use message_cache::MessageCache;
pub use session_store::SessionStore;
pub use slot::{KeyValueStore, MemoryStore, SqliteStore};
