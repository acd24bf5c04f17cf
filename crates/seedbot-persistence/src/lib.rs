//! Persistence layer for seedbot.
//!
//! Provides crash-safe persisted sets of torrent hashes using atomic file
//! operations (write to temp file, then rename). Two sets are kept on disk:
//! the hashes already announced as completed, and the hashes for which
//! notifications are disabled.
//!
//! # Example
//!
//! ```no_run
//! use seedbot_persistence::HashStore;
//!
//! let store = HashStore::completed("/home/user/.seedbot").unwrap();
//! if store.mark_new("a1b2c3").unwrap() {
//!     // first time we see this hash, notify
//! }
//! ```

pub mod atomic;
pub mod error;
pub mod hash_store;

pub use error::{PersistenceError, Result};
pub use hash_store::HashStore;
