//! Library persistence.
//!
//! [`LibraryStore`] is the durable side of the organizer: media units and
//! their lifecycle state, the torrents attached to them, the files placed
//! in the library and a small key/value table of runtime parameters.
//! [`SqliteLibraryStore`] backs it with `rusqlite`.

mod error;
mod sqlite;
mod traits;
mod types;

pub use error::StoreError;
pub use sqlite::SqliteLibraryStore;
pub use traits::{LibraryStore, ParamStore};
pub use types::*;
