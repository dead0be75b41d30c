//! # Start Optimiser Preferences
//!
//! Key/value preferences and the container blacklist persisted in them.
//!
//! The blacklist lives in a single string preference. It is written as a
//! JSON array so identifiers may contain any character; values written by
//! older releases (`;`-joined) are still understood when read back.

mod blacklist;
mod codec;
mod error;
mod store;

pub use blacklist::{Blacklist, BlacklistChange};
pub use codec::{decode_ids, encode_ids, LEGACY_DELIMITER};
pub use error::{PrefsError, Result};
pub use store::{FilePreferences, MemoryPreferences, Preferences};
