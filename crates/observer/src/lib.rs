//! # Start Optimiser Path Observer
//!
//! Decorates the host's path-to-container resolution so every local container
//! file is seen, and blacklisted ones are reported as absent.
//!
//! ```text
//! host startup scan
//!     │  resolve(path)
//!     ▼
//! PathObserver ──path_to_mime──> host (LocalContainerProvider)
//!     │
//!     ├─> derive id (basename, strip suffix, URL-decode)
//!     ├─> record id in the known set (always)
//!     └─> blacklisted? -> None : Some(id)
//! ```
//!
//! The host installs the observer as its resolver; nothing is patched in place.

mod observer;
mod resolver;
mod scanner;

pub use observer::{derive_container_id, PathObserver};
pub use resolver::{ContainerPathResolver, LocalContainerProvider, PathToMime};
pub use scanner::{ContainerScanner, LoadedContainer, ScanReport};
