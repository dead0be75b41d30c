//! # Start Optimiser Registry
//!
//! The slice of the host application's container model the optimiser reads.
//!
//! The host owns every container, stack and MIME type. This crate only names
//! the shapes it hands out and the queries the optimiser is allowed to make:
//!
//! ```text
//! MimeDatabase ──> MimeType (name + suffixes)
//!
//! ContainerRegistry
//!     ├──> find_container_stacks(StackQuery)              -> ContainerStack[]
//!     ├──> find_instance_containers_metadata(MetadataQuery) -> ContainerMetadata[]
//!     └──> is_read_only(id)
//! ```
//!
//! [`MemoryRegistry`] implements the query seam over plain values and can be
//! loaded from a JSON snapshot, which is what the command-line host uses.
//!
//! ## Example
//!
//! ```rust
//! use startopt_registry::{ContainerMetadata, ContainerRegistry, MemoryRegistry, MetadataQuery};
//!
//! let mut registry = MemoryRegistry::default();
//! registry.add_instance(
//!     ContainerMetadata::new("pla_red")
//!         .with("type", "material")
//!         .with("base_file", "pla"),
//!     true,
//! );
//!
//! let materials = registry.find_instance_containers_metadata(&MetadataQuery::by_type("material"));
//! assert_eq!(materials[0].base_file(), Some("pla"));
//! ```

mod error;
mod mime;
mod registry;
mod types;

pub use error::{MimeTypeNotFound, RegistryError, Result};
pub use mime::{
    container_mime_types, ExtensionMimeDatabase, MimeDatabase, MimeType, CONTAINER_STACK_MIME,
    DEFINITION_MIME, EXTRUDER_STACK_MIME, GLOBAL_STACK_MIME, INSTANCE_CONTAINER_MIME,
    MATERIAL_MIME,
};
pub use registry::{
    ContainerRegistry, InstanceRecord, MemoryRegistry, MetadataQuery, RegistrySnapshot,
    StackQuery,
};
pub use types::{
    ContainerId, ContainerMetadata, ContainerStack, Definition, EXTRUDER_STACK_TYPE,
    GENERIC_BRAND, MACHINE_STACK_TYPE, MATERIAL_TYPE,
};
