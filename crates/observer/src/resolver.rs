use startopt_registry::{
    container_mime_types, ContainerId, ExtensionMimeDatabase, MimeDatabase, MimeType,
    MimeTypeNotFound,
};
use std::collections::HashSet;
use std::path::Path;

/// Host MIME lookup restricted to container files.
pub trait PathToMime: Send + Sync {
    /// `Ok(None)` when the file has a known type that is not a container type
    fn path_to_mime(&self, path: &Path) -> Result<Option<MimeType>, MimeTypeNotFound>;
}

/// Resolves a local file to the container it holds.
///
/// The host calls the installed resolver for every candidate file of its
/// startup scan and skips files that resolve to `None`.
pub trait ContainerPathResolver: Send + Sync {
    /// Container id and type of `path`; both `None` when it must not be loaded
    fn resolve_with_mime(&self, path: &Path) -> (Option<ContainerId>, Option<MimeType>);

    fn resolve(&self, path: &Path) -> Option<ContainerId> {
        self.resolve_with_mime(path).0
    }
}

/// The host's stock MIME lookup: a MIME database plus the container types
/// registered with it.
pub struct LocalContainerProvider<D = ExtensionMimeDatabase> {
    mime_database: D,
    container_types: HashSet<String>,
}

impl LocalContainerProvider {
    /// Provider that knows the stock container types only
    pub fn with_stock_types() -> Self {
        let container_types = container_mime_types().into_iter().map(|mime| mime.name);
        Self::new(ExtensionMimeDatabase::with_container_types(), container_types)
    }
}

impl<D: MimeDatabase> LocalContainerProvider<D> {
    pub fn new(mime_database: D, container_types: impl IntoIterator<Item = String>) -> Self {
        Self {
            mime_database,
            container_types: container_types.into_iter().collect(),
        }
    }
}

impl<D: MimeDatabase + Send + Sync> PathToMime for LocalContainerProvider<D> {
    fn path_to_mime(&self, path: &Path) -> Result<Option<MimeType>, MimeTypeNotFound> {
        let mime = self.mime_database.mime_type_for_file(path)?;
        if self.container_types.contains(&mime.name) {
            Ok(Some(mime))
        } else {
            Ok(None)
        }
    }
}
