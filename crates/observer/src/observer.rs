use crate::resolver::{ContainerPathResolver, PathToMime};
use startopt_prefs::Blacklist;
use startopt_registry::{ContainerId, MimeType};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Container id of a file of type `mime`.
///
/// The base name loses its type suffix and is then URL-decoded (`+` reads as
/// a space), so ids may hold characters file systems reject.
pub fn derive_container_id(path: &Path, mime: &MimeType) -> Option<ContainerId> {
    let file_name = path.file_name()?.to_string_lossy();
    let stem = mime.strip_extension(&file_name).replace('+', " ");
    let id = match urlencoding::decode(&stem) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => match urlencoding::decode_binary(stem.as_bytes()) {
            Cow::Borrowed(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            Cow::Owned(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        },
    };
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// Resolver installed in place of the host's own.
///
/// Every container id it derives lands in the known set, whether or not the
/// file is then suppressed. The known set only grows.
pub struct PathObserver {
    host: Arc<dyn PathToMime>,
    blacklist: Arc<Blacklist>,
    known_ids: Mutex<BTreeSet<ContainerId>>,
}

impl PathObserver {
    pub fn new(host: Arc<dyn PathToMime>, blacklist: Arc<Blacklist>) -> Self {
        Self {
            host,
            blacklist,
            known_ids: Mutex::new(BTreeSet::new()),
        }
    }

    fn known(&self) -> MutexGuard<'_, BTreeSet<ContainerId>> {
        self.known_ids
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Derive and record the container id of `path` without consulting the
    /// blacklist
    pub fn observe(&self, path: &Path) -> Option<(ContainerId, MimeType)> {
        let mime = match self.host.path_to_mime(path) {
            Ok(Some(mime)) => mime,
            Ok(None) => return None,
            Err(err) => {
                log::warn!("Not a container file: {err}");
                return None;
            }
        };
        let id = derive_container_id(path, &mime)?;
        self.known().insert(id.clone());
        Some((id, mime))
    }

    pub fn known_ids(&self) -> BTreeSet<ContainerId> {
        self.known().clone()
    }

    pub fn known_len(&self) -> usize {
        self.known().len()
    }

    pub fn is_known(&self, id: &str) -> bool {
        self.known().contains(id)
    }

    pub fn blacklist(&self) -> &Arc<Blacklist> {
        &self.blacklist
    }
}

impl ContainerPathResolver for PathObserver {
    fn resolve_with_mime(&self, path: &Path) -> (Option<ContainerId>, Option<MimeType>) {
        let Some((id, mime)) = self.observe(path) else {
            return (None, None);
        };
        if self.blacklist.contains(&id) {
            log::debug!("Suppressing blacklisted container {id} ({})", path.display());
            return (None, None);
        }
        (Some(id), Some(mime))
    }
}
