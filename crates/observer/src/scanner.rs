use crate::resolver::ContainerPathResolver;
use startopt_registry::{ContainerId, MimeType};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// A file the host would load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedContainer {
    pub id: ContainerId,
    pub path: PathBuf,
    pub mime: MimeType,
}

#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub loaded: Vec<LoadedContainer>,
    /// Files resolved to no container (unknown type, non-container type or blacklisted)
    pub skipped: usize,
}

impl ScanReport {
    pub fn files(&self) -> usize {
        self.loaded.len() + self.skipped
    }
}

/// Walks local container directories the way the host's startup scan does,
/// asking a resolver about every file.
pub struct ContainerScanner {
    roots: Vec<PathBuf>,
}

impl ContainerScanner {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self {
            roots: roots
                .into_iter()
                .map(|root| root.as_ref().to_path_buf())
                .collect(),
        }
    }

    pub fn scan(&self, resolver: &dyn ContainerPathResolver) -> ScanReport {
        let mut report = ScanReport::default();

        for root in &self.roots {
            if !root.is_dir() {
                log::warn!("Skipping missing container directory {}", root.display());
                continue;
            }

            let walker = WalkDir::new(root)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

            for result in walker {
                let entry = match result {
                    Ok(entry) => entry,
                    Err(e) => {
                        log::warn!("Failed to read entry: {e}");
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }

                match resolver.resolve_with_mime(entry.path()) {
                    (Some(id), Some(mime)) => report.loaded.push(LoadedContainer {
                        id,
                        path: entry.into_path(),
                        mime,
                    }),
                    _ => report.skipped += 1,
                }
            }
        }

        log::info!(
            "Scanned {} files: {} containers to load, {} skipped",
            report.files(),
            report.loaded.len(),
            report.skipped
        );
        report
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}
