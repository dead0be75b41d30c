use crate::error::MimeTypeNotFound;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFINITION_MIME: &str = "application/x-uranium-definitioncontainer";
pub const INSTANCE_CONTAINER_MIME: &str = "application/x-uranium-instancecontainer";
pub const CONTAINER_STACK_MIME: &str = "application/x-uranium-containerstack";
pub const GLOBAL_STACK_MIME: &str = "application/x-cura-globalstack";
pub const EXTRUDER_STACK_MIME: &str = "application/x-cura-extruderstack";
pub const MATERIAL_MIME: &str = "application/x-ultimaker-material-profile";

/// A file type known to the host, identified by name and file suffixes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MimeType {
    pub name: String,
    /// Suffixes without the leading dot, e.g. `def.json`
    pub suffixes: Vec<String>,
}

impl MimeType {
    pub fn new(name: impl Into<String>, suffixes: &[&str]) -> Self {
        Self {
            name: name.into(),
            suffixes: suffixes.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Length of the longest suffix of this type that `file_name` ends with,
    /// counting the separating `.`
    fn matching_suffix_len(&self, file_name: &str) -> Option<usize> {
        let name = file_name.as_bytes();
        self.suffixes
            .iter()
            .filter_map(|suffix| {
                let len = suffix.len() + 1;
                if name.len() <= len {
                    return None;
                }
                let tail = &name[name.len() - len..];
                (tail[0] == b'.' && tail[1..].eq_ignore_ascii_case(suffix.as_bytes()))
                    .then_some(len)
            })
            .max()
    }

    /// Remove this type's extension from a file name.
    ///
    /// Names that do not carry one of the suffixes come back unchanged.
    pub fn strip_extension(&self, file_name: &str) -> String {
        match self.matching_suffix_len(file_name) {
            Some(len) => file_name[..file_name.len() - len].to_string(),
            None => file_name.to_string(),
        }
    }
}

/// Stock container file types of the host
pub fn container_mime_types() -> Vec<MimeType> {
    vec![
        MimeType::new(DEFINITION_MIME, &["def.json"]),
        MimeType::new(INSTANCE_CONTAINER_MIME, &["inst.cfg"]),
        MimeType::new(CONTAINER_STACK_MIME, &["stack.cfg"]),
        MimeType::new(GLOBAL_STACK_MIME, &["global.cfg"]),
        MimeType::new(EXTRUDER_STACK_MIME, &["extruder.cfg"]),
        MimeType::new(MATERIAL_MIME, &["xml.fdm_material"]),
    ]
}

/// Host MIME detection.
pub trait MimeDatabase {
    fn mime_type_for_file(&self, path: &Path) -> Result<MimeType, MimeTypeNotFound>;
}

/// MIME detection by file suffix; the longest matching suffix wins.
#[derive(Debug, Clone, Default)]
pub struct ExtensionMimeDatabase {
    types: Vec<MimeType>,
}

impl ExtensionMimeDatabase {
    /// Database preloaded with [`container_mime_types`]
    pub fn with_container_types() -> Self {
        Self {
            types: container_mime_types(),
        }
    }

    pub fn register(&mut self, mime_type: MimeType) {
        self.types.retain(|known| known.name != mime_type.name);
        self.types.push(mime_type);
    }
}

impl MimeDatabase for ExtensionMimeDatabase {
    fn mime_type_for_file(&self, path: &Path) -> Result<MimeType, MimeTypeNotFound> {
        let not_found = || MimeTypeNotFound {
            path: path.to_path_buf(),
        };
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(not_found)?;

        self.types
            .iter()
            .filter_map(|mime| mime.matching_suffix_len(file_name).map(|len| (len, mime)))
            .max_by_key(|(len, _)| *len)
            .map(|(_, mime)| mime.clone())
            .ok_or_else(not_found)
    }
}
