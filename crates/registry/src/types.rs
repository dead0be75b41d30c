use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Identifier naming one container, derived from its file name.
pub type ContainerId = String;

/// `type` metadata value of a global (machine) stack
pub const MACHINE_STACK_TYPE: &str = "machine";

/// `type` metadata value of an extruder stack
pub const EXTRUDER_STACK_TYPE: &str = "extruder_train";

/// `type` metadata value of a material instance container
pub const MATERIAL_TYPE: &str = "material";

/// `brand` value of unbranded materials
pub const GENERIC_BRAND: &str = "generic";

/// Metadata record of a container, keyed by entry name.
///
/// The host stores arbitrary JSON values here; the optimiser only ever reads
/// string entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerMetadata(BTreeMap<String, Value>);

impl ContainerMetadata {
    pub fn new(id: impl Into<String>) -> Self {
        Self::default().with("id", id)
    }

    /// Builder-style insert of a string entry
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), Value::String(value.into()));
    }

    /// String entry, `None` when missing or not a string
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// String entry with a fallback
    pub fn entry_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn id(&self) -> Option<&str> {
        self.get("id")
    }

    pub fn container_type(&self) -> Option<&str> {
        self.get("type")
    }

    pub fn definition(&self) -> Option<&str> {
        self.get("definition")
    }

    pub fn base_file(&self) -> Option<&str> {
        self.get("base_file")
    }

    pub fn brand(&self) -> Option<&str> {
        self.get("brand")
    }

    pub fn is_material(&self) -> bool {
        self.container_type() == Some(MATERIAL_TYPE)
    }

    /// Identifier of the file that actually holds this container.
    ///
    /// Material variants share one profile file named by `base_file`; every
    /// other container is its own file.
    pub fn file_id(&self) -> Option<&str> {
        if self.is_material() {
            self.base_file().or_else(|| self.id())
        } else {
            self.id()
        }
    }
}

/// Definition referenced by a stack.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    pub id: ContainerId,
    /// Files of the definitions this one inherits from, nearest parent first
    #[serde(default)]
    pub inherited_files: Vec<PathBuf>,
}

impl Definition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            inherited_files: Vec::new(),
        }
    }

    #[must_use]
    pub fn inheriting(mut self, path: impl Into<PathBuf>) -> Self {
        self.inherited_files.push(path.into());
        self
    }
}

/// A configured machine or extruder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerStack {
    pub id: ContainerId,
    pub definition: Definition,
    #[serde(default)]
    pub metadata: ContainerMetadata,
    /// Material currently selected on this stack
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<ContainerMetadata>,
}

impl ContainerStack {
    pub fn new(id: impl Into<String>, stack_type: &str, definition: Definition) -> Self {
        let id = id.into();
        let metadata = ContainerMetadata::new(id.clone()).with("type", stack_type);
        Self {
            id,
            definition,
            metadata,
            material: None,
        }
    }

    pub fn machine(id: impl Into<String>, definition: Definition) -> Self {
        Self::new(id, MACHINE_STACK_TYPE, definition)
    }

    /// Extruder stack attached to `machine_id`
    pub fn extruder(id: impl Into<String>, machine_id: &str, definition: Definition) -> Self {
        let mut stack = Self::new(id, EXTRUDER_STACK_TYPE, definition);
        stack.metadata.insert("machine", machine_id);
        stack
    }

    #[must_use]
    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key, value);
        self
    }

    #[must_use]
    pub fn with_material(mut self, material: ContainerMetadata) -> Self {
        self.material = Some(material);
        self
    }

    pub fn metadata_entry<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.metadata.entry_or(key, default)
    }

    pub fn stack_type(&self) -> Option<&str> {
        self.metadata.container_type()
    }

    /// Global stack an extruder belongs to
    pub fn machine_id(&self) -> Option<&str> {
        self.metadata.get("machine")
    }
}
