use crate::types::{ContainerMetadata, ContainerStack, EXTRUDER_STACK_TYPE, MACHINE_STACK_TYPE};
use crate::{RegistryError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Filter for [`ContainerRegistry::find_container_stacks`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackQuery {
    /// Required `type` metadata value
    pub stack_type: Option<String>,
    /// Required `machine` metadata value (extruders of one global stack)
    pub machine: Option<String>,
}

impl StackQuery {
    pub fn machines() -> Self {
        Self {
            stack_type: Some(MACHINE_STACK_TYPE.to_string()),
            machine: None,
        }
    }

    pub fn extruders_of(machine_id: &str) -> Self {
        Self {
            stack_type: Some(EXTRUDER_STACK_TYPE.to_string()),
            machine: Some(machine_id.to_string()),
        }
    }

    pub fn matches(&self, stack: &ContainerStack) -> bool {
        if let Some(stack_type) = &self.stack_type {
            if stack.stack_type() != Some(stack_type.as_str()) {
                return false;
            }
        }
        if let Some(machine) = &self.machine {
            if stack.machine_id() != Some(machine.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Filter for [`ContainerRegistry::find_instance_containers_metadata`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataQuery {
    pub definition: Option<String>,
    pub container_type: Option<String>,
}

impl MetadataQuery {
    pub fn by_definition(definition_id: &str) -> Self {
        Self {
            definition: Some(definition_id.to_string()),
            container_type: None,
        }
    }

    pub fn by_type(container_type: &str) -> Self {
        Self {
            definition: None,
            container_type: Some(container_type.to_string()),
        }
    }

    pub fn matches(&self, metadata: &ContainerMetadata) -> bool {
        if let Some(definition) = &self.definition {
            if metadata.definition() != Some(definition.as_str()) {
                return false;
            }
        }
        if let Some(container_type) = &self.container_type {
            if metadata.container_type() != Some(container_type.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Read-only view of the host's loaded containers.
pub trait ContainerRegistry {
    fn find_container_stacks(&self, query: &StackQuery) -> Vec<ContainerStack>;

    fn find_instance_containers_metadata(&self, query: &MetadataQuery) -> Vec<ContainerMetadata>;

    /// Whether the container ships with the host (as opposed to user-created)
    fn is_read_only(&self, container_id: &str) -> bool;
}

/// Instance container entry of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    #[serde(default)]
    pub read_only: bool,
    #[serde(flatten)]
    pub metadata: ContainerMetadata,
}

/// Serialized registry state, as written by a host export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    #[serde(default)]
    pub stacks: Vec<ContainerStack>,
    #[serde(default)]
    pub instances: Vec<InstanceRecord>,
}

/// Registry over plain in-memory values.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    stacks: Vec<ContainerStack>,
    instances: Vec<InstanceRecord>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: RegistrySnapshot) -> Result<Self> {
        let mut seen = HashSet::new();
        for stack in &snapshot.stacks {
            if stack.id.is_empty() {
                return Err(RegistryError::invalid_snapshot("stack with empty id"));
            }
            if !seen.insert(stack.id.as_str()) {
                return Err(RegistryError::invalid_snapshot(format!(
                    "duplicate stack id {}",
                    stack.id
                )));
            }
        }
        for (idx, record) in snapshot.instances.iter().enumerate() {
            if record.metadata.id().is_none() {
                return Err(RegistryError::invalid_snapshot(format!(
                    "instance #{idx} has no string id"
                )));
            }
        }

        log::debug!(
            "Loaded registry snapshot: {} stacks, {} instance containers",
            snapshot.stacks.len(),
            snapshot.instances.len()
        );
        Ok(Self {
            stacks: snapshot.stacks,
            instances: snapshot.instances,
        })
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Self::from_snapshot(serde_json::from_slice(bytes)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_json(&bytes)
    }

    pub fn add_stack(&mut self, stack: ContainerStack) {
        self.stacks.retain(|known| known.id != stack.id);
        self.stacks.push(stack);
    }

    pub fn add_instance(&mut self, metadata: ContainerMetadata, read_only: bool) {
        self.instances.push(InstanceRecord {
            read_only,
            metadata,
        });
    }
}

impl ContainerRegistry for MemoryRegistry {
    fn find_container_stacks(&self, query: &StackQuery) -> Vec<ContainerStack> {
        self.stacks
            .iter()
            .filter(|stack| query.matches(stack))
            .cloned()
            .collect()
    }

    fn find_instance_containers_metadata(&self, query: &MetadataQuery) -> Vec<ContainerMetadata> {
        self.instances
            .iter()
            .filter(|record| query.matches(&record.metadata))
            .map(|record| record.metadata.clone())
            .collect()
    }

    fn is_read_only(&self, container_id: &str) -> bool {
        self.instances
            .iter()
            .find(|record| record.metadata.id() == Some(container_id))
            .is_some_and(|record| record.read_only)
    }
}
