use startopt_observer::PathObserver;
use startopt_registry::{
    ContainerId, ContainerRegistry, ContainerStack, MetadataQuery, StackQuery, GENERIC_BRAND,
    MATERIAL_TYPE,
};
use std::collections::BTreeSet;

/// Machine stacks followed by the extruders of each machine.
///
/// Extruders whose machine is not among the machine stacks are left out.
pub fn active_stacks(registry: &dyn ContainerRegistry) -> Vec<ContainerStack> {
    let machines = registry.find_container_stacks(&StackQuery::machines());
    let mut extruders = Vec::new();
    for machine in &machines {
        extruders.extend(registry.find_container_stacks(&StackQuery::extruders_of(&machine.id)));
    }
    let mut stacks = machines;
    stacks.extend(extruders);
    stacks
}

/// Everything the active configuration references
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveContainers {
    pub stack_ids: BTreeSet<ContainerId>,
    pub definition_ids: BTreeSet<ContainerId>,
    pub container_ids: BTreeSet<ContainerId>,
}

impl ActiveContainers {
    pub fn collect(
        registry: &dyn ContainerRegistry,
        stacks: &[ContainerStack],
        observer: &PathObserver,
    ) -> Self {
        let mut active = Self::default();

        for stack in stacks {
            active.stack_ids.insert(stack.id.clone());
            active.definition_ids.insert(stack.definition.id.clone());

            // ancestors may never have been scanned; observing them also
            // records them as known
            for path in &stack.definition.inherited_files {
                if let Some((id, _)) = observer.observe(path) {
                    active.definition_ids.insert(id);
                }
            }

            let quality_definition = stack.metadata_entry("quality_definition", "");
            if !quality_definition.is_empty() {
                active.definition_ids.insert(quality_definition.to_string());
            }
        }

        for definition_id in &active.definition_ids {
            let query = MetadataQuery::by_definition(definition_id);
            for metadata in registry.find_instance_containers_metadata(&query) {
                if let Some(id) = metadata.file_id() {
                    active.container_ids.insert(id.to_string());
                }
            }
        }

        active
    }

    pub fn contains(&self, id: &str) -> bool {
        self.stack_ids.contains(id)
            || self.definition_ids.contains(id)
            || self.container_ids.contains(id)
    }
}

/// Material families of branded materials nothing needs.
///
/// A family is kept when an active stack has it selected, or when any of its
/// containers is user-made (not read-only).
pub fn unused_branded_materials(
    registry: &dyn ContainerRegistry,
    stacks: &[ContainerStack],
) -> BTreeSet<ContainerId> {
    let mut branded = BTreeSet::new();
    let mut keep = BTreeSet::new();

    for stack in stacks {
        let Some(material) = &stack.material else {
            continue;
        };
        if let Some(base_file) = material.base_file().or_else(|| material.id()) {
            keep.insert(base_file.to_string());
        }
    }

    let materials =
        registry.find_instance_containers_metadata(&MetadataQuery::by_type(MATERIAL_TYPE));
    for metadata in materials {
        let Some(base_file) = metadata.file_id() else {
            continue;
        };
        let is_generic = metadata
            .brand()
            .is_some_and(|brand| brand.eq_ignore_ascii_case(GENERIC_BRAND));
        if !is_generic {
            branded.insert(base_file.to_string());
        }
        let user_made = metadata
            .id()
            .is_some_and(|id| !registry.is_read_only(id));
        if user_made {
            keep.insert(base_file.to_string());
        }
    }

    branded.difference(&keep).cloned().collect()
}
