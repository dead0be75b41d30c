use pretty_assertions::assert_eq;
use startopt_observer::{ContainerPathResolver, ContainerScanner, LocalContainerProvider};
use startopt_optimiser::{
    MenuAction, OptimiserConfig, RecordingNotifier, StartupOptimiser, DEFAULT_PREFERENCE_KEY,
};
use startopt_prefs::{FilePreferences, MemoryPreferences, Preferences};
use startopt_registry::{ContainerMetadata, ContainerStack, Definition, MemoryRegistry};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn ids(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn optimiser_with(prefs: Box<dyn Preferences + Send>) -> (StartupOptimiser, RecordingNotifier) {
    let notifier = RecordingNotifier::default();
    let optimiser = StartupOptimiser::new(
        OptimiserConfig::default(),
        prefs,
        Arc::new(LocalContainerProvider::with_stock_types()),
        Box::new(notifier.clone()),
    )
    .unwrap();
    (optimiser, notifier)
}

fn resolve_all(resolver: &dyn ContainerPathResolver, names: &[&str]) {
    for name in names {
        resolver.resolve(Path::new(name));
    }
}

#[test]
fn unused_is_known_minus_active() {
    let (optimiser, notifier) = optimiser_with(Box::new(MemoryPreferences::new()));
    resolve_all(
        &**optimiser.observer(),
        &["A.def.json", "B.inst.cfg", "C.inst.cfg"],
    );

    let mut registry = MemoryRegistry::new();
    registry.add_stack(ContainerStack::machine("m1", Definition::new("A")));
    registry.add_instance(
        ContainerMetadata::new("B")
            .with("type", "quality")
            .with("definition", "A"),
        true,
    );

    assert_eq!(optimiser.compute_unused_containers(&registry), ids(&["C"]));

    let size = optimiser
        .trigger(MenuAction::DisableUnused, &registry)
        .unwrap();
    assert_eq!(size, 1);
    assert_eq!(optimiser.blacklist().ids(), ids(&["C"]));
    assert!(notifier.last().unwrap().text.contains("1 configuration files"));
}

#[test]
fn disable_unused_is_idempotent() {
    let (optimiser, _) = optimiser_with(Box::new(MemoryPreferences::new()));
    resolve_all(
        &**optimiser.observer(),
        &["A.def.json", "X.def.json", "Y.inst.cfg"],
    );
    let mut registry = MemoryRegistry::new();
    registry.add_stack(ContainerStack::machine("m1", Definition::new("A")));

    let first = optimiser.compute_unused_containers(&registry);
    optimiser.disable_unused(&registry).unwrap();
    let after_first = optimiser.blacklist().ids();

    let second = optimiser.compute_unused_containers(&registry);
    optimiser.disable_unused(&registry).unwrap();

    assert_eq!(first, second);
    assert_eq!(after_first, optimiser.blacklist().ids());
}

#[test]
fn blacklist_union_keeps_previous_entries() {
    let prefs = MemoryPreferences::with_value(DEFAULT_PREFERENCE_KEY, "old_profile");
    let (optimiser, _) = optimiser_with(Box::new(prefs));
    resolve_all(&**optimiser.observer(), &["A.def.json", "new.inst.cfg"]);

    let mut registry = MemoryRegistry::new();
    registry.add_stack(ContainerStack::machine("m1", Definition::new("A")));
    optimiser.disable_unused(&registry).unwrap();

    assert_eq!(optimiser.blacklist().ids(), ids(&["new", "old_profile"]));
}

#[test]
fn definition_chain_quality_definition_and_materials_are_active() {
    let temp = tempdir().unwrap();
    let parent = temp.path().join("fdmprinter.def.json");
    fs::write(&parent, b"{}").unwrap();

    let (optimiser, _) = optimiser_with(Box::new(MemoryPreferences::new()));
    resolve_all(
        &**optimiser.observer(),
        &[
            "um3.def.json",
            "um3_extruder.def.json",
            "shared_quality.inst.cfg",
            "pla.xml.fdm_material",
            "abs.xml.fdm_material",
            "other_printer.def.json",
        ],
    );

    let mut registry = MemoryRegistry::new();
    registry.add_stack(
        ContainerStack::machine("m1", Definition::new("um3").inheriting(&parent))
            .with_metadata("quality_definition", "ultimaker"),
    );
    registry.add_stack(ContainerStack::extruder(
        "m1_e0",
        "m1",
        Definition::new("um3_extruder"),
    ));
    registry.add_instance(
        ContainerMetadata::new("shared_quality")
            .with("type", "quality")
            .with("definition", "ultimaker"),
        true,
    );
    registry.add_instance(
        ContainerMetadata::new("pla_um3_0.4")
            .with("type", "material")
            .with("base_file", "pla")
            .with("definition", "um3"),
        true,
    );

    let unused = optimiser.compute_unused_containers(&registry);
    assert_eq!(unused, ids(&["abs", "other_printer"]));
    // observing the inherited file recorded it as known
    assert!(optimiser.observer().is_known("fdmprinter"));
}

#[test]
fn no_active_stacks_marks_everything_unused() {
    let (optimiser, _) = optimiser_with(Box::new(MemoryPreferences::new()));
    resolve_all(&**optimiser.observer(), &["A.def.json", "B.inst.cfg"]);

    let unused = optimiser.compute_unused_containers(&MemoryRegistry::new());
    assert_eq!(unused, ids(&["A", "B"]));
}

#[test]
fn unused_branded_materials_keep_selected_and_custom() {
    let (optimiser, _) = optimiser_with(Box::new(MemoryPreferences::new()));

    let mut registry = MemoryRegistry::new();
    registry.add_instance(
        ContainerMetadata::new("m1")
            .with("type", "material")
            .with("base_file", "fam1")
            .with("brand", "BrandX"),
        true,
    );
    registry.add_instance(
        ContainerMetadata::new("selected_0.4")
            .with("type", "material")
            .with("base_file", "selected")
            .with("brand", "BrandY"),
        true,
    );
    registry.add_instance(
        ContainerMetadata::new("generic_pla")
            .with("type", "material")
            .with("base_file", "generic_pla")
            .with("brand", "GENERIC"),
        true,
    );
    registry.add_instance(
        ContainerMetadata::new("custom_0.4")
            .with("type", "material")
            .with("base_file", "custom")
            .with("brand", "BrandZ"),
        false,
    );
    // selected material without a brand entry still counts as in use
    registry.add_stack(
        ContainerStack::machine("printer", Definition::new("um3")).with_material(
            ContainerMetadata::new("selected_0.4")
                .with("type", "material")
                .with("base_file", "selected"),
        ),
    );

    assert_eq!(
        optimiser.compute_unused_branded_materials(&registry),
        ids(&["fam1"])
    );
    optimiser
        .trigger(MenuAction::LoadOnlyGenericMaterials, &registry)
        .unwrap();
    assert!(optimiser.blacklist().contains("fam1"));
}

#[test]
fn restore_clears_suppression() {
    let prefs = MemoryPreferences::with_value(DEFAULT_PREFERENCE_KEY, "[\"C\"]");
    let (optimiser, notifier) = optimiser_with(Box::new(prefs));
    let observer = optimiser.observer();

    assert_eq!(observer.resolve(Path::new("C.inst.cfg")), None);
    assert_eq!(
        observer.resolve(Path::new("A.inst.cfg")).as_deref(),
        Some("A")
    );

    let size = optimiser
        .trigger(MenuAction::RestoreAll, &MemoryRegistry::new())
        .unwrap();
    assert_eq!(size, 0);
    assert_eq!(
        observer.resolve(Path::new("C.inst.cfg")).as_deref(),
        Some("C")
    );
    assert!(notifier.last().unwrap().text.contains("restarting"));
}

#[test]
fn added_container_is_unblacklisted() {
    let prefs = MemoryPreferences::with_value(DEFAULT_PREFERENCE_KEY, "imported;other");
    let (optimiser, _) = optimiser_with(Box::new(prefs));

    assert!(optimiser.on_container_added("imported").unwrap());
    assert!(!optimiser.on_container_added("imported").unwrap());
    assert_eq!(optimiser.blacklist().ids(), ids(&["other"]));
}

#[test]
fn blacklist_survives_restart() {
    let temp = tempdir().unwrap();
    let containers = temp.path().join("containers");
    fs::create_dir_all(&containers).unwrap();
    for name in ["um3.def.json", "unused_printer.def.json", "draft.inst.cfg"] {
        fs::write(containers.join(name), b"").unwrap();
    }
    let prefs_path = temp.path().join("preferences.json");

    {
        let (optimiser, _) =
            optimiser_with(Box::new(FilePreferences::open(&prefs_path).unwrap()));
        let report = ContainerScanner::new([&containers]).scan(&**optimiser.observer());
        assert_eq!(report.loaded.len(), 3);

        let mut registry = MemoryRegistry::new();
        registry.add_stack(ContainerStack::machine("m1", Definition::new("um3")));
        registry.add_instance(
            ContainerMetadata::new("draft")
                .with("type", "quality")
                .with("definition", "um3"),
            true,
        );
        optimiser.disable_unused(&registry).unwrap();
    }

    let (optimiser, _) = optimiser_with(Box::new(FilePreferences::open(&prefs_path).unwrap()));
    let report = ContainerScanner::new([&containers]).scan(&**optimiser.observer());
    let loaded: BTreeSet<_> = report.loaded.into_iter().map(|c| c.id).collect();
    assert_eq!(loaded, ids(&["draft", "um3"]));
    assert_eq!(report.skipped, 1);
    assert!(optimiser.observer().is_known("unused_printer"));

    let raw = fs::read_to_string(&prefs_path).unwrap();
    assert!(raw.contains("unused_printer"));
}
