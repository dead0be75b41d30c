use crate::notify::{Message, Notifier};
use crate::usage::{active_stacks, unused_branded_materials, ActiveContainers};
use crate::{MenuAction, OptimiserConfig, Result};
use startopt_observer::{ContainerPathResolver, PathObserver, PathToMime};
use startopt_prefs::{Blacklist, BlacklistChange, Preferences};
use startopt_registry::{ContainerId, ContainerRegistry};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// The host side that accepts a replacement path resolver.
pub trait ResolverHost {
    fn install_resolver(&mut self, resolver: Arc<dyn ContainerPathResolver>);
}

/// One per process: owns the known-id set (through its observer), the
/// blacklist handle and the faulty containers last reported by the host.
pub struct StartupOptimiser {
    config: OptimiserConfig,
    blacklist: Arc<Blacklist>,
    observer: Arc<PathObserver>,
    notifier: Box<dyn Notifier>,
    installed: AtomicBool,
    faulty: Mutex<BTreeSet<ContainerId>>,
}

impl StartupOptimiser {
    pub fn new(
        config: OptimiserConfig,
        preferences: Box<dyn Preferences + Send>,
        host_mime: Arc<dyn PathToMime>,
        notifier: Box<dyn Notifier>,
    ) -> Result<Self> {
        config.validate()?;
        let blacklist = Arc::new(Blacklist::load(preferences, &config.preference_key));
        let observer = Arc::new(PathObserver::new(host_mime, Arc::clone(&blacklist)));
        Ok(Self {
            config,
            blacklist,
            observer,
            notifier,
            installed: AtomicBool::new(false),
            faulty: Mutex::new(BTreeSet::new()),
        })
    }

    pub fn config(&self) -> &OptimiserConfig {
        &self.config
    }

    pub fn blacklist(&self) -> &Arc<Blacklist> {
        &self.blacklist
    }

    pub fn observer(&self) -> &Arc<PathObserver> {
        &self.observer
    }

    /// Install the observer as the host's resolver.
    ///
    /// Must run before the host's startup scan. Only the first call installs;
    /// later calls return `false` and leave the host untouched.
    pub fn on_plugins_loaded(&self, host: &mut dyn ResolverHost) -> bool {
        if self.installed.swap(true, Ordering::SeqCst) {
            log::debug!("Path observer already installed");
            return false;
        }
        let resolver: Arc<dyn ContainerPathResolver> = self.observer.clone();
        host.install_resolver(resolver);
        log::info!(
            "Installed path observer ({} blacklisted containers)",
            self.blacklist.len()
        );
        true
    }

    /// Known local containers the active configuration does not reference
    pub fn compute_unused_containers(
        &self,
        registry: &dyn ContainerRegistry,
    ) -> BTreeSet<ContainerId> {
        let stacks = active_stacks(registry);
        if stacks.is_empty() {
            if self.config.skip_when_no_active_stacks {
                log::warn!("No active machine; not computing unused containers");
                return BTreeSet::new();
            }
            log::warn!("No active machine; every known container counts as unused");
        }

        let active = ActiveContainers::collect(registry, &stacks, &self.observer);
        let unused: BTreeSet<_> = self
            .observer
            .known_ids()
            .into_iter()
            .filter(|id| !active.contains(id))
            .collect();
        log::debug!(
            "{} active stacks, {} active definitions, {} active containers, {} unused",
            active.stack_ids.len(),
            active.definition_ids.len(),
            active.container_ids.len(),
            unused.len()
        );
        unused
    }

    /// Branded material families neither selected nor user-made
    pub fn compute_unused_branded_materials(
        &self,
        registry: &dyn ContainerRegistry,
    ) -> BTreeSet<ContainerId> {
        unused_branded_materials(registry, &active_stacks(registry))
    }

    pub fn disable_unused(&self, registry: &dyn ContainerRegistry) -> Result<BlacklistChange> {
        let unused = self.compute_unused_containers(registry);
        self.blacklist_and_notify(unused)
    }

    pub fn load_only_generic_materials(
        &self,
        registry: &dyn ContainerRegistry,
    ) -> Result<BlacklistChange> {
        let unused = self.compute_unused_branded_materials(registry);
        self.blacklist_and_notify(unused)
    }

    pub fn restore_all(&self) -> Result<()> {
        self.blacklist.reset()?;
        self.notifier.show(Message::info(
            "All configuration files will be loaded again after restarting.",
        ));
        Ok(())
    }

    /// The host loaded a container at runtime; make sure it is not skipped
    /// next time. Returns whether it was blacklisted.
    pub fn on_container_added(&self, container_id: &str) -> Result<bool> {
        Ok(self.blacklist.remove(container_id)?)
    }

    /// The host found containers it could not use. Remembers them and offers
    /// to blacklist exactly that set.
    pub fn on_configuration_errors<I, S>(&self, container_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let reported: BTreeSet<ContainerId> = container_ids
            .into_iter()
            .map(Into::into)
            .filter(|id: &String| !id.is_empty())
            .collect();
        if reported.is_empty() {
            return;
        }

        let count = reported.len();
        *self
            .faulty
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = reported;
        self.notifier.show(
            Message::warning(format!(
                "{count} configuration files could not be loaded. They can be skipped on future starts."
            ))
            .with_action(MenuAction::DisableAffectedProfiles),
        );
    }

    /// Containers from the last configuration error report not yet blacklisted
    pub fn pending_faulty(&self) -> BTreeSet<ContainerId> {
        self.faulty
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn disable_affected_profiles(&self) -> Result<BlacklistChange> {
        let faulty = std::mem::take(
            &mut *self
                .faulty
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );
        if faulty.is_empty() {
            return Ok(BlacklistChange {
                added: 0,
                total: self.blacklist.len(),
            });
        }
        self.blacklist_and_notify(faulty)
    }

    /// Blacklist `container_ids` as given
    pub fn disable_containers<I, S>(&self, container_ids: I) -> Result<BlacklistChange>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blacklist_and_notify(container_ids.into_iter().map(Into::into).collect())
    }

    /// Run a user action; returns the blacklist size afterwards
    pub fn trigger(&self, action: MenuAction, registry: &dyn ContainerRegistry) -> Result<usize> {
        log::debug!("Running action: {}", action.label());
        match action {
            MenuAction::DisableUnused => self.disable_unused(registry)?,
            MenuAction::LoadOnlyGenericMaterials => self.load_only_generic_materials(registry)?,
            MenuAction::DisableAffectedProfiles => self.disable_affected_profiles()?,
            MenuAction::RestoreAll => {
                self.restore_all()?;
                return Ok(0);
            }
        };
        Ok(self.blacklist.len())
    }

    fn blacklist_and_notify(&self, ids: BTreeSet<ContainerId>) -> Result<BlacklistChange> {
        let change = self.blacklist.extend(ids)?;
        self.notifier.show(Message::info(format!(
            "{} configuration files will be skipped after restarting ({} newly disabled).",
            change.total, change.added
        )));
        Ok(change)
    }
}
