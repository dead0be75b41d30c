//! # Start Optimiser
//!
//! Shortens host startup by skipping configuration files the active printer
//! setup never references.
//!
//! ## Flow
//!
//! ```text
//! plugins loaded ──> on_plugins_loaded: install PathObserver as the host resolver
//!        │
//!        ▼
//! host startup scan ──> PathObserver records every container id,
//!                       suppresses blacklisted ones
//!        │
//!        ▼
//! user action ──> DisableUnused:            known - active  ─┐
//!                 LoadOnlyGenericMaterials: branded - kept   ─┼─> blacklist (union) ─> message
//!                 DisableAffectedProfiles:  reported faulty  ─┘
//!                 RestoreAll:               blacklist = ""
//! ```
//!
//! Suppression only happens while the host scans at startup, so every
//! blacklist change takes effect on the next start.

mod config;
mod error;
mod notify;
mod optimiser;
mod usage;

pub use config::{OptimiserConfig, DEFAULT_PREFERENCE_KEY};
pub use error::{OptimiserError, Result};
pub use notify::{LogNotifier, Message, MessageKind, Notifier, RecordingNotifier};
pub use optimiser::{ResolverHost, StartupOptimiser};
pub use usage::{active_stacks, unused_branded_materials, ActiveContainers};

/// Menu the actions are listed under
pub const MENU_NAME: &str = "Startup Optimiser";

/// User-invocable actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuAction {
    DisableUnused,
    LoadOnlyGenericMaterials,
    RestoreAll,
    /// Offered by the configuration error message rather than the menu
    DisableAffectedProfiles,
}

impl MenuAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::DisableUnused => "Disable loading unused configuration files",
            Self::LoadOnlyGenericMaterials => "Load only 'generic' materials",
            Self::RestoreAll => "Restore all configuration files",
            Self::DisableAffectedProfiles => "Disable affected profiles",
        }
    }

    /// Actions shown in the menu, in order
    pub fn menu_items() -> [MenuAction; 3] {
        [
            Self::DisableUnused,
            Self::LoadOnlyGenericMaterials,
            Self::RestoreAll,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn menu_lists_three_actions_in_order() {
        let labels: Vec<_> = MenuAction::menu_items()
            .iter()
            .map(|action| action.label())
            .collect();
        assert_eq!(
            labels,
            vec![
                "Disable loading unused configuration files",
                "Load only 'generic' materials",
                "Restore all configuration files",
            ]
        );
        assert!(!MenuAction::menu_items().contains(&MenuAction::DisableAffectedProfiles));
    }
}
