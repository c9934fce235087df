//! Installing the shim into a module system
//!
//! Installation puts a [`HookedResolver`] at the front of a
//! [`ModuleSystem`]'s search order, so the hooked names win over any
//! other source, including real modules on disk.

use std::sync::Arc;

use tracing::{info, warn};

use super::database::Database;
use super::hooks::{build_hook_table, HookTable};
use super::importer::HookedResolver;
use super::provider::ProviderRegistry;
use super::{Address, ShimError};
use crate::module::{LoaderId, ModuleSystem};

/// Handle to an installed resolver
///
/// Returned by installation and required to uninstall.
#[derive(Clone)]
pub struct Registration {
    resolver: Arc<HookedResolver>,
    position: usize,
}

impl Registration {
    pub fn loader(&self) -> LoaderId {
        self.resolver.id()
    }

    /// Position in the search order at insertion time
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn hooks(&self) -> &HookTable {
        self.resolver.hooks()
    }

    pub fn resolver(&self) -> &Arc<HookedResolver> {
        &self.resolver
    }

    /// Whether the resolver is still in `system`'s search order
    pub fn is_installed(
        &self,
        system: &ModuleSystem,
    ) -> bool {
        system.position(self.loader()).is_some()
    }

    /// Put the same resolver back at the front.
    ///
    /// No-op if it is still installed. Any other active shim is replaced,
    /// exactly as a fresh install would.
    pub fn reinstall(
        &self,
        system: &ModuleSystem,
    ) -> usize {
        activate(system, &self.resolver)
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("loader", &self.loader())
            .field("position", &self.position)
            .field("hooks", self.hooks())
            .finish()
    }
}

/// Lowest segment start in `db`
pub fn default_address(db: &dyn Database) -> Result<Address, ShimError> {
    db.segments()
        .iter()
        .map(|seg| seg.start)
        .min()
        .ok_or(ShimError::NoAddressableContext)
}

/// Install a prepared table into `system`.
///
/// Any shim already active in `system` is removed first, and modules
/// already loaded under a hooked name are evicted so the next import goes
/// through the resolver.
pub fn install_table(
    system: &ModuleSystem,
    hooks: HookTable,
) -> Registration {
    let resolver = Arc::new(HookedResolver::new(hooks));
    let position = activate(system, &resolver);
    info!(
        "installed shim {} with {} hooked modules",
        resolver.id(),
        resolver.hooks().len()
    );
    Registration { resolver, position }
}

/// Make `resolver` the only active shim, first in the search order.
///
/// Runs as one [`ModuleSystem::update`], so no import can register a
/// module found through the old search order afterwards.
fn activate(
    system: &ModuleSystem,
    resolver: &Arc<HookedResolver>,
) -> usize {
    let own = resolver.id();
    system.update(|finders, registry| {
        let stale: Vec<LoaderId> = finders
            .iter()
            .filter(|f| f.label() == HookedResolver::LABEL && f.id() != own)
            .map(|f| f.id())
            .collect();
        for id in stale {
            warn!("replacing active shim {}", id);
            finders.retain(|f| f.id() != id);
            registry.remove_loaded_by(id);
        }

        if let Some(pos) = finders.iter().position(|f| f.id() == own) {
            return pos;
        }

        for name in resolver.hooks().names() {
            if let Some(previous) = registry.remove(name) {
                info!(
                    "evicting previously loaded {} ({})",
                    name,
                    previous.file.as_deref().unwrap_or("<builtin>")
                );
            }
        }
        finders.insert(0, resolver.clone());
        0
    })
}

/// Build the hook table for `db` and install it into `system`.
///
/// Nothing is registered if the table cannot be built.
pub fn install_into(
    system: &ModuleSystem,
    registry: &dyn ProviderRegistry,
    db: &dyn Database,
    current_address: Option<Address>,
) -> Result<(HookTable, Registration), ShimError> {
    let hooks = build_hook_table(registry, db, current_address)?;
    let registration = install_table(system, hooks.clone());
    Ok((hooks, registration))
}

/// Remove an installed resolver and the modules it created.
///
/// Returns false if it was not installed.
pub fn uninstall(
    system: &ModuleSystem,
    registration: &Registration,
) -> bool {
    let id = registration.loader();
    system.update(|finders, registry| {
        let before = finders.len();
        finders.retain(|f| f.id() != id);
        if finders.len() == before {
            return false;
        }
        let evicted = registry.remove_loaded_by(id);
        info!("uninstalled shim {}, evicted {:?}", id, evicted);
        true
    })
}
