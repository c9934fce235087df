//! Hooked resolver
//!
//! A [`Finder`] that answers only for the names in its [`HookTable`] and
//! serves each of them as a synthetic module merged from the name's
//! providers. Synthetic modules are created on first request and then
//! shared.

use std::sync::Arc;

use tracing::{debug, info};

use super::hooks::HookTable;
use super::provider::Provider;
use super::ShimError;
use crate::module::cache::{CacheStats, ModuleCache};
use crate::module::{Finder, LoaderId, Module, ModuleError};

/// Members with this prefix are never copied into a synthetic module
const RESERVED_PREFIX: &str = "__";

pub(crate) fn is_reserved(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX)
}

/// Search-order participant serving the hooked names
pub struct HookedResolver {
    id: LoaderId,
    hooks: HookTable,
    cache: ModuleCache,
}

impl HookedResolver {
    /// Diagnostic label, also used to find an active shim in a search order
    pub const LABEL: &'static str = "idbshim";

    pub fn new(hooks: HookTable) -> Self {
        Self {
            id: LoaderId::next(),
            hooks,
            cache: ModuleCache::new(),
        }
    }

    pub fn id(&self) -> LoaderId {
        self.id
    }

    pub fn hooks(&self) -> &HookTable {
        &self.hooks
    }

    /// Whether `name` is hooked. No side effects.
    pub fn can_resolve(
        &self,
        name: &str,
    ) -> bool {
        self.hooks.contains(name)
    }

    /// The synthetic module for `name`, created on first call.
    ///
    /// Calling this for a name [`can_resolve`](Self::can_resolve) rejects
    /// is a caller bug and yields [`ShimError::InvariantViolation`].
    pub fn resolve(
        &self,
        name: &str,
    ) -> Result<Arc<Module>, ShimError> {
        let providers = self
            .hooks
            .get(name)
            .ok_or_else(|| ShimError::InvariantViolation {
                name: name.to_string(),
            })?;

        self.cache.get_or_try_insert_with(name, || {
            info!("hooking import: {}", name);
            Ok(self.synthesize(name, providers))
        })
    }

    /// Names that already have a synthetic module
    pub fn resolved_names(&self) -> Vec<String> {
        self.cache.cached_modules()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn synthesize(
        &self,
        name: &str,
        providers: &[Arc<dyn Provider>],
    ) -> Module {
        let mut module = Module::new(name);
        module.loader = Some(self.id);
        module.package = Some(String::new());

        // later providers overwrite earlier ones, like successive `import *`
        for provider in providers {
            if let Some(origin) = provider.origin() {
                module.file = Some(origin.to_string());
            }
            for (member, value) in provider.members() {
                if is_reserved(&member) {
                    continue;
                }
                module.set(&member, value);
            }
        }
        debug!(
            "synthesized {} with {} members from {} providers",
            name,
            module.len(),
            providers.len()
        );
        module
    }
}

impl Finder for HookedResolver {
    fn id(&self) -> LoaderId {
        self.id
    }

    fn label(&self) -> &'static str {
        Self::LABEL
    }

    fn find(
        &self,
        name: &str,
    ) -> bool {
        let hooked = self.can_resolve(name);
        debug!("find {}: hooked={}", name, hooked);
        hooked
    }

    fn load(
        &self,
        name: &str,
    ) -> Result<Arc<Module>, ModuleError> {
        self.resolve(name).map_err(|e| ModuleError::Loader {
            name: name.to_string(),
            message: e.to_string(),
        })
    }
}
