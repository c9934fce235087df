//! Hook table
//!
//! Maps each logical module name a script may import onto the ordered
//! providers whose members make up that module.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use super::database::Database;
use super::install::default_address;
use super::provider::{Provider, ProviderRegistry};
use super::{Address, ApiRole, ShimError};

/// The fixed name -> roles table.
///
/// `idaapi` re-exports several `ida_*` modules the way the real one does
/// `from ida_xxx import *`, so it merges their providers in order.
pub const HOOKS: &[(&str, &[ApiRole])] = &[
    ("idc", &[ApiRole::Idc]),
    (
        "idaapi",
        &[
            ApiRole::Idaapi,
            ApiRole::IdaFuncs,
            ApiRole::IdaBytes,
            ApiRole::IdaNetnode,
            ApiRole::IdaNalt,
            ApiRole::IdaName,
            ApiRole::IdaEntry,
        ],
    ),
    ("idautils", &[ApiRole::Idautils]),
    ("ida_funcs", &[ApiRole::IdaFuncs]),
    ("ida_bytes", &[ApiRole::IdaBytes]),
    ("ida_netnode", &[ApiRole::IdaNetnode]),
    ("ida_nalt", &[ApiRole::IdaNalt]),
    ("ida_name", &[ApiRole::IdaName]),
    ("ida_entry", &[ApiRole::IdaEntry]),
];

/// Logical module name -> non-empty ordered provider list
#[derive(Clone, Default)]
pub struct HookTable {
    entries: IndexMap<String, Vec<Arc<dyn Provider>>>,
    screen_ea: Option<Address>,
}

impl HookTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry
    pub fn insert(
        &mut self,
        name: &str,
        providers: Vec<Arc<dyn Provider>>,
    ) -> Result<(), ShimError> {
        if providers.is_empty() {
            return Err(ShimError::EmptyProviderList {
                name: name.to_string(),
            });
        }
        self.entries.insert(name.to_string(), providers);
        Ok(())
    }

    /// Builder form of [`HookTable::insert`]
    pub fn with(
        mut self,
        name: &str,
        providers: Vec<Arc<dyn Provider>>,
    ) -> Result<Self, ShimError> {
        self.insert(name, providers)?;
        Ok(self)
    }

    pub fn get(
        &self,
        name: &str,
    ) -> Option<&[Arc<dyn Provider>]> {
        self.entries.get(name).map(|v| v.as_slice())
    }

    pub fn contains(
        &self,
        name: &str,
    ) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Address the providers were built for, when built by [`build_hook_table`]
    pub fn screen_ea(&self) -> Option<Address> {
        self.screen_ea
    }
}

impl fmt::Debug for HookTable {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, providers) in &self.entries {
            let names: Vec<&str> = providers.iter().map(|p| p.name()).collect();
            map.entry(name, &names);
        }
        map.finish()
    }
}

/// Build the fixed hook table for `db`.
///
/// The current address is `current_address` if given, else the lowest
/// segment start. Every role is built once before anything is assembled,
/// so a registry error leaves nothing behind.
pub fn build_hook_table(
    registry: &dyn ProviderRegistry,
    db: &dyn Database,
    current_address: Option<Address>,
) -> Result<HookTable, ShimError> {
    let screen_ea = match current_address {
        Some(ea) => ea,
        None => default_address(db)?,
    };
    debug!("building hook table at {:#x}", screen_ea);

    let mut built: HashMap<ApiRole, Arc<dyn Provider>> = HashMap::new();
    for role in ApiRole::ALL {
        let provider = registry
            .provider(db, screen_ea, role)
            .map_err(|source| ShimError::Provider { role, source })?;
        built.insert(role, provider);
    }

    let mut table = HookTable::new();
    table.screen_ea = Some(screen_ea);
    for (name, roles) in HOOKS {
        let providers = roles.iter().map(|role| Arc::clone(&built[role])).collect();
        table.insert(name, providers)?;
    }
    Ok(table)
}
