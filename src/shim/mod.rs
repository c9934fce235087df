//! IDAPython import shim
//!
//! Makes scripts written against the IDAPython module layout (`idc`,
//! `idaapi`, `ida_bytes`, ...) importable from a [`ModuleSystem`] whose
//! modules are backed by arbitrary [`Provider`]s.
//!
//! # Layout
//!
//! - [`database`] - segment boundary used to pick a default address
//! - [`provider`] - provider and provider-registry contracts
//! - [`hooks`] - fixed name/role table and [`HookTable`]
//! - [`importer`] - [`HookedResolver`], the search-order participant
//! - [`install`] - install / uninstall against a module system
//!
//! [`ModuleSystem`]: crate::module::ModuleSystem

pub mod database;
pub mod hooks;
pub mod importer;
pub mod install;
pub mod provider;

use std::fmt;
use std::str::FromStr;

pub use database::{Database, Segment, SegmentTable};
pub use hooks::{build_hook_table, HookTable, HOOKS};
pub use importer::HookedResolver;
pub use install::{default_address, install_into, install_table, uninstall, Registration};
pub use provider::{Provider, ProviderError, ProviderRegistry, StaticProvider, StaticRegistry};

/// Effective address in the analysed database
pub type Address = u64;

/// One emulated IDAPython API module.
///
/// The registry builds one provider per role; the hook table then maps
/// logical module names onto one or more roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ApiRole {
    Idc,
    Idaapi,
    Idautils,
    IdaFuncs,
    IdaBytes,
    IdaNetnode,
    IdaNalt,
    IdaName,
    IdaEntry,
}

impl ApiRole {
    /// Every role, in the order the registry is asked for them
    pub const ALL: [ApiRole; 9] = [
        ApiRole::Idc,
        ApiRole::Idaapi,
        ApiRole::Idautils,
        ApiRole::IdaFuncs,
        ApiRole::IdaBytes,
        ApiRole::IdaNetnode,
        ApiRole::IdaNalt,
        ApiRole::IdaName,
        ApiRole::IdaEntry,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ApiRole::Idc => "idc",
            ApiRole::Idaapi => "idaapi",
            ApiRole::Idautils => "idautils",
            ApiRole::IdaFuncs => "ida_funcs",
            ApiRole::IdaBytes => "ida_bytes",
            ApiRole::IdaNetnode => "ida_netnode",
            ApiRole::IdaNalt => "ida_nalt",
            ApiRole::IdaName => "ida_name",
            ApiRole::IdaEntry => "ida_entry",
        }
    }
}

impl FromStr for ApiRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApiRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("unknown API role: {}", s))
    }
}

impl fmt::Display for ApiRole {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shim errors
#[derive(Debug, thiserror::Error)]
pub enum ShimError {
    /// No segments to derive a default address from, and none was given
    #[error("no addressable context: database has no segments and no current address was given")]
    NoAddressableContext,

    /// `resolve` called for a name the hook table does not contain
    #[error("invariant violation: '{name}' is not a hooked module")]
    InvariantViolation { name: String },

    /// A hook entry must list at least one provider
    #[error("hook '{name}' has no providers")]
    EmptyProviderList { name: String },

    /// The provider registry failed to build a role
    #[error("failed to build provider for role '{role}'")]
    Provider {
        role: ApiRole,
        #[source]
        source: ProviderError,
    },
}
