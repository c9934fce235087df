//! idbshim - IDAPython import shim
//!
//! Lets scripts written against the IDAPython module layout run against an
//! alternative backend. Importing `idc`, `idaapi`, `idautils` or one of the
//! `ida_*` modules is intercepted and answered with a synthetic module whose
//! members come from pluggable providers.
//!
//! # Example
//!
//! ```no_run
//! use idbshim::module::ModuleSystem;
//! use idbshim::shim::{Segment, SegmentTable, StaticRegistry};
//!
//! fn main() -> idbshim::Result<()> {
//!     let db = SegmentTable::new(vec![Segment::new(0x401000, 0x402000)]);
//!     let registry = StaticRegistry::with_all_roles();
//!
//!     let hooks = idbshim::install(&registry, &db, None)?;
//!     assert!(hooks.contains("idaapi"));
//!
//!     let idc = ModuleSystem::global().import("idc")?;
//!     println!("{} members", idc.len());
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/idbshim")]
#![warn(rust_2018_idioms)]

pub mod module;
pub mod shim;
pub mod util;

// Re-exports
pub use anyhow::{Context, Result};
pub use thiserror::Error;

pub use module::{Module, ModuleError, ModuleSystem, Value};
pub use shim::{
    Address, ApiRole, Database, HookTable, HookedResolver, Provider, ProviderRegistry,
    Registration, ShimError,
};

use tracing::debug;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Display name
pub const NAME: &str = "idbshim";

/// Install the shim into the process-wide module system.
///
/// Builds the fixed hook table from `registry` for `db` at
/// `current_address` (the lowest segment start if `None`), puts the hooked
/// resolver in front of every other import source, and returns the table
/// that was installed. A previously installed shim is replaced.
///
/// Fails with [`ShimError::NoAddressableContext`] when no address is given
/// and `db` has no segments; nothing is installed in that case.
pub fn install(
    registry: &dyn ProviderRegistry,
    db: &dyn Database,
    current_address: Option<Address>,
) -> ::std::result::Result<HookTable, ShimError> {
    debug!("installing into the global module system");
    let (hooks, _) = shim::install_into(ModuleSystem::global(), registry, db, current_address)?;
    Ok(hooks)
}
