//! Importing hooked names through a module system

use std::sync::Arc;

use idbshim::module::ModuleSystem;
use idbshim::shim::{install_into, HOOKS};
use idbshim::{ModuleError, Value};

use crate::common::{sample_db, sample_registry, str_value};

#[test]
fn test_every_hooked_name_imports() {
    let system = ModuleSystem::new();
    let (hooks, _) = install_into(&system, &sample_registry(), &sample_db(), None).unwrap();

    for (name, _) in HOOKS {
        assert!(hooks.contains(name));
        let module = system.import(name).unwrap();
        assert_eq!(module.name, *name);
        assert_eq!(module.package.as_deref(), Some(""));
    }
}

#[test]
fn test_idaapi_merges_in_order() {
    let system = ModuleSystem::new();
    install_into(&system, &sample_registry(), &sample_db(), None).unwrap();

    let idaapi = system.import("idaapi").unwrap();
    for role in [
        "idaapi",
        "ida_funcs",
        "ida_bytes",
        "ida_netnode",
        "ida_nalt",
        "ida_name",
        "ida_entry",
    ] {
        assert!(idaapi.has(&format!("{}_only", role)), "missing {}_only", role);
    }
    assert!(!idaapi.has("idc_only"));
    assert!(!idaapi.has("idautils_only"));

    // last listed provider wins
    assert_eq!(idaapi.get("ROLE"), Some(&str_value("ida_entry")));
    assert_eq!(idaapi.get("get_name"), Some(&str_value("ida_entry")));
    assert_eq!(idaapi.file.as_deref(), Some("ida_entry.py"));

    // first-seen order is kept for overwritten names
    let names = idaapi.member_names();
    assert_eq!(&names[..2], &["ROLE", "idaapi_only"]);
}

#[test]
fn test_single_provider_modules() {
    let system = ModuleSystem::new();
    install_into(&system, &sample_registry(), &sample_db(), None).unwrap();

    let bytes = system.import("ida_bytes").unwrap();
    assert_eq!(bytes.get("ROLE"), Some(&str_value("ida_bytes")));
    assert_eq!(bytes.file.as_deref(), Some("ida_bytes.py"));
    assert!(!bytes.has("ida_funcs_only"));
}

#[test]
fn test_dunder_members_never_copied() {
    let system = ModuleSystem::new();
    install_into(&system, &sample_registry(), &sample_db(), None).unwrap();

    for (name, _) in HOOKS {
        let module = system.import(name).unwrap();
        assert!(module.member_names().iter().all(|m| !m.starts_with("__")));
    }
}

#[test]
fn test_screen_ea_defaults_to_lowest_segment() {
    let system = ModuleSystem::new();
    let (hooks, _) = install_into(&system, &sample_registry(), &sample_db(), None).unwrap();
    assert_eq!(hooks.screen_ea(), Some(0x1000));

    let idc = system.import("idc").unwrap();
    let screen_ea = idc.get("ScreenEA").and_then(Value::as_function).unwrap();
    assert_eq!(screen_ea.call(&[]).unwrap(), Value::Int(0x1000));

    let idaapi = system.import("idaapi").unwrap();
    let get_screen_ea = idaapi.get("get_screen_ea").and_then(Value::as_function).unwrap();
    assert_eq!(get_screen_ea.call(&[]).unwrap(), Value::Int(0x1000));
}

#[test]
fn test_explicit_screen_ea() {
    let system = ModuleSystem::new();
    let (hooks, _) =
        install_into(&system, &sample_registry(), &sample_db(), Some(0x2400)).unwrap();
    assert_eq!(hooks.screen_ea(), Some(0x2400));

    let idc = system.import("idc").unwrap();
    let screen_ea = idc.get("ScreenEA").and_then(Value::as_function).unwrap();
    assert_eq!(screen_ea.call(&[]).unwrap(), Value::Int(0x2400));
}

#[test]
fn test_repeated_import_shares_instance() {
    let system = ModuleSystem::new();
    let (_, registration) =
        install_into(&system, &sample_registry(), &sample_db(), None).unwrap();

    let first = system.import("idaapi").unwrap();
    let second = system.import("idaapi").unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    // the resolver hands out the same object the module system recorded
    let direct = registration.resolver().resolve("idaapi").unwrap();
    assert!(Arc::ptr_eq(&first, &direct));

    // an evicted registry entry is rebuilt from the resolver cache, not re-synthesized
    system.registry().remove("idaapi");
    let third = system.import("idaapi").unwrap();
    assert!(Arc::ptr_eq(&first, &third));
    assert_eq!(registration.resolver().cache_stats().misses, 1);
}

#[test]
fn test_unhooked_name_declined() {
    let system = ModuleSystem::new();
    let (_, registration) =
        install_into(&system, &sample_registry(), &sample_db(), None).unwrap();
    let resolver = registration.resolver();

    for _ in 0..3 {
        assert!(!resolver.can_resolve("ida_kernwin"));
        assert!(matches!(
            system.import("ida_kernwin"),
            Err(ModuleError::NotFound { .. })
        ));
    }
    assert!(resolver.resolved_names().is_empty());
    assert!(!system.registry().has_module("ida_kernwin"));

    for (name, _) in HOOKS {
        assert!(resolver.can_resolve(name));
    }
}
