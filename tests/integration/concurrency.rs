//! Imports racing installs, and concurrent importers

use std::sync::{Arc, Barrier};
use std::thread;

use idbshim::module::{Finder, LoaderId, ModuleSystem};
use idbshim::shim::{install_into, uninstall};
use idbshim::{Module, ModuleError, Value};

use crate::common::{sample_db, sample_registry, str_value};

/// On-disk stand-in that parks inside `load` until released
struct GatedFinder {
    id: LoaderId,
    name: &'static str,
    entered: Barrier,
    release: Barrier,
}

impl GatedFinder {
    fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            id: LoaderId::next(),
            name,
            entered: Barrier::new(2),
            release: Barrier::new(2),
        })
    }
}

impl Finder for GatedFinder {
    fn id(&self) -> LoaderId {
        self.id
    }

    fn label(&self) -> &'static str {
        "gated"
    }

    fn find(
        &self,
        name: &str,
    ) -> bool {
        name == self.name
    }

    fn load(
        &self,
        name: &str,
    ) -> Result<Arc<Module>, ModuleError> {
        self.entered.wait();
        self.release.wait();
        let mut module = Module::new(name);
        module.loader = Some(self.id);
        module.set("REAL", Value::Bool(true));
        Ok(Arc::new(module))
    }
}

#[test]
fn test_install_during_real_load_still_hooks() {
    let system = ModuleSystem::new();
    let gated = GatedFinder::new("idc");
    system.push_back(gated.clone());

    thread::scope(|s| {
        let importer = s.spawn(|| system.import("idc"));

        gated.entered.wait();
        let (_, registration) =
            install_into(&system, &sample_registry(), &sample_db(), None).unwrap();
        gated.release.wait();

        // the in-flight import notices the new search order and retries
        let seen = importer.join().unwrap().unwrap();
        assert!(!seen.has("REAL"));
        assert_eq!(seen.loader, Some(registration.loader()));

        let idc = system.import("idc").unwrap();
        assert!(Arc::ptr_eq(&seen, &idc));
        assert_eq!(idc.get("ROLE"), Some(&str_value("idc")));
    });
}

#[test]
fn test_uninstall_during_real_load_keeps_real_module() {
    let system = ModuleSystem::new();
    let (_, registration) =
        install_into(&system, &sample_registry(), &sample_db(), None).unwrap();
    let gated = GatedFinder::new("helpers");
    system.push_back(gated.clone());

    thread::scope(|s| {
        let importer = s.spawn(|| system.import("helpers"));
        gated.entered.wait();
        assert!(uninstall(&system, &registration));
        // the retry asks the gated finder again
        gated.release.wait();
        gated.entered.wait();
        gated.release.wait();

        let helpers = importer.join().unwrap().unwrap();
        assert!(helpers.has("REAL"));
        assert_eq!(helpers.loader, Some(gated.id()));
    });
}

#[test]
fn test_concurrent_importers_share_one_module() {
    let system = ModuleSystem::new();
    let (_, registration) =
        install_into(&system, &sample_registry(), &sample_db(), None).unwrap();

    let modules: Vec<Arc<Module>> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| system.import("idaapi").unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for module in &modules[1..] {
        assert!(Arc::ptr_eq(&modules[0], module));
    }
    assert_eq!(registration.resolver().cache_stats().misses, 1);
}

#[test]
fn test_imports_during_repeated_installs_end_on_active_table() {
    let system = ModuleSystem::new();
    let (_, mut last) = install_into(&system, &sample_registry(), &sample_db(), None).unwrap();

    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..200 {
                    let idc = system.import("idc").unwrap();
                    assert_eq!(idc.get("ROLE"), Some(&str_value("idc")));
                }
            });
        }
        for ea in 0..20u64 {
            let (_, registration) =
                install_into(&system, &sample_registry(), &sample_db(), Some(ea)).unwrap();
            last = registration;
        }
    });

    assert_eq!(system.finder_ids(), vec![last.loader()]);
    let idc = system.import("idc").unwrap();
    assert_eq!(idc.loader, Some(last.loader()));
}
