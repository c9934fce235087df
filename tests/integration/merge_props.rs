//! Property tests for provider merging using proptest

use std::collections::HashMap;
use std::sync::Arc;

use idbshim::shim::{HookTable, HookedResolver, Provider, StaticProvider};
use idbshim::Value;
use proptest::prelude::*;

/// Member names, including reserved ones
fn member_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z][a-z0-9_]{0,6}",
        "__[a-z]{1,4}__",
    ]
}

/// Members of one provider
fn provider_strategy() -> impl Strategy<Value = Vec<(String, i64)>> {
    prop::collection::vec((member_name_strategy(), any::<i64>()), 0..12)
}

fn build(members: &[Vec<(String, i64)>]) -> Vec<Arc<dyn Provider>> {
    members
        .iter()
        .enumerate()
        .map(|(i, list)| {
            let mut provider = StaticProvider::new(&format!("p{}", i));
            for (name, value) in list {
                provider.insert(name, Value::Int(*value));
            }
            Arc::new(provider) as Arc<dyn Provider>
        })
        .collect()
}

proptest! {
    /// Every non-reserved member appears with the value of the last provider defining it
    #[test]
    fn test_merge_is_last_wins_union(lists in prop::collection::vec(provider_strategy(), 1..5)) {
        let mut expected: HashMap<String, i64> = HashMap::new();
        for list in &lists {
            // within one provider, a repeated name keeps its last value
            for (name, value) in list {
                if !name.starts_with("__") {
                    expected.insert(name.clone(), *value);
                }
            }
        }

        let table = HookTable::new().with("merged", build(&lists)).unwrap();
        let resolver = HookedResolver::new(table);
        let module = resolver.resolve("merged").unwrap();

        prop_assert_eq!(module.len(), expected.len());
        for (name, value) in &expected {
            prop_assert_eq!(module.get(name), Some(&Value::Int(*value)));
        }
        prop_assert!(module.member_names().iter().all(|n| !n.starts_with("__")));
    }

    /// Resolving twice never synthesizes twice
    #[test]
    fn test_resolve_identity(lists in prop::collection::vec(provider_strategy(), 1..3)) {
        let table = HookTable::new().with("merged", build(&lists)).unwrap();
        let resolver = HookedResolver::new(table);
        let first = resolver.resolve("merged").unwrap();
        let second = resolver.resolve("merged").unwrap();
        prop_assert!(Arc::ptr_eq(&first, &second));
        prop_assert_eq!(resolver.cache_stats().misses, 1);
    }
}
