//! Shared fixtures

use std::sync::Arc;

use idbshim::shim::{
    ApiRole, Database, Provider, ProviderError, ProviderRegistry, Segment, SegmentTable,
    StaticProvider, StaticRegistry,
};
use idbshim::{Address, Value};

/// Segments starting at 0x1000, 0x2000 and 0x1500, unsorted
pub fn sample_db() -> SegmentTable {
    SegmentTable::new(vec![
        Segment::named(0x1000, 0x1500, ".text"),
        Segment::named(0x2000, 0x3000, ".data"),
        Segment::named(0x1500, 0x2000, ".rdata"),
    ])
}

/// Registry where each role defines `ROLE` and a role-specific member,
/// and several `ida_*` roles share the `get_name` member name.
pub fn sample_registry() -> StaticRegistry {
    let mut registry = StaticRegistry::new();
    for role in ApiRole::ALL {
        let provider = StaticProvider::new(role.as_str())
            .with_origin(&format!("{}.py", role.as_str()))
            .with("ROLE", role.as_str())
            .with(&format!("{}_only", role.as_str()), 1_i64)
            .with("get_name", role.as_str())
            .with("__doc__", "hidden");
        registry.register(role, provider);
    }
    registry
}

/// Registry that fails for one role
pub struct FailingRegistry {
    pub inner: StaticRegistry,
    pub failing: ApiRole,
}

impl ProviderRegistry for FailingRegistry {
    fn provider(
        &self,
        db: &dyn Database,
        screen_ea: Address,
        role: ApiRole,
    ) -> Result<Arc<dyn Provider>, ProviderError> {
        if role == self.failing {
            return Err(ProviderError::Failed {
                role,
                message: "netnode index is corrupt".to_string(),
            });
        }
        self.inner.provider(db, screen_ea, role)
    }
}

pub fn str_value(s: &str) -> Value {
    Value::Str(s.to_string())
}
