//! Provider contracts
//!
//! A [`Provider`] is a bag of named members standing in for one real
//! IDAPython module. The shim never looks inside a member; it only copies
//! them into synthetic modules.

use std::collections::BTreeMap;
use std::sync::Arc;

use indexmap::IndexMap;

use super::database::Database;
use super::{Address, ApiRole};
use crate::module::{NativeFunction, Value};
use crate::util::config::{ConfigError, ShimConfig};

/// A source of module members
pub trait Provider: Send + Sync {
    /// Diagnostic name
    fn name(&self) -> &str;

    /// File the provider's members originate from, if any
    fn origin(&self) -> Option<&str> {
        None
    }

    /// Public members, in declaration order
    fn members(&self) -> Vec<(String, Value)>;
}

/// Provider construction errors, owned by the registry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("no provider registered for role '{role}'")]
    Missing { role: ApiRole },

    #[error("provider for role '{role}' failed: {message}")]
    Failed { role: ApiRole, message: String },
}

/// Builds one provider per API role for a database and current address
pub trait ProviderRegistry {
    fn provider(
        &self,
        db: &dyn Database,
        screen_ea: Address,
        role: ApiRole,
    ) -> Result<Arc<dyn Provider>, ProviderError>;
}

/// Provider with a fixed member list
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    name: String,
    origin: Option<String>,
    members: IndexMap<String, Value>,
}

impl StaticProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            origin: None,
            members: IndexMap::new(),
        }
    }

    pub fn with_origin(
        mut self,
        origin: &str,
    ) -> Self {
        self.origin = Some(origin.to_string());
        self
    }

    pub fn with(
        mut self,
        name: &str,
        value: impl Into<Value>,
    ) -> Self {
        self.members.insert(name.to_string(), value.into());
        self
    }

    pub fn insert(
        &mut self,
        name: &str,
        value: Value,
    ) {
        self.members.insert(name.to_string(), value);
    }

    pub fn contains(
        &self,
        name: &str,
    ) -> bool {
        self.members.contains_key(name)
    }
}

impl Provider for StaticProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    fn members(&self) -> Vec<(String, Value)> {
        self.members
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Registry over pre-built [`StaticProvider`]s
///
/// Each request clones the role's provider and adds the screen-address
/// accessor the real API exposes for that role (`idc.ScreenEA`,
/// `idaapi.get_screen_ea`) unless the provider already defines it.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    providers: BTreeMap<ApiRole, StaticProvider>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with an empty provider for every role
    pub fn with_all_roles() -> Self {
        let mut registry = Self::new();
        for role in ApiRole::ALL {
            registry.register(role, StaticProvider::new(role.as_str()));
        }
        registry
    }

    pub fn register(
        &mut self,
        role: ApiRole,
        provider: StaticProvider,
    ) {
        self.providers.insert(role, provider);
    }

    pub fn with(
        mut self,
        role: ApiRole,
        provider: StaticProvider,
    ) -> Self {
        self.register(role, provider);
        self
    }

    pub fn get(
        &self,
        role: ApiRole,
    ) -> Option<&StaticProvider> {
        self.providers.get(&role)
    }

    /// Build from the `[providers.<role>]` tables of a config profile
    ///
    /// Roles the profile omits get an empty provider.
    pub fn from_config(config: &ShimConfig) -> Result<Self, ConfigError> {
        let mut registry = Self::with_all_roles();
        for (role, section) in config.provider_sections()? {
            let mut provider = StaticProvider::new(role.as_str());
            if let Some(origin) = &section.origin {
                provider = provider.with_origin(origin);
            }
            for (name, value) in &section.members {
                provider.insert(name, Value::from(value));
            }
            registry.register(role, provider);
        }
        Ok(registry)
    }
}

fn screen_ea_accessor(role: ApiRole) -> Option<&'static str> {
    match role {
        ApiRole::Idc => Some("ScreenEA"),
        ApiRole::Idaapi => Some("get_screen_ea"),
        _ => None,
    }
}

impl ProviderRegistry for StaticRegistry {
    fn provider(
        &self,
        _db: &dyn Database,
        screen_ea: Address,
        role: ApiRole,
    ) -> Result<Arc<dyn Provider>, ProviderError> {
        let mut provider = self
            .providers
            .get(&role)
            .cloned()
            .ok_or(ProviderError::Missing { role })?;

        if let Some(accessor) = screen_ea_accessor(role) {
            if !provider.contains(accessor) {
                let ea = i64::try_from(screen_ea).map_err(|_| ProviderError::Failed {
                    role,
                    message: format!("address {:#x} does not fit an int member", screen_ea),
                })?;
                provider.insert(
                    accessor,
                    Value::Function(NativeFunction::new(accessor, move |_| Ok(Value::Int(ea)))),
                );
            }
        }
        Ok(Arc::new(provider))
    }
}
