//! idbshim configuration profiles
//!
//! A profile describes everything the CLI needs to stand up a shim without
//! a real database: the segment layout, an optional current address, and
//! the members each API role provides.
//!
//! # Example
//!
//! ```toml
//! screen_ea = 0x401000
//!
//! [log]
//! level = "debug"
//!
//! [[database.segments]]
//! start = 0x401000
//! end = 0x402000
//! name = ".text"
//!
//! [providers.idc]
//! origin = "idb/idapython.py"
//! members = { BADADDR = 0xffffffff, SEARCH_DOWN = 1 }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::module::Value;
use crate::shim::{Address, ApiRole, Segment, SegmentTable};
use crate::util::logger::LogLevel;

/// Shim configuration profile
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ShimConfig {
    /// Explicit current address; the lowest segment start is used otherwise
    #[serde(default)]
    pub screen_ea: Option<Address>,
    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
    /// Database layout
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Provider contents, keyed by role name
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
}

impl ShimConfig {
    /// Provider sections with their role names checked
    pub fn provider_sections(&self) -> Result<Vec<(ApiRole, &ProviderConfig)>, ConfigError> {
        self.providers
            .iter()
            .map(|(name, section)| {
                let role = name
                    .parse::<ApiRole>()
                    .map_err(|_| ConfigError::UnknownRole(name.clone()))?;
                Ok((role, section))
            })
            .collect()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// One of debug, info, warn, error
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

impl LogConfig {
    pub fn level(&self) -> Result<LogLevel, ConfigError> {
        self.level
            .parse()
            .map_err(|_| ConfigError::InvalidLogLevel(self.level.clone()))
    }
}

/// Database layout
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub segments: Vec<SegmentConfig>,
}

/// One segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentConfig {
    pub start: Address,
    pub end: Address,
    #[serde(default)]
    pub name: Option<String>,
}

impl DatabaseConfig {
    pub fn to_segment_table(&self) -> SegmentTable {
        self.segments
            .iter()
            .map(|s| Segment {
                start: s.start,
                end: s.end,
                name: s.name.clone(),
            })
            .collect()
    }
}

/// Members of one provider
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    /// File reported as the synthetic module's origin
    #[serde(default)]
    pub origin: Option<String>,
    /// Member name -> value, in file order
    #[serde(default)]
    pub members: IndexMap<String, MemberValue>,
}

/// A literal member value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MemberValue {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<MemberValue>),
}

impl From<&MemberValue> for Value {
    fn from(value: &MemberValue) -> Self {
        match value {
            MemberValue::Bool(b) => Value::Bool(*b),
            MemberValue::Int(n) => Value::Int(*n),
            MemberValue::Str(s) => Value::Str(s.clone()),
            MemberValue::List(items) => Value::List(items.iter().map(Value::from).collect()),
        }
    }
}

/// Parse a profile from TOML text
pub fn parse_config(content: &str) -> Result<ShimConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Load a profile from disk
pub fn load_config(path: &Path) -> Result<ShimConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

/// Parse an address given as decimal or `0x` hex
pub fn parse_address(text: &str) -> Result<Address, ConfigError> {
    let trimmed = text.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => Address::from_str_radix(hex, 16),
        None => trimmed.parse(),
    };
    parsed.map_err(|_| ConfigError::InvalidAddress(text.to_string()))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("Unknown provider role: {0}")]
    UnknownRole(String),
}
