//! Property configuration for the validator factory.
//!
//! Properties are string key/value pairs that override what was configured
//! in code. They can be set directly on a `ConfigurationState` or loaded
//! from TOML files:
//! - Global: `~/.vfactory/properties.toml` - User-wide defaults
//! - Project: `.vfactory/properties.toml` - Project-specific overrides
//!
//! Project properties take precedence over global ones.
//!
//! ```toml
//! [properties]
//! "validator.fail_fast" = true
//! "validator.constraint_mapping_contributors" = "acme.BookConstraints, acme.AuthorConstraints"
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Property keys understood by the factory.
pub mod keys {
    /// Abort validation of an object graph at the first violation.
    pub const FAIL_FAST: &str = "validator.fail_fast";

    /// Allow overriding methods to alter parameter constraints.
    pub const ALLOW_PARAMETER_CONSTRAINT_OVERRIDE: &str =
        "validator.allow_parameter_constraint_override";

    /// Allow more than one method in a hierarchy to mark the return value as cascaded.
    pub const ALLOW_MULTIPLE_CASCADED_VALIDATION_ON_RESULT: &str =
        "validator.allow_multiple_cascaded_validation_on_result";

    /// Allow parallel methods to define parameter constraints.
    pub const ALLOW_PARALLEL_METHODS_DEFINE_PARAMETER_CONSTRAINTS: &str =
        "validator.allow_parallel_method_parameter_constraint";

    /// Enable the traversable resolver result cache.
    pub const ENABLE_TRAVERSABLE_RESOLVER_RESULT_CACHE: &str =
        "validator.enable_traversable_resolver_result_cache";

    /// Comma-separated names of constraint mapping contributors.
    pub const CONSTRAINT_MAPPING_CONTRIBUTORS: &str = "validator.constraint_mapping_contributors";

    /// Name of the script evaluator factory to use.
    pub const SCRIPT_EVALUATOR_FACTORY_CLASSNAME: &str =
        "validator.script_evaluator_factory_classname";

    /// Every known key.
    pub const ALL: &[&str] = &[
        FAIL_FAST,
        ALLOW_PARAMETER_CONSTRAINT_OVERRIDE,
        ALLOW_MULTIPLE_CASCADED_VALIDATION_ON_RESULT,
        ALLOW_PARALLEL_METHODS_DEFINE_PARAMETER_CONSTRAINTS,
        ENABLE_TRAVERSABLE_RESOLVER_RESULT_CACHE,
        CONSTRAINT_MAPPING_CONTRIBUTORS,
        SCRIPT_EVALUATOR_FACTORY_CLASSNAME,
    ];
}

/// Resolved property table.
pub type Properties = BTreeMap<String, String>;

/// Interpret a property value as a boolean.
///
/// Only `true` (any ASCII case) is true; every other value is false.
pub fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

/// Split a comma-separated list of names.
///
/// Entries are trimmed and repeated names kept only at their first position.
/// Trailing empty entries are dropped; an empty entry anywhere else is kept
/// so the caller can reject it. A blank value yields no names.
pub fn split_names(value: &str) -> Vec<String> {
    let mut entries: Vec<&str> = value.split(',').map(str::trim).collect();
    while entries.last().is_some_and(|name| name.is_empty()) {
        entries.pop();
    }

    let mut names: Vec<String> = Vec::new();
    for name in entries {
        if !names.iter().any(|existing| existing == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// A property value as written in a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Flag(bool),
    Number(i64),
    Text(String),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Flag(flag) => write!(f, "{}", flag),
            PropertyValue::Number(number) => write!(f, "{}", number),
            PropertyValue::Text(text) => f.write_str(text),
        }
    }
}

/// Contents of a properties file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertiesFile {
    /// Property table
    pub properties: BTreeMap<String, PropertyValue>,
}

impl PropertiesFile {
    /// Load properties from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read properties file: {}", path.display()))?;

        let file: PropertiesFile = toml::from_str(&contents)
            .with_context(|| format!("failed to parse properties file: {}", path.display()))?;

        for key in file.properties.keys() {
            if !keys::ALL.contains(&key.as_str()) {
                tracing::warn!("Unknown property `{}` in {}", key, path.display());
            }
        }

        Ok(file)
    }

    /// Load properties with fallback to an empty table if the file doesn't exist
    /// or can't be read.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load properties from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another file into this one (other takes precedence).
    pub fn merge(&mut self, other: PropertiesFile) {
        self.properties.extend(other.properties);
    }

    /// Flatten into the string table the factory consumes.
    pub fn to_properties(&self) -> Properties {
        self.properties
            .iter()
            .map(|(key, value)| (key.clone(), value.to_string()))
            .collect()
    }
}

/// Load merged properties from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project properties (.vfactory/properties.toml)
/// 2. Global properties (~/.vfactory/properties.toml)
pub fn load_properties(global_path: &Path, project_path: &Path) -> PropertiesFile {
    let mut file = PropertiesFile::default();

    if global_path.exists() {
        file.merge(PropertiesFile::load_or_default(global_path));
    }

    if project_path.exists() {
        file.merge(PropertiesFile::load_or_default(project_path));
    }

    file
}

/// Get the global config directory (~/.vfactory).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".vfactory"))
}

/// Get the global properties path (~/.vfactory/properties.toml).
pub fn global_properties_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("properties.toml"))
}

/// Get the project properties path (.vfactory/properties.toml).
pub fn project_properties_path(project_root: &Path) -> PathBuf {
    project_root.join(".vfactory").join("properties.toml")
}
