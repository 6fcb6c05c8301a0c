//! Sources of bean constraint configuration.
//!
//! A metadata manager asks each provider for the configurations of a bean
//! type and merges them. Providers are built once per factory and shared by
//! every manager the factory creates.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::core::mapping::{BeanConfiguration, SealedMappings};
use crate::factory::errors::{FactoryError, FactoryResult};

/// Supplies bean constraint configurations.
pub trait MetadataProvider: Send + Sync {
    /// Configurations for a bean type, in provider order.
    fn bean_configurations(&self, type_name: &str) -> Vec<&BeanConfiguration>;

    /// Every bean type this provider configures, sorted.
    fn configured_types(&self) -> Vec<&str>;

    /// Provider kind, for logging.
    fn kind(&self) -> &'static str;
}

/// Programmatic constraint placements from the aggregated mappings.
#[derive(Debug, Clone)]
pub struct ProgrammaticMetadataProvider {
    mappings: SealedMappings,
}

impl ProgrammaticMetadataProvider {
    pub fn new(mappings: SealedMappings) -> Self {
        ProgrammaticMetadataProvider { mappings }
    }
}

impl MetadataProvider for ProgrammaticMetadataProvider {
    fn bean_configurations(&self, type_name: &str) -> Vec<&BeanConfiguration> {
        self.mappings
            .iter()
            .filter_map(|m| m.bean_configuration(type_name))
            .collect()
    }

    fn configured_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self
            .mappings
            .iter()
            .flat_map(|m| m.bean_configurations())
            .map(|b| b.type_name())
            .collect();
        types.sort_unstable();
        types.dedup();
        types
    }

    fn kind(&self) -> &'static str {
        "programmatic"
    }
}

/// A named mapping document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingStream {
    pub name: String,
    pub content: String,
}

impl MappingStream {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        MappingStream {
            name: name.into(),
            content: content.into(),
        }
    }
}

impl fmt::Display for MappingStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Turns mapping documents into bean configurations.
pub trait MappingStreamParser: Send + Sync {
    fn parse(&self, stream: &MappingStream) -> anyhow::Result<Vec<BeanConfiguration>>;
}

/// Bean configurations read from mapping documents.
#[derive(Debug, Default)]
pub struct XmlMetadataProvider {
    beans: BTreeMap<String, Vec<BeanConfiguration>>,
    stream_count: usize,
}

impl XmlMetadataProvider {
    /// Parse every stream. The first stream that fails to parse fails the
    /// whole provider.
    pub fn new(streams: &[MappingStream], parser: &dyn MappingStreamParser) -> FactoryResult<Self> {
        let mut beans: BTreeMap<String, Vec<BeanConfiguration>> = BTreeMap::new();

        for stream in streams {
            let parsed = parser
                .parse(stream)
                .map_err(|e| FactoryError::MappingParse {
                    stream: stream.name.clone(),
                    message: format!("{:#}", e),
                })?;
            debug!(
                "Parsed {} bean configuration(s) from mapping stream `{}`",
                parsed.len(),
                stream
            );
            for bean in parsed {
                beans.entry(bean.type_name().to_string()).or_default().push(bean);
            }
        }

        Ok(XmlMetadataProvider {
            beans,
            stream_count: streams.len(),
        })
    }

    /// Number of streams the provider was built from.
    pub fn stream_count(&self) -> usize {
        self.stream_count
    }
}

impl MetadataProvider for XmlMetadataProvider {
    fn bean_configurations(&self, type_name: &str) -> Vec<&BeanConfiguration> {
        self.beans
            .get(type_name)
            .map(|beans| beans.iter().collect())
            .unwrap_or_default()
    }

    fn configured_types(&self) -> Vec<&str> {
        self.beans.keys().map(String::as_str).collect()
    }

    fn kind(&self) -> &'static str {
        "xml"
    }
}
