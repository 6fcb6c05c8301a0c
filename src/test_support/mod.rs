//! Test utilities for validator factory unit tests.
//!
//! Stub providers, fixture contributors and a counting metadata manager
//! builder for checking how often the cache builds.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};

use crate::bootstrap::aggregator::{ConstraintMappingBuilder, ConstraintMappingContributor};
use crate::bootstrap::loader::{ComponentLoader, ComponentRegistry};
use crate::core::constraint_type::{ConstraintType, ValidatorDescriptor};
use crate::core::mapping::BeanConfiguration;
use crate::core::providers::{ParameterNameProvider, ProviderName, ScriptEvaluatorFactory};
use crate::core::registry::ConstraintRegistry;
use crate::metadata::cache::CacheKey;
use crate::metadata::manager::MetadataManager;
use crate::metadata::provider::{MappingStream, MappingStreamParser};

/// A loader with nothing registered, so tests never see the global registry.
pub fn empty_loader() -> Arc<dyn ComponentLoader> {
    Arc::new(ComponentRegistry::named("empty test registry"))
}

/// Contributes one mapping defining each of its constraint types.
///
/// Every definition replaces existing validators with a single
/// `<type>Validator` for `Object`.
#[derive(Debug, Clone)]
pub struct DefiningContributor {
    types: Vec<String>,
}

impl DefiningContributor {
    pub fn new(types: &[&str]) -> Self {
        DefiningContributor {
            types: types.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl ConstraintMappingContributor for DefiningContributor {
    fn create_constraint_mappings(&self, builder: &mut ConstraintMappingBuilder<'_>) {
        let mapping = builder.add_constraint_mapping();
        for ty in &self.types {
            mapping
                .constraint_definition(ConstraintType::new(ty))
                .include_existing_validators(false)
                .validated_by(ValidatorDescriptor::new(format!("{}Validator", ty), "Object"));
        }
    }
}

/// Names parameters from a fixed list, falling back to `p<index>`.
#[derive(Debug, Clone)]
pub struct FixedParameterNameProvider {
    names: Vec<String>,
}

impl FixedParameterNameProvider {
    pub fn new(names: &[&str]) -> Self {
        FixedParameterNameProvider {
            names: names.iter().map(|n| n.to_string()).collect(),
        }
    }
}

impl ProviderName for FixedParameterNameProvider {}

impl ParameterNameProvider for FixedParameterNameProvider {
    fn parameter_names(&self, _method: &str, arity: usize) -> Vec<String> {
        (0..arity)
            .map(|i| {
                self.names
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("p{}", i))
            })
            .collect()
    }
}

/// Parses `<bean type> <field> <constraint type>` lines, one bean
/// configuration per line.
#[derive(Debug, Clone, Copy)]
pub struct LineMappingParser;

impl MappingStreamParser for LineMappingParser {
    fn parse(&self, stream: &MappingStream) -> Result<Vec<BeanConfiguration>> {
        let mut beans = Vec::new();
        for (number, line) in stream.content.lines().enumerate() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            let [bean, field, constraint] = parts.as_slice() else {
                bail!("line {}: expected `<bean> <field> <constraint>`", number + 1);
            };
            let mut configuration = BeanConfiguration::new(*bean);
            configuration.field(*field, ConstraintType::new(constraint));
            beans.push(configuration);
        }
        Ok(beans)
    }
}

/// Script evaluator factory that records how often it was cleared.
#[derive(Debug, Default)]
pub struct RecordingScriptEvaluatorFactory {
    clears: AtomicUsize,
}

impl RecordingScriptEvaluatorFactory {
    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl ProviderName for RecordingScriptEvaluatorFactory {}

impl ScriptEvaluatorFactory for RecordingScriptEvaluatorFactory {
    fn prepare_evaluator(&self, _language: &str) {}

    fn clear(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}

/// Metadata manager builder that counts its invocations.
#[derive(Debug, Default)]
pub struct CountingBuilder {
    builds: AtomicUsize,
    registry: Arc<ConstraintRegistry>,
}

impl CountingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(&self, key: &CacheKey) -> MetadataManager {
        self.builds.fetch_add(1, Ordering::SeqCst);
        MetadataManager::new(Arc::clone(&self.registry), Vec::new(), key)
    }

    pub fn count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}
