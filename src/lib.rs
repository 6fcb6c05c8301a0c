//! validator-factory - bootstrap and metadata caching for a bean validation engine
//!
//! This crate builds validator factories: it aggregates constraint mappings
//! from programmatic configuration and named contributors, registers custom
//! constraint definitions, and caches the expensive per-configuration bean
//! metadata so that validators created under the same configuration share it.

pub mod bootstrap;
pub mod core;
pub mod factory;
pub mod metadata;
pub mod util;

/// Test utilities for validator factory unit tests.
///
/// Only compiled for tests. Provides stub providers, fixture contributors
/// and a counting metadata manager builder.
#[cfg(test)]
pub mod test_support;

pub use bootstrap::{
    ComponentLoader, ComponentRegistry, ConstraintMappingBuilder, ConstraintMappingContributor,
};
pub use self::core::{ConstraintMapping, ConstraintType, ValidatorDescriptor};
pub use factory::{
    ConfigurationState, FactoryError, FactoryResult, Validator, ValidatorContext, ValidatorFactory,
};
pub use metadata::{BeanMetadata, CacheKey, MetadataManager, MetadataManagerCache};
