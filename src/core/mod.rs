//! Core data structures for the validator factory.
//!
//! This module contains the types the rest of the crate is built on:
//! - Interned constraint identities and validator descriptors
//! - Constraint mappings and their contributions
//! - The constraint registry
//! - Provider traits and their defaults
//! - Method validation and value extraction settings

pub mod constraint_type;
pub mod mapping;
pub mod method_validation;
pub mod providers;
pub mod registry;
pub mod value_extraction;

pub use constraint_type::{ConstraintType, ValidatorDescriptor};
pub use mapping::{
    BeanConfiguration, ConstrainedElement, ConstraintDefinitionContribution, ConstraintMapping,
    MappingContributorSource, MappingId, MappingSet, SealedMappings,
};
pub use method_validation::{MethodValidationConfiguration, MethodValidationConfigurationBuilder};
pub use registry::ConstraintRegistry;
pub use value_extraction::{ValueExtractorDescriptor, ValueExtractorManager};
