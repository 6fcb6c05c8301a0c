//! Factory bootstrap: collecting constraint mappings from every source,
//! loading named components and registering custom constraint definitions.

pub mod aggregator;
pub mod loader;
pub mod registrar;

pub use aggregator::{ConstraintMappingBuilder, ConstraintMappingContributor, MappingSourceAggregator};
pub use loader::{ComponentKind, ComponentLoader, ComponentRegistry};
pub use registrar::ConstraintDefinitionRegistrar;
