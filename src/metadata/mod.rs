//! Bean metadata: providers, managers and the manager cache.

pub mod cache;
pub mod manager;
pub mod provider;

pub use cache::{CacheKey, MetadataManagerCache};
pub use manager::{BeanMetadata, MetaConstraint, MetadataManager};
pub use provider::{
    MappingStream, MappingStreamParser, MetadataProvider, ProgrammaticMetadataProvider,
    XmlMetadataProvider,
};
