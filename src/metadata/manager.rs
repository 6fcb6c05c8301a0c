//! Bean metadata management.
//!
//! A `MetadataManager` is built for one cache key. It merges what the
//! metadata providers say about a bean type with the validators the
//! constraint registry knows, and keeps the result per bean type until
//! cleared.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use tracing::{debug, trace};

use crate::core::constraint_type::{ConstraintType, ValidatorDescriptor};
use crate::core::mapping::ConstrainedElement;
use crate::core::method_validation::MethodValidationConfiguration;
use crate::core::providers::ParameterNameProvider;
use crate::core::registry::ConstraintRegistry;
use crate::core::value_extraction::ValueExtractorManager;
use crate::metadata::cache::CacheKey;
use crate::metadata::provider::MetadataProvider;

/// A constraint on one element of a bean, with its active validators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaConstraint {
    pub element: ConstrainedElement,
    /// Element name as reported in constraint violations. Parameters are
    /// named by the parameter name provider.
    pub element_name: String,
    pub constraint_type: ConstraintType,
    pub validators: Vec<ValidatorDescriptor>,
    /// Kind of the provider that configured the constraint.
    pub origin: &'static str,
}

/// Merged constraint metadata of one bean type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BeanMetadata {
    type_name: String,
    constraints: Vec<MetaConstraint>,
}

impl BeanMetadata {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn constraints(&self) -> &[MetaConstraint] {
        &self.constraints
    }

    /// Whether any constraint is configured for the bean.
    pub fn has_constraints(&self) -> bool {
        !self.constraints.is_empty()
    }

    /// Constraints placed on the element with the given name.
    pub fn constraints_for<'a>(
        &'a self,
        element_name: &'a str,
    ) -> impl Iterator<Item = &'a MetaConstraint> + 'a {
        self.constraints
            .iter()
            .filter(move |c| c.element_name == element_name)
    }
}

/// Builds and caches bean metadata for one provider configuration.
pub struct MetadataManager {
    registry: Arc<ConstraintRegistry>,
    providers: Vec<Arc<dyn MetadataProvider>>,
    parameter_name_provider: Arc<dyn ParameterNameProvider>,
    value_extractor_manager: ValueExtractorManager,
    method_validation: MethodValidationConfiguration,
    beans: RwLock<HashMap<String, Arc<BeanMetadata>>>,
}

impl MetadataManager {
    /// Create a manager for the configuration described by `key`.
    pub fn new(
        registry: Arc<ConstraintRegistry>,
        providers: Vec<Arc<dyn MetadataProvider>>,
        key: &CacheKey,
    ) -> Self {
        debug!(
            "Creating metadata manager with {} provider(s) for {}",
            providers.len(),
            key
        );
        MetadataManager {
            registry,
            providers,
            parameter_name_provider: Arc::clone(key.parameter_name_provider()),
            value_extractor_manager: key.value_extractor_manager().clone(),
            method_validation: key.method_validation_configuration(),
            beans: RwLock::new(HashMap::new()),
        }
    }

    /// Metadata for a bean type, built on first request.
    pub fn bean_metadata(&self, type_name: &str) -> Arc<BeanMetadata> {
        {
            let beans = self.beans.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(metadata) = beans.get(type_name) {
                return Arc::clone(metadata);
            }
        }

        let mut beans = self.beans.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(metadata) = beans.get(type_name) {
            return Arc::clone(metadata);
        }

        let metadata = Arc::new(self.build_bean_metadata(type_name));
        beans.insert(type_name.to_string(), Arc::clone(&metadata));
        metadata
    }

    fn build_bean_metadata(&self, type_name: &str) -> BeanMetadata {
        let mut constraints = Vec::new();

        for provider in &self.providers {
            for bean in provider.bean_configurations(type_name) {
                for configured in bean.constraints() {
                    let validators = self.registry.validator_descriptors(configured.constraint_type);
                    if validators.is_empty() {
                        trace!(
                            "No validator registered for `{}` on {}.{}",
                            configured.constraint_type,
                            type_name,
                            configured.element
                        );
                    }
                    constraints.push(MetaConstraint {
                        element_name: self.element_name(&configured.element),
                        element: configured.element.clone(),
                        constraint_type: configured.constraint_type,
                        validators,
                        origin: provider.kind(),
                    });
                }
            }
        }

        trace!(
            "Built metadata for `{}` with {} constraint(s)",
            type_name,
            constraints.len()
        );
        BeanMetadata {
            type_name: type_name.to_string(),
            constraints,
        }
    }

    fn element_name(&self, element: &ConstrainedElement) -> String {
        match element {
            ConstrainedElement::Type => String::new(),
            ConstrainedElement::Field { name } => name.clone(),
            ConstrainedElement::Getter { property } => property.clone(),
            ConstrainedElement::Parameter {
                method,
                index,
                arity,
            } => {
                let names = self.parameter_name_provider.parameter_names(method, *arity);
                let parameter = names
                    .get(*index)
                    .cloned()
                    .unwrap_or_else(|| format!("arg{}", index));
                format!("{}.{}", method, parameter)
            }
            ConstrainedElement::ReturnValue { method } => format!("{}.<return value>", method),
        }
    }

    /// Number of bean types with built metadata.
    pub fn cached_bean_count(&self) -> usize {
        self.beans.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Drop all built bean metadata.
    pub fn clear(&self) {
        self.beans
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn parameter_name_provider(&self) -> &Arc<dyn ParameterNameProvider> {
        &self.parameter_name_provider
    }

    pub fn value_extractor_manager(&self) -> &ValueExtractorManager {
        &self.value_extractor_manager
    }

    pub fn method_validation_configuration(&self) -> MethodValidationConfiguration {
        self.method_validation
    }

    /// Kinds of the metadata providers, in lookup order.
    pub fn provider_kinds(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.kind()).collect()
    }
}

impl fmt::Debug for MetadataManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataManager")
            .field("providers", &self.provider_kinds())
            .field(
                "parameter_name_provider",
                &self.parameter_name_provider.provider_name(),
            )
            .field("value_extractors", &self.value_extractor_manager.len())
            .field("method_validation", &self.method_validation)
            .field("cached_beans", &self.cached_bean_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mapping::{ConstraintMapping, MappingSet};
    use crate::core::providers::DefaultParameterNameProvider;
    use crate::metadata::provider::ProgrammaticMetadataProvider;
    use crate::test_support::FixedParameterNameProvider;

    fn manager_with(
        mapping: ConstraintMapping,
        parameter_names: Arc<dyn ParameterNameProvider>,
    ) -> MetadataManager {
        let mut set = MappingSet::new();
        set.insert(mapping);
        let provider: Arc<dyn MetadataProvider> =
            Arc::new(ProgrammaticMetadataProvider::new(set.seal()));
        let key = CacheKey::new(
            parameter_names,
            ValueExtractorManager::default(),
            MethodValidationConfiguration::default(),
        );
        MetadataManager::new(Arc::new(ConstraintRegistry::new()), vec![provider], &key)
    }

    fn book_mapping() -> ConstraintMapping {
        let mut mapping = ConstraintMapping::new();
        mapping
            .bean("acme.Book")
            .field("title", ConstraintType::new("constraints.NotBlank"))
            .parameter("setPages", 0, 1, ConstraintType::new("constraints.Min"));
        mapping
    }

    #[test]
    fn test_bean_metadata_resolves_validators() {
        let manager = manager_with(book_mapping(), Arc::new(DefaultParameterNameProvider));

        let metadata = manager.bean_metadata("acme.Book");
        assert_eq!(metadata.constraints().len(), 2);

        let title: Vec<_> = metadata.constraints_for("title").collect();
        assert_eq!(title.len(), 1);
        assert_eq!(title[0].validators.len(), 1);
        assert_eq!(title[0].origin, "programmatic");
    }

    #[test]
    fn test_constraints_for_owned_element_name() {
        let manager = manager_with(book_mapping(), Arc::new(DefaultParameterNameProvider));
        let metadata = manager.bean_metadata("acme.Book");

        let element = format!("setPages.{}", "arg0");
        let found: Vec<_> = metadata.constraints_for(&element).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].constraint_type, ConstraintType::new("constraints.Min"));
        assert_eq!(metadata.constraints_for("isbn").count(), 0);
    }

    #[test]
    fn test_parameters_named_by_provider() {
        let default_names = manager_with(book_mapping(), Arc::new(DefaultParameterNameProvider));
        let custom_names = manager_with(
            book_mapping(),
            Arc::new(FixedParameterNameProvider::new(&["pages"])),
        );

        assert_eq!(
            default_names.bean_metadata("acme.Book").constraints()[1].element_name,
            "setPages.arg0"
        );
        assert_eq!(
            custom_names.bean_metadata("acme.Book").constraints()[1].element_name,
            "setPages.pages"
        );
    }

    #[test]
    fn test_bean_metadata_is_cached_until_cleared() {
        let manager = manager_with(book_mapping(), Arc::new(DefaultParameterNameProvider));

        let first = manager.bean_metadata("acme.Book");
        let second = manager.bean_metadata("acme.Book");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(manager.cached_bean_count(), 1);

        manager.clear();
        assert_eq!(manager.cached_bean_count(), 0);
        assert!(!Arc::ptr_eq(&first, &manager.bean_metadata("acme.Book")));
    }

    #[test]
    fn test_unconfigured_bean_has_no_constraints() {
        let manager = manager_with(book_mapping(), Arc::new(DefaultParameterNameProvider));
        assert!(!manager.bean_metadata("acme.Unknown").has_constraints());
    }
}
