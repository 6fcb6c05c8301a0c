//! Mapping source aggregation.
//!
//! Constraint mappings come from three places, gathered in this order:
//! 1. Programmatic mappings handed over on the configuration
//! 2. Contributors found through component discovery
//! 3. Contributors named in the `validator.constraint_mapping_contributors` property
//!
//! Programmatic mappings go first so that everything added later is
//! registered after them and conflicts are reported against the later source.

use tracing::{debug, info};

use crate::bootstrap::loader::{run_restricted, ComponentKind, ComponentLoader};
use crate::core::mapping::{ConstraintMapping, MappingContributorSource, MappingSet};
use crate::factory::configuration::ConfigurationState;
use crate::factory::errors::{FactoryError, FactoryResult};
use crate::util::config::{keys, split_names};

/// Contributes constraint mappings during factory bootstrap.
pub trait ConstraintMappingContributor: Send + Sync {
    /// Add mappings through the builder.
    fn create_constraint_mappings(&self, builder: &mut ConstraintMappingBuilder<'_>);
}

/// Handed to contributors; appends new mappings to the aggregate set.
pub struct ConstraintMappingBuilder<'a> {
    mappings: &'a mut MappingSet,
    source: MappingContributorSource,
    added: usize,
}

impl<'a> ConstraintMappingBuilder<'a> {
    fn new(mappings: &'a mut MappingSet, source: MappingContributorSource) -> Self {
        ConstraintMappingBuilder {
            mappings,
            source,
            added: 0,
        }
    }

    /// Create a new mapping in the aggregate set and return it for configuration.
    pub fn add_constraint_mapping(&mut self) -> &mut ConstraintMapping {
        self.added += 1;
        self.mappings.push_new(self.source.clone())
    }

    /// Number of mappings this builder has added.
    pub fn added(&self) -> usize {
        self.added
    }
}

/// Collects constraint mappings from every configured source.
pub struct MappingSourceAggregator<'a> {
    loader: &'a dyn ComponentLoader,
}

impl<'a> MappingSourceAggregator<'a> {
    pub fn new(loader: &'a dyn ComponentLoader) -> Self {
        MappingSourceAggregator { loader }
    }

    /// Gather all mappings into one set.
    ///
    /// A contributor name that cannot be loaded fails the whole collection.
    pub fn collect(&self, configuration: &mut ConfigurationState) -> FactoryResult<MappingSet> {
        let mut mappings = MappingSet::new();

        let programmatic = configuration.take_programmatic_mappings();
        let programmatic_count = programmatic.len();
        for mapping in programmatic {
            mappings.insert(mapping);
        }
        debug!("Collected {} programmatic constraint mapping(s)", programmatic_count);

        let discovered = run_restricted(
            ComponentKind::MappingContributor,
            self.loader.loader_name(),
            || self.loader.discover_contributors(),
        )?;
        for (name, contributor) in discovered {
            let source = MappingContributorSource::Discovered(name);
            Self::contribute(contributor.as_ref(), &mut mappings, source);
        }

        if let Some(value) = configuration.property(keys::CONSTRAINT_MAPPING_CONTRIBUTORS) {
            for name in split_names(value) {
                if name.is_empty() {
                    return Err(FactoryError::ComponentLoad {
                        kind: ComponentKind::MappingContributor,
                        name,
                        reason: "empty entry in the contributor list".to_string(),
                    });
                }
                let contributor = run_restricted(ComponentKind::MappingContributor, &name, || {
                    self.loader.load_contributor(&name)
                })?;
                let source = MappingContributorSource::PropertyNamed(name);
                Self::contribute(contributor.as_ref(), &mut mappings, source);
            }
        }

        info!("Aggregated {} constraint mapping(s)", mappings.len());
        Ok(mappings)
    }

    fn contribute(
        contributor: &dyn ConstraintMappingContributor,
        mappings: &mut MappingSet,
        source: MappingContributorSource,
    ) {
        let mut builder = ConstraintMappingBuilder::new(mappings, source.clone());
        contributor.create_constraint_mappings(&mut builder);
        debug!("{} added {} mapping(s)", source, builder.added());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::loader::ComponentRegistry;
    use crate::core::constraint_type::ConstraintType;
    use crate::test_support::DefiningContributor;

    fn loader() -> ComponentRegistry {
        let mut registry = ComponentRegistry::new();
        registry.register_discoverable_contributor("acme.Discovered", || {
            Ok(Box::new(DefiningContributor::new(&["acme.FromDiscovery"])))
        });
        registry.register_contributor("acme.Named", || {
            Ok(Box::new(DefiningContributor::new(&["acme.FromProperty"])))
        });
        registry
    }

    fn first_types(mappings: &MappingSet) -> Vec<&'static str> {
        mappings
            .iter()
            .flat_map(|m| m.constraint_definition_contributions())
            .map(|c| c.constraint_type().name())
            .collect()
    }

    #[test]
    fn test_collects_in_source_order() {
        let mut programmatic = ConstraintMapping::new();
        programmatic.constraint_definition(ConstraintType::new("acme.Programmatic"));

        let mut configuration = ConfigurationState::new()
            .with_mapping(programmatic)
            .with_property(keys::CONSTRAINT_MAPPING_CONTRIBUTORS, "acme.Named");

        let loader = loader();
        let mappings = MappingSourceAggregator::new(&loader)
            .collect(&mut configuration)
            .unwrap();

        assert_eq!(
            first_types(&mappings),
            vec!["acme.Programmatic", "acme.FromDiscovery", "acme.FromProperty"]
        );
    }

    #[test]
    fn test_mappings_tagged_with_source() {
        let mut configuration = ConfigurationState::new()
            .with_property(keys::CONSTRAINT_MAPPING_CONTRIBUTORS, "acme.Named");

        let loader = loader();
        let mappings = MappingSourceAggregator::new(&loader)
            .collect(&mut configuration)
            .unwrap();

        let sources: Vec<_> = mappings.iter().map(|m| m.source().clone()).collect();
        assert_eq!(
            sources,
            vec![
                MappingContributorSource::Discovered("acme.Discovered".to_string()),
                MappingContributorSource::PropertyNamed("acme.Named".to_string()),
            ]
        );
    }

    #[test]
    fn test_repeated_property_name_loaded_once() {
        let mut configuration = ConfigurationState::new().with_property(
            keys::CONSTRAINT_MAPPING_CONTRIBUTORS,
            "acme.Named, acme.Named",
        );

        let loader = loader();
        let mappings = MappingSourceAggregator::new(&loader)
            .collect(&mut configuration)
            .unwrap();

        assert_eq!(mappings.len(), 2);
    }

    #[test]
    fn test_empty_contributor_entry_fails() {
        let mut configuration = ConfigurationState::new()
            .with_property(keys::CONSTRAINT_MAPPING_CONTRIBUTORS, "acme.Named,,acme.Named");

        let loader = loader();
        let err = MappingSourceAggregator::new(&loader)
            .collect(&mut configuration)
            .unwrap_err();

        assert!(matches!(
            err,
            FactoryError::ComponentLoad { ref name, kind: ComponentKind::MappingContributor, .. }
                if name.is_empty()
        ));
    }

    #[test]
    fn test_trailing_comma_is_ignored() {
        let mut configuration = ConfigurationState::new()
            .with_property(keys::CONSTRAINT_MAPPING_CONTRIBUTORS, "acme.Named,");

        let loader = loader();
        let mappings = MappingSourceAggregator::new(&loader)
            .collect(&mut configuration)
            .unwrap();

        assert_eq!(mappings.len(), 2);
    }

    #[test]
    fn test_unknown_contributor_fails() {
        let mut configuration = ConfigurationState::new().with_property(
            keys::CONSTRAINT_MAPPING_CONTRIBUTORS,
            "acme.Named,acme.DoesNotExist",
        );

        let loader = loader();
        let err = MappingSourceAggregator::new(&loader)
            .collect(&mut configuration)
            .unwrap_err();

        assert!(matches!(
            err,
            FactoryError::ComponentLoad { ref name, .. } if name == "acme.DoesNotExist"
        ));
    }

    #[test]
    fn test_empty_configuration() {
        let mut configuration = ConfigurationState::new();
        let loader = ComponentRegistry::new();
        let mappings = MappingSourceAggregator::new(&loader)
            .collect(&mut configuration)
            .unwrap();
        assert!(mappings.is_empty());
    }
}
