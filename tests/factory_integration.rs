//! Integration tests for validator factory bootstrap and metadata caching.
//!
//! These go through the public API only: contributors are registered on a
//! component registry and named in properties, the way an application
//! would wire them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use validator_factory::core::providers::DefaultParameterNameProvider;
use validator_factory::core::{ConstraintRegistry, ValueExtractorDescriptor};
use validator_factory::util::config::keys;
use validator_factory::{
    CacheKey, ComponentRegistry, ConfigurationState, ConstraintMapping, ConstraintMappingBuilder,
    ConstraintMappingContributor, ConstraintType, FactoryError, MetadataManager,
    ValidatorDescriptor, ValidatorFactory,
};

/// Defines each of its constraint types with a single validator.
struct Defining(Vec<&'static str>);

impl ConstraintMappingContributor for Defining {
    fn create_constraint_mappings(&self, builder: &mut ConstraintMappingBuilder<'_>) {
        let mapping = builder.add_constraint_mapping();
        for ty in &self.0 {
            mapping
                .constraint_definition(ConstraintType::new(ty))
                .include_existing_validators(false)
                .validated_by(ValidatorDescriptor::new(format!("{}Validator", ty), "Object"));
        }
    }
}

fn registry_with(contributors: &[(&'static str, Vec<&'static str>)]) -> Arc<ComponentRegistry> {
    let mut registry = ComponentRegistry::named("integration registry");
    for (name, types) in contributors {
        let types = types.clone();
        registry.register_contributor(*name, move || Ok(Box::new(Defining(types.clone()))));
    }
    Arc::new(registry)
}

fn base_configuration() -> ConfigurationState {
    ConfigurationState::new().with_component_loader(registry_with(&[]))
}

// ============================================================================
// Fail-fast resolution
// ============================================================================

#[test]
fn test_programmatic_fail_fast_with_absent_or_true_property() {
    for property in [None, Some("true"), Some("True")] {
        let mut configuration = base_configuration().with_fail_fast(true);
        if let Some(value) = property {
            configuration = configuration.with_property(keys::FAIL_FAST, value);
        }

        let factory = ValidatorFactory::new(configuration).unwrap();
        assert!(factory.is_fail_fast(), "property {:?}", property);
        assert!(factory.validator().is_fail_fast());
    }
}

#[test]
fn test_programmatic_fail_fast_contradicted_by_property() {
    let configuration = base_configuration()
        .with_fail_fast(true)
        .with_property(keys::FAIL_FAST, "false");

    let err = ValidatorFactory::new(configuration).unwrap_err();
    assert!(matches!(err, FactoryError::InconsistentFailFast));
    assert!(err.to_diagnostic().format(false).contains(keys::FAIL_FAST));
}

#[test]
fn test_property_enables_fail_fast() {
    let factory =
        ValidatorFactory::new(base_configuration().with_property(keys::FAIL_FAST, "true")).unwrap();
    assert!(factory.is_fail_fast());
}

// ============================================================================
// Constraint definition registration
// ============================================================================

#[test]
fn test_duplicate_definition_fails_in_either_order() {
    let registry = registry_with(&[
        ("it.First", vec!["it.Shared", "it.OnlyFirst"]),
        ("it.Second", vec!["it.OnlySecond", "it.Shared"]),
    ]);

    for names in ["it.First,it.Second", "it.Second,it.First"] {
        let configuration = ConfigurationState::new()
            .with_component_loader(registry.clone())
            .with_property(keys::CONSTRAINT_MAPPING_CONTRIBUTORS, names);

        match ValidatorFactory::new(configuration) {
            Err(FactoryError::DuplicateConstraintDefinition {
                constraint_type, ..
            }) => assert_eq!(constraint_type, ConstraintType::new("it.Shared"), "order {}", names),
            Err(other) => panic!("order {}: unexpected error {}", names, other),
            Ok(_) => panic!("order {}: construction should fail", names),
        }
    }
}

#[test]
fn test_programmatic_and_contributed_duplicate() {
    let mut mapping = ConstraintMapping::new();
    mapping.constraint_definition(ConstraintType::new("it.Isbn"));

    let configuration = ConfigurationState::new()
        .with_component_loader(registry_with(&[("it.Books", vec!["it.Isbn"])]))
        .with_mapping(mapping)
        .with_property(keys::CONSTRAINT_MAPPING_CONTRIBUTORS, "it.Books");

    let err = ValidatorFactory::new(configuration).unwrap_err();
    let message = err.to_diagnostic().format(false);
    assert!(message.contains("it.Isbn"));
    assert!(message.contains("property-configured contributor `it.Books`"));
}

#[test]
fn test_disjoint_contributors_register_union() {
    let contributors: Vec<(&'static str, Vec<&'static str>)> = vec![
        ("it.A", vec!["it.A1", "it.A2"]),
        ("it.B", vec!["it.B1"]),
        ("it.C", vec!["it.C1", "it.C2", "it.C3"]),
    ];
    let configuration = ConfigurationState::new()
        .with_component_loader(registry_with(&contributors))
        .with_property(keys::CONSTRAINT_MAPPING_CONTRIBUTORS, " it.A , it.B,it.C ,");

    let factory = ValidatorFactory::new(configuration).unwrap();
    let registry = factory.constraint_registry();

    assert_eq!(factory.constraint_mappings().len(), 3);
    assert_eq!(
        registry.len(),
        ConstraintRegistry::builtin_types().count() + 6
    );
    for (_, types) in &contributors {
        for ty in types {
            assert_eq!(
                registry.validator_descriptors(ConstraintType::new(ty)),
                vec![ValidatorDescriptor::new(format!("{}Validator", ty), "Object")]
            );
        }
    }
}

#[test]
fn test_unknown_contributor_fails_construction() {
    let configuration = ConfigurationState::new()
        .with_component_loader(registry_with(&[("it.Known", vec!["it.K"])]))
        .with_property(keys::CONSTRAINT_MAPPING_CONTRIBUTORS, "it.Known,it.Unknown");

    match ValidatorFactory::new(configuration) {
        Err(FactoryError::ComponentLoad { name, .. }) => assert_eq!(name, "it.Unknown"),
        Err(other) => panic!("unexpected error {}", other),
        Ok(_) => panic!("construction should fail"),
    }
}

#[test]
fn test_empty_contributor_entry_fails_construction() {
    let configuration = ConfigurationState::new()
        .with_component_loader(registry_with(&[("it.A", vec!["it.A1"]), ("it.B", vec!["it.B1"])]))
        .with_property(keys::CONSTRAINT_MAPPING_CONTRIBUTORS, "it.A,,it.B");

    match ValidatorFactory::new(configuration) {
        Err(FactoryError::ComponentLoad { name, .. }) => assert!(name.is_empty()),
        Err(other) => panic!("unexpected error {}", other),
        Ok(_) => panic!("construction should fail"),
    }
}

#[test]
fn test_cloned_mapping_is_registered_separately() {
    let mut template = ConstraintMapping::new();
    template
        .bean("it.Book")
        .field("title", ConstraintType::new("constraints.NotBlank"));
    let mut extended = template.clone();
    extended
        .constraint_definition(ConstraintType::new("it.Isbn"))
        .validated_by(ValidatorDescriptor::new("it.IsbnValidator", "String"));

    let factory = ValidatorFactory::new(
        base_configuration()
            .with_mapping(template)
            .with_mapping(extended),
    )
    .unwrap();

    assert_eq!(factory.constraint_mappings().len(), 2);
    assert!(factory
        .constraint_registry()
        .contains(ConstraintType::new("it.Isbn")));
}

#[test]
fn test_global_registry_is_fallback_loader() {
    ComponentRegistry::register_global(|registry| {
        registry.register_contributor("it.GlobalOnly", || {
            Ok(Box::new(Defining(vec!["it.FromGlobal"])))
        });
    });

    let configuration = ConfigurationState::new()
        .with_property(keys::CONSTRAINT_MAPPING_CONTRIBUTORS, "it.GlobalOnly");
    let factory = ValidatorFactory::new(configuration).unwrap();

    assert!(factory
        .constraint_registry()
        .contains(ConstraintType::new("it.FromGlobal")));
}

// ============================================================================
// Metadata manager caching
// ============================================================================

#[test]
fn test_same_configuration_shares_metadata_manager() {
    let factory = ValidatorFactory::new(base_configuration()).unwrap();

    let managers: Vec<_> = (0..5)
        .map(|_| Arc::clone(factory.validator().metadata_manager()))
        .collect();

    for manager in &managers[1..] {
        assert!(Arc::ptr_eq(&managers[0], manager));
    }
    assert_eq!(factory.metadata_cache().len(), 1);
}

#[test]
fn test_different_parameter_name_provider_gets_own_manager() {
    let factory = ValidatorFactory::new(base_configuration()).unwrap();

    let default = factory.validator();
    let custom = factory
        .using_context()
        .parameter_name_provider(Arc::new(DefaultParameterNameProvider))
        .validator();

    assert!(!Arc::ptr_eq(default.metadata_manager(), custom.metadata_manager()));
}

#[test]
fn test_message_interpolator_is_not_part_of_key() {
    let factory = ValidatorFactory::new(base_configuration()).unwrap();

    let custom = factory
        .using_context()
        .message_interpolator(Arc::clone(factory.message_interpolator()))
        .fail_fast(true)
        .validator();

    assert!(Arc::ptr_eq(
        custom.metadata_manager(),
        factory.validator().metadata_manager()
    ));
}

#[test]
fn test_value_extractors_compared_by_value() {
    let extractor = ValueExtractorDescriptor::new("it.Box", 0, "it.BoxExtractor");
    let factory = ValidatorFactory::new(base_configuration()).unwrap();

    let first = factory
        .using_context()
        .add_value_extractor(extractor.clone())
        .validator();
    let second = factory
        .using_context()
        .add_value_extractor(extractor)
        .validator();

    assert!(Arc::ptr_eq(first.metadata_manager(), second.metadata_manager()));
    assert_eq!(factory.metadata_cache().len(), 1);
}

#[test]
fn test_concurrent_validator_creation_observes_one_manager() {
    const THREADS: usize = 50;
    let factory = ValidatorFactory::new(base_configuration()).unwrap();

    let managers: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| scope.spawn(|| Arc::clone(factory.validator().metadata_manager())))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(factory.metadata_cache().len(), 1);
    let cached = factory.validator();
    for manager in &managers {
        assert!(Arc::ptr_eq(manager, cached.metadata_manager()));
    }
}

#[test]
fn test_close_then_lookup_rebuilds() {
    let factory = ValidatorFactory::new(base_configuration()).unwrap();
    let builds = AtomicUsize::new(0);
    let key = || {
        CacheKey::new(
            Arc::clone(factory.parameter_name_provider()),
            factory.value_extractor_manager().clone(),
            factory.method_validation_configuration(),
        )
    };
    let build = |key: &CacheKey| {
        builds.fetch_add(1, Ordering::SeqCst);
        MetadataManager::new(Arc::new(ConstraintRegistry::new()), Vec::new(), key)
    };

    let before = factory.metadata_cache().get_or_create(key(), build);
    factory.metadata_cache().get_or_create(key(), build);
    assert_eq!(builds.load(Ordering::SeqCst), 1);

    factory.close();
    assert!(factory.metadata_cache().is_empty());

    let after = factory.metadata_cache().get_or_create(key(), build);
    assert_eq!(builds.load(Ordering::SeqCst), 2);
    assert!(!Arc::ptr_eq(&before, &after));
}

#[test]
fn test_bean_metadata_through_validator() {
    let mut mapping = ConstraintMapping::new();
    mapping
        .bean("it.Order")
        .field("customer", ConstraintType::new("constraints.NotNull"))
        .parameter("ship", 1, 2, ConstraintType::new("constraints.Future"));

    let factory = ValidatorFactory::new(base_configuration().with_mapping(mapping)).unwrap();
    let metadata = factory.validator().bean_metadata("it.Order");

    let names: Vec<_> = metadata
        .constraints()
        .iter()
        .map(|c| c.element_name.as_str())
        .collect();
    assert_eq!(names, vec!["customer", "ship.arg1"]);
    assert!(metadata.constraints().iter().all(|c| !c.validators.is_empty()));
}
