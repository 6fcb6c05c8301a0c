//! The validator factory.
//!
//! Construction does all of the one-time work: resolving providers and
//! flags, aggregating constraint mappings and registering custom constraint
//! definitions. Afterwards the only shared state that changes is the
//! metadata manager cache.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::bootstrap::aggregator::MappingSourceAggregator;
use crate::bootstrap::loader::{run_restricted, ComponentKind, ComponentLoader, ComponentRegistry};
use crate::bootstrap::registrar::ConstraintDefinitionRegistrar;
use crate::core::mapping::SealedMappings;
use crate::core::method_validation::MethodValidationConfiguration;
use crate::core::providers::{
    ClockProvider, ConstraintValidatorFactory, DefaultConstraintValidatorFactory,
    DefaultMessageInterpolator, DefaultParameterNameProvider, DefaultScriptEvaluatorFactory,
    DefaultTraversableResolver, MessageInterpolator, ParameterNameProvider, ScriptEvaluatorFactory,
    SystemClockProvider, TraversableResolver,
};
use crate::core::registry::ConstraintRegistry;
use crate::core::value_extraction::ValueExtractorManager;
use crate::factory::configuration::ConfigurationState;
use crate::factory::context::ValidatorContext;
use crate::factory::errors::{FactoryError, FactoryResult};
use crate::factory::validator::{Validator, ValidatorSettings};
use crate::metadata::cache::MetadataManagerCache;
use crate::metadata::manager::MetadataManager;
use crate::metadata::provider::{MetadataProvider, ProgrammaticMetadataProvider, XmlMetadataProvider};
use crate::util::config::{keys, parse_bool, Properties};

/// Flags resolved from code and properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EffectiveConfiguration {
    pub fail_fast: bool,
    pub method_validation: MethodValidationConfiguration,
    pub traversable_resolver_result_cache: bool,
}

impl EffectiveConfiguration {
    /// Apply property overrides to the values set in code.
    ///
    /// Fail-fast enabled in code cannot be disabled by a property.
    pub fn resolve(configuration: &ConfigurationState) -> FactoryResult<Self> {
        let properties = configuration.properties();

        let fail_fast = resolve_fail_fast(properties, configuration.fail_fast)?;

        let programmatic = configuration.method_validation;
        let method_validation = MethodValidationConfiguration::builder()
            .allow_overriding_method_alter_parameter_constraint(resolve_flag(
                properties,
                keys::ALLOW_PARAMETER_CONSTRAINT_OVERRIDE,
                programmatic.is_allow_overriding_method_alter_parameter_constraint(),
            ))
            .allow_multiple_cascaded_validation_on_return_values(resolve_flag(
                properties,
                keys::ALLOW_MULTIPLE_CASCADED_VALIDATION_ON_RESULT,
                programmatic.is_allow_multiple_cascaded_validation_on_return_values(),
            ))
            .allow_parallel_methods_define_parameter_constraints(resolve_flag(
                properties,
                keys::ALLOW_PARALLEL_METHODS_DEFINE_PARAMETER_CONSTRAINTS,
                programmatic.is_allow_parallel_methods_define_parameter_constraints(),
            ))
            .build();

        let traversable_resolver_result_cache = resolve_flag(
            properties,
            keys::ENABLE_TRAVERSABLE_RESOLVER_RESULT_CACHE,
            configuration.traversable_resolver_result_cache,
        );

        Ok(EffectiveConfiguration {
            fail_fast,
            method_validation,
            traversable_resolver_result_cache,
        })
    }
}

fn resolve_fail_fast(properties: &Properties, programmatic: bool) -> FactoryResult<bool> {
    match properties.get(keys::FAIL_FAST) {
        Some(value) => {
            let configured = parse_bool(value);
            if programmatic && !configured {
                return Err(FactoryError::InconsistentFailFast);
            }
            Ok(configured)
        }
        None => Ok(programmatic),
    }
}

fn resolve_flag(properties: &Properties, key: &str, programmatic: bool) -> bool {
    properties
        .get(key)
        .map(|value| parse_bool(value))
        .unwrap_or(programmatic)
}

/// Creates validators sharing one set of constraint definitions.
pub struct ValidatorFactory {
    message_interpolator: Arc<dyn MessageInterpolator>,
    traversable_resolver: Arc<dyn TraversableResolver>,
    parameter_name_provider: Arc<dyn ParameterNameProvider>,
    clock_provider: Arc<dyn ClockProvider>,
    constraint_validator_factory: Arc<dyn ConstraintValidatorFactory>,
    script_evaluator_factory: Arc<dyn ScriptEvaluatorFactory>,
    value_extractor_manager: ValueExtractorManager,
    configuration: EffectiveConfiguration,
    registry: Arc<ConstraintRegistry>,
    mappings: SealedMappings,
    xml_provider: Option<Arc<XmlMetadataProvider>>,
    metadata_cache: MetadataManagerCache,
}

impl ValidatorFactory {
    /// Build a factory. Any error aborts construction.
    pub fn new(mut configuration: ConfigurationState) -> FactoryResult<Self> {
        let loader: Arc<dyn ComponentLoader> = match configuration.component_loader.take() {
            Some(loader) => loader,
            None => ComponentRegistry::global(),
        };

        let message_interpolator: Arc<dyn MessageInterpolator> =
            match configuration.message_interpolator.take() {
                Some(interpolator) => interpolator,
                None => Arc::new(DefaultMessageInterpolator),
            };
        let traversable_resolver: Arc<dyn TraversableResolver> =
            match configuration.traversable_resolver.take() {
                Some(resolver) => resolver,
                None => Arc::new(DefaultTraversableResolver),
            };
        let parameter_name_provider: Arc<dyn ParameterNameProvider> =
            match configuration.parameter_name_provider.take() {
                Some(provider) => provider,
                None => Arc::new(DefaultParameterNameProvider),
            };
        let clock_provider: Arc<dyn ClockProvider> = match configuration.clock_provider.take() {
            Some(provider) => provider,
            None => Arc::new(SystemClockProvider),
        };
        let constraint_validator_factory: Arc<dyn ConstraintValidatorFactory> =
            match configuration.constraint_validator_factory.take() {
                Some(factory) => factory,
                None => Arc::new(DefaultConstraintValidatorFactory::new()),
            };
        let value_extractor_manager =
            ValueExtractorManager::new(std::mem::take(&mut configuration.value_extractors));

        // Mapping documents are only parsed when there are any
        let xml_provider = if configuration.mapping_streams.is_empty() {
            None
        } else {
            let parser = configuration.mapping_parser.as_ref().ok_or(FactoryError::MissingMappingParser {
                streams: configuration.mapping_streams.len(),
            })?;
            let provider = XmlMetadataProvider::new(&configuration.mapping_streams, parser.as_ref())?;
            Some(Arc::new(provider))
        };

        let mappings = MappingSourceAggregator::new(loader.as_ref())
            .collect(&mut configuration)?
            .seal();

        let registry = Arc::new(ConstraintRegistry::new());
        ConstraintDefinitionRegistrar::register(&mappings, &registry)?;

        let effective = EffectiveConfiguration::resolve(&configuration)?;

        let script_evaluator_factory =
            resolve_script_evaluator_factory(&configuration, loader.as_ref())?;

        let factory = ValidatorFactory {
            message_interpolator,
            traversable_resolver,
            parameter_name_provider,
            clock_provider,
            constraint_validator_factory,
            script_evaluator_factory,
            value_extractor_manager,
            configuration: effective,
            registry,
            mappings,
            xml_provider,
            metadata_cache: MetadataManagerCache::new(),
        };
        factory.log_configuration();
        Ok(factory)
    }

    fn log_configuration(&self) {
        debug!(
            "Using {} as message interpolator",
            self.message_interpolator.provider_name()
        );
        debug!(
            "Using {} as traversable resolver",
            self.traversable_resolver.provider_name()
        );
        debug!(
            "Using {} as parameter name provider",
            self.parameter_name_provider.provider_name()
        );
        debug!("Using {} as clock provider", self.clock_provider.provider_name());
        debug!(
            "Using {} as script evaluator factory",
            self.script_evaluator_factory.provider_name()
        );
        info!(
            "Validator factory ready: {} mapping(s), {} constraint type(s), fail fast: {}",
            self.mappings.len(),
            self.registry.len(),
            self.configuration.fail_fast
        );
    }

    /// A validator with the factory's settings.
    pub fn validator(&self) -> Validator {
        self.create_validator(self.default_settings())
    }

    /// Start configuring a validator with per-validator overrides.
    pub fn using_context(&self) -> ValidatorContext<'_> {
        ValidatorContext::new(self)
    }

    pub(crate) fn default_settings(&self) -> ValidatorSettings {
        ValidatorSettings {
            message_interpolator: Arc::clone(&self.message_interpolator),
            traversable_resolver: Arc::clone(&self.traversable_resolver),
            parameter_name_provider: Arc::clone(&self.parameter_name_provider),
            clock_provider: Arc::clone(&self.clock_provider),
            constraint_validator_factory: Arc::clone(&self.constraint_validator_factory),
            script_evaluator_factory: Arc::clone(&self.script_evaluator_factory),
            value_extractor_manager: self.value_extractor_manager.clone(),
            fail_fast: self.configuration.fail_fast,
            method_validation: self.configuration.method_validation,
            traversable_resolver_result_cache: self.configuration.traversable_resolver_result_cache,
        }
    }

    pub(crate) fn create_validator(&self, settings: ValidatorSettings) -> Validator {
        let manager = self.metadata_cache.get_or_create(settings.cache_key(), |key| {
            MetadataManager::new(Arc::clone(&self.registry), self.metadata_providers(), key)
        });
        Validator::new(settings, manager)
    }

    fn metadata_providers(&self) -> Vec<Arc<dyn MetadataProvider>> {
        let mut providers: Vec<Arc<dyn MetadataProvider>> = Vec::new();
        if let Some(xml) = &self.xml_provider {
            providers.push(Arc::clone(xml) as Arc<dyn MetadataProvider>);
        }
        if !self.mappings.is_empty() {
            providers.push(Arc::new(ProgrammaticMetadataProvider::new(self.mappings.clone())));
        }
        providers
    }

    pub fn message_interpolator(&self) -> &Arc<dyn MessageInterpolator> {
        &self.message_interpolator
    }

    pub fn traversable_resolver(&self) -> &Arc<dyn TraversableResolver> {
        &self.traversable_resolver
    }

    pub fn parameter_name_provider(&self) -> &Arc<dyn ParameterNameProvider> {
        &self.parameter_name_provider
    }

    pub fn clock_provider(&self) -> &Arc<dyn ClockProvider> {
        &self.clock_provider
    }

    pub fn constraint_validator_factory(&self) -> &Arc<dyn ConstraintValidatorFactory> {
        &self.constraint_validator_factory
    }

    pub fn script_evaluator_factory(&self) -> &Arc<dyn ScriptEvaluatorFactory> {
        &self.script_evaluator_factory
    }

    pub fn is_fail_fast(&self) -> bool {
        self.configuration.fail_fast
    }

    pub fn method_validation_configuration(&self) -> MethodValidationConfiguration {
        self.configuration.method_validation
    }

    pub fn is_traversable_resolver_result_cache_enabled(&self) -> bool {
        self.configuration.traversable_resolver_result_cache
    }

    pub fn effective_configuration(&self) -> EffectiveConfiguration {
        self.configuration
    }

    pub fn value_extractor_manager(&self) -> &ValueExtractorManager {
        &self.value_extractor_manager
    }

    pub fn constraint_registry(&self) -> &ConstraintRegistry {
        &self.registry
    }

    pub fn constraint_mappings(&self) -> &SealedMappings {
        &self.mappings
    }

    pub fn metadata_cache(&self) -> &MetadataManagerCache {
        &self.metadata_cache
    }

    /// Access the factory as `T`. Only `ValidatorFactory` itself is supported.
    pub fn unwrap<T: Any>(&self) -> FactoryResult<&T> {
        (self as &dyn Any)
            .downcast_ref::<T>()
            .ok_or(FactoryError::UnsupportedUnwrap {
                type_name: std::any::type_name::<T>(),
            })
    }

    /// Release everything the factory and its validators cached.
    ///
    /// Validators must not be created while this runs.
    pub fn close(&self) {
        self.constraint_validator_factory.clear();
        self.registry.clear();
        self.metadata_cache.clear();
        self.script_evaluator_factory.clear();
        debug!("Validator factory closed");
    }
}

fn resolve_script_evaluator_factory(
    configuration: &ConfigurationState,
    loader: &dyn ComponentLoader,
) -> FactoryResult<Arc<dyn ScriptEvaluatorFactory>> {
    if let Some(factory) = &configuration.script_evaluator_factory {
        debug!("Using configured script evaluator factory {}", factory.provider_name());
        return Ok(Arc::clone(factory));
    }

    if let Some(name) = configuration.property(keys::SCRIPT_EVALUATOR_FACTORY_CLASSNAME) {
        let factory = run_restricted(ComponentKind::ScriptEvaluatorFactory, name, || {
            loader.load_script_evaluator_factory(name)
        })
        .map_err(|source| FactoryError::ScriptEvaluatorFactory {
            name: name.to_string(),
            source: Box::new(source),
        })?;
        debug!("Using script evaluator factory `{}`", name);
        return Ok(factory);
    }

    Ok(Arc::new(DefaultScriptEvaluatorFactory::new()))
}

impl fmt::Debug for ValidatorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorFactory")
            .field("message_interpolator", &self.message_interpolator.provider_name())
            .field("traversable_resolver", &self.traversable_resolver.provider_name())
            .field(
                "parameter_name_provider",
                &self.parameter_name_provider.provider_name(),
            )
            .field("clock_provider", &self.clock_provider.provider_name())
            .field(
                "script_evaluator_factory",
                &self.script_evaluator_factory.provider_name(),
            )
            .field("configuration", &self.configuration)
            .field("mappings", &self.mappings.len())
            .field("constraint_types", &self.registry.len())
            .field("cached_managers", &self.metadata_cache.len())
            .finish()
    }
}
