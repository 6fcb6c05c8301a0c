//! Programmatic factory configuration.
//!
//! `ConfigurationState` carries everything a factory is built from: provider
//! instances, flags set in code, programmatic mappings, mapping streams and
//! string properties. Properties override the corresponding values set in
//! code when the factory resolves its settings.

use std::fmt;
use std::sync::Arc;

use crate::bootstrap::loader::ComponentLoader;
use crate::core::mapping::ConstraintMapping;
use crate::core::method_validation::MethodValidationConfiguration;
use crate::core::providers::{
    ClockProvider, ConstraintValidatorFactory, MessageInterpolator, ParameterNameProvider,
    ScriptEvaluatorFactory, TraversableResolver,
};
use crate::core::value_extraction::ValueExtractorDescriptor;
use crate::metadata::provider::{MappingStream, MappingStreamParser};
use crate::util::config::Properties;

/// Input to [`ValidatorFactory::new`](crate::factory::ValidatorFactory::new).
pub struct ConfigurationState {
    pub(crate) message_interpolator: Option<Arc<dyn MessageInterpolator>>,
    pub(crate) traversable_resolver: Option<Arc<dyn TraversableResolver>>,
    pub(crate) parameter_name_provider: Option<Arc<dyn ParameterNameProvider>>,
    pub(crate) clock_provider: Option<Arc<dyn ClockProvider>>,
    pub(crate) constraint_validator_factory: Option<Arc<dyn ConstraintValidatorFactory>>,
    pub(crate) script_evaluator_factory: Option<Arc<dyn ScriptEvaluatorFactory>>,
    pub(crate) value_extractors: Vec<ValueExtractorDescriptor>,
    pub(crate) mapping_streams: Vec<MappingStream>,
    pub(crate) mapping_parser: Option<Arc<dyn MappingStreamParser>>,
    pub(crate) component_loader: Option<Arc<dyn ComponentLoader>>,
    pub(crate) fail_fast: bool,
    pub(crate) method_validation: MethodValidationConfiguration,
    pub(crate) traversable_resolver_result_cache: bool,
    programmatic_mappings: Vec<ConstraintMapping>,
    properties: Properties,
}

impl ConfigurationState {
    /// Empty configuration: default providers, no mappings, no properties.
    pub fn new() -> Self {
        ConfigurationState {
            message_interpolator: None,
            traversable_resolver: None,
            parameter_name_provider: None,
            clock_provider: None,
            constraint_validator_factory: None,
            script_evaluator_factory: None,
            value_extractors: Vec::new(),
            mapping_streams: Vec::new(),
            mapping_parser: None,
            component_loader: None,
            fail_fast: false,
            method_validation: MethodValidationConfiguration::default(),
            traversable_resolver_result_cache: true,
            programmatic_mappings: Vec::new(),
            properties: Properties::new(),
        }
    }

    pub fn with_message_interpolator(mut self, interpolator: Arc<dyn MessageInterpolator>) -> Self {
        self.message_interpolator = Some(interpolator);
        self
    }

    pub fn with_traversable_resolver(mut self, resolver: Arc<dyn TraversableResolver>) -> Self {
        self.traversable_resolver = Some(resolver);
        self
    }

    pub fn with_parameter_name_provider(mut self, provider: Arc<dyn ParameterNameProvider>) -> Self {
        self.parameter_name_provider = Some(provider);
        self
    }

    pub fn with_clock_provider(mut self, provider: Arc<dyn ClockProvider>) -> Self {
        self.clock_provider = Some(provider);
        self
    }

    pub fn with_constraint_validator_factory(
        mut self,
        factory: Arc<dyn ConstraintValidatorFactory>,
    ) -> Self {
        self.constraint_validator_factory = Some(factory);
        self
    }

    /// Use this script evaluator factory. Takes precedence over
    /// `validator.script_evaluator_factory_classname`.
    pub fn with_script_evaluator_factory(mut self, factory: Arc<dyn ScriptEvaluatorFactory>) -> Self {
        self.script_evaluator_factory = Some(factory);
        self
    }

    /// Add a value extractor on top of the defaults.
    pub fn with_value_extractor(mut self, extractor: ValueExtractorDescriptor) -> Self {
        self.value_extractors.push(extractor);
        self
    }

    /// Add a mapping document. Requires a mapping parser.
    pub fn with_mapping_stream(mut self, stream: MappingStream) -> Self {
        self.mapping_streams.push(stream);
        self
    }

    pub fn with_mapping_parser(mut self, parser: Arc<dyn MappingStreamParser>) -> Self {
        self.mapping_parser = Some(parser);
        self
    }

    /// Load named components with this loader instead of the global registry.
    pub fn with_component_loader(mut self, loader: Arc<dyn ComponentLoader>) -> Self {
        self.component_loader = Some(loader);
        self
    }

    /// Add a programmatic constraint mapping.
    pub fn with_mapping(mut self, mapping: ConstraintMapping) -> Self {
        self.programmatic_mappings.push(mapping);
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_method_validation(mut self, configuration: MethodValidationConfiguration) -> Self {
        self.method_validation = configuration;
        self
    }

    pub fn with_traversable_resolver_result_cache(mut self, enabled: bool) -> Self {
        self.traversable_resolver_result_cache = enabled;
        self
    }

    /// Set a property. A later value for the same key replaces the earlier one.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Set several properties.
    pub fn with_properties(mut self, properties: impl IntoIterator<Item = (String, String)>) -> Self {
        self.properties.extend(properties);
        self
    }

    /// Value of a property, if set.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn programmatic_mappings(&self) -> &[ConstraintMapping] {
        &self.programmatic_mappings
    }

    /// Hand the programmatic mappings over to aggregation.
    pub(crate) fn take_programmatic_mappings(&mut self) -> Vec<ConstraintMapping> {
        std::mem::take(&mut self.programmatic_mappings)
    }
}

impl Default for ConfigurationState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConfigurationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationState")
            .field("fail_fast", &self.fail_fast)
            .field("method_validation", &self.method_validation)
            .field(
                "traversable_resolver_result_cache",
                &self.traversable_resolver_result_cache,
            )
            .field("value_extractors", &self.value_extractors.len())
            .field("mapping_streams", &self.mapping_streams.len())
            .field("programmatic_mappings", &self.programmatic_mappings.len())
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}
