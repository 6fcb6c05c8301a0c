//! Per-validator configuration overrides.

use std::sync::Arc;

use crate::core::providers::{
    ClockProvider, ConstraintValidatorFactory, MessageInterpolator, ParameterNameProvider,
    ScriptEvaluatorFactory, TraversableResolver,
};
use crate::core::value_extraction::ValueExtractorDescriptor;
use crate::factory::validator::{Validator, ValidatorSettings};
use crate::factory::validator_factory::ValidatorFactory;

/// Creates a validator with some of the factory's settings replaced.
///
/// Starts from the factory's resolved settings; anything not overridden is
/// inherited.
pub struct ValidatorContext<'f> {
    factory: &'f ValidatorFactory,
    settings: ValidatorSettings,
    additional_extractors: Vec<ValueExtractorDescriptor>,
}

impl<'f> ValidatorContext<'f> {
    pub(crate) fn new(factory: &'f ValidatorFactory) -> Self {
        ValidatorContext {
            factory,
            settings: factory.default_settings(),
            additional_extractors: Vec::new(),
        }
    }

    pub fn message_interpolator(mut self, interpolator: Arc<dyn MessageInterpolator>) -> Self {
        self.settings.message_interpolator = interpolator;
        self
    }

    pub fn traversable_resolver(mut self, resolver: Arc<dyn TraversableResolver>) -> Self {
        self.settings.traversable_resolver = resolver;
        self
    }

    /// Metadata is not shared with validators using another provider.
    pub fn parameter_name_provider(mut self, provider: Arc<dyn ParameterNameProvider>) -> Self {
        self.settings.parameter_name_provider = provider;
        self
    }

    pub fn clock_provider(mut self, provider: Arc<dyn ClockProvider>) -> Self {
        self.settings.clock_provider = provider;
        self
    }

    pub fn constraint_validator_factory(mut self, factory: Arc<dyn ConstraintValidatorFactory>) -> Self {
        self.settings.constraint_validator_factory = factory;
        self
    }

    pub fn script_evaluator_factory(mut self, factory: Arc<dyn ScriptEvaluatorFactory>) -> Self {
        self.settings.script_evaluator_factory = factory;
        self
    }

    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.settings.fail_fast = fail_fast;
        self
    }

    pub fn allow_overriding_method_alter_parameter_constraint(mut self, allow: bool) -> Self {
        self.settings.method_validation = self
            .settings
            .method_validation
            .to_builder()
            .allow_overriding_method_alter_parameter_constraint(allow)
            .build();
        self
    }

    pub fn allow_multiple_cascaded_validation_on_return_values(mut self, allow: bool) -> Self {
        self.settings.method_validation = self
            .settings
            .method_validation
            .to_builder()
            .allow_multiple_cascaded_validation_on_return_values(allow)
            .build();
        self
    }

    pub fn allow_parallel_methods_define_parameter_constraints(mut self, allow: bool) -> Self {
        self.settings.method_validation = self
            .settings
            .method_validation
            .to_builder()
            .allow_parallel_methods_define_parameter_constraints(allow)
            .build();
        self
    }

    pub fn enable_traversable_resolver_result_cache(mut self, enabled: bool) -> Self {
        self.settings.traversable_resolver_result_cache = enabled;
        self
    }

    /// Add a value extractor on top of the factory's extractors.
    pub fn add_value_extractor(mut self, extractor: ValueExtractorDescriptor) -> Self {
        self.additional_extractors.push(extractor);
        self
    }

    /// Create the validator.
    pub fn validator(mut self) -> Validator {
        if !self.additional_extractors.is_empty() {
            self.settings.value_extractor_manager = self
                .settings
                .value_extractor_manager
                .with_additional(self.additional_extractors);
        }
        self.factory.create_validator(self.settings)
    }
}
