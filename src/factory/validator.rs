//! Validators handed out by the factory.

use std::fmt;
use std::sync::Arc;

use crate::core::method_validation::MethodValidationConfiguration;
use crate::core::providers::{
    ClockProvider, ConstraintValidatorFactory, MessageInterpolator, ParameterNameProvider,
    ScriptEvaluatorFactory, TraversableResolver,
};
use crate::core::value_extraction::ValueExtractorManager;
use crate::metadata::cache::CacheKey;
use crate::metadata::manager::{BeanMetadata, MetadataManager};

/// Everything a validator is configured with.
#[derive(Clone)]
pub(crate) struct ValidatorSettings {
    pub message_interpolator: Arc<dyn MessageInterpolator>,
    pub traversable_resolver: Arc<dyn TraversableResolver>,
    pub parameter_name_provider: Arc<dyn ParameterNameProvider>,
    pub clock_provider: Arc<dyn ClockProvider>,
    pub constraint_validator_factory: Arc<dyn ConstraintValidatorFactory>,
    pub script_evaluator_factory: Arc<dyn ScriptEvaluatorFactory>,
    pub value_extractor_manager: ValueExtractorManager,
    pub fail_fast: bool,
    pub method_validation: MethodValidationConfiguration,
    pub traversable_resolver_result_cache: bool,
}

impl ValidatorSettings {
    /// The part of the settings bean metadata depends on.
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(
            Arc::clone(&self.parameter_name_provider),
            self.value_extractor_manager.clone(),
            self.method_validation,
        )
    }
}

/// A configured validator.
///
/// Validators created under the same parameter name provider, value
/// extractors and method validation configuration share their metadata
/// manager.
pub struct Validator {
    settings: ValidatorSettings,
    metadata: Arc<MetadataManager>,
}

impl Validator {
    pub(crate) fn new(settings: ValidatorSettings, metadata: Arc<MetadataManager>) -> Self {
        Validator { settings, metadata }
    }

    /// Constraint metadata of a bean type.
    pub fn bean_metadata(&self, type_name: &str) -> Arc<BeanMetadata> {
        self.metadata.bean_metadata(type_name)
    }

    pub fn metadata_manager(&self) -> &Arc<MetadataManager> {
        &self.metadata
    }

    pub fn message_interpolator(&self) -> &Arc<dyn MessageInterpolator> {
        &self.settings.message_interpolator
    }

    pub fn traversable_resolver(&self) -> &Arc<dyn TraversableResolver> {
        &self.settings.traversable_resolver
    }

    pub fn parameter_name_provider(&self) -> &Arc<dyn ParameterNameProvider> {
        &self.settings.parameter_name_provider
    }

    pub fn clock_provider(&self) -> &Arc<dyn ClockProvider> {
        &self.settings.clock_provider
    }

    pub fn constraint_validator_factory(&self) -> &Arc<dyn ConstraintValidatorFactory> {
        &self.settings.constraint_validator_factory
    }

    pub fn script_evaluator_factory(&self) -> &Arc<dyn ScriptEvaluatorFactory> {
        &self.settings.script_evaluator_factory
    }

    pub fn value_extractor_manager(&self) -> &ValueExtractorManager {
        &self.settings.value_extractor_manager
    }

    pub fn is_fail_fast(&self) -> bool {
        self.settings.fail_fast
    }

    pub fn method_validation_configuration(&self) -> MethodValidationConfiguration {
        self.settings.method_validation
    }

    pub fn is_traversable_resolver_result_cache_enabled(&self) -> bool {
        self.settings.traversable_resolver_result_cache
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field(
                "message_interpolator",
                &self.settings.message_interpolator.provider_name(),
            )
            .field(
                "parameter_name_provider",
                &self.settings.parameter_name_provider.provider_name(),
            )
            .field("fail_fast", &self.settings.fail_fast)
            .field("method_validation", &self.settings.method_validation)
            .field(
                "traversable_resolver_result_cache",
                &self.settings.traversable_resolver_result_cache,
            )
            .field("metadata", &self.metadata)
            .finish()
    }
}
