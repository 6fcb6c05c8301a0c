//! Provider traits consumed by the factory and the validators it creates.
//!
//! These are the seams to the parts of a validation engine that live outside
//! this crate. Every trait has a default implementation used when the
//! configuration does not supply one.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

use crate::core::constraint_type::ConstraintType;

/// Type name of a provider, for logging.
pub trait ProviderName {
    fn provider_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Turns constraint message templates into user-facing messages.
pub trait MessageInterpolator: ProviderName + Send + Sync {
    fn interpolate(&self, template: &str, constraint_type: ConstraintType) -> String;
}

/// Decides whether a property may be reached during graph traversal.
pub trait TraversableResolver: ProviderName + Send + Sync {
    fn is_reachable(&self, bean_type: &str, property: &str) -> bool;

    fn is_cascadable(&self, bean_type: &str, property: &str) -> bool;
}

/// Names the parameters of methods and constructors.
///
/// Parameter names end up in bean metadata, so metadata built for one
/// provider is never shared with another.
pub trait ParameterNameProvider: ProviderName + Send + Sync {
    fn parameter_names(&self, method: &str, arity: usize) -> Vec<String>;
}

/// Source of "now" for temporal constraints.
pub trait ClockProvider: ProviderName + Send + Sync {
    fn now(&self) -> SystemTime;
}

/// Creates constraint validator instances from descriptors.
pub trait ConstraintValidatorFactory: ProviderName + Send + Sync {
    /// Called before a validator instance is handed out.
    fn acquire(&self, validator: &str);

    /// Release cached validator instances.
    fn clear(&self) {}
}

/// Provides script evaluators for script-based constraints.
pub trait ScriptEvaluatorFactory: ProviderName + Send + Sync {
    /// Prepare an evaluator for a script language.
    fn prepare_evaluator(&self, language: &str);

    /// Release all prepared evaluators.
    fn clear(&self);
}

/// Returns message templates unchanged except for `{constraint}`.
#[derive(Debug, Default)]
pub struct DefaultMessageInterpolator;

impl ProviderName for DefaultMessageInterpolator {}

impl MessageInterpolator for DefaultMessageInterpolator {
    fn interpolate(&self, template: &str, constraint_type: ConstraintType) -> String {
        template.replace("{constraint}", constraint_type.simple_name())
    }
}

/// Everything is reachable and cascadable.
#[derive(Debug, Default)]
pub struct DefaultTraversableResolver;

impl ProviderName for DefaultTraversableResolver {}

impl TraversableResolver for DefaultTraversableResolver {
    fn is_reachable(&self, _bean_type: &str, _property: &str) -> bool {
        true
    }

    fn is_cascadable(&self, _bean_type: &str, _property: &str) -> bool {
        true
    }
}

/// Positional parameter names: `arg0`, `arg1`, ...
#[derive(Debug, Default)]
pub struct DefaultParameterNameProvider;

impl ProviderName for DefaultParameterNameProvider {}

impl ParameterNameProvider for DefaultParameterNameProvider {
    fn parameter_names(&self, _method: &str, arity: usize) -> Vec<String> {
        (0..arity).map(|i| format!("arg{}", i)).collect()
    }
}

/// Wall clock.
#[derive(Debug, Default)]
pub struct SystemClockProvider;

impl ProviderName for SystemClockProvider {}

impl ClockProvider for SystemClockProvider {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Tracks which validators have been instantiated.
#[derive(Debug, Default)]
pub struct DefaultConstraintValidatorFactory {
    instantiated: RwLock<HashSet<String>>,
}

impl DefaultConstraintValidatorFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct validators handed out since the last clear.
    pub fn instance_count(&self) -> usize {
        self.instantiated
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl ProviderName for DefaultConstraintValidatorFactory {}

impl ConstraintValidatorFactory for DefaultConstraintValidatorFactory {
    fn acquire(&self, validator: &str) {
        self.instantiated
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(validator.to_string());
    }

    fn clear(&self) {
        self.instantiated
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Caches one prepared evaluator per script language until cleared.
#[derive(Debug, Default)]
pub struct DefaultScriptEvaluatorFactory {
    prepared: RwLock<HashSet<String>>,
}

impl DefaultScriptEvaluatorFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Languages with a prepared evaluator.
    pub fn prepared_languages(&self) -> Vec<String> {
        let mut languages: Vec<_> = self
            .prepared
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect();
        languages.sort();
        languages
    }
}

impl ProviderName for DefaultScriptEvaluatorFactory {}

impl ScriptEvaluatorFactory for DefaultScriptEvaluatorFactory {
    fn prepare_evaluator(&self, language: &str) {
        self.prepared
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(language.to_ascii_lowercase());
    }

    fn clear(&self) {
        self.prepared
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
