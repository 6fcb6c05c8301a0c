//! Method validation relaxation flags.
//!
//! By default overriding methods may not alter parameter constraints,
//! return values may be marked for cascaded validation only once in a
//! hierarchy, and parallel methods may not define parameter constraints.
//! Each rule can be relaxed independently.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Method validation rules in effect for a factory or validator.
///
/// Part of the metadata cache key: metadata built under one set of rules is
/// not valid under another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodValidationConfiguration {
    allow_overriding_method_alter_parameter_constraint: bool,
    allow_multiple_cascaded_validation_on_return_values: bool,
    allow_parallel_methods_define_parameter_constraints: bool,
}

impl MethodValidationConfiguration {
    /// Start from the strict default rules.
    pub fn builder() -> MethodValidationConfigurationBuilder {
        MethodValidationConfigurationBuilder::default()
    }

    pub fn is_allow_overriding_method_alter_parameter_constraint(&self) -> bool {
        self.allow_overriding_method_alter_parameter_constraint
    }

    pub fn is_allow_multiple_cascaded_validation_on_return_values(&self) -> bool {
        self.allow_multiple_cascaded_validation_on_return_values
    }

    pub fn is_allow_parallel_methods_define_parameter_constraints(&self) -> bool {
        self.allow_parallel_methods_define_parameter_constraints
    }

    /// Continue building from this configuration.
    pub fn to_builder(self) -> MethodValidationConfigurationBuilder {
        MethodValidationConfigurationBuilder { config: self }
    }
}

impl fmt::Display for MethodValidationConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "parameter-override={}, multiple-cascade-on-return={}, parallel-parameter-constraints={}",
            self.allow_overriding_method_alter_parameter_constraint,
            self.allow_multiple_cascaded_validation_on_return_values,
            self.allow_parallel_methods_define_parameter_constraints
        )
    }
}

/// Builder for [`MethodValidationConfiguration`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodValidationConfigurationBuilder {
    config: MethodValidationConfiguration,
}

impl MethodValidationConfigurationBuilder {
    pub fn allow_overriding_method_alter_parameter_constraint(mut self, allow: bool) -> Self {
        self.config.allow_overriding_method_alter_parameter_constraint = allow;
        self
    }

    pub fn allow_multiple_cascaded_validation_on_return_values(mut self, allow: bool) -> Self {
        self.config.allow_multiple_cascaded_validation_on_return_values = allow;
        self
    }

    pub fn allow_parallel_methods_define_parameter_constraints(mut self, allow: bool) -> Self {
        self.config.allow_parallel_methods_define_parameter_constraints = allow;
        self
    }

    pub fn build(self) -> MethodValidationConfiguration {
        self.config
    }
}
