//! Factory bootstrap error types and diagnostics.

use thiserror::Error;

use crate::bootstrap::loader::ComponentKind;
use crate::core::constraint_type::ConstraintType;
use crate::core::mapping::MappingContributorSource;
use crate::util::config::keys;
use crate::util::diagnostic::Diagnostic;

/// Result alias for factory operations.
pub type FactoryResult<T> = Result<T, FactoryError>;

/// Error raised while bootstrapping or using a validator factory.
#[derive(Debug, Error, miette::Diagnostic)]
pub enum FactoryError {
    #[error(
        "inconsistent fail-fast configuration: enabled programmatically but disabled by `{key}`",
        key = keys::FAIL_FAST
    )]
    #[diagnostic(
        code(validator_factory::config::inconsistent_fail_fast),
        help("Remove the property or stop enabling fail-fast programmatically")
    )]
    InconsistentFailFast,

    #[error("constraint `{constraint_type}` has already been configured")]
    #[diagnostic(code(validator_factory::mapping::duplicate_definition))]
    DuplicateConstraintDefinition {
        constraint_type: ConstraintType,
        origin: MappingContributorSource,
    },

    #[error("unable to load {kind} `{name}`: {reason}")]
    #[diagnostic(code(validator_factory::loader::component_load))]
    ComponentLoad {
        kind: ComponentKind,
        name: String,
        reason: String,
    },

    #[error("unable to instantiate script evaluator factory `{name}`")]
    #[diagnostic(code(validator_factory::loader::script_evaluator_factory))]
    ScriptEvaluatorFactory {
        name: String,
        #[source]
        source: Box<FactoryError>,
    },

    #[error("{streams} mapping stream(s) configured but no mapping parser is set")]
    #[diagnostic(
        code(validator_factory::xml::missing_parser),
        help("Supply a parser with `ConfigurationState::with_mapping_parser`")
    )]
    MissingMappingParser { streams: usize },

    #[error("failed to parse mapping stream `{stream}`: {message}")]
    #[diagnostic(code(validator_factory::xml::parse))]
    MappingParse { stream: String, message: String },

    #[error("type `{type_name}` is not supported for unwrapping")]
    #[diagnostic(code(validator_factory::unwrap::unsupported))]
    UnsupportedUnwrap { type_name: &'static str },
}

impl FactoryError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            FactoryError::InconsistentFailFast => Diagnostic::error(self.to_string())
                .with_context(format!(
                    "`{}` resolves to false while fail-fast was enabled in code",
                    keys::FAIL_FAST
                ))
                .with_suggestion(format!("Set `{}` to true or remove it", keys::FAIL_FAST))
                .with_suggestion("Stop enabling fail-fast programmatically"),

            FactoryError::DuplicateConstraintDefinition {
                constraint_type,
                origin,
            } => Diagnostic::error(format!(
                "constraint `{}` is defined more than once",
                constraint_type
            ))
            .with_context(format!("second definition comes from {}", origin))
            .with_suggestion(format!(
                "Keep a single definition of `{}` and use `include_existing_validators` to extend it",
                constraint_type.simple_name()
            )),

            FactoryError::ComponentLoad { kind, name, reason } => {
                let mut diag = Diagnostic::error(format!("could not load {} `{}`", kind, name))
                    .with_context(reason.clone());
                if *kind == ComponentKind::MappingContributor {
                    diag = diag.with_context(format!(
                        "named in `{}`",
                        keys::CONSTRAINT_MAPPING_CONTRIBUTORS
                    ));
                }
                diag.with_suggestion("Check that the name is spelled correctly")
                    .with_suggestion("Ensure the component is registered with the component loader")
            }

            FactoryError::ScriptEvaluatorFactory { name, source } => {
                Diagnostic::error(self.to_string())
                    .with_context(source.to_string())
                    .with_context(format!(
                        "`{}` = `{}`",
                        keys::SCRIPT_EVALUATOR_FACTORY_CLASSNAME,
                        name
                    ))
                    .with_suggestion("Register the factory or remove the property to use the default")
            }

            FactoryError::MissingMappingParser { .. } => Diagnostic::error(self.to_string())
                .with_suggestion("Configure a mapping parser or drop the mapping streams"),

            FactoryError::MappingParse { stream, message } => {
                Diagnostic::error(format!("invalid mapping stream `{}`", stream))
                    .with_context(message.clone())
            }

            FactoryError::UnsupportedUnwrap { type_name } => {
                Diagnostic::error(self.to_string()).with_context(format!(
                    "only the factory type itself can be unwrapped, not `{}`",
                    type_name
                ))
            }
        }
    }
}
