//! The validator factory and the configuration it is built from.

pub mod configuration;
pub mod context;
pub mod errors;
pub mod validator;
pub mod validator_factory;

pub use configuration::ConfigurationState;
pub use context::ValidatorContext;
pub use errors::{FactoryError, FactoryResult};
pub use validator::Validator;
pub use validator_factory::{EffectiveConfiguration, ValidatorFactory};
