//! Constraint definition registration.
//!
//! Folds the constraint definition contributions of all aggregated mappings
//! into the constraint registry. This runs once, after aggregation and
//! before any metadata is built.

use std::collections::HashSet;

use tracing::debug;

use crate::core::constraint_type::ConstraintType;
use crate::core::mapping::SealedMappings;
use crate::core::registry::ConstraintRegistry;
use crate::factory::errors::{FactoryError, FactoryResult};

/// Registers custom constraint definitions.
pub struct ConstraintDefinitionRegistrar;

impl ConstraintDefinitionRegistrar {
    /// Register every contribution, in mapping order then contribution order.
    ///
    /// A constraint type may be defined by at most one contribution across
    /// all mappings. The second definition fails registration and names the
    /// type; nothing after it is registered.
    pub fn register(mappings: &SealedMappings, registry: &ConstraintRegistry) -> FactoryResult<()> {
        let mut defined: HashSet<ConstraintType> = HashSet::new();

        for mapping in mappings.iter() {
            for contribution in mapping.constraint_definition_contributions() {
                let constraint_type = contribution.constraint_type();
                if !defined.insert(constraint_type) {
                    return Err(FactoryError::DuplicateConstraintDefinition {
                        constraint_type,
                        origin: mapping.source().clone(),
                    });
                }

                registry.put_validator_descriptors(
                    constraint_type,
                    contribution.validators(),
                    contribution.include_existing(),
                );
                debug!(
                    "Registered {} validator(s) for `{}` from {} (include existing: {})",
                    contribution.validators().len(),
                    constraint_type,
                    mapping.source(),
                    contribution.include_existing()
                );
            }
        }

        Ok(())
    }
}
