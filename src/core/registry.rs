//! Constraint registry - constraint type to active validators.
//!
//! The registry always starts with the built-in constraint types. Custom
//! definitions are folded in once by the registrar during factory
//! construction; after that the registry is only read, until `clear()`
//! releases it when the factory closes.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::core::constraint_type::{ConstraintType, ValidatorDescriptor};

/// Built-in constraint types and the value types their validators accept.
const BUILTIN_CONSTRAINTS: &[(&str, &[(&str, &str)])] = &[
    ("constraints.NotNull", &[("NotNullValidator", "Object")]),
    ("constraints.Null", &[("NullValidator", "Object")]),
    (
        "constraints.NotBlank",
        &[("NotBlankValidator", "CharSequence")],
    ),
    (
        "constraints.NotEmpty",
        &[
            ("NotEmptyValidatorForCharSequence", "CharSequence"),
            ("NotEmptyValidatorForCollection", "Collection"),
            ("NotEmptyValidatorForMap", "Map"),
        ],
    ),
    (
        "constraints.Size",
        &[
            ("SizeValidatorForCharSequence", "CharSequence"),
            ("SizeValidatorForCollection", "Collection"),
            ("SizeValidatorForMap", "Map"),
            ("SizeValidatorForArray", "Object[]"),
        ],
    ),
    (
        "constraints.Min",
        &[
            ("MinValidatorForNumber", "Number"),
            ("MinValidatorForCharSequence", "CharSequence"),
        ],
    ),
    (
        "constraints.Max",
        &[
            ("MaxValidatorForNumber", "Number"),
            ("MaxValidatorForCharSequence", "CharSequence"),
        ],
    ),
    ("constraints.Pattern", &[("PatternValidator", "CharSequence")]),
    ("constraints.Email", &[("EmailValidator", "CharSequence")]),
    ("constraints.Past", &[("PastValidatorForInstant", "Instant")]),
    ("constraints.Future", &[("FutureValidatorForInstant", "Instant")]),
];

/// Registry of constraint types and their validators.
#[derive(Debug)]
pub struct ConstraintRegistry {
    validators: RwLock<HashMap<ConstraintType, Vec<ValidatorDescriptor>>>,
}

impl ConstraintRegistry {
    /// Create a registry holding all built-in constraint types.
    pub fn new() -> Self {
        let mut validators = HashMap::new();
        for (name, descriptors) in BUILTIN_CONSTRAINTS {
            validators.insert(
                ConstraintType::new(name),
                descriptors
                    .iter()
                    .map(|(validator, ty)| ValidatorDescriptor::new(*validator, *ty))
                    .collect(),
            );
        }

        ConstraintRegistry {
            validators: RwLock::new(validators),
        }
    }

    /// Create a registry without built-in constraints.
    pub fn empty() -> Self {
        ConstraintRegistry {
            validators: RwLock::new(HashMap::new()),
        }
    }

    /// Names of the built-in constraint types.
    pub fn builtin_types() -> impl Iterator<Item = ConstraintType> {
        BUILTIN_CONSTRAINTS
            .iter()
            .map(|(name, _)| ConstraintType::new(name))
    }

    /// Set the validators of a constraint type.
    ///
    /// With `include_existing` the descriptors are appended after the ones
    /// already registered; otherwise they replace them.
    pub fn put_validator_descriptors(
        &self,
        constraint_type: ConstraintType,
        descriptors: &[ValidatorDescriptor],
        include_existing: bool,
    ) {
        let mut validators = self
            .validators
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let mut merged = if include_existing {
            validators.remove(&constraint_type).unwrap_or_default()
        } else {
            Vec::new()
        };
        merged.extend(descriptors.iter().cloned());

        validators.insert(constraint_type, merged);
    }

    /// Active validators for a constraint type (empty if unknown).
    pub fn validator_descriptors(&self, constraint_type: ConstraintType) -> Vec<ValidatorDescriptor> {
        self.validators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&constraint_type)
            .cloned()
            .unwrap_or_default()
    }

    /// Check if a constraint type is known.
    pub fn contains(&self, constraint_type: ConstraintType) -> bool {
        self.validators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&constraint_type)
    }

    /// All registered constraint types, sorted by name.
    pub fn constraint_types(&self) -> Vec<ConstraintType> {
        let mut types: Vec<_> = self
            .validators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        types.sort();
        types
    }

    /// Get the number of registered constraint types.
    pub fn len(&self) -> usize {
        self.validators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every registered constraint type.
    pub fn clear(&self) {
        self.validators
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for ConstraintRegistry {
    fn default() -> Self {
        Self::new()
    }
}
