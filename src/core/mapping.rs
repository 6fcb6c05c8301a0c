//! Constraint mappings - programmatic constraint configuration.
//!
//! A `ConstraintMapping` is what one mapping source produces: constraint
//! definition contributions (new or replacement validators for a constraint
//! type) and bean configurations (which constraints sit on which elements).
//! Mappings are collected into a `MappingSet` during factory construction
//! and sealed into `SealedMappings`, which is read-only from then on.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::core::constraint_type::{ConstraintType, ValidatorDescriptor};

static NEXT_MAPPING_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a constraint mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MappingId(u64);

impl MappingId {
    fn next() -> Self {
        MappingId(NEXT_MAPPING_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for MappingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mapping#{}", self.0)
    }
}

/// Where a constraint mapping came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "name")]
pub enum MappingContributorSource {
    /// Handed over on the configuration before bootstrap
    PreSupplied,
    /// Created by a contributor found through component discovery
    Discovered(String),
    /// Created by a contributor named in the contributors property
    PropertyNamed(String),
}

impl fmt::Display for MappingContributorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingContributorSource::PreSupplied => write!(f, "programmatic configuration"),
            MappingContributorSource::Discovered(name) => {
                write!(f, "discovered contributor `{}`", name)
            }
            MappingContributorSource::PropertyNamed(name) => {
                write!(f, "property-configured contributor `{}`", name)
            }
        }
    }
}

/// Validators contributed for one constraint type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintDefinitionContribution {
    constraint_type: ConstraintType,
    validators: Vec<ValidatorDescriptor>,
    include_existing: bool,
}

impl ConstraintDefinitionContribution {
    /// Create an empty contribution that extends existing validators.
    pub fn new(constraint_type: ConstraintType) -> Self {
        ConstraintDefinitionContribution {
            constraint_type,
            validators: Vec::new(),
            include_existing: true,
        }
    }

    /// Keep (`true`) or replace (`false`) validators already registered for the type.
    pub fn include_existing_validators(&mut self, include: bool) -> &mut Self {
        self.include_existing = include;
        self
    }

    /// Add a validator for the constraint type.
    pub fn validated_by(&mut self, descriptor: ValidatorDescriptor) -> &mut Self {
        self.validators.push(descriptor);
        self
    }

    pub fn constraint_type(&self) -> ConstraintType {
        self.constraint_type
    }

    pub fn validators(&self) -> &[ValidatorDescriptor] {
        &self.validators
    }

    pub fn include_existing(&self) -> bool {
        self.include_existing
    }
}

/// An element of a bean that a constraint can be placed on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum ConstrainedElement {
    /// The bean type itself (class-level constraint)
    Type,
    /// A field
    Field { name: String },
    /// A getter, by property name
    Getter { property: String },
    /// A method or constructor parameter
    Parameter {
        method: String,
        index: usize,
        arity: usize,
    },
    /// A method return value
    ReturnValue { method: String },
}

impl fmt::Display for ConstrainedElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstrainedElement::Type => write!(f, "<type>"),
            ConstrainedElement::Field { name } => write!(f, "{}", name),
            ConstrainedElement::Getter { property } => write!(f, "{}()", property),
            ConstrainedElement::Parameter { method, index, .. } => {
                write!(f, "{}[{}]", method, index)
            }
            ConstrainedElement::ReturnValue { method } => write!(f, "{}.<return value>", method),
        }
    }
}

/// A constraint placed on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfiguredConstraint {
    pub element: ConstrainedElement,
    pub constraint_type: ConstraintType,
}

/// Constraint placements for one bean type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeanConfiguration {
    type_name: String,
    constraints: Vec<ConfiguredConstraint>,
}

impl BeanConfiguration {
    /// Create an empty configuration for a bean type.
    pub fn new(type_name: impl Into<String>) -> Self {
        BeanConfiguration {
            type_name: type_name.into(),
            constraints: Vec::new(),
        }
    }

    /// Place a constraint on an element.
    pub fn constraint(
        &mut self,
        element: ConstrainedElement,
        constraint_type: ConstraintType,
    ) -> &mut Self {
        self.constraints.push(ConfiguredConstraint {
            element,
            constraint_type,
        });
        self
    }

    /// Place a constraint on a field.
    pub fn field(&mut self, name: impl Into<String>, constraint_type: ConstraintType) -> &mut Self {
        self.constraint(ConstrainedElement::Field { name: name.into() }, constraint_type)
    }

    /// Place a constraint on a method parameter.
    pub fn parameter(
        &mut self,
        method: impl Into<String>,
        index: usize,
        arity: usize,
        constraint_type: ConstraintType,
    ) -> &mut Self {
        self.constraint(
            ConstrainedElement::Parameter {
                method: method.into(),
                index,
                arity,
            },
            constraint_type,
        )
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn constraints(&self) -> &[ConfiguredConstraint] {
        &self.constraints
    }
}

/// Constraint configuration produced by one mapping source.
///
/// Every mapping has its own identity; a clone is a new mapping.
#[derive(Debug)]
pub struct ConstraintMapping {
    id: MappingId,
    source: MappingContributorSource,
    definitions: Vec<ConstraintDefinitionContribution>,
    beans: Vec<BeanConfiguration>,
}

impl ConstraintMapping {
    /// Create an empty programmatic mapping.
    pub fn new() -> Self {
        Self::from_source(MappingContributorSource::PreSupplied)
    }

    pub(crate) fn from_source(source: MappingContributorSource) -> Self {
        ConstraintMapping {
            id: MappingId::next(),
            source,
            definitions: Vec::new(),
            beans: Vec::new(),
        }
    }

    /// Start a constraint definition contribution for a type.
    ///
    /// Defining the same type twice is not rejected here; the registrar
    /// reports it when the mapping is registered.
    pub fn constraint_definition(
        &mut self,
        constraint_type: ConstraintType,
    ) -> &mut ConstraintDefinitionContribution {
        self.definitions
            .push(ConstraintDefinitionContribution::new(constraint_type));
        let last = self.definitions.len() - 1;
        &mut self.definitions[last]
    }

    /// Get or create the bean configuration for a type.
    pub fn bean(&mut self, type_name: &str) -> &mut BeanConfiguration {
        let position = match self.beans.iter().position(|b| b.type_name == type_name) {
            Some(position) => position,
            None => {
                self.beans.push(BeanConfiguration::new(type_name));
                self.beans.len() - 1
            }
        };
        &mut self.beans[position]
    }

    pub fn id(&self) -> MappingId {
        self.id
    }

    pub fn source(&self) -> &MappingContributorSource {
        &self.source
    }

    pub fn constraint_definition_contributions(&self) -> &[ConstraintDefinitionContribution] {
        &self.definitions
    }

    pub fn bean_configurations(&self) -> &[BeanConfiguration] {
        &self.beans
    }

    /// Bean configuration for a type, if this mapping configures it.
    pub fn bean_configuration(&self, type_name: &str) -> Option<&BeanConfiguration> {
        self.beans.iter().find(|b| b.type_name == type_name)
    }
}

impl Clone for ConstraintMapping {
    fn clone(&self) -> Self {
        ConstraintMapping {
            id: MappingId::next(),
            source: self.source.clone(),
            definitions: self.definitions.clone(),
            beans: self.beans.clone(),
        }
    }
}

impl Default for ConstraintMapping {
    fn default() -> Self {
        Self::new()
    }
}

/// Order-preserving set of constraint mappings, keyed by mapping identity.
#[derive(Debug, Default)]
pub struct MappingSet {
    mappings: Vec<ConstraintMapping>,
}

impl MappingSet {
    pub fn new() -> Self {
        MappingSet {
            mappings: Vec::new(),
        }
    }

    /// Insert a mapping. Returns `false` if a mapping with the same identity
    /// is already present.
    pub fn insert(&mut self, mapping: ConstraintMapping) -> bool {
        if self.mappings.iter().any(|m| m.id == mapping.id) {
            return false;
        }
        self.mappings.push(mapping);
        true
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConstraintMapping> {
        self.mappings.iter()
    }

    /// Append a fresh mapping from `source` and hand it back for configuration.
    pub(crate) fn push_new(&mut self, source: MappingContributorSource) -> &mut ConstraintMapping {
        self.mappings.push(ConstraintMapping::from_source(source));
        let last = self.mappings.len() - 1;
        &mut self.mappings[last]
    }

    /// Freeze the set. No mapping can be added, removed or changed afterwards.
    pub fn seal(self) -> SealedMappings {
        SealedMappings {
            mappings: self.mappings.into(),
        }
    }
}

/// Immutable, cheaply shared view of the aggregated mappings.
#[derive(Debug, Clone, Default)]
pub struct SealedMappings {
    mappings: Arc<[ConstraintMapping]>,
}

impl SealedMappings {
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConstraintMapping> {
        self.mappings.iter()
    }

    /// All constraint types contributed by the sealed mappings, in registration order.
    pub fn contributed_types(&self) -> Vec<ConstraintType> {
        self.mappings
            .iter()
            .flat_map(|m| m.definitions.iter().map(|d| d.constraint_type))
            .collect()
    }
}
