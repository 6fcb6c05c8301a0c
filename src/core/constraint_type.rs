//! Constraint type identity.
//!
//! A `ConstraintType` names one kind of validation rule ("NotNull",
//! "Pattern", ...). Identities are interned so the registry and the
//! registrar's seen-set compare and hash them by pointer.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{LazyLock, PoisonError, RwLock};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Global constraint type interner
static CONSTRAINT_TYPES: LazyLock<RwLock<HashSet<&'static str>>> =
    LazyLock::new(|| RwLock::new(HashSet::new()));

/// Interned identity of a constraint type.
#[derive(Clone, Copy)]
pub struct ConstraintType {
    name: &'static str,
}

impl ConstraintType {
    /// Intern a constraint type by its fully qualified name.
    pub fn new(name: impl AsRef<str>) -> Self {
        let name = name.as_ref();

        {
            let interned = CONSTRAINT_TYPES
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(&existing) = interned.get(name) {
                return ConstraintType { name: existing };
            }
        }

        let mut interned = CONSTRAINT_TYPES
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        // Another thread may have won the race for the write lock
        if let Some(&existing) = interned.get(name) {
            return ConstraintType { name: existing };
        }

        let leaked: &'static str = Box::leak(name.to_string().into_boxed_str());
        interned.insert(leaked);

        ConstraintType { name: leaked }
    }

    /// The constraint type name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The last path segment of the name (`NotNull` for `constraints.NotNull`).
    pub fn simple_name(&self) -> &'static str {
        self.name.rsplit(['.', ':']).next().unwrap_or(self.name)
    }
}

impl PartialEq for ConstraintType {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.name, other.name)
    }
}

impl Eq for ConstraintType {}

impl Hash for ConstraintType {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.name, state)
    }
}

impl PartialOrd for ConstraintType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ConstraintType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(other.name)
    }
}

impl fmt::Debug for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConstraintType({})", self.name)
    }
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl From<&str> for ConstraintType {
    fn from(name: &str) -> Self {
        ConstraintType::new(name)
    }
}

impl Serialize for ConstraintType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.name.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ConstraintType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(ConstraintType::new(name))
    }
}

/// Describes one validator implementation able to check a constraint type
/// for values of a given type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidatorDescriptor {
    /// Name of the validator implementation
    pub validator: String,

    /// Type of value the validator accepts (e.g. "CharSequence")
    pub validated_type: String,
}

impl ValidatorDescriptor {
    /// Create a descriptor.
    pub fn new(validator: impl Into<String>, validated_type: impl Into<String>) -> Self {
        ValidatorDescriptor {
            validator: validator.into(),
            validated_type: validated_type.into(),
        }
    }
}

impl fmt::Display for ValidatorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.validator, self.validated_type)
    }
}
