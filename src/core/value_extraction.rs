//! Value extractors - how to reach the elements of container types.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// One value extractor: which container it unwraps and which type argument
/// it extracts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ValueExtractorDescriptor {
    /// Container type (e.g. "List")
    pub container_type: String,

    /// Index of the extracted type argument
    pub type_argument: usize,

    /// Name of the extractor implementation
    pub extractor: String,
}

impl ValueExtractorDescriptor {
    pub fn new(
        container_type: impl Into<String>,
        type_argument: usize,
        extractor: impl Into<String>,
    ) -> Self {
        ValueExtractorDescriptor {
            container_type: container_type.into(),
            type_argument,
            extractor: extractor.into(),
        }
    }

    fn key(&self) -> (String, usize) {
        (self.container_type.clone(), self.type_argument)
    }
}

impl fmt::Display for ValueExtractorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}<{}> via {}",
            self.container_type, self.type_argument, self.extractor
        )
    }
}

/// Default extractors for the common container types.
const DEFAULT_EXTRACTORS: &[(&str, usize, &str)] = &[
    ("List", 0, "ListValueExtractor"),
    ("Set", 0, "IterableValueExtractor"),
    ("Map", 0, "MapKeyExtractor"),
    ("Map", 1, "MapValueExtractor"),
    ("Optional", 0, "OptionalValueExtractor"),
    ("Object[]", 0, "ObjectArrayValueExtractor"),
];

/// The set of value extractors in effect.
///
/// Equality is by content: two managers holding the same extractors are
/// interchangeable for metadata purposes, which makes this a by-value
/// component of the metadata cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValueExtractorManager {
    extractors: BTreeMap<(String, usize), ValueExtractorDescriptor>,
}

impl ValueExtractorManager {
    /// Default extractors overlaid with the given ones.
    ///
    /// A configured extractor for the same container and type argument
    /// replaces the default one.
    pub fn new(configured: impl IntoIterator<Item = ValueExtractorDescriptor>) -> Self {
        let mut extractors = BTreeMap::new();
        for (container, argument, extractor) in DEFAULT_EXTRACTORS {
            let descriptor = ValueExtractorDescriptor::new(*container, *argument, *extractor);
            extractors.insert(descriptor.key(), descriptor);
        }
        for descriptor in configured {
            extractors.insert(descriptor.key(), descriptor);
        }

        ValueExtractorManager { extractors }
    }

    /// A manager with these extractors added on top of the current ones.
    pub fn with_additional(
        &self,
        additional: impl IntoIterator<Item = ValueExtractorDescriptor>,
    ) -> Self {
        let mut extractors = self.extractors.clone();
        for descriptor in additional {
            extractors.insert(descriptor.key(), descriptor);
        }
        ValueExtractorManager { extractors }
    }

    /// Extractor for a container type argument.
    pub fn extractor_for(
        &self,
        container_type: &str,
        type_argument: usize,
    ) -> Option<&ValueExtractorDescriptor> {
        self.extractors
            .get(&(container_type.to_string(), type_argument))
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValueExtractorDescriptor> {
        self.extractors.values()
    }
}

impl Default for ValueExtractorManager {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
