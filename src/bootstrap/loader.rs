//! Named component loading.
//!
//! Contributors and script evaluator factories can be named in properties.
//! A `ComponentLoader` turns such a name into an instance. The default
//! loader is a `ComponentRegistry` of named constructors; a process-wide
//! registry is used when the configuration does not bring its own loader.
//!
//! Every load of a named component goes through [`run_restricted`].

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use serde::Serialize;

use crate::bootstrap::aggregator::ConstraintMappingContributor;
use crate::core::providers::ScriptEvaluatorFactory;
use crate::factory::errors::{FactoryError, FactoryResult};

/// The interface a named component is loaded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentKind {
    MappingContributor,
    ScriptEvaluatorFactory,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentKind::MappingContributor => write!(f, "constraint mapping contributor"),
            ComponentKind::ScriptEvaluatorFactory => write!(f, "script evaluator factory"),
        }
    }
}

/// Resolves component names to instances.
pub trait ComponentLoader: Send + Sync {
    /// Instantiate the contributor registered under `name`.
    fn load_contributor(&self, name: &str) -> FactoryResult<Box<dyn ConstraintMappingContributor>>;

    /// Instantiate the script evaluator factory registered under `name`.
    fn load_script_evaluator_factory(
        &self,
        name: &str,
    ) -> FactoryResult<Arc<dyn ScriptEvaluatorFactory>>;

    /// Instantiate every contributor offered for discovery, with its name.
    fn discover_contributors(
        &self,
    ) -> FactoryResult<Vec<(String, Box<dyn ConstraintMappingContributor>)>>;

    /// Loader name, for logging.
    fn loader_name(&self) -> &str {
        "component loader"
    }
}

type ContributorConstructor =
    Arc<dyn Fn() -> FactoryResult<Box<dyn ConstraintMappingContributor>> + Send + Sync>;
type ScriptFactoryConstructor =
    Arc<dyn Fn() -> FactoryResult<Arc<dyn ScriptEvaluatorFactory>> + Send + Sync>;

#[derive(Clone)]
struct ContributorEntry {
    constructor: ContributorConstructor,
    discoverable: bool,
}

/// Registry of named component constructors.
///
/// Discovery order is registration order.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    name: String,
    contributors: HashMap<String, ContributorEntry>,
    contributor_order: Vec<String>,
    script_factories: HashMap<String, ScriptFactoryConstructor>,
}

/// Process-wide registry
static GLOBAL_REGISTRY: LazyLock<RwLock<ComponentRegistry>> =
    LazyLock::new(|| RwLock::new(ComponentRegistry::named("global component registry")));

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::named("component registry")
    }

    /// Create an empty registry with a name used in logs.
    pub fn named(name: impl Into<String>) -> Self {
        ComponentRegistry {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Register a contributor that can only be loaded by name.
    pub fn register_contributor<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn() -> FactoryResult<Box<dyn ConstraintMappingContributor>> + Send + Sync + 'static,
    {
        self.insert_contributor(name.into(), Arc::new(constructor), false);
    }

    /// Register a contributor that is also offered for discovery.
    pub fn register_discoverable_contributor<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn() -> FactoryResult<Box<dyn ConstraintMappingContributor>> + Send + Sync + 'static,
    {
        self.insert_contributor(name.into(), Arc::new(constructor), true);
    }

    fn insert_contributor(
        &mut self,
        name: String,
        constructor: ContributorConstructor,
        discoverable: bool,
    ) {
        // Re-registering a name replaces the constructor but keeps its position
        if !self.contributors.contains_key(&name) {
            self.contributor_order.push(name.clone());
        }
        self.contributors.insert(
            name,
            ContributorEntry {
                constructor,
                discoverable,
            },
        );
    }

    /// Register a script evaluator factory.
    pub fn register_script_evaluator_factory<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn() -> FactoryResult<Arc<dyn ScriptEvaluatorFactory>> + Send + Sync + 'static,
    {
        self.script_factories
            .insert(name.into(), Arc::new(constructor));
    }

    /// Check if a component is registered.
    pub fn contains(&self, kind: ComponentKind, name: &str) -> bool {
        match kind {
            ComponentKind::MappingContributor => self.contributors.contains_key(name),
            ComponentKind::ScriptEvaluatorFactory => self.script_factories.contains_key(name),
        }
    }

    /// Get the number of registered components.
    pub fn len(&self) -> usize {
        self.contributors.len() + self.script_factories.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register components with the process-wide registry.
    pub fn register_global(f: impl FnOnce(&mut ComponentRegistry)) {
        let mut registry = GLOBAL_REGISTRY
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut registry);
    }

    /// Snapshot of the process-wide registry.
    ///
    /// Used as the loader when the configuration supplies none.
    pub fn global() -> Arc<ComponentRegistry> {
        Arc::new(
            GLOBAL_REGISTRY
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        )
    }
}

fn not_registered(kind: ComponentKind, name: &str) -> FactoryError {
    FactoryError::ComponentLoad {
        kind,
        name: name.to_string(),
        reason: "no component registered under this name".to_string(),
    }
}

fn instantiation_failed(kind: ComponentKind, name: &str, err: FactoryError) -> FactoryError {
    match err {
        FactoryError::ComponentLoad { .. } => err,
        other => FactoryError::ComponentLoad {
            kind,
            name: name.to_string(),
            reason: other.to_string(),
        },
    }
}

impl ComponentLoader for ComponentRegistry {
    fn load_contributor(&self, name: &str) -> FactoryResult<Box<dyn ConstraintMappingContributor>> {
        let kind = ComponentKind::MappingContributor;
        let entry = self
            .contributors
            .get(name)
            .ok_or_else(|| not_registered(kind, name))?;
        (entry.constructor)().map_err(|e| instantiation_failed(kind, name, e))
    }

    fn load_script_evaluator_factory(
        &self,
        name: &str,
    ) -> FactoryResult<Arc<dyn ScriptEvaluatorFactory>> {
        let kind = ComponentKind::ScriptEvaluatorFactory;
        let constructor = self
            .script_factories
            .get(name)
            .ok_or_else(|| not_registered(kind, name))?;
        constructor().map_err(|e| instantiation_failed(kind, name, e))
    }

    fn discover_contributors(
        &self,
    ) -> FactoryResult<Vec<(String, Box<dyn ConstraintMappingContributor>)>> {
        let mut discovered = Vec::new();
        for name in &self.contributor_order {
            let Some(entry) = self.contributors.get(name) else {
                continue;
            };
            if !entry.discoverable {
                continue;
            }
            let contributor = (entry.constructor)().map_err(|e| {
                instantiation_failed(ComponentKind::MappingContributor, name, e)
            })?;
            discovered.push((name.clone(), contributor));
        }
        Ok(discovered)
    }

    fn loader_name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut script_factories: Vec<_> = self.script_factories.keys().collect();
        script_factories.sort();
        f.debug_struct("ComponentRegistry")
            .field("name", &self.name)
            .field("contributors", &self.contributor_order)
            .field("script_factories", &script_factories)
            .finish()
    }
}

/// Run a component load in restricted execution.
///
/// All loading of externally named components funnels through here so a
/// host can audit or confine it in one place.
pub(crate) fn run_restricted<T>(
    kind: ComponentKind,
    name: &str,
    action: impl FnOnce() -> FactoryResult<T>,
) -> FactoryResult<T> {
    let span = tracing::debug_span!("load_component", %kind, name);
    let _enter = span.enter();

    let result = action();
    match &result {
        Ok(_) => tracing::debug!("Loaded {} `{}`", kind, name),
        Err(e) => tracing::debug!("Failed to load {} `{}`: {}", kind, name, e),
    }
    result
}
