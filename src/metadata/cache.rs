//! Metadata manager cache.
//!
//! Building a `MetadataManager` is expensive, and its content depends only
//! on the parameter name provider, the value extractors and the method
//! validation configuration. Validators created under the same three share
//! one manager.
//!
//! Lookups take the read lock. A miss takes the write lock, looks again and
//! builds while still holding it, so a manager is built at most once per key
//! and every caller observes the same instance.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::core::method_validation::MethodValidationConfiguration;
use crate::core::providers::ParameterNameProvider;
use crate::core::value_extraction::ValueExtractorManager;
use crate::metadata::manager::MetadataManager;

/// Identifies the configuration a metadata manager was built for.
///
/// The parameter name provider is compared by identity; the key holds a
/// reference to it so the address cannot be reused while the key exists.
#[derive(Clone)]
pub struct CacheKey {
    parameter_name_provider: Arc<dyn ParameterNameProvider>,
    value_extractor_manager: ValueExtractorManager,
    method_validation: MethodValidationConfiguration,
}

impl CacheKey {
    pub fn new(
        parameter_name_provider: Arc<dyn ParameterNameProvider>,
        value_extractor_manager: ValueExtractorManager,
        method_validation: MethodValidationConfiguration,
    ) -> Self {
        CacheKey {
            parameter_name_provider,
            value_extractor_manager,
            method_validation,
        }
    }

    pub fn parameter_name_provider(&self) -> &Arc<dyn ParameterNameProvider> {
        &self.parameter_name_provider
    }

    pub fn value_extractor_manager(&self) -> &ValueExtractorManager {
        &self.value_extractor_manager
    }

    pub fn method_validation_configuration(&self) -> MethodValidationConfiguration {
        self.method_validation
    }

    fn provider_address(&self) -> *const () {
        Arc::as_ptr(&self.parameter_name_provider) as *const ()
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.provider_address(), other.provider_address())
            && self.value_extractor_manager == other.value_extractor_manager
            && self.method_validation == other.method_validation
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.provider_address().hash(state);
        self.value_extractor_manager.hash(state);
        self.method_validation.hash(state);
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheKey")
            .field(
                "parameter_name_provider",
                &format_args!(
                    "{} @ {:p}",
                    self.parameter_name_provider.provider_name(),
                    self.provider_address()
                ),
            )
            .field("value_extractors", &self.value_extractor_manager.len())
            .field("method_validation", &self.method_validation)
            .finish()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "parameter names: {}, {} value extractor(s), {}",
            self.parameter_name_provider.provider_name(),
            self.value_extractor_manager.len(),
            self.method_validation
        )
    }
}

/// Concurrent `CacheKey -> MetadataManager` store. Entries live until `clear`.
#[derive(Debug, Default)]
pub struct MetadataManagerCache {
    managers: RwLock<HashMap<CacheKey, Arc<MetadataManager>>>,
}

impl MetadataManagerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the manager for `key`, building it with `builder` on a miss.
    pub fn get_or_create<F>(&self, key: CacheKey, builder: F) -> Arc<MetadataManager>
    where
        F: FnOnce(&CacheKey) -> MetadataManager,
    {
        match self.get_or_try_create(key, |key| Ok::<_, std::convert::Infallible>(builder(key))) {
            Ok(manager) => manager,
            Err(never) => match never {},
        }
    }

    /// Fallible variant of [`get_or_create`](Self::get_or_create).
    ///
    /// A builder error is returned as is and nothing is cached for the key.
    pub fn get_or_try_create<F, E>(&self, key: CacheKey, builder: F) -> Result<Arc<MetadataManager>, E>
    where
        F: FnOnce(&CacheKey) -> Result<MetadataManager, E>,
    {
        // Fast path: read lock only
        {
            let managers = self.managers.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(manager) = managers.get(&key) {
                return Ok(Arc::clone(manager));
            }
        }

        // Slow path: another caller may have built it while we waited
        let mut managers = self.managers.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(manager) = managers.get(&key) {
            return Ok(Arc::clone(manager));
        }

        let manager = Arc::new(builder(&key)?);
        debug!("Cached new metadata manager ({} total)", managers.len() + 1);
        managers.insert(key, Arc::clone(&manager));
        Ok(manager)
    }

    /// Whether a manager is cached for `key`.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.managers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.managers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear every cached manager, then drop them all.
    ///
    /// Must not run concurrently with lookups.
    pub fn clear(&self) {
        let mut managers = self.managers.write().unwrap_or_else(PoisonError::into_inner);
        for manager in managers.values() {
            manager.clear();
        }
        debug!("Cleared {} metadata manager(s)", managers.len());
        managers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    use crate::core::providers::DefaultParameterNameProvider;
    use crate::core::value_extraction::ValueExtractorDescriptor;
    use crate::test_support::{CountingBuilder, FixedParameterNameProvider};

    fn key_for(provider: &Arc<dyn ParameterNameProvider>) -> CacheKey {
        CacheKey::new(
            Arc::clone(provider),
            ValueExtractorManager::default(),
            MethodValidationConfiguration::default(),
        )
    }

    #[test]
    fn test_key_equality_by_provider_identity() {
        let provider: Arc<dyn ParameterNameProvider> = Arc::new(DefaultParameterNameProvider);
        let other: Arc<dyn ParameterNameProvider> = Arc::new(FixedParameterNameProvider::new(&["a"]));

        assert_eq!(key_for(&provider), key_for(&provider));
        assert_ne!(key_for(&provider), key_for(&other));
    }

    #[test]
    fn test_key_equality_by_value_for_other_components() {
        let provider: Arc<dyn ParameterNameProvider> = Arc::new(DefaultParameterNameProvider);
        let relaxed = MethodValidationConfiguration::builder()
            .allow_overriding_method_alter_parameter_constraint(true)
            .build();
        let extra = ValueExtractorManager::default()
            .with_additional([ValueExtractorDescriptor::new("acme.Box", 0, "acme.BoxExtractor")]);

        let base = key_for(&provider);
        let with_relaxed = CacheKey::new(Arc::clone(&provider), ValueExtractorManager::default(), relaxed);
        let with_extra = CacheKey::new(
            Arc::clone(&provider),
            extra.clone(),
            MethodValidationConfiguration::default(),
        );

        assert_ne!(base, with_relaxed);
        assert_ne!(base, with_extra);
        assert_eq!(
            with_extra,
            CacheKey::new(Arc::clone(&provider), extra, MethodValidationConfiguration::default())
        );
    }

    #[test]
    fn test_same_key_returns_same_manager() {
        let cache = MetadataManagerCache::new();
        let builder = CountingBuilder::new();
        let provider: Arc<dyn ParameterNameProvider> = Arc::new(DefaultParameterNameProvider);

        let first = cache.get_or_create(key_for(&provider), |k| builder.build(k));
        let second = cache.get_or_create(key_for(&provider), |k| builder.build(k));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(builder.count(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_different_provider_builds_new_manager() {
        let cache = MetadataManagerCache::new();
        let builder = CountingBuilder::new();
        let a: Arc<dyn ParameterNameProvider> = Arc::new(DefaultParameterNameProvider);
        let b: Arc<dyn ParameterNameProvider> = Arc::new(DefaultParameterNameProvider);

        let first = cache.get_or_create(key_for(&a), |k| builder.build(k));
        let second = cache.get_or_create(key_for(&b), |k| builder.build(k));

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(builder.count(), 2);
    }

    #[test]
    fn test_builder_error_caches_nothing() {
        let cache = MetadataManagerCache::new();
        let provider: Arc<dyn ParameterNameProvider> = Arc::new(DefaultParameterNameProvider);

        let result = cache.get_or_try_create(key_for(&provider), |_| Err("boom"));
        assert_eq!(result.err(), Some("boom"));
        assert!(cache.is_empty());
        assert!(!cache.contains(&key_for(&provider)));
    }

    #[test]
    fn test_clear_then_lookup_rebuilds() {
        let cache = MetadataManagerCache::new();
        let builder = CountingBuilder::new();
        let provider: Arc<dyn ParameterNameProvider> = Arc::new(DefaultParameterNameProvider);

        let before = cache.get_or_create(key_for(&provider), |k| builder.build(k));
        before.bean_metadata("acme.Book");
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(before.cached_bean_count(), 0);

        let after = cache.get_or_create(key_for(&provider), |k| builder.build(k));
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(builder.count(), 2);
    }

    #[test]
    fn test_concurrent_lookups_observe_one_manager() {
        const THREADS: usize = 50;

        let cache = Arc::new(MetadataManagerCache::new());
        let builder = Arc::new(CountingBuilder::new());
        let provider: Arc<dyn ParameterNameProvider> = Arc::new(DefaultParameterNameProvider);
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let builder = Arc::clone(&builder);
                let barrier = Arc::clone(&barrier);
                let key = key_for(&provider);
                thread::spawn(move || {
                    barrier.wait();
                    cache.get_or_create(key, |k| builder.build(k))
                })
            })
            .collect();

        let managers: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(cache.len(), 1);
        assert_eq!(builder.count(), 1);
        let cached = cache.get_or_create(key_for(&provider), |k| builder.build(k));
        for manager in &managers {
            assert!(Arc::ptr_eq(manager, &cached));
        }
    }
}
