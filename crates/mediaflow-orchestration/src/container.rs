//! Lazy singleton registry of collaborators.
//!
//! Rust has no Python-style duck-typed `Any` dict with ergonomic
//! downcasting at the call site without type annotations, so
//! `register`/`get` are generic over the stored type `T: Send + Sync +
//! 'static` and the container keys its inner maps by `(&'static str,
//! TypeId)` — this preserves a "string service name" lookup surface
//! while staying type-safe.

use dashmap::DashMap;
use mediaflow_shared::error::{OrchestrationError, OrchestrationResult};
use std::any::{Any, TypeId};
use std::sync::Arc;

/// String constants naming every collaborator the container wires at
/// startup, mirroring the reference's `Services` class.
pub mod services {
    pub const TASK_MANAGER: &str = "task_manager";
    pub const NOTIFIER: &str = "notifier";
    pub const DOWNLOADER: &str = "downloader";
    pub const TRANSCRIBER: &str = "transcriber";
    pub const TRANSLATOR: &str = "translator";
    pub const SYNTHESIZER: &str = "synthesizer";
    pub const ENHANCER: &str = "enhancer";
    pub const CLEANER: &str = "cleaner";
}

type Factory = Box<dyn Fn() -> Arc<dyn Any + Send + Sync> + Send + Sync>;

enum Slot {
    Factory(Factory),
    Instance(Arc<dyn Any + Send + Sync>),
}

/// Lazy, typed singleton registry keyed by string service name.
#[derive(Default)]
pub struct ServiceContainer {
    slots: DashMap<(&'static str, TypeId), Slot>,
}

impl ServiceContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a zero-arg factory for `name`. Overwrites any prior
    /// registration under the same `(name, T)` key.
    pub fn register<T, F>(&self, name: &'static str, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let key = (name, TypeId::of::<T>());
        self.slots.insert(
            key,
            Slot::Factory(Box::new(move || Arc::new(factory()) as Arc<dyn Any + Send + Sync>)),
        );
    }

    /// Instantiate (or reuse the cached instance) for `name`.
    pub fn get<T>(&self, name: &'static str) -> OrchestrationResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let key = (name, TypeId::of::<T>());
        let cached = self
            .slots
            .get(&key)
            .and_then(|slot| match slot.value() {
                Slot::Instance(instance) => Some(instance.clone()),
                Slot::Factory(_) => None,
            });
        if let Some(instance) = cached {
            return Self::downcast(instance);
        }

        let instance = {
            let mut entry = self
                .slots
                .get_mut(&key)
                .ok_or_else(|| OrchestrationError::not_found("service", name))?;
            let built = match &*entry {
                Slot::Instance(instance) => instance.clone(),
                Slot::Factory(factory) => factory(),
            };
            *entry = Slot::Instance(built.clone());
            built
        };
        Self::downcast(instance)
    }

    pub fn has<T: 'static>(&self, name: &'static str) -> bool {
        self.slots.contains_key(&(name, TypeId::of::<T>()))
    }

    /// Test hook: replace a registration with a concrete instance
    /// directly, bypassing the factory.
    pub fn override_instance<T>(&self, name: &'static str, instance: T)
    where
        T: Send + Sync + 'static,
    {
        let key = (name, TypeId::of::<T>());
        self.slots
            .insert(key, Slot::Instance(Arc::new(instance)));
    }

    /// Test hook: clear every registration.
    pub fn reset(&self) {
        self.slots.clear();
    }

    fn downcast<T: Send + Sync + 'static>(
        instance: Arc<dyn Any + Send + Sync>,
    ) -> OrchestrationResult<Arc<T>> {
        instance
            .downcast::<T>()
            .map_err(|_| OrchestrationError::validation("service registered under wrong type"))
    }
}
