use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use courier_core::{Error, Result};
use courier_fabric::Serializer;
use parking_lot::RwLock;

use crate::envelope::Failure;
use crate::method::{ErasedMethod, MethodKey, MethodTable, Service};
use crate::types::{Signature, TypeDescriptor, Value};

type ErasedInstance = Arc<dyn Any + Send + Sync>;
type Factory = Box<dyn Fn() -> ErasedInstance + Send + Sync>;

/// One registered implementation: its method table and its lazily created
/// shared instance
pub struct ServiceBinding {
    implementation: TypeDescriptor,
    factory: Factory,
    instance: OnceLock<ErasedInstance>,
    methods: HashMap<MethodKey, ErasedMethod>,
}

impl ServiceBinding {
    fn new<S, F>(factory: F) -> Self
    where
        S: Service,
        F: Fn() -> S + Send + Sync + 'static,
    {
        Self {
            implementation: TypeDescriptor::of::<S>(),
            factory: Box::new(move || Arc::new(factory()) as ErasedInstance),
            instance: OnceLock::new(),
            methods: MethodTable::<S>::build().into_entries(),
        }
    }

    fn from_instance<S: Service>(instance: Arc<S>) -> Self {
        let erased: ErasedInstance = instance;
        let cell = OnceLock::new();
        let _ = cell.set(erased.clone());
        Self {
            implementation: TypeDescriptor::of::<S>(),
            factory: Box::new(move || erased.clone()),
            instance: cell,
            methods: MethodTable::<S>::build().into_entries(),
        }
    }

    pub fn implementation(&self) -> &TypeDescriptor {
        &self.implementation
    }

    pub fn has_method(&self, name: &str, parameter_types: &[TypeDescriptor]) -> bool {
        self.methods
            .contains_key(&MethodKey::new(name, parameter_types.to_vec()))
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodKey> {
        self.methods.keys()
    }

    /// The shared instance, created by the factory on first use
    fn instance(&self) -> ErasedInstance {
        self.instance.get_or_init(|| (self.factory)()).clone()
    }
}

/// A resolved service: the live instance plus the binding it came from
#[derive(Clone)]
pub struct ServiceInstance {
    service_name: String,
    binding: Arc<ServiceBinding>,
    object: ErasedInstance,
}

impl ServiceInstance {
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn implementation(&self) -> &TypeDescriptor {
        self.binding.implementation()
    }

    pub fn binding(&self) -> &ServiceBinding {
        &self.binding
    }

    pub fn is<S: Service>(&self) -> bool {
        self.object.is::<S>()
    }

    pub fn downcast<S: Service>(&self) -> Option<Arc<S>> {
        self.object.clone().downcast::<S>().ok()
    }

    /// Whether both handles point at the same live instance
    pub fn same_instance(&self, other: &ServiceInstance) -> bool {
        Arc::ptr_eq(&self.object, &other.object)
    }

    /// Look up `method_name` with exactly `parameter_types` and call it
    pub fn invoke(
        &self,
        codec: &Serializer,
        method_name: &str,
        parameter_types: &[TypeDescriptor],
        args: &[Value],
    ) -> std::result::Result<Option<Value>, Failure> {
        let key = MethodKey::new(method_name, parameter_types.to_vec());
        let method = self.binding.methods.get(&key).ok_or_else(|| {
            Failure::method_not_found(format!(
                "{}.{}{} on {}",
                self.service_name,
                method_name,
                Signature(parameter_types),
                self.binding.implementation
            ))
        })?;
        method(self.object.as_ref(), codec, args)
    }
}

/// Maps service names to their implementations
///
/// Bindings are normally added at startup before serving begins. Lookups
/// take a shared lock only long enough to clone the binding handle.
#[derive(Default)]
pub struct ServiceRegistry {
    services: RwLock<HashMap<String, Arc<ServiceBinding>>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `service_name` to implementation `S`, built by `factory` on
    /// first resolve. Replaces any existing binding of the same name.
    pub fn register<S, F>(&self, service_name: impl Into<String>, factory: F)
    where
        S: Service,
        F: Fn() -> S + Send + Sync + 'static,
    {
        self.insert(service_name.into(), ServiceBinding::new(factory));
    }

    pub fn register_default<S: Service + Default>(&self, service_name: impl Into<String>) {
        self.register(service_name, S::default);
    }

    /// Bind `service_name` to an already constructed instance
    pub fn register_instance<S: Service>(&self, service_name: impl Into<String>, instance: Arc<S>) {
        self.insert(service_name.into(), ServiceBinding::from_instance(instance));
    }

    fn insert(&self, service_name: String, binding: ServiceBinding) {
        tracing::debug!(
            service = %service_name,
            implementation = %binding.implementation,
            methods = binding.methods.len(),
            "registering service"
        );
        let previous = self
            .services
            .write()
            .insert(service_name.clone(), Arc::new(binding));
        if let Some(previous) = previous {
            tracing::info!(
                service = %service_name,
                replaced = %previous.implementation,
                "service binding replaced"
            );
        }
    }

    pub fn unregister(&self, service_name: &str) -> bool {
        self.services.write().remove(service_name).is_some()
    }

    /// The live instance bound to `service_name`
    pub fn resolve(&self, service_name: &str) -> Result<ServiceInstance> {
        let binding = self
            .services
            .read()
            .get(service_name)
            .cloned()
            .ok_or_else(|| Error::ServiceNotFound(service_name.to_string()))?;

        let object = binding.instance();
        Ok(ServiceInstance {
            service_name: service_name.to_string(),
            binding,
            object,
        })
    }

    /// Resolve and downcast to the concrete implementation
    pub fn resolve_as<S: Service>(&self, service_name: &str) -> Result<Arc<S>> {
        let instance = self.resolve(service_name)?;
        instance.downcast::<S>().ok_or_else(|| {
            Error::ServiceNotFound(format!(
                "{service_name} is bound to {}, not {}",
                instance.implementation(),
                TypeDescriptor::of::<S>()
            ))
        })
    }

    pub fn contains(&self, service_name: &str) -> bool {
        self.services.read().contains_key(service_name)
    }

    /// Registered service names, sorted
    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static CONSTRUCTED: AtomicUsize = AtomicUsize::new(0);

    struct Counted;

    impl Counted {
        fn new() -> Self {
            CONSTRUCTED.fetch_add(1, Ordering::SeqCst);
            Counted
        }

        fn ping(&self) -> std::result::Result<String, String> {
            Ok("pong".to_string())
        }
    }

    impl Service for Counted {
        fn methods(table: &mut MethodTable<Self>) {
            table.method("ping", Counted::ping);
        }
    }

    #[test]
    fn instance_is_built_lazily_and_once() {
        let registry = ServiceRegistry::new();
        registry.register("Counted", Counted::new);
        assert_eq!(CONSTRUCTED.load(Ordering::SeqCst), 0);

        let first = registry.resolve("Counted").unwrap();
        let second = registry.resolve("Counted").unwrap();

        assert_eq!(CONSTRUCTED.load(Ordering::SeqCst), 1);
        assert!(first.same_instance(&second));
        assert!(first.binding().has_method("ping", &[]));
    }
}
