//! Creation of components with parameters supplied at call time.
//!
//! A [ScopedFactory] builds any component known to its [ComponentFactory], while letting the caller
//! provide instances for dependencies registered in an
//! [override scope](crate::scope::override_scope). Parameters are visible only to the thread
//! performing the call and only for its duration (under the default
//! [stack policy](CleanupPolicy::Stack)), so concurrent calls never observe each other's values.
//!
//! Components can perform nested calls during their own construction by using
//! [ScopedFactory::current]. Nested parameters shadow the outer ones, which become visible again
//! when the nested call ends.

use crate::component::Injectable;
use crate::config::ScopeConfig;
use crate::error::{ComponentInstanceProviderError, ConfigurationError};
use crate::factory::{ComponentFactory, ComponentFactoryBuilder, ComponentResolver};
use crate::instance_provider::{
    ComponentInstanceAnyPtr, ComponentInstancePtr, TypedComponentInstanceProvider,
};
use crate::scope::override_scope::OverrideScopeFactory;
use crate::scope::override_store::{CleanupPolicy, OverrideStoreHandle};
use crate::type_key::TypeKey;
use derivative::Derivative;
use std::cell::RefCell;
use std::sync::Arc;
use tracing::{debug, trace};

/// Values supplied to a single [ScopedFactory] call. Each value is keyed by its own type and an
/// optional name, so the order of adding values doesn't matter. Adding a value for the same key
/// twice makes the latter one visible.
#[derive(Clone, Default, Debug)]
pub struct Parameters {
    values: Vec<(TypeKey, ComponentInstanceAnyPtr)>,
}

impl Parameters {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value for dependencies of type `P`.
    #[inline]
    pub fn with<P: Send + Sync + 'static>(self, value: P) -> Self {
        self.with_ptr(ComponentInstancePtr::new(value))
    }

    /// Adds an already shared value. Components receive this exact instance.
    pub fn with_ptr<P: Send + Sync + 'static>(mut self, value: ComponentInstancePtr<P>) -> Self {
        self.values
            .push((TypeKey::of::<P>(), value as ComponentInstanceAnyPtr));
        self
    }

    /// Adds a value for dependencies of type `P` requested by given name.
    #[inline]
    pub fn with_named<P: Send + Sync + 'static, N: ToString>(self, name: N, value: P) -> Self {
        self.with_named_ptr(name, ComponentInstancePtr::new(value))
    }

    pub fn with_named_ptr<P: Send + Sync + 'static, N: ToString>(
        mut self,
        name: N,
        value: ComponentInstancePtr<P>,
    ) -> Self {
        self.values
            .push((TypeKey::named::<P, _>(name), value as ComponentInstanceAnyPtr));
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

thread_local! {
    static ACTIVE_FACTORIES: RefCell<Vec<ScopedFactory>> = RefCell::default();
}

/// Factory creating components with call-specific [Parameters]. Cheap to clone and safe to share
/// between threads - all clones use the same container and stores.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct ScopedFactory {
    #[derivative(Debug = "ignore")]
    component_factory: Arc<ComponentFactory>,
    store: OverrideStoreHandle,
}

impl ScopedFactory {
    /// Creates a new factory using given container. The store handle must be the one used by the
    /// override scope registered in the container, e.g. obtained from
    /// [OverrideScopeFactory::store].
    pub fn new(component_factory: Arc<ComponentFactory>, store: OverrideStoreHandle) -> Self {
        Self {
            component_factory,
            store,
        }
    }

    /// Creates a container with all statically registered components and an override scope
    /// configured as given.
    pub fn from_config(config: &ScopeConfig) -> Result<Self, ConfigurationError> {
        debug!(?config, "Creating scoped factory.");

        let scope_factory = OverrideScopeFactory::new(config.cleanup_policy, config.miss_policy);
        let store = scope_factory.store();

        let component_factory = ComponentFactoryBuilder::new()?
            .with_scope_factory(&config.scope_name, Box::new(scope_factory))
            .build()?;

        Ok(Self::new(Arc::new(component_factory), store))
    }

    /// Returns the innermost factory performing a call on the current thread, if any. Intended for
    /// components which need to create other components with their own parameters.
    pub fn current() -> Option<Self> {
        ACTIVE_FACTORIES.with(|factories| factories.borrow().last().cloned())
    }

    #[inline]
    pub fn component_factory(&self) -> &Arc<ComponentFactory> {
        &self.component_factory
    }

    #[inline]
    pub fn store(&self) -> &OverrideStoreHandle {
        &self.store
    }

    /// Creates the primary instance of `T`, using given parameters as overrides.
    pub fn create<T: Injectable + ?Sized>(
        &self,
        parameters: Parameters,
    ) -> Result<ComponentInstancePtr<T>, ComponentInstanceProviderError> {
        self.invoke(parameters, |resolver| resolver.primary_instance_typed::<T>())
    }

    /// Creates the primary instance of `T` without any parameters.
    #[inline]
    pub fn create_default<T: Injectable + ?Sized>(
        &self,
    ) -> Result<ComponentInstancePtr<T>, ComponentInstanceProviderError> {
        self.create(Parameters::default())
    }

    /// Creates an instance of `T` with given name, using given parameters as overrides.
    pub fn create_named<T: Injectable + ?Sized>(
        &self,
        name: &str,
        parameters: Parameters,
    ) -> Result<ComponentInstancePtr<T>, ComponentInstanceProviderError> {
        self.invoke(parameters, |resolver| {
            resolver.instance_by_name_typed::<T>(name)
        })
    }

    fn invoke<R>(
        &self,
        parameters: Parameters,
        resolve: impl FnOnce(&mut ComponentResolver<'_>) -> Result<R, ComponentInstanceProviderError>,
    ) -> Result<R, ComponentInstanceProviderError> {
        let mut invocation = Invocation::enter(self);

        debug!(
            parameters = parameters.len(),
            store = self.store.id(),
            "Applying overrides."
        );

        for (key, value) in parameters.values {
            invocation.apply(key, value);
        }

        let result = resolve(&mut self.component_factory.resolver());
        match &result {
            Ok(_) => trace!("Scoped creation complete."),
            Err(error) => debug!(%error, "Scoped creation failed."),
        }

        result
    }
}

/// Active call of a [ScopedFactory]. Reverts all changes to the thread state when dropped, whether
/// the call succeeded, failed or panicked.
struct Invocation<'a> {
    factory: &'a ScopedFactory,
    applied: Vec<TypeKey>,
}

impl<'a> Invocation<'a> {
    fn enter(factory: &'a ScopedFactory) -> Self {
        ACTIVE_FACTORIES.with(|factories| factories.borrow_mut().push(factory.clone()));

        Self {
            factory,
            applied: vec![],
        }
    }

    fn apply(&mut self, key: TypeKey, value: ComponentInstanceAnyPtr) {
        trace!(%key, "Applying override.");

        self.factory.store.put(key.clone(), value);
        self.applied.push(key);
    }
}

impl Drop for Invocation<'_> {
    fn drop(&mut self) {
        if self.factory.store.policy() == CleanupPolicy::Stack {
            for key in self.applied.iter().rev() {
                trace!(%key, "Removing override.");
                self.factory.store.remove(key);
            }
        }

        let factory = ACTIVE_FACTORIES.with(|factories| factories.borrow_mut().pop());
        drop(factory);
    }
}
