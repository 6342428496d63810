//! Component instances are contained in [Scope]s - containers which decide when to reuse or create
//! an instance. There's a global one for singletons, but there also can be other, specialized ones.
//! Some can be simple, like [PrototypeScope], while other can be quite complex and depend on
//! external factors, e.g. the [OverrideScope](override_scope::OverrideScope) which serves values
//! supplied by the caller of a [ScopedFactory](crate::scoped_factory::ScopedFactory).
//!
//! Note: scope resolution happens at component instantiation time, which can lead to unexpected
//! consequences if incompatible scopes are mixed together, e.g. a [singleton](SINGLETON) component
//! can depend on a [prototype](PROTOTYPE) one. In such case when creating the singleton, a new
//! instance of the dependency will be created, since it's a prototype, but then that single
//! instance will live as long as the singleton lives. The same applies to singletons depending on
//! overridden parameters - the first override wins forever, so such combinations should be
//! avoided.

pub mod override_scope;
pub mod override_store;

use crate::error::ComponentInstanceProviderError;
use crate::instance_provider::ComponentInstanceAnyPtr;
use crate::type_key::TypeKey;
use fxhash::FxHashMap;
#[cfg(test)]
use mockall::automock;
use parking_lot::{Condvar, Mutex};
use std::any::TypeId;
use std::thread::{self, ThreadId};
use tracing::trace;

pub type ScopePtr = Box<dyn Scope + Send + Sync>;

/// Produces a new instance, when a scope decides one is needed.
pub type InstanceSupplier<'a> =
    &'a mut dyn FnMut() -> Result<ComponentInstanceAnyPtr, ComponentInstanceProviderError>;

/// Name of the [SingletonScope].
pub const SINGLETON: &str = "SINGLETON";

/// Name of the [PrototypeScope].
pub const PROTOTYPE: &str = "PROTOTYPE";

/// A scope containing component instances. See module documentation for information on scopes.
pub trait Scope {
    /// Gets an instance for the given slot. The scope may call `supplier` to create a new
    /// instance, which it is then free to store for reuse. Returning `None` means the scope has no
    /// instance to offer and the request cannot be satisfied.
    fn instance(
        &self,
        key: &TypeKey,
        supplier: InstanceSupplier<'_>,
    ) -> Result<Option<ComponentInstanceAnyPtr>, ComponentInstanceProviderError>;
}

#[derive(Default)]
struct SingletonState {
    instances: FxHashMap<TypeId, ComponentInstanceAnyPtr>,
    // component type -> thread running its constructor
    constructing: FxHashMap<TypeId, ThreadId>,
    // thread -> component type it waits for
    waiting: FxHashMap<ThreadId, TypeId>,
}

impl SingletonState {
    /// Follows the chain of threads waiting on each other's constructions, starting at `thread`.
    fn waits_for(&self, mut thread: ThreadId, target: ThreadId) -> bool {
        while let Some(owner) = self
            .waiting
            .get(&thread)
            .and_then(|type_id| self.constructing.get(type_id))
        {
            if *owner == target {
                return true;
            }

            thread = *owner;
        }

        false
    }
}

/// Scope for instances shared between components. Stateless components are good candidates to be
/// stored in the singleton scope.
///
/// Instances are shared per concrete component type, regardless of the name they were requested
/// with. Concurrent first requests construct the instance at most once - all requesters receive the
/// same one. A request which would wait, directly or through other threads, for a construction
/// running on its own thread fails with a
/// [DependencyCycle](ComponentInstanceProviderError::DependencyCycle).
#[derive(Default)]
pub struct SingletonScope {
    state: Mutex<SingletonState>,
    constructed: Condvar,
}

impl Scope for SingletonScope {
    fn instance(
        &self,
        key: &TypeKey,
        supplier: InstanceSupplier<'_>,
    ) -> Result<Option<ComponentInstanceAnyPtr>, ComponentInstanceProviderError> {
        let type_id = key.type_id();
        let current = thread::current().id();

        let mut state = self.state.lock();
        loop {
            if let Some(instance) = state.instances.get(&type_id) {
                return Ok(Some(instance.clone()));
            }

            match state.constructing.get(&type_id).copied() {
                None => break,
                Some(owner) if owner == current || state.waits_for(owner, current) => {
                    return Err(ComponentInstanceProviderError::DependencyCycle(type_id));
                }
                Some(_) => {
                    trace!(%key, "Waiting for singleton constructed by another thread.");

                    state.waiting.insert(current, type_id);
                    self.constructed.wait(&mut state);
                    state.waiting.remove(&current);
                }
            }
        }

        // the lock is released before construction, so singletons can depend on singletons
        state.constructing.insert(type_id, current);
        drop(state);

        let _construction = Construction {
            scope: self,
            type_id,
        };

        let instance = supplier()?;
        self.state.lock().instances.insert(type_id, instance.clone());

        Ok(Some(instance))
    }
}

/// Releases a singleton construction slot, waking up waiting threads, even if the constructor
/// fails or panics.
struct Construction<'a> {
    scope: &'a SingletonScope,
    type_id: TypeId,
}

impl Drop for Construction<'_> {
    fn drop(&mut self) {
        self.scope.state.lock().constructing.remove(&self.type_id);
        self.scope.constructed.notify_all();
    }
}

/// A scope which creates a new instance of a given component on each request. Stateful components
/// usually should be stored in a prototype scope.
#[derive(Default, Copy, Clone, Eq, PartialEq)]
pub struct PrototypeScope;

impl Scope for PrototypeScope {
    #[inline]
    fn instance(
        &self,
        _key: &TypeKey,
        supplier: InstanceSupplier<'_>,
    ) -> Result<Option<ComponentInstanceAnyPtr>, ComponentInstanceProviderError> {
        supplier().map(Some)
    }
}

/// Factory for custom [Scope]s.
#[cfg_attr(test, automock)]
pub trait ScopeFactory {
    fn create_scope(&self) -> ScopePtr;
}

#[derive(Copy, Clone, Eq, PartialEq, Default)]
pub struct SingletonScopeFactory;

impl ScopeFactory for SingletonScopeFactory {
    fn create_scope(&self) -> ScopePtr {
        Box::<SingletonScope>::default()
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Default)]
pub struct PrototypeScopeFactory;

impl ScopeFactory for PrototypeScopeFactory {
    fn create_scope(&self) -> ScopePtr {
        Box::<PrototypeScope>::default()
    }
}
