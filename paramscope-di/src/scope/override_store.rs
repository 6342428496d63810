//! Thread-confined storage for overridden instances.
//!
//! An [OverrideStore] maps [TypeKeys](TypeKey) to instances supplied from outside the container.
//! Stores are never shared between threads - an [OverrideStoreHandle] addresses a separate store on
//! each thread which uses it, created lazily on first write. Since every thread owns its stores
//! exclusively, no locking is involved.
//!
//! Two store implementations exist, selected by [CleanupPolicy]:
//!
//! * [StackOverrideStore] - each `put` shadows the previous value for the same key, which becomes
//! visible again after the matching `remove`. This allows nesting and is the default.
//! * [MapOverrideStore] - last write wins, `remove` deletes the value. Nothing is restored, so
//! nesting is not supported.

use crate::instance_provider::ComponentInstanceAnyPtr;
use crate::type_key::TypeKey;
use fxhash::FxHashMap;
use serde::Deserialize;
use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};

/// Mutable mapping from a [TypeKey] to the currently active override.
pub trait OverrideStore {
    /// Makes `value` the active override for `key`, returning a value which is no longer reachable
    /// because of it.
    fn put(
        &mut self,
        key: TypeKey,
        value: ComponentInstanceAnyPtr,
    ) -> Option<ComponentInstanceAnyPtr>;

    /// Returns the active override for `key`, if any.
    fn get(&self, key: &TypeKey) -> Option<ComponentInstanceAnyPtr>;

    /// Reverses the most recent `put` for `key`, returning the removed value.
    fn remove(&mut self, key: &TypeKey) -> Option<ComponentInstanceAnyPtr>;

    fn is_empty(&self) -> bool;
}

/// Store keeping a LIFO stack of overrides per key.
#[derive(Default)]
pub struct StackOverrideStore {
    stacks: FxHashMap<TypeKey, Vec<ComponentInstanceAnyPtr>>,
}

impl OverrideStore for StackOverrideStore {
    fn put(
        &mut self,
        key: TypeKey,
        value: ComponentInstanceAnyPtr,
    ) -> Option<ComponentInstanceAnyPtr> {
        self.stacks.entry(key).or_default().push(value);
        None
    }

    fn get(&self, key: &TypeKey) -> Option<ComponentInstanceAnyPtr> {
        self.stacks.get(key).and_then(|stack| stack.last()).cloned()
    }

    fn remove(&mut self, key: &TypeKey) -> Option<ComponentInstanceAnyPtr> {
        let stack = self.stacks.get_mut(key)?;
        let value = stack.pop();

        if stack.is_empty() {
            self.stacks.remove(key);
        }

        value
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }
}

/// Store keeping only the latest override per key.
#[derive(Default)]
pub struct MapOverrideStore {
    values: FxHashMap<TypeKey, ComponentInstanceAnyPtr>,
}

impl OverrideStore for MapOverrideStore {
    #[inline]
    fn put(
        &mut self,
        key: TypeKey,
        value: ComponentInstanceAnyPtr,
    ) -> Option<ComponentInstanceAnyPtr> {
        self.values.insert(key, value)
    }

    #[inline]
    fn get(&self, key: &TypeKey) -> Option<ComponentInstanceAnyPtr> {
        self.values.get(key).cloned()
    }

    #[inline]
    fn remove(&mut self, key: &TypeKey) -> Option<ComponentInstanceAnyPtr> {
        self.values.remove(key)
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Selects the [OverrideStore] implementation and the way a
/// [ScopedFactory](crate::scoped_factory::ScopedFactory) cleans up after itself.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupPolicy {
    /// Overrides are stacked and removed when the factory invocation ends, whether it succeeded or
    /// not. Nested invocations see their own overrides on top of the outer ones.
    #[default]
    Stack,
    /// Overrides overwrite each other and are left in place after the factory invocation ends.
    /// Nested invocations permanently replace the values of outer ones.
    Map,
}

impl CleanupPolicy {
    fn create_store(self) -> Box<dyn OverrideStore> {
        match self {
            CleanupPolicy::Stack => Box::<StackOverrideStore>::default(),
            CleanupPolicy::Map => Box::<MapOverrideStore>::default(),
        }
    }
}

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static STORES: RefCell<FxHashMap<u64, Box<dyn OverrideStore>>> = RefCell::default();
}

/// Handle to a family of per-thread [OverrideStore]s. Cloned handles refer to the same stores,
/// while separately created handles never see each other's overrides, even on the same thread.
///
/// Every operation borrows the store of the calling thread only for its own duration, so it is
/// safe to use the handle again while creating an instance which was requested with it.
#[derive(Clone, Debug)]
pub struct OverrideStoreHandle {
    id: u64,
    policy: CleanupPolicy,
}

impl OverrideStoreHandle {
    pub fn new(policy: CleanupPolicy) -> Self {
        Self {
            id: NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed),
            policy,
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn policy(&self) -> CleanupPolicy {
        self.policy
    }

    /// Puts an override into the store of the current thread.
    pub fn put(&self, key: TypeKey, value: ComponentInstanceAnyPtr) {
        let replaced = STORES.with(|stores| {
            stores
                .borrow_mut()
                .entry(self.id)
                .or_insert_with(|| self.policy.create_store())
                .put(key, value)
        });

        drop(replaced);
    }

    /// Returns the active override of the current thread.
    pub fn get(&self, key: &TypeKey) -> Option<ComponentInstanceAnyPtr> {
        STORES.with(|stores| {
            stores
                .borrow()
                .get(&self.id)
                .and_then(|store| store.get(key))
        })
    }

    /// Reverses the most recent `put` for given key on the current thread.
    pub fn remove(&self, key: &TypeKey) -> Option<ComponentInstanceAnyPtr> {
        STORES.with(|stores| {
            let mut stores = stores.borrow_mut();
            let store = stores.get_mut(&self.id)?;
            let value = store.remove(key);

            if store.is_empty() {
                stores.remove(&self.id);
            }

            value
        })
    }

    /// Drops all overrides of the current thread.
    pub fn clear(&self) {
        // values are dropped outside the borrow, since their destructors might use the store
        let store = STORES.with(|stores| stores.borrow_mut().remove(&self.id));
        drop(store);
    }

    /// Checks if there are no overrides on the current thread.
    pub fn is_empty(&self) -> bool {
        STORES.with(|stores| {
            stores
                .borrow()
                .get(&self.id)
                .map(|store| store.is_empty())
                .unwrap_or(true)
        })
    }
}
