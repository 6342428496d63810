//! Scope serving instances supplied by the caller instead of the container.
//!
//! Components registered in an override scope are not constructed like other ones. Instead, their
//! instances are taken from the [OverrideStore](super::override_store::OverrideStore) of the
//! current thread, typically filled by a [ScopedFactory](crate::scoped_factory::ScopedFactory)
//! for the duration of a single `create` call. What happens when there's no active override is
//! decided by the [MissPolicy].

use crate::error::ComponentInstanceProviderError;
use crate::instance_provider::ComponentInstanceAnyPtr;
use crate::scope::override_store::{CleanupPolicy, OverrideStoreHandle};
use crate::scope::{InstanceSupplier, Scope, ScopeFactory, ScopePtr};
use crate::type_key::TypeKey;
use serde::Deserialize;
use tracing::trace;

/// Default name of the override scope.
pub const PARAMETER: &str = "PARAMETER";

/// Behavior of an [OverrideScope] without an active override for the requested key.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissPolicy {
    /// Return no instance. Requiring such instance fails with
    /// [MissingOverride](ComponentInstanceProviderError::MissingOverride), while optional
    /// dependencies are left empty.
    #[default]
    NullOnMiss,
    /// Construct the instance like a prototype would.
    Fallback,
}

/// Scope returning overrides from the current thread. Overrides are returned as-is, without ever
/// calling the supplier.
pub struct OverrideScope {
    store: OverrideStoreHandle,
    miss_policy: MissPolicy,
}

impl OverrideScope {
    pub fn new(store: OverrideStoreHandle, miss_policy: MissPolicy) -> Self {
        Self { store, miss_policy }
    }
}

impl Scope for OverrideScope {
    fn instance(
        &self,
        key: &TypeKey,
        supplier: InstanceSupplier<'_>,
    ) -> Result<Option<ComponentInstanceAnyPtr>, ComponentInstanceProviderError> {
        if let Some(instance) = self.store.get(key) {
            trace!(%key, "Using overridden instance.");
            return Ok(Some(instance));
        }

        match self.miss_policy {
            MissPolicy::NullOnMiss => {
                trace!(%key, "No override available.");
                Ok(None)
            }
            MissPolicy::Fallback => {
                trace!(%key, "No override available - constructing new instance.");
                supplier().map(Some)
            }
        }
    }
}

/// Factory for [OverrideScope]s. All scopes created by a given factory share the same
/// [OverrideStoreHandle], which should be passed to the
/// [ScopedFactory](crate::scoped_factory::ScopedFactory) filling the stores.
#[derive(Clone, Debug)]
pub struct OverrideScopeFactory {
    store: OverrideStoreHandle,
    miss_policy: MissPolicy,
}

impl OverrideScopeFactory {
    pub fn new(cleanup_policy: CleanupPolicy, miss_policy: MissPolicy) -> Self {
        Self {
            store: OverrideStoreHandle::new(cleanup_policy),
            miss_policy,
        }
    }

    /// Returns the handle to stores used by the created scopes.
    #[inline]
    pub fn store(&self) -> OverrideStoreHandle {
        self.store.clone()
    }

    #[inline]
    pub fn miss_policy(&self) -> MissPolicy {
        self.miss_policy
    }
}

impl Default for OverrideScopeFactory {
    fn default() -> Self {
        Self::new(CleanupPolicy::default(), MissPolicy::default())
    }
}

impl ScopeFactory for OverrideScopeFactory {
    fn create_scope(&self) -> ScopePtr {
        Box::new(OverrideScope::new(self.store.clone(), self.miss_policy))
    }
}
