//! Dependency injection container with support for externally supplied, per-invocation
//! parameters.
//!
//! Components are registered in a [component_registry], created by a
//! [ComponentFactory](factory::ComponentFactory) and stored in [scopes](scope). On top of that,
//! the [ScopedFactory](scoped_factory::ScopedFactory) makes it possible to build any component
//! while supplying some of its dependencies at call time, e.g. request data or values known only
//! to the caller. Such parameters live in a thread-confined
//! [override store](scope::override_store) and are injected through an
//! [override scope](scope::override_scope), without affecting singletons or prototypes.
//!
//! ```
//! use paramscope_di::config::ScopeConfig;
//! use paramscope_di::scoped_factory::{Parameters, ScopedFactory};
//! use paramscope_di::instance_provider::ComponentInstancePtr;
//! use paramscope_di::Component;
//!
//! #[derive(Component)]
//! #[component(scope = "PARAMETER")]
//! struct RequestId(#[component(default)] u64);
//!
//! #[derive(Component)]
//! #[component(scope = "PROTOTYPE")]
//! struct Handler {
//!     request_id: ComponentInstancePtr<RequestId>,
//! }
//!
//! let factory = ScopedFactory::from_config(&ScopeConfig::default()).unwrap();
//! let handler = factory
//!     .create::<Handler>(Parameters::new().with(RequestId(7)))
//!     .unwrap();
//!
//! assert_eq!(handler.request_id.0, 7);
//! ```
//!
//! ### Features
//!
//! * `derive` - automatic derive of [Component] and related macros

pub mod component;
pub mod component_registry;
pub mod config;
mod error;
pub mod factory;
pub mod instance_provider;
pub mod scope;
pub mod scoped_factory;
pub mod type_key;

pub use error::{
    ComponentDefinitionRegistryError, ComponentInstanceProviderError, ConfigurationError,
};

#[cfg(feature = "derive")]
pub use paramscope_di_derive::{component_alias, injectable, Component};
