use crate::instance_provider::ErrorPtr;
use crate::type_key::TypeKey;
use std::any::TypeId;
use thiserror::Error;

/// Errors related to creating and managing components.
#[derive(Error, Clone, Debug)]
pub enum ComponentInstanceProviderError {
    #[error("Cannot find a primary instance for component '{0:?}' - either none or multiple exists without a primary marker.")]
    NoPrimaryInstance(TypeId),
    #[error("Tried to downcast component to incompatible type: {0:?}")]
    IncompatibleComponent(TypeId),
    #[error("Cannot find named component: {name}")]
    NoNamedInstance { name: String, type_id: TypeId },
    #[error("Unrecognized scope: {0}")]
    UnrecognizedScope(String),
    #[error("Detected dependency cycle for: {0:?}")]
    DependencyCycle(TypeId),
    /// The scope of the component resolved for the `requested` type has no value for `key`.
    #[error("No override is active for: {key}")]
    MissingOverride { key: TypeKey, requested: TypeId },
    #[error("Error in component constructor: {0}")]
    ConstructorError(ErrorPtr),
}

impl ComponentInstanceProviderError {
    /// Checks if the error signals an unavailable instance of exactly the requested slot, as opposed
    /// to a failure deeper in the dependency graph.
    pub(crate) fn is_missing(&self, type_id: TypeId, name: Option<&str>) -> bool {
        match self {
            Self::NoPrimaryInstance(id) => name.is_none() && *id == type_id,
            Self::NoNamedInstance {
                name: missing_name,
                type_id: missing_type_id,
            } => name == Some(missing_name.as_str()) && *missing_type_id == type_id,
            Self::MissingOverride { key, requested } => {
                *requested == type_id && key.qualifier() == name
            }
            _ => false,
        }
    }
}

/// Error related to component registries.
#[derive(Error, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum ComponentDefinitionRegistryError {
    #[error("Attempted to register a duplicated component with name: {0}")]
    DuplicateComponentName(String),
    #[error("Attempted to re-register a concrete component type: {0}")]
    DuplicateComponentType(String),
    #[error("Missing base component of type {target_type} for alias: {alias_type}")]
    MissingBaseComponent {
        alias_type: String,
        target_type: String,
    },
    #[error(
        "Registering a duplicate primary component of type {target_type} for alias: {alias_type}"
    )]
    DuplicatePrimaryComponent {
        alias_type: String,
        target_type: String,
    },
    #[error("Component {target_type} is registered in scope {existing} and cannot be moved to scope {requested}")]
    ConflictingScope {
        target_type: String,
        existing: String,
        requested: String,
    },
}

/// Container configuration errors, detected when building a
/// [ComponentFactory](crate::factory::ComponentFactory).
#[derive(Error, Clone, Eq, PartialEq, Debug)]
pub enum ConfigurationError {
    #[error("Invalid component registry: {0}")]
    Registry(#[from] ComponentDefinitionRegistryError),
    #[error("Scope registered more than once: {0}")]
    DuplicateScope(String),
    #[error("Component {component} uses unregistered scope: {scope}")]
    UnrecognizedScope { component: String, scope: String },
    #[error("Cannot load configuration: {0}")]
    Load(String),
}
