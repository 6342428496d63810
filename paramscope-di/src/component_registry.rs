//! Functionality related to registering definitions of components. [ComponentInstanceProvider]s
//! should create [Component] instances based on those definitions, which can be registered
//! automatically or manually.

use crate::component::{Component, ComponentDowncast, Injectable};
use crate::component_registry::internal::{
    ComponentAliasDefinition, ComponentAliasRegisterer, ComponentDefinitionRegisterer,
    TypedComponentDefinition,
};
use crate::component_registry::registry::NamedComponentDefinitionMap;
use crate::error::{ComponentDefinitionRegistryError, ComponentInstanceProviderError};
use crate::instance_provider::{CastFunction, ComponentInstanceAnyPtr, ComponentInstanceProvider};
use derivative::Derivative;
use fxhash::FxHashMap;
use itertools::Itertools;
#[cfg(test)]
use mockall::automock;
use std::any::{type_name, TypeId};

/// Constructor for type-erased component instances.
pub type Constructor = fn(
    instance_provider: &mut dyn ComponentInstanceProvider,
) -> Result<ComponentInstanceAnyPtr, ComponentInstanceProviderError>;

/// Definition for a [Component] registered in a definition registry.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct ComponentDefinition {
    /// Each component has at least one name, which can be used to request a specific instance.
    /// Derive-based components have their name generated from type name by converting it to snake
    /// case.
    pub names: Vec<String>,

    /// With multiple components registered for a given type, one of them can be marked as primary
    /// and returned when requesting a single instance.
    pub is_primary: bool,

    /// The name of a [Scope](crate::scope::Scope) holding instances of this component.
    pub scope_name: String,

    /// The id of the actual component this definition is for.
    pub resolved_type_id: TypeId,

    /// The type name of the actual component this definition is for.
    pub resolved_type_name: &'static str,

    /// Constructor method for type-erased instances.
    #[derivative(Debug = "ignore")]
    pub constructor: Constructor,

    /// Cast function associated for given type. Please see the documentation for [CastFunction] for
    /// details on usage.
    #[derivative(Debug = "ignore")]
    pub cast: CastFunction,
}

/// Registration information for a [Component]. Please see [ComponentDefinition] for information
/// about the meaning of the fields.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct ComponentMetadata {
    pub names: Vec<String>,

    pub scope_name: String,

    #[derivative(Debug = "ignore")]
    pub constructor: Constructor,

    #[derivative(Debug = "ignore")]
    pub cast: CastFunction,
}

/// Registration information for an  alias for a [Component] registered in a definition registry.
/// Please see [ComponentDefinition] for information about the meaning of the fields.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct ComponentAliasMetadata {
    pub is_primary: bool,

    /// Additional name, under which the alias can be requested.
    pub name: Option<String>,

    #[derivative(Debug = "ignore")]
    pub cast: CastFunction,
}

/// A registry of component definitions which can be used when requesting instances via a
/// [ComponentInstanceProvider].
#[cfg_attr(test, automock)]
pub trait ComponentDefinitionRegistry {
    /// Returns all registered definitions for a given type.
    fn components_by_type(&self, type_id: TypeId) -> Vec<ComponentDefinition>;

    /// Returns a definition with given name, which can be cast to the given type.
    fn component_by_name(&self, name: &str, type_id: TypeId) -> Option<ComponentDefinition>;

    /// Returns the primary definition for a given type - either the only one or the one marked as
    /// primary.
    fn primary_component(&self, type_id: TypeId) -> Option<ComponentDefinition>;

    /// Checks if given type is present in this registry.
    fn is_registered(&self, type_id: TypeId) -> bool;

    /// Checks if there's a definition with given name.
    fn is_name_registered(&self, name: &str) -> bool;

    /// Returns a copy of the whole registry as a map.
    fn all_definitions(&self) -> FxHashMap<TypeId, Vec<ComponentDefinition>>;
}

/// Registry of component definitions initialized from statically registered definitions.
#[derive(Clone, Debug)]
pub struct StaticComponentDefinitionRegistry {
    definition_map: NamedComponentDefinitionMap,
    allow_definition_overriding: bool,
}

impl StaticComponentDefinitionRegistry {
    /// Creates a registry containing all components and aliases registered by the derive macros.
    pub fn new(allow_definition_overriding: bool) -> Result<Self, ComponentDefinitionRegistryError> {
        let component_definitions: Vec<TypedComponentDefinition> =
            inventory::iter::<ComponentDefinitionRegisterer>
                .into_iter()
                .map(|registerer| (registerer.register)())
                .collect_vec();

        let alias_definitions: Vec<ComponentAliasDefinition> =
            inventory::iter::<ComponentAliasRegisterer>
                .into_iter()
                .map(|registerer| (registerer.register)())
                .collect_vec();

        let mut registry = Self::empty(allow_definition_overriding);

        for definition in &component_definitions {
            registry.definition_map.try_register_component(
                definition.target,
                definition.target_name,
                &definition.metadata,
                allow_definition_overriding,
            )?;
        }

        for definition in &alias_definitions {
            registry.definition_map.try_register_alias(
                definition.alias_type,
                definition.target_type,
                definition.alias_name,
                definition.target_name,
                &definition.metadata,
            )?;
        }

        Ok(registry)
    }

    /// Creates a registry without any definitions, for manual registration.
    pub fn empty(allow_definition_overriding: bool) -> Self {
        Self {
            definition_map: Default::default(),
            allow_definition_overriding,
        }
    }

    /// Adds a new definition for a given type.
    pub fn register_component<T: Component>(
        &mut self,
        metadata: &ComponentMetadata,
    ) -> Result<(), ComponentDefinitionRegistryError> {
        self.definition_map.try_register_component(
            TypeId::of::<T>(),
            type_name::<T>(),
            metadata,
            self.allow_definition_overriding,
        )
    }

    /// Adds an alias `Source` for component of type `Target`. This is useful when registering
    /// `dyn Trait` as an alias for a given concrete type.
    #[inline]
    pub fn register_alias<Source: ComponentDowncast<Target> + ?Sized, Target: Component>(
        &mut self,
        metadata: &ComponentAliasMetadata,
    ) -> Result<(), ComponentDefinitionRegistryError> {
        self.definition_map.try_register_alias(
            TypeId::of::<Source>(),
            TypeId::of::<Target>(),
            type_name::<Source>(),
            type_name::<Target>(),
            metadata,
        )
    }
}

impl ComponentDefinitionRegistry for StaticComponentDefinitionRegistry {
    #[inline]
    fn components_by_type(&self, type_id: TypeId) -> Vec<ComponentDefinition> {
        self.definition_map.components_by_type(type_id)
    }

    #[inline]
    fn component_by_name(&self, name: &str, type_id: TypeId) -> Option<ComponentDefinition> {
        self.definition_map.component_by_name(name, type_id)
    }

    #[inline]
    fn primary_component(&self, type_id: TypeId) -> Option<ComponentDefinition> {
        self.definition_map.primary_component(type_id)
    }

    #[inline]
    fn is_registered(&self, type_id: TypeId) -> bool {
        self.definition_map.is_registered(type_id)
    }

    #[inline]
    fn is_name_registered(&self, name: &str) -> bool {
        self.definition_map.is_name_registered(name)
    }

    #[inline]
    fn all_definitions(&self) -> FxHashMap<TypeId, Vec<ComponentDefinition>> {
        self.definition_map.all_definitions()
    }
}

/// Helper trait for [ComponentDefinitionRegistry] providing strongly-typed access.
pub trait TypedComponentDefinitionRegistry {
    /// Typesafe version of [ComponentDefinitionRegistry::components_by_type].
    fn components_by_type_typed<T: Injectable + ?Sized>(&self) -> Vec<ComponentDefinition>;

    /// Typesafe version of [ComponentDefinitionRegistry::primary_component].
    fn primary_component_typed<T: Injectable + ?Sized>(&self) -> Option<ComponentDefinition>;

    /// Typesafe version of [ComponentDefinitionRegistry::is_registered].
    fn is_registered_typed<T: Injectable + ?Sized>(&self) -> bool;
}

impl<R: ComponentDefinitionRegistry + ?Sized> TypedComponentDefinitionRegistry for R {
    #[inline]
    fn components_by_type_typed<T: Injectable + ?Sized>(&self) -> Vec<ComponentDefinition> {
        self.components_by_type(TypeId::of::<T>())
    }

    #[inline]
    fn primary_component_typed<T: Injectable + ?Sized>(&self) -> Option<ComponentDefinition> {
        self.primary_component(TypeId::of::<T>())
    }

    #[inline]
    fn is_registered_typed<T: Injectable + ?Sized>(&self) -> bool {
        self.is_registered(TypeId::of::<T>())
    }
}

mod registry {
    use crate::component_registry::{
        ComponentAliasMetadata, ComponentDefinition, ComponentMetadata,
    };
    use crate::error::ComponentDefinitionRegistryError;
    use fxhash::FxHashMap;
    use std::any::TypeId;

    #[derive(Default, Clone, Debug)]
    pub(super) struct NamedComponentDefinitionMap {
        definitions: FxHashMap<TypeId, Vec<ComponentDefinition>>,
        names: FxHashMap<String, TypeId>,
    }

    impl NamedComponentDefinitionMap {
        pub(super) fn component_by_name(
            &self,
            name: &str,
            type_id: TypeId,
        ) -> Option<ComponentDefinition> {
            self.definitions
                .get(&type_id)
                .and_then(|definitions| {
                    definitions
                        .iter()
                        .find(|definition| definition.names.iter().any(|n| n == name))
                })
                .cloned()
        }

        pub(super) fn components_by_type(&self, type_id: TypeId) -> Vec<ComponentDefinition> {
            self.definitions.get(&type_id).cloned().unwrap_or_default()
        }

        pub(super) fn primary_component(&self, type_id: TypeId) -> Option<ComponentDefinition> {
            self.definitions.get(&type_id).and_then(|definitions| {
                if definitions.len() == 1 {
                    return definitions.first().cloned();
                }

                definitions
                    .iter()
                    .find(|definition| definition.is_primary)
                    .cloned()
            })
        }

        pub(super) fn try_register_alias(
            &mut self,
            alias_type: TypeId,
            target_type: TypeId,
            alias_name: &str,
            target_name: &str,
            metadata: &ComponentAliasMetadata,
        ) -> Result<(), ComponentDefinitionRegistryError> {
            let mut target_definitions = self
                .definitions
                .get(&target_type)
                .ok_or(ComponentDefinitionRegistryError::MissingBaseComponent {
                    alias_type: alias_name.to_string(),
                    target_type: target_name.to_string(),
                })
                .cloned()?;

            for definition in &mut target_definitions {
                definition.is_primary = metadata.is_primary;
                definition.cast = metadata.cast;

                if let Some(name) = &metadata.name {
                    definition.names.push(name.clone());
                }
            }

            if let Some(alias_definitions) = self.definitions.get_mut(&alias_type) {
                if metadata.is_primary
                    && alias_definitions
                        .iter()
                        .any(|definition| definition.is_primary)
                {
                    return Err(
                        ComponentDefinitionRegistryError::DuplicatePrimaryComponent {
                            alias_type: alias_name.to_string(),
                            target_type: target_name.to_string(),
                        },
                    );
                }

                alias_definitions.append(&mut target_definitions);
            } else {
                self.definitions.insert(alias_type, target_definitions);
            }

            if let Some(name) = &metadata.name {
                self.names.insert(name.clone(), alias_type);
            }

            Ok(())
        }

        pub(super) fn try_register_component(
            &mut self,
            target: TypeId,
            target_name: &'static str,
            metadata: &ComponentMetadata,
            allow_definition_overriding: bool,
        ) -> Result<(), ComponentDefinitionRegistryError> {
            if !allow_definition_overriding {
                if let Some(name) = metadata
                    .names
                    .iter()
                    .find(|name| self.names.contains_key(*name))
                {
                    return Err(ComponentDefinitionRegistryError::DuplicateComponentName(
                        name.clone(),
                    ));
                }
            }

            let definition = ComponentDefinition {
                names: metadata.names.clone(),
                is_primary: false,
                scope_name: metadata.scope_name.clone(),
                resolved_type_id: target,
                resolved_type_name: target_name,
                constructor: metadata.constructor,
                cast: metadata.cast,
            };

            let names = definition.names.clone();

            if let Some(entries) = self.definitions.get_mut(&target) {
                // concrete component types should not have multiple definitions
                debug_assert!(entries.len() <= 1);

                if !allow_definition_overriding && !entries.is_empty() {
                    return Err(ComponentDefinitionRegistryError::DuplicateComponentType(
                        target_name.to_string(),
                    ));
                }

                if let Some(entry) = entries
                    .iter()
                    .find(|entry| entry.scope_name != definition.scope_name)
                {
                    return Err(ComponentDefinitionRegistryError::ConflictingScope {
                        target_type: target_name.to_string(),
                        existing: entry.scope_name.clone(),
                        requested: definition.scope_name,
                    });
                }

                entries
                    .iter()
                    .flat_map(|entry| entry.names.iter())
                    .for_each(|name| {
                        self.names.remove(name);
                    });

                *entries = vec![definition];
            } else {
                self.definitions.insert(target, vec![definition]);
            }

            self.names
                .extend(names.into_iter().map(|name| (name, target)));

            Ok(())
        }

        #[inline]
        pub(super) fn is_registered(&self, target: TypeId) -> bool {
            self.definitions
                .get(&target)
                .map(|definitions| !definitions.is_empty())
                .unwrap_or(false)
        }

        #[inline]
        pub(super) fn is_name_registered(&self, name: &str) -> bool {
            self.names.contains_key(name)
        }

        #[inline]
        pub(super) fn all_definitions(&self) -> FxHashMap<TypeId, Vec<ComponentDefinition>> {
            self.definitions.clone()
        }
    }

}

#[doc(hidden)]
pub mod internal {
    use crate::component::{Component, ComponentDowncast};
    use crate::component_registry::{ComponentAliasMetadata, ComponentMetadata};
    use crate::error::ComponentInstanceProviderError;
    use crate::instance_provider::{
        ComponentInstanceAnyPtr, ComponentInstanceProvider, ComponentInstancePtr,
    };
    use inventory::collect;
    pub use inventory::submit;
    use std::any::{Any, TypeId};

    #[derive(Clone)]
    pub struct TypedComponentDefinition {
        pub target: TypeId,
        pub target_name: &'static str,
        pub metadata: ComponentMetadata,
    }

    pub struct ComponentDefinitionRegisterer {
        pub register: fn() -> TypedComponentDefinition,
    }

    #[derive(Clone)]
    pub struct ComponentAliasDefinition {
        pub alias_type: TypeId,
        pub target_type: TypeId,
        pub alias_name: &'static str,
        pub target_name: &'static str,
        pub metadata: ComponentAliasMetadata,
    }

    pub struct ComponentAliasRegisterer {
        pub register: fn() -> ComponentAliasDefinition,
    }

    collect!(ComponentDefinitionRegisterer);
    collect!(ComponentAliasRegisterer);

    /// Type-erased constructor creating `T` and running its lifecycle hook.
    pub fn construct<T: Component>(
        instance_provider: &mut dyn ComponentInstanceProvider,
    ) -> Result<ComponentInstanceAnyPtr, ComponentInstanceProviderError> {
        let mut instance = T::create(instance_provider)?;
        instance.after_inject(instance_provider)?;
        Ok(ComponentInstancePtr::new(instance) as ComponentInstanceAnyPtr)
    }

    /// Type-erased cast from a `C` instance to `Source`.
    pub fn cast<Source: ComponentDowncast<C> + ?Sized, C: Component>(
        instance: ComponentInstanceAnyPtr,
    ) -> Result<Box<dyn Any>, ComponentInstanceAnyPtr> {
        Source::downcast(instance).map(|p| Box::new(p) as Box<dyn Any>)
    }
}
