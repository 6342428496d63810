//! Core functionality for creating [Component](crate::component::Component) instances.

use crate::component_registry::{
    ComponentDefinition, ComponentDefinitionRegistry, StaticComponentDefinitionRegistry,
};
use crate::error::ConfigurationError;
use crate::instance_provider::{
    CastFunction, ComponentInstanceAnyPtr, ComponentInstanceProvider,
    ComponentInstanceProviderError,
};
use crate::scope::{
    PrototypeScopeFactory, ScopeFactory, ScopePtr, SingletonScopeFactory, PROTOTYPE, SINGLETON,
};
use crate::type_key::TypeKey;
use fxhash::{FxHashMap, FxHashSet};
use itertools::Itertools;
use std::any::TypeId;
use tracing::{debug, trace};

pub type ComponentDefinitionRegistryPtr = Box<dyn ComponentDefinitionRegistry + Send + Sync>;

pub type ScopeFactoryPtr = Box<dyn ScopeFactory + Send + Sync>;

pub type ScopeFactoryRegistry = FxHashMap<String, ScopeFactoryPtr>;

/// Builder for [ComponentFactory] with sensible defaults, for easy construction.
pub struct ComponentFactoryBuilder {
    definition_registry: ComponentDefinitionRegistryPtr,
    scope_factories: ScopeFactoryRegistry,
    duplicate_scopes: Vec<String>,
}

impl ComponentFactoryBuilder {
    /// Creates a new builder with a default configuration: all statically registered components
    /// and the [SINGLETON] and [PROTOTYPE] scopes.
    pub fn new() -> Result<Self, ConfigurationError> {
        Ok(Self::with_registry(Box::new(
            StaticComponentDefinitionRegistry::new(false)?,
        )))
    }

    /// Creates a new builder using given registry and the default scopes.
    pub fn with_registry(definition_registry: ComponentDefinitionRegistryPtr) -> Self {
        Self {
            definition_registry,
            scope_factories: [
                (
                    SINGLETON.to_string(),
                    Box::<SingletonScopeFactory>::default() as ScopeFactoryPtr,
                ),
                (
                    PROTOTYPE.to_string(),
                    Box::<PrototypeScopeFactory>::default() as ScopeFactoryPtr,
                ),
            ]
            .into_iter()
            .collect(),
            duplicate_scopes: vec![],
        }
    }

    /// Sets new [ComponentDefinitionRegistry].
    pub fn with_definition_registry(
        mut self,
        definition_registry: ComponentDefinitionRegistryPtr,
    ) -> Self {
        self.definition_registry = definition_registry;
        self
    }

    /// Sets new scope factories, replacing all existing ones.
    pub fn with_scope_factories(mut self, scope_factories: ScopeFactoryRegistry) -> Self {
        self.scope_factories = scope_factories;
        self
    }

    /// Adds a new scope factory. Registering the same scope name twice is a configuration error,
    /// reported by [ComponentFactoryBuilder::build].
    pub fn with_scope_factory<T: ToString>(mut self, name: T, factory: ScopeFactoryPtr) -> Self {
        let name = name.to_string();
        if self.scope_factories.contains_key(&name) {
            self.duplicate_scopes.push(name);
        } else {
            self.scope_factories.insert(name, factory);
        }

        self
    }

    /// Validates the configuration and builds resulting [ComponentFactory].
    pub fn build(self) -> Result<ComponentFactory, ConfigurationError> {
        if let Some(name) = self.duplicate_scopes.into_iter().next() {
            return Err(ConfigurationError::DuplicateScope(name));
        }

        if let Some(definition) = self
            .definition_registry
            .all_definitions()
            .into_values()
            .flatten()
            .find(|definition| !self.scope_factories.contains_key(&definition.scope_name))
        {
            return Err(ConfigurationError::UnrecognizedScope {
                component: definition.resolved_type_name.to_string(),
                scope: definition.scope_name,
            });
        }

        Ok(ComponentFactory::new(
            self.definition_registry,
            self.scope_factories,
        ))
    }
}

/// Generic factory for [Component](crate::component::Component) instances. Uses definitions from
/// the [ComponentDefinitionRegistry] and [scopes](crate::scope) to create and store instances for
/// reuse.
///
/// The factory can be shared between threads. Each request is handled by a separate
/// [ComponentResolver], which can be obtained explicitly with [ComponentFactory::resolver] or
/// implicitly by using the factory as a [ComponentInstanceProvider].
pub struct ComponentFactory {
    definition_registry: ComponentDefinitionRegistryPtr,
    scopes: FxHashMap<String, ScopePtr>,
}

impl ComponentFactory {
    /// Creates a new factory with given registry and scope factories. The factory map should
    /// include built-in [SINGLETON] and [PROTOTYPE] for maximum compatibility with components,
    /// since they are usually the most popular. This is not a hard requirement, but care needs to
    /// be taken to ensure no component uses them.
    pub fn new(
        definition_registry: ComponentDefinitionRegistryPtr,
        scope_factories: ScopeFactoryRegistry,
    ) -> Self {
        Self {
            definition_registry,
            scopes: scope_factories
                .into_iter()
                .map(|(name, factory)| (name, factory.create_scope()))
                .collect(),
        }
    }

    /// Starts a new, independent resolution of a dependency graph.
    #[inline]
    pub fn resolver(&self) -> ComponentResolver<'_> {
        ComponentResolver {
            factory: self,
            types_under_construction: Default::default(),
        }
    }
}

impl ComponentInstanceProvider for ComponentFactory {
    #[inline]
    fn primary_instance(
        &mut self,
        type_id: TypeId,
    ) -> Result<(ComponentInstanceAnyPtr, CastFunction), ComponentInstanceProviderError> {
        self.resolver().primary_instance(type_id)
    }

    #[inline]
    fn instances(
        &mut self,
        type_id: TypeId,
    ) -> Result<Vec<(ComponentInstanceAnyPtr, CastFunction)>, ComponentInstanceProviderError> {
        self.resolver().instances(type_id)
    }

    #[inline]
    fn instance_by_name(
        &mut self,
        name: &str,
        type_id: TypeId,
    ) -> Result<(ComponentInstanceAnyPtr, CastFunction), ComponentInstanceProviderError> {
        self.resolver().instance_by_name(name, type_id)
    }
}

/// Resolution of a single dependency graph, tracking components under construction to detect
/// dependency cycles.
pub struct ComponentResolver<'a> {
    factory: &'a ComponentFactory,
    types_under_construction: FxHashSet<TypeId>,
}

impl ComponentResolver<'_> {
    fn create_instance(
        &mut self,
        definition: &ComponentDefinition,
        key: TypeKey,
        requested: TypeId,
    ) -> Result<(ComponentInstanceAnyPtr, CastFunction), ComponentInstanceProviderError> {
        if self
            .types_under_construction
            .contains(&definition.resolved_type_id)
        {
            return Err(ComponentInstanceProviderError::DependencyCycle(
                definition.resolved_type_id,
            ));
        }

        let factory = self.factory;
        let scope = factory.scopes.get(&definition.scope_name).ok_or_else(|| {
            ComponentInstanceProviderError::UnrecognizedScope(definition.scope_name.clone())
        })?;

        trace!(%key, scope = %definition.scope_name, "Resolving component instance.");

        let constructor = definition.constructor;

        self.types_under_construction
            .insert(definition.resolved_type_id);
        let instance = scope.instance(&key, &mut || {
            debug!(component = definition.resolved_type_name, "Creating component.");
            constructor(&mut *self)
        });
        self.types_under_construction
            .remove(&definition.resolved_type_id);

        instance?
            .map(|instance| (instance, definition.cast))
            .ok_or(ComponentInstanceProviderError::MissingOverride { key, requested })
    }
}

impl ComponentInstanceProvider for ComponentResolver<'_> {
    fn primary_instance(
        &mut self,
        type_id: TypeId,
    ) -> Result<(ComponentInstanceAnyPtr, CastFunction), ComponentInstanceProviderError> {
        let definition = self
            .factory
            .definition_registry
            .primary_component(type_id)
            .ok_or(ComponentInstanceProviderError::NoPrimaryInstance(type_id))?;

        let key = TypeKey::new(definition.resolved_type_id, definition.resolved_type_name);
        self.create_instance(&definition, key, type_id)
    }

    fn instances(
        &mut self,
        type_id: TypeId,
    ) -> Result<Vec<(ComponentInstanceAnyPtr, CastFunction)>, ComponentInstanceProviderError> {
        self.factory
            .definition_registry
            .components_by_type(type_id)
            .iter()
            .map(|definition| {
                let key = TypeKey::new(definition.resolved_type_id, definition.resolved_type_name);
                self.create_instance(definition, key, type_id)
            })
            .try_collect()
    }

    fn instance_by_name(
        &mut self,
        name: &str,
        type_id: TypeId,
    ) -> Result<(ComponentInstanceAnyPtr, CastFunction), ComponentInstanceProviderError> {
        let definition = self
            .factory
            .definition_registry
            .component_by_name(name, type_id)
            .ok_or_else(|| ComponentInstanceProviderError::NoNamedInstance {
                name: name.to_string(),
                type_id,
            })?;

        let key = TypeKey::new(definition.resolved_type_id, definition.resolved_type_name)
            .with_qualifier(name);
        self.create_instance(&definition, key, type_id)
    }
}

#[cfg(test)]
mod tests {
    use crate::component_registry::{
        ComponentDefinition, ComponentDefinitionRegistry, MockComponentDefinitionRegistry,
    };
    use crate::error::ConfigurationError;
    use crate::factory::{
        ComponentDefinitionRegistryPtr, ComponentFactory, ComponentFactoryBuilder, ScopeFactoryPtr,
    };
    use crate::instance_provider::{
        ComponentInstanceAnyPtr, ComponentInstanceProvider, ComponentInstanceProviderError,
        ComponentInstancePtr,
    };
    use crate::scope::override_scope::{OverrideScopeFactory, PARAMETER};
    use crate::scope::{
        MockScopeFactory, PrototypeScope, PrototypeScopeFactory, ScopePtr, SingletonScopeFactory,
        PROTOTYPE, SINGLETON,
    };
    use crate::type_key::TypeKey;
    use fxhash::FxHashMap;
    use mockall::predicate::*;
    use std::any::{Any, TypeId};
    use std::sync::Arc;

    fn cast(instance: ComponentInstanceAnyPtr) -> Result<Box<dyn Any>, ComponentInstanceAnyPtr> {
        Err(instance)
    }

    fn constructor(
        _instance_provider: &mut dyn ComponentInstanceProvider,
    ) -> Result<ComponentInstanceAnyPtr, ComponentInstanceProviderError> {
        Ok(ComponentInstancePtr::new(0) as ComponentInstanceAnyPtr)
    }

    fn error_constructor(
        _instance_provider: &mut dyn ComponentInstanceProvider,
    ) -> Result<ComponentInstanceAnyPtr, ComponentInstanceProviderError> {
        Err(ComponentInstanceProviderError::NoPrimaryInstance(
            TypeId::of::<u8>(),
        ))
    }

    fn recursive_constructor(
        instance_provider: &mut dyn ComponentInstanceProvider,
    ) -> Result<ComponentInstanceAnyPtr, ComponentInstanceProviderError> {
        instance_provider
            .primary_instance(TypeId::of::<i8>())
            .map(|(instance, _)| instance)
    }

    fn create_definition(scope_name: &str) -> (ComponentDefinition, TypeId) {
        (
            ComponentDefinition {
                names: ["name".to_string()].into_iter().collect(),
                is_primary: false,
                scope_name: scope_name.to_string(),
                resolved_type_id: TypeId::of::<i8>(),
                resolved_type_name: "i8",
                constructor,
                cast,
            },
            TypeId::of::<i8>(),
        )
    }

    fn create_factory<T: ComponentDefinitionRegistry + Send + Sync + 'static>(
        definition_registry: T,
    ) -> ComponentFactory {
        ComponentFactory::new(
            Box::new(definition_registry) as ComponentDefinitionRegistryPtr,
            [
                (
                    PROTOTYPE.to_string(),
                    Box::<PrototypeScopeFactory>::default() as ScopeFactoryPtr,
                ),
                (
                    SINGLETON.to_string(),
                    Box::<SingletonScopeFactory>::default() as ScopeFactoryPtr,
                ),
                (
                    PARAMETER.to_string(),
                    Box::<OverrideScopeFactory>::default() as ScopeFactoryPtr,
                ),
            ]
            .into_iter()
            .collect(),
        )
    }

    #[test]
    fn should_return_primary_instance() {
        let (definition, id) = create_definition(PROTOTYPE);

        let mut registry = MockComponentDefinitionRegistry::new();
        registry
            .expect_primary_component()
            .with(eq(id))
            .times(1)
            .return_const(Some(definition));

        let mut factory = create_factory(registry);
        assert!(factory.primary_instance(id).is_ok());
    }

    #[test]
    fn should_detect_primary_instance_loops() {
        let id = TypeId::of::<i8>();
        let (mut definition, _) = create_definition(PROTOTYPE);
        definition.constructor = recursive_constructor;

        let mut registry = MockComponentDefinitionRegistry::new();
        registry
            .expect_primary_component()
            .with(eq(id))
            .times(2)
            .return_const(Some(definition));

        let mut factory = create_factory(registry);
        assert!(matches!(
            factory.primary_instance(id).unwrap_err(),
            ComponentInstanceProviderError::DependencyCycle(cycle_id) if cycle_id == id
        ));
    }

    #[test]
    fn should_detect_singleton_loops_without_deadlock() {
        let id = TypeId::of::<i8>();
        let (mut definition, _) = create_definition(SINGLETON);
        definition.constructor = recursive_constructor;

        let mut registry = MockComponentDefinitionRegistry::new();
        registry
            .expect_primary_component()
            .with(eq(id))
            .return_const(Some(definition));

        let mut factory = create_factory(registry);
        assert!(matches!(
            factory.primary_instance(id).unwrap_err(),
            ComponentInstanceProviderError::DependencyCycle(_)
        ));
    }

    #[test]
    fn should_not_return_missing_primary_instance() {
        let id = TypeId::of::<i8>();

        let mut registry = MockComponentDefinitionRegistry::new();
        registry
            .expect_primary_component()
            .with(eq(id))
            .times(1)
            .return_const(None);

        let mut factory = create_factory(registry);
        assert!(matches!(
            factory.primary_instance(id).unwrap_err(),
            ComponentInstanceProviderError::NoPrimaryInstance(missing_id) if missing_id == id
        ));
    }

    #[test]
    fn should_recognize_primary_instance_missing_scope() {
        let (definition, id) = create_definition("UNKNOWN");

        let mut registry = MockComponentDefinitionRegistry::new();
        registry
            .expect_primary_component()
            .with(eq(id))
            .times(1)
            .return_const(Some(definition));

        let mut factory = create_factory(registry);
        assert!(matches!(
            factory.primary_instance(id).unwrap_err(),
            ComponentInstanceProviderError::UnrecognizedScope(scope) if scope == "UNKNOWN"
        ));
    }

    #[test]
    fn should_forward_primary_instance_constructor_error() {
        let (mut definition, id) = create_definition(PROTOTYPE);
        definition.constructor = error_constructor;

        let mut registry = MockComponentDefinitionRegistry::new();
        registry
            .expect_primary_component()
            .with(eq(id))
            .times(1)
            .return_const(Some(definition));

        let mut factory = create_factory(registry);
        assert!(matches!(
            factory.primary_instance(id).unwrap_err(),
            ComponentInstanceProviderError::NoPrimaryInstance(missing_id) if missing_id == TypeId::of::<u8>()
        ));
    }

    #[test]
    fn should_report_missing_override() {
        let (definition, id) = create_definition(PARAMETER);

        let mut registry = MockComponentDefinitionRegistry::new();
        registry
            .expect_primary_component()
            .with(eq(id))
            .times(1)
            .return_const(Some(definition));

        let mut factory = create_factory(registry);
        assert!(matches!(
            factory.primary_instance(id).unwrap_err(),
            ComponentInstanceProviderError::MissingOverride { key, requested }
                if key == TypeKey::of::<i8>() && requested == id
        ));
    }

    #[test]
    fn should_reuse_singletons() {
        let (definition, id) = create_definition(SINGLETON);

        let mut registry = MockComponentDefinitionRegistry::new();
        registry
            .expect_primary_component()
            .with(eq(id))
            .times(2)
            .return_const(Some(definition));

        let mut factory = create_factory(registry);
        let (first, _) = factory.primary_instance(id).unwrap();
        let (second, _) = factory.primary_instance(id).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn should_use_scope_from_factory() {
        let (definition, id) = create_definition(PROTOTYPE);

        let mut registry = MockComponentDefinitionRegistry::new();
        registry
            .expect_primary_component()
            .with(eq(id))
            .times(1)
            .return_const(Some(definition));

        let mut scope_factory = MockScopeFactory::new();
        scope_factory
            .expect_create_scope()
            .times(1)
            .returning(|| Box::<PrototypeScope>::default() as ScopePtr);

        let mut factory = ComponentFactory::new(
            Box::new(registry) as ComponentDefinitionRegistryPtr,
            [(
                PROTOTYPE.to_string(),
                Box::new(scope_factory) as ScopeFactoryPtr,
            )]
            .into_iter()
            .collect(),
        );

        factory.primary_instance(id).unwrap();
    }

    #[test]
    fn should_return_all_instances() {
        let (definition, id) = create_definition(PROTOTYPE);

        let mut registry = MockComponentDefinitionRegistry::new();
        registry
            .expect_components_by_type()
            .with(eq(id))
            .times(1)
            .return_const(vec![definition.clone(), definition]);

        let mut factory = create_factory(registry);
        assert_eq!(factory.instances(id).unwrap().len(), 2);
    }

    #[test]
    fn should_return_instance_by_name() {
        let (definition, id) = create_definition(PROTOTYPE);

        let mut registry = MockComponentDefinitionRegistry::new();
        registry
            .expect_component_by_name()
            .with(eq("name"), eq(id))
            .times(1)
            .return_const(Some(definition));

        let mut factory = create_factory(registry);
        assert!(factory.instance_by_name("name", id).is_ok());
    }

    #[test]
    fn should_reject_unknown_scope_on_build() {
        let (definition, id) = create_definition("UNKNOWN");

        let mut registry = MockComponentDefinitionRegistry::new();
        registry
            .expect_all_definitions()
            .times(1)
            .return_const(
                [(id, vec![definition])]
                    .into_iter()
                    .collect::<FxHashMap<_, _>>(),
            );

        assert_eq!(
            ComponentFactoryBuilder::with_registry(Box::new(registry))
                .build()
                .err(),
            Some(ConfigurationError::UnrecognizedScope {
                component: "i8".to_string(),
                scope: "UNKNOWN".to_string(),
            })
        );
    }

    #[test]
    fn should_reject_duplicate_scope_on_build() {
        let mut registry = MockComponentDefinitionRegistry::new();
        registry
            .expect_all_definitions()
            .return_const(FxHashMap::<TypeId, Vec<ComponentDefinition>>::default());

        assert_eq!(
            ComponentFactoryBuilder::with_registry(Box::new(registry))
                .with_scope_factory(PARAMETER, Box::<OverrideScopeFactory>::default())
                .with_scope_factory(PARAMETER, Box::<OverrideScopeFactory>::default())
                .build()
                .err(),
            Some(ConfigurationError::DuplicateScope(PARAMETER.to_string()))
        );
    }
}
