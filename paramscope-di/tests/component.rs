#[cfg(feature = "derive")]
mod component_derive_test {
    use paramscope_di::component::Component;
    use paramscope_di::component_registry::{
        ComponentDefinitionRegistry, StaticComponentDefinitionRegistry,
        TypedComponentDefinitionRegistry,
    };
    use paramscope_di::instance_provider::{
        CastFunction, ComponentInstanceAnyPtr, ComponentInstanceProvider,
        ComponentInstanceProviderError, ComponentInstancePtr,
    };
    use paramscope_di::scope::{PROTOTYPE, SINGLETON};
    use paramscope_di::{component_alias, injectable, Component};
    use std::any::TypeId;

    #[injectable]
    trait TestTrait1 {}

    #[injectable]
    trait TestTrait2 {}

    #[injectable]
    trait TestTrait3 {}

    #[derive(Component)]
    struct TestDependency;

    #[component_alias(name = "aliased_dependency")]
    impl TestTrait3 for TestDependency {}

    #[derive(Component)]
    struct TestComponent1 {
        _dependency_1: ComponentInstancePtr<TestDependency>,
        _dependency_2: ComponentInstancePtr<dyn TestTrait3 + Sync + Send>,
        _optional_dependency: Option<ComponentInstancePtr<TestDependency>>,
        #[component(name = "test_dependency")]
        _named_dependency: ComponentInstancePtr<dyn TestTrait3 + Sync + Send>,
        #[component(name = "test_dependency")]
        _named_optional_dependency: Option<ComponentInstancePtr<dyn TestTrait3 + Sync + Send>>,
        #[component(default)]
        default: i8,
        #[component(default = "dummy_expr")]
        default_expr: i8,
        all_dependencies: Vec<ComponentInstancePtr<dyn TestTrait3 + Sync + Send>>,
    }

    #[allow(dead_code)]
    #[derive(Component)]
    #[component(names = ["dep2"], scope = "PROTOTYPE")]
    struct TestComponent2(
        ComponentInstancePtr<TestDependency>,
        #[component(default = "dummy_expr")] i8,
    );

    #[component_alias]
    impl TestTrait1 for TestComponent2 {}

    #[component_alias(primary)]
    impl TestTrait2 for TestComponent2 {}

    #[derive(Component)]
    struct TestComponent3;

    #[component_alias]
    impl TestTrait2 for TestComponent3 {}

    fn dummy_expr() -> i8 {
        -1
    }

    fn cast_dependency(
        instance: ComponentInstanceAnyPtr,
    ) -> Result<Box<dyn std::any::Any>, ComponentInstanceAnyPtr> {
        instance
            .downcast::<TestDependency>()
            .map(|p| Box::new(p) as Box<dyn std::any::Any>)
    }

    fn cast_trait(
        instance: ComponentInstanceAnyPtr,
    ) -> Result<Box<dyn std::any::Any>, ComponentInstanceAnyPtr> {
        instance
            .downcast::<TestDependency>()
            .map(|p| {
                Box::new(p as ComponentInstancePtr<dyn TestTrait3 + Sync + Send>)
                    as Box<dyn std::any::Any>
            })
    }

    struct TestDependencyInstanceProvider;

    impl ComponentInstanceProvider for TestDependencyInstanceProvider {
        fn primary_instance(
            &mut self,
            type_id: TypeId,
        ) -> Result<(ComponentInstanceAnyPtr, CastFunction), ComponentInstanceProviderError>
        {
            if type_id == TypeId::of::<TestDependency>() {
                return TestDependency::create(self).map(|p| {
                    (
                        ComponentInstancePtr::new(p) as ComponentInstanceAnyPtr,
                        cast_dependency as CastFunction,
                    )
                });
            }

            if type_id == TypeId::of::<dyn TestTrait3 + Sync + Send>() {
                return TestDependency::create(self).map(|p| {
                    (
                        ComponentInstancePtr::new(p) as ComponentInstanceAnyPtr,
                        cast_trait as CastFunction,
                    )
                });
            }

            Err(ComponentInstanceProviderError::NoPrimaryInstance(type_id))
        }

        fn instances(
            &mut self,
            type_id: TypeId,
        ) -> Result<Vec<(ComponentInstanceAnyPtr, CastFunction)>, ComponentInstanceProviderError>
        {
            self.primary_instance(type_id)
                .map(|(p, cast)| vec![(p, cast)])
        }

        fn instance_by_name(
            &mut self,
            name: &str,
            type_id: TypeId,
        ) -> Result<(ComponentInstanceAnyPtr, CastFunction), ComponentInstanceProviderError>
        {
            if name == "test_dependency" {
                self.primary_instance(type_id)
            } else {
                Err(ComponentInstanceProviderError::NoNamedInstance {
                    name: name.to_string(),
                    type_id,
                })
            }
        }
    }

    #[test]
    fn should_directly_create_component() {
        let component = TestComponent1::create(&mut TestDependencyInstanceProvider).unwrap();

        assert_eq!(component.default, 0);
        assert_eq!(component.default_expr, -1);
        assert_eq!(component.all_dependencies.len(), 1);
    }

    #[test]
    fn should_register_components() {
        let registry = StaticComponentDefinitionRegistry::new(false).unwrap();

        let definition = registry.primary_component_typed::<TestDependency>().unwrap();
        assert_eq!(definition.names, vec!["test_dependency".to_string()]);
        assert_eq!(definition.scope_name, SINGLETON);

        let definition = registry.primary_component_typed::<TestComponent2>().unwrap();
        assert_eq!(definition.names, vec!["dep2".to_string()]);
        assert_eq!(definition.scope_name, PROTOTYPE);

        assert!(registry.is_name_registered("test_dependency"));
        assert!(registry.is_registered_typed::<dyn TestTrait1 + Send + Sync>());
    }

    #[test]
    fn should_register_aliases() {
        let registry = StaticComponentDefinitionRegistry::new(false).unwrap();

        let definition = registry
            .primary_component_typed::<dyn TestTrait2 + Send + Sync>()
            .unwrap();
        assert_eq!(
            definition.resolved_type_id,
            TypeId::of::<TestComponent2>()
        );
        assert_eq!(
            registry
                .components_by_type_typed::<dyn TestTrait2 + Send + Sync>()
                .len(),
            2
        );

        let definition = registry
            .component_by_name(
                "aliased_dependency",
                TypeId::of::<dyn TestTrait3 + Send + Sync>(),
            )
            .unwrap();
        assert_eq!(
            definition.resolved_type_id,
            TypeId::of::<TestDependency>()
        );
    }
}
