use crate::component::Injectable;
pub use crate::error::ComponentInstanceProviderError;
use std::any::{Any, TypeId};
use std::error::Error;
use std::sync::Arc;

pub type ComponentInstancePtr<T> = Arc<T>;

pub type ComponentInstanceAnyPtr = ComponentInstancePtr<dyn Any + Send + Sync + 'static>;

/// Shared pointer to an error returned by user code, e.g. a component constructor.
pub type ErrorPtr = Arc<dyn Error + Send + Sync + 'static>;

/// Casts a type-erased instance to a `Box<ComponentInstancePtr<T>>` of the type which was
/// requested, e.g. a `dyn Trait` for an alias. On failure, the original instance is returned.
pub type CastFunction =
    fn(instance: ComponentInstanceAnyPtr) -> Result<Box<dyn Any>, ComponentInstanceAnyPtr>;

/// Generic provider for component instances.
pub trait ComponentInstanceProvider {
    /// Tries to return a primary instance of a given component. A primary component is either the
    /// only one registered or one marked as primary.
    fn primary_instance(
        &mut self,
        type_id: TypeId,
    ) -> Result<(ComponentInstanceAnyPtr, CastFunction), ComponentInstanceProviderError>;

    /// Tries to create all available instances of a given component.
    fn instances(
        &mut self,
        type_id: TypeId,
    ) -> Result<Vec<(ComponentInstanceAnyPtr, CastFunction)>, ComponentInstanceProviderError>;

    /// Tries to return an instance with the given name and type.
    fn instance_by_name(
        &mut self,
        name: &str,
        type_id: TypeId,
    ) -> Result<(ComponentInstanceAnyPtr, CastFunction), ComponentInstanceProviderError>;
}

/// Helper trait for [ComponentInstanceProvider] providing strongly-typed access.
pub trait TypedComponentInstanceProvider {
    /// Typesafe version of [ComponentInstanceProvider::primary_instance].
    fn primary_instance_typed<T: Injectable + ?Sized>(
        &mut self,
    ) -> Result<ComponentInstancePtr<T>, ComponentInstanceProviderError>;

    /// Tries to get an instance like [TypedComponentInstanceProvider::primary_instance_typed] does,
    /// but returns `None` on missing instance, including a missing override for a parameter.
    fn primary_instance_option<T: Injectable + ?Sized>(
        &mut self,
    ) -> Result<Option<ComponentInstancePtr<T>>, ComponentInstanceProviderError>;

    /// Typesafe version of [ComponentInstanceProvider::instances].
    fn instances_typed<T: Injectable + ?Sized>(
        &mut self,
    ) -> Result<Vec<ComponentInstancePtr<T>>, ComponentInstanceProviderError>;

    /// Typesafe version of [ComponentInstanceProvider::instance_by_name].
    fn instance_by_name_typed<T: Injectable + ?Sized>(
        &mut self,
        name: &str,
    ) -> Result<ComponentInstancePtr<T>, ComponentInstanceProviderError>;

    /// Tries to get an instance like [TypedComponentInstanceProvider::instance_by_name_typed] does,
    /// but returns `None` on missing instance.
    fn instance_by_name_option<T: Injectable + ?Sized>(
        &mut self,
        name: &str,
    ) -> Result<Option<ComponentInstancePtr<T>>, ComponentInstanceProviderError>;
}

impl<CIP: ComponentInstanceProvider + ?Sized> TypedComponentInstanceProvider for CIP {
    fn primary_instance_typed<T: Injectable + ?Sized>(
        &mut self,
    ) -> Result<ComponentInstancePtr<T>, ComponentInstanceProviderError> {
        let type_id = TypeId::of::<T>();
        self.primary_instance(type_id)
            .and_then(move |(p, cast)| cast_instance(p, cast, type_id))
    }

    fn primary_instance_option<T: Injectable + ?Sized>(
        &mut self,
    ) -> Result<Option<ComponentInstancePtr<T>>, ComponentInstanceProviderError> {
        match self.primary_instance_typed::<T>() {
            Ok(p) => Ok(Some(p)),
            Err(error) if error.is_missing(TypeId::of::<T>(), None) => Ok(None),
            Err(error) => Err(error),
        }
    }

    fn instances_typed<T: Injectable + ?Sized>(
        &mut self,
    ) -> Result<Vec<ComponentInstancePtr<T>>, ComponentInstanceProviderError> {
        let type_id = TypeId::of::<T>();
        self.instances(type_id).and_then(|instances| {
            instances
                .into_iter()
                .map(move |(p, cast)| cast_instance(p, cast, type_id))
                .collect()
        })
    }

    fn instance_by_name_typed<T: Injectable + ?Sized>(
        &mut self,
        name: &str,
    ) -> Result<ComponentInstancePtr<T>, ComponentInstanceProviderError> {
        let type_id = TypeId::of::<T>();
        self.instance_by_name(name, type_id)
            .and_then(move |(p, cast)| cast_instance(p, cast, type_id))
    }

    fn instance_by_name_option<T: Injectable + ?Sized>(
        &mut self,
        name: &str,
    ) -> Result<Option<ComponentInstancePtr<T>>, ComponentInstanceProviderError> {
        match self.instance_by_name_typed::<T>(name) {
            Ok(p) => Ok(Some(p)),
            Err(error) if error.is_missing(TypeId::of::<T>(), Some(name)) => Ok(None),
            Err(error) => Err(error),
        }
    }
}

pub(crate) fn cast_instance<T: Injectable + ?Sized>(
    instance: ComponentInstanceAnyPtr,
    cast: CastFunction,
    type_id: TypeId,
) -> Result<ComponentInstancePtr<T>, ComponentInstanceProviderError> {
    debug_assert_eq!(type_id, TypeId::of::<T>());
    let p = cast(instance)
        .map_err(|_| ComponentInstanceProviderError::IncompatibleComponent(type_id))?;
    if let Ok(p) = p.downcast::<ComponentInstancePtr<T>>() {
        Ok(*p)
    } else {
        Err(ComponentInstanceProviderError::IncompatibleComponent(
            type_id,
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::component::Injectable;
    use crate::instance_provider::{
        CastFunction, ComponentInstanceAnyPtr, ComponentInstanceProvider,
        ComponentInstanceProviderError, ComponentInstancePtr, TypedComponentInstanceProvider,
    };
    use crate::type_key::TypeKey;
    use std::any::{Any, TypeId};

    #[derive(Debug)]
    struct TestComponent;

    impl Injectable for TestComponent {}

    fn cast(instance: ComponentInstanceAnyPtr) -> Result<Box<dyn Any>, ComponentInstanceAnyPtr> {
        instance
            .downcast::<TestComponent>()
            .map(|p| Box::new(p) as Box<dyn Any>)
    }

    struct ErrorProvider(ComponentInstanceProviderError);

    impl ComponentInstanceProvider for ErrorProvider {
        fn primary_instance(
            &mut self,
            _type_id: TypeId,
        ) -> Result<(ComponentInstanceAnyPtr, CastFunction), ComponentInstanceProviderError>
        {
            Err(self.0.clone())
        }

        fn instances(
            &mut self,
            _type_id: TypeId,
        ) -> Result<Vec<(ComponentInstanceAnyPtr, CastFunction)>, ComponentInstanceProviderError>
        {
            Ok(vec![(
                ComponentInstancePtr::new(TestComponent) as ComponentInstanceAnyPtr,
                cast as CastFunction,
            )])
        }

        fn instance_by_name(
            &mut self,
            _name: &str,
            _type_id: TypeId,
        ) -> Result<(ComponentInstanceAnyPtr, CastFunction), ComponentInstanceProviderError>
        {
            Ok((
                ComponentInstancePtr::new(0u8) as ComponentInstanceAnyPtr,
                cast as CastFunction,
            ))
        }
    }

    fn no_named_instance(name: &str, type_id: TypeId) -> ComponentInstanceProviderError {
        ComponentInstanceProviderError::NoNamedInstance {
            name: name.to_string(),
            type_id,
        }
    }

    #[test]
    fn should_map_missing_override_to_none() {
        let mut provider = ErrorProvider(ComponentInstanceProviderError::MissingOverride {
            key: TypeKey::of::<TestComponent>(),
            requested: TypeId::of::<TestComponent>(),
        });
        assert!(provider
            .primary_instance_option::<TestComponent>()
            .unwrap()
            .is_none());
    }

    #[test]
    fn should_map_missing_alias_override_to_none() {
        let mut provider = ErrorProvider(ComponentInstanceProviderError::MissingOverride {
            key: TypeKey::of::<u8>(),
            requested: TypeId::of::<TestComponent>(),
        });
        assert!(provider
            .primary_instance_option::<TestComponent>()
            .unwrap()
            .is_none());
    }

    #[test]
    fn should_forward_unrelated_errors_for_options() {
        let mut provider = ErrorProvider(ComponentInstanceProviderError::MissingOverride {
            key: TypeKey::of::<u8>(),
            requested: TypeId::of::<u8>(),
        });
        assert!(matches!(
            provider
                .primary_instance_option::<TestComponent>()
                .unwrap_err(),
            ComponentInstanceProviderError::MissingOverride { .. }
        ));
    }

    #[test]
    fn should_forward_nested_missing_names_for_options() {
        let mut provider = ErrorProvider(no_named_instance("other", TypeId::of::<u8>()));
        assert!(matches!(
            provider
                .primary_instance_option::<TestComponent>()
                .unwrap_err(),
            ComponentInstanceProviderError::NoNamedInstance { .. }
        ));
    }

    #[test]
    fn should_cast_instances() {
        let mut provider = ErrorProvider(no_named_instance("", TypeId::of::<u8>()));
        assert_eq!(provider.instances_typed::<TestComponent>().unwrap().len(), 1);
    }

    #[test]
    fn should_reject_incompatible_instances() {
        let mut provider = ErrorProvider(no_named_instance("", TypeId::of::<u8>()));
        assert!(matches!(
            provider
                .instance_by_name_typed::<TestComponent>("name")
                .unwrap_err(),
            ComponentInstanceProviderError::IncompatibleComponent(_)
        ));
    }
}
