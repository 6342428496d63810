//! Identity of a dependency slot.

use derivative::Derivative;
use std::any::{type_name, TypeId};
use std::fmt::{Display, Formatter};

/// Identifies a requested dependency: a type and an optional qualifier (name). Keys are equal iff
/// they point to the same slot - the type name is carried only for diagnostics.
#[derive(Derivative, Clone)]
#[derivative(Debug, PartialEq, Eq, Hash)]
pub struct TypeKey {
    type_id: TypeId,
    #[derivative(PartialEq = "ignore", Hash = "ignore")]
    type_name: &'static str,
    qualifier: Option<String>,
}

impl TypeKey {
    #[inline]
    pub fn new(type_id: TypeId, type_name: &'static str) -> Self {
        Self {
            type_id,
            type_name,
            qualifier: None,
        }
    }

    /// Key of an unqualified `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(TypeId::of::<T>(), type_name::<T>())
    }

    /// Key of `T` qualified with given name.
    #[inline]
    pub fn named<T: ?Sized + 'static, N: ToString>(name: N) -> Self {
        Self::of::<T>().with_qualifier(name)
    }

    #[inline]
    pub fn with_qualifier<N: ToString>(mut self, name: N) -> Self {
        self.qualifier = Some(name.to_string());
        self
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }
}

impl Display for TypeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{}(\"{}\")", self.type_name, qualifier),
            None => f.write_str(self.type_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::type_key::TypeKey;
    use std::any::TypeId;

    struct Param;

    #[test]
    fn should_ignore_type_name_in_equality() {
        assert_eq!(
            TypeKey::of::<Param>(),
            TypeKey::new(TypeId::of::<Param>(), "renamed")
        );
        assert_ne!(TypeKey::of::<Param>(), TypeKey::of::<u8>());
    }

    #[test]
    fn should_distinguish_qualifiers() {
        assert_ne!(TypeKey::of::<Param>(), TypeKey::named::<Param, _>("a"));
        assert_ne!(
            TypeKey::named::<Param, _>("a"),
            TypeKey::named::<Param, _>("b")
        );
        assert_eq!(
            TypeKey::named::<Param, _>("a"),
            TypeKey::of::<Param>().with_qualifier("a")
        );
    }

    #[test]
    fn should_display_qualifier() {
        let key = TypeKey::new(TypeId::of::<Param>(), "Param").with_qualifier("first");
        assert_eq!(key.to_string(), "Param(\"first\")");
        assert_eq!(key.qualifier(), Some("first"));
    }
}
