//! Type tokens used to address nodes and ambient bindings.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a resolvable type.
///
/// A key pairs the `TypeId` of a (possibly unsized) type with its
/// `type_name`. Equality and hashing use the `TypeId` only; the name is kept
/// for diagnostics and for matching configured lifetime overrides.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::Key;
///
/// trait Clock: Send + Sync {}
///
/// let key = Key::of::<dyn Clock>();
/// assert!(key.is_polymorphic());
/// assert!(key.type_name().ends_with("Clock"));
/// assert_eq!(key, Key::of::<dyn Clock>());
/// assert!(!Key::of::<String>().is_polymorphic());
/// ```
#[derive(Clone, Copy)]
pub struct Key {
    id: TypeId,
    name: &'static str,
}

impl Key {
    /// Key for `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Full type name, as reported by `std::any::type_name`.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.name
    }

    /// The underlying `TypeId`.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// True when the key names a trait object, the only kind of type a
    /// producer may define.
    pub fn is_polymorphic(&self) -> bool {
        self.name.starts_with("dyn ")
    }

    /// True when the key names an error trait object.
    ///
    /// The check is by name: `dyn Error` itself matches, but a trait that
    /// merely has `Error` as a supertrait does not.
    pub fn is_error_contract(&self) -> bool {
        self.name.starts_with("dyn core::error::Error")
            || self.name.starts_with("dyn std::error::Error")
    }
}

impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Widget: Send + Sync {}

    #[test]
    fn keys_compare_by_type_id() {
        assert_eq!(Key::of::<dyn Widget>(), Key::of::<dyn Widget>());
        assert_ne!(Key::of::<dyn Widget>(), Key::of::<dyn std::error::Error>());
    }

    #[test]
    fn error_trait_objects_are_recognized() {
        assert!(Key::of::<dyn std::error::Error + Send + Sync>().is_error_contract());
        assert!(!Key::of::<dyn Widget>().is_error_contract());
    }

    #[test]
    fn error_subtraits_are_not_recognized() {
        trait Failure: std::error::Error + Send + Sync {}
        assert!(!Key::of::<dyn Failure>().is_error_contract());
        assert!(Key::of::<dyn Failure>().is_polymorphic());
    }

    #[test]
    fn concrete_types_are_not_polymorphic() {
        assert!(!Key::of::<u32>().is_polymorphic());
        assert!(Key::of::<dyn Widget>().is_polymorphic());
    }
}
