//! Injection scope: the ordered pool of typed values a controller's
//! parameters are resolved against.

use std::any::{Any, TypeId, type_name};
use std::sync::Arc;

use crate::error::Error;

/// One registered value, tagged with its concrete type.
#[derive(Clone)]
pub(crate) struct Entry {
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

impl Entry {
    pub(crate) fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            value: Arc::new(value),
        }
    }
}

/// A snapshot of registered middleware plus any request-scoped values.
///
/// Resolution scans from the back, so the most recently added value of a
/// type shadows every earlier one. Values added with [`Scope::with`] after
/// the snapshot was taken therefore take precedence over registry values.
#[derive(Clone, Default)]
pub struct Scope {
    entries: Vec<Entry>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_entries(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    /// Adds a supplemental value. Returns `self` for chaining.
    pub fn with<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.insert(value);
        self
    }

    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) {
        self.entries.push(Entry::new(value));
    }

    /// Resolves the last value of exactly type `T`.
    pub fn resolve<T: Clone + Send + Sync + 'static>(&self) -> Result<T, Error> {
        let wanted = TypeId::of::<T>();
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.type_id == wanted)
            .and_then(|entry| entry.value.downcast_ref::<T>())
            .cloned()
            .ok_or(Error::UnresolvedDependency { type_name: type_name::<T>() })
    }

    pub(crate) fn provides(&self, type_id: TypeId) -> bool {
        self.entries.iter().any(|entry| entry.type_id == type_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct A {
        v: u32,
    }

    #[test]
    fn last_value_of_a_type_wins() {
        let scope = Scope::new().with(A { v: 1 }).with(7u8).with(A { v: 2 });
        assert_eq!(scope.resolve::<A>().unwrap(), A { v: 2 });
        assert_eq!(scope.resolve::<u8>().unwrap(), 7);
    }

    #[test]
    fn missing_type_names_the_dependency() {
        let err = Scope::new().with(A { v: 1 }).resolve::<String>().unwrap_err();
        match err {
            Error::UnresolvedDependency { type_name } => assert!(type_name.contains("String")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn resolution_is_by_exact_type() {
        let scope = Scope::new().with(A { v: 1 });
        assert!(scope.resolve::<Arc<A>>().is_err());
        assert!(scope.provides(TypeId::of::<A>()));
    }
}
