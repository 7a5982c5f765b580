//! Middleware registry.
//!
//! Middleware here is any value an application wants injected into its
//! controllers: a database handle, a template renderer, a translator. Values
//! are registered once at startup and resolved by concrete type on every
//! request.
//!
//! ```rust
//! use ela::middleware::Registry;
//!
//! #[derive(Clone)]
//! struct Db(&'static str);
//!
//! #[derive(Clone)]
//! struct Repo(&'static str);
//!
//! let registry = Registry::new();
//! registry.register(Db("postgres://"));
//! // the factory runs now, against what is registered so far
//! registry.register_factory(|db: Db| Repo(db.0)).unwrap();
//!
//! assert_eq!(registry.snapshot().resolve::<Repo>().unwrap().0, "postgres://");
//! ```

mod scope;

use std::any::type_name;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error};

use crate::error::Error;
use crate::handler::Injectable;

pub use scope::Scope;
pub(crate) use scope::Entry;

/// Ordered, append-only collection of middleware values.
///
/// Cloning is cheap and yields a handle to the same registry. Reads take a
/// snapshot under a read lock, so a request never observes a half-finished
/// registration and never holds the lock while its controllers run.
#[derive(Clone, Default)]
pub struct Registry {
    entries: Arc<RwLock<Vec<Entry>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value`. A later value of the same type shadows this one.
    pub fn register<T: Send + Sync + 'static>(&self, value: T) {
        self.entries.write().push(Entry::new(value));
        debug!(middleware = type_name::<T>(), "middleware registered");
    }

    /// Invokes `factory` with arguments resolved from the registry as it is
    /// right now and registers the value it returns.
    ///
    /// If a parameter cannot be resolved, nothing is registered.
    pub fn register_factory<Args, F>(&self, factory: F) -> Result<(), Error>
    where
        F: Injectable<Args>,
        F::Output: Send + Sync + 'static,
    {
        match factory.invoke(&self.snapshot()) {
            Ok(value) => {
                self.register(value);
                Ok(())
            }
            Err(e) => {
                error!(factory = type_name::<F>(), error = %e, "injection failed");
                Err(e)
            }
        }
    }

    /// Copies the current registry contents into a fresh [`Scope`].
    pub fn snapshot(&self) -> Scope {
        Scope::from_entries(self.entries.read().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct A {
        v: u32,
    }

    #[derive(Clone, Debug, PartialEq)]
    struct B {
        from_a: u32,
    }

    #[test]
    fn factory_sees_registry_at_registration_time() {
        let registry = Registry::new();
        registry.register(A { v: 1 });
        registry.register_factory(|a: A| B { from_a: a.v }).unwrap();
        registry.register(A { v: 2 });

        let scope = registry.snapshot();
        assert_eq!(scope.resolve::<B>().unwrap(), B { from_a: 1 });
        assert_eq!(scope.resolve::<A>().unwrap(), A { v: 2 });
    }

    #[test]
    fn failed_factory_registers_nothing() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        let registry = Registry::new();
        let result = registry.register_factory(|a: A| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            B { from_a: a.v }
        });

        assert!(matches!(result, Err(Error::UnresolvedDependency { .. })));
        assert_eq!(CALLS.load(Ordering::SeqCst), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn snapshot_is_detached_from_later_registrations() {
        let registry = Registry::new();
        registry.register(A { v: 1 });
        let snapshot = registry.snapshot();
        registry.register(A { v: 2 });

        assert_eq!(snapshot.resolve::<A>().unwrap(), A { v: 1 });
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn clones_share_one_registry() {
        let registry = Registry::new();
        registry.clone().register(A { v: 3 });
        assert_eq!(registry.snapshot().resolve::<A>().unwrap(), A { v: 3 });
    }
}
