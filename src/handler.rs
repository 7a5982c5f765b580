//! Dependency injection and controller type erasure.
//!
//! # How a controller gets its arguments
//!
//! A controller is any plain function whose parameters are `Clone` types:
//!
//! ```text
//! fn show(ctx: Context, db: Db) { … }            ← user writes this
//!        ↓ router.on("/users/:id", show)
//! show.into_boxed_controller()                   ← Controller blanket impl
//!        ↓
//! Arc::new(FnController { f: show, .. })         ← stored as BoxedController
//!        ↓
//! controller.call(&scope)  at request time       ← one vtable dispatch
//!        ↓
//! show(scope.resolve::<Context>()?, scope.resolve::<Db>()?)
//! ```
//!
//! Binding is positional-by-type: every parameter is looked up by its
//! concrete type, never by name. Two parameters of the same type receive the
//! same (most recently registered) value.

use std::any::{TypeId, type_name};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::Error;
use crate::middleware::Scope;

// ── Dependencies ──────────────────────────────────────────────────────────────

/// One parameter type a controller needs from its scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dependency {
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
}

impl Dependency {
    pub fn of<T: 'static>() -> Self {
        Self { type_id: TypeId::of::<T>(), type_name: type_name::<T>() }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

// ── Injectable ────────────────────────────────────────────────────────────────

/// A function whose arguments can be resolved from a [`Scope`].
///
/// Implemented for every `Fn` of up to eight parameters where each parameter
/// is `Clone + Send + Sync + 'static`. `Args` is the parameter tuple; it only
/// exists so the arity impls do not overlap.
pub trait Injectable<Args>: Send + Sync + 'static {
    type Output;

    /// Parameter types in declaration order.
    fn dependencies() -> Vec<Dependency>;

    /// Resolves every parameter, then calls the function. If any parameter
    /// is missing the function is not called.
    fn invoke(&self, scope: &Scope) -> Result<Self::Output, Error>;
}

macro_rules! impl_injectable {
    ($($ty:ident),*) => {
        impl<F, R, $($ty,)*> Injectable<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> R + Send + Sync + 'static,
            $($ty: Clone + Send + Sync + 'static,)*
        {
            type Output = R;

            fn dependencies() -> Vec<Dependency> {
                vec![$(Dependency::of::<$ty>()),*]
            }

            #[allow(non_snake_case, unused_variables)]
            fn invoke(&self, scope: &Scope) -> Result<R, Error> {
                $(let $ty = scope.resolve::<$ty>()?;)*
                Ok((self)($($ty),*))
            }
        }
    };
}

impl_injectable!();
impl_injectable!(A1);
impl_injectable!(A1, A2);
impl_injectable!(A1, A2, A3);
impl_injectable!(A1, A2, A3, A4);
impl_injectable!(A1, A2, A3, A4, A5);
impl_injectable!(A1, A2, A3, A4, A5, A6);
impl_injectable!(A1, A2, A3, A4, A5, A6, A7);
impl_injectable!(A1, A2, A3, A4, A5, A6, A7, A8);

// ── Outcome ───────────────────────────────────────────────────────────────────

/// What a controller may return.
///
/// `()` always succeeds. `Err(e)` from a `Result<(), E>` becomes a
/// [`Error::RuntimeFault`] carrying `e`'s display text, which the dispatcher
/// answers with `500`.
pub trait IntoOutcome {
    fn into_outcome(self) -> Result<(), Error>;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Result<(), Error> {
        Ok(())
    }
}

impl<E: fmt::Display> IntoOutcome for Result<(), E> {
    fn into_outcome(self) -> Result<(), Error> {
        self.map_err(|e| Error::fault(e.to_string()))
    }
}

// ── Type erasure ──────────────────────────────────────────────────────────────

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` because it appears in the public `Controller` trait.
#[doc(hidden)]
pub trait ErasedController {
    fn call(&self, scope: &Scope) -> Result<(), Error>;
    fn dependencies(&self) -> Vec<Dependency>;
    fn name(&self) -> &'static str;
}

#[doc(hidden)]
pub type BoxedController = Arc<dyn ErasedController + Send + Sync + 'static>;

/// Implemented for every valid controller function.
///
/// Sealed: the blanket impl below is the only one, for any [`Injectable`]
/// function returning [`IntoOutcome`].
pub trait Controller<Args>: private::Sealed<Args> + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_controller(self) -> BoxedController;
}

mod private {
    pub trait Sealed<Args> {}
}

impl<F, Args> private::Sealed<Args> for F
where
    F: Injectable<Args>,
    F::Output: IntoOutcome,
{
}

impl<F, Args> Controller<Args> for F
where
    F: Injectable<Args>,
    F::Output: IntoOutcome,
    Args: 'static,
{
    fn into_boxed_controller(self) -> BoxedController {
        Arc::new(FnController { f: self, _args: PhantomData })
    }
}

struct FnController<F, Args> {
    f: F,
    _args: PhantomData<fn() -> Args>,
}

impl<F, Args> ErasedController for FnController<F, Args>
where
    F: Injectable<Args>,
    F::Output: IntoOutcome,
{
    fn call(&self, scope: &Scope) -> Result<(), Error> {
        self.f.invoke(scope)?.into_outcome()
    }

    fn dependencies(&self) -> Vec<Dependency> {
        F::dependencies()
    }

    fn name(&self) -> &'static str {
        type_name::<F>()
    }
}
