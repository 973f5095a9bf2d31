//! Resolver traits for graph-backed resolution.

use std::sync::Arc;

use crate::callable::{self, Callable, Curried, Outcome};
use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::registration::AnyArc;

/// Object-safe core of every resolver.
///
/// [`Scope`](crate::Scope) implements it, and producers that declare an
/// `Arc<dyn ResolverCore>` parameter receive a handle to the scope that is
/// resolving them. That self binding is ambient: it never needs a definition
/// and it is not a dependency cycle.
///
/// Most callers use the generic methods of [`Resolver`] instead.
pub trait ResolverCore: Send + Sync {
    /// Resolves the value stored under `key`.
    ///
    /// Trait objects are stored as `Arc<Arc<dyn Trait>>` erased to
    /// `Arc<dyn Any + Send + Sync>`.
    ///
    /// # Returns
    ///
    /// * `Ok(AnyArc)` - The resolved value
    /// * `Err(DiError)` - Missing definition, producer failure, cycle, etc.
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc>;
}

/// Typed resolution, currying and invocation on top of [`ResolverCore`].
///
/// Implemented for every `ResolverCore`, including `dyn ResolverCore`.
///
/// # Examples
///
/// ```
/// use ferrous_wire::{args, Arg, Lifetime, Registry, Resolver};
/// use std::sync::Arc;
///
/// trait Rate: Send + Sync {
///     fn percent(&self) -> i64;
/// }
///
/// struct Flat;
/// impl Rate for Flat {
///     fn percent(&self) -> i64 { 10 }
/// }
///
/// let mut registry = Registry::new();
/// registry.add(|| Arc::new(Flat) as Arc<dyn Rate>, Lifetime::Singleton).unwrap();
/// let graph = registry.build().unwrap();
///
/// let scope = graph.new_scope();
/// let rate = scope.resolve::<dyn Rate>().unwrap();
/// assert_eq!(rate.percent(), 10);
///
/// let apply = scope
///     .curry(|amount: Arg<i64>, rate: Arc<dyn Rate>| *amount * rate.percent() / 100)
///     .unwrap();
/// assert_eq!(apply.arity(), 1);
/// assert_eq!(apply.call(args![250i64]).unwrap(), 25);
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves `T`, usually a trait object.
    ///
    /// # Returns
    ///
    /// * `Ok(Arc<T>)` - The resolved instance
    /// * `Err(DiError)` - Resolution error
    fn resolve<T>(&self) -> DiResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let any = self.resolve_any(&Key::of::<T>())?;
        any.downcast::<Arc<T>>()
            .map(|stored| (*stored).clone())
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
    }

    /// Resolves `T`, returning `None` when nothing defines it.
    ///
    /// Only a missing definition for `T` itself maps to `None`; a missing
    /// transitive input is still an error.
    fn try_resolve<T>(&self) -> DiResult<Option<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        match self.resolve::<T>() {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_top_level_missing() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Binds every parameter of `f` this resolver can satisfy and leaves the
    /// rest open.
    ///
    /// Parameters whose own definition is missing become open slots, in
    /// declaration order; any other resolution error aborts. A trailing
    /// [`Rest`](crate::Rest) parameter is always open.
    fn curry<F, Args>(&self, f: F) -> DiResult<Curried<F::Output>>
    where
        F: Callable<Args>,
    {
        callable::curry(self, f)
    }

    /// Curries `f` and calls it with no arguments.
    ///
    /// Fails with `UnboundParameters` when any parameter stays open. When `f`
    /// returns `Result<(), E>`, an `Err` becomes the result of `invoke`.
    fn invoke<F, Args>(&self, f: F) -> DiResult<()>
    where
        F: Callable<Args>,
        F::Output: Outcome,
    {
        callable::invoke(self, f)
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
