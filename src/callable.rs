//! Parameter descriptors, producers, currying and invocation.
//!
//! A function's parameter types are its descriptor. Each parameter is one of:
//!
//! - `Arc<T>`: resolved from the graph (or from an ambient binding) by `T`
//! - [`Arg<T>`]: a plain value the caller supplies, always left open
//! - [`Rest<T>`]: a trailing variadic tail, always left open
//!
//! Producers only take `Arc<T>` parameters. Curried functions may mix all
//! three.

use std::any::{type_name, Any};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::error::{BoxError, DiError, DiResult, SharedError};
use crate::key::Key;
use crate::registration::AnyArc;
use crate::traits::ResolverCore;

/// A caller-supplied argument for an open slot.
pub type Supplied = Box<dyn Any + Send>;

/// Builds the argument list for [`Curried::call`].
///
/// ```
/// use ferrous_wire::args;
///
/// let supplied = args![1i32, "two".to_string()];
/// assert_eq!(supplied.len(), 2);
/// ```
#[macro_export]
macro_rules! args {
    ($($value:expr),* $(,)?) => {
        ::std::vec![$(::std::boxed::Box::new($value) as $crate::Supplied),*]
    };
}

/// What fills one parameter position when a function is called.
#[doc(hidden)]
pub enum Slot {
    Resolved(AnyArc),
    Supplied(Supplied),
    Rest(Vec<Supplied>),
}

/// Static description of one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    /// Key resolved from the graph, `None` for caller-supplied values.
    pub key: Option<Key>,
    pub type_name: &'static str,
    pub variadic: bool,
}

impl ParamSpec {
    /// True when resolution alone can fill the parameter.
    pub fn is_injectable(&self) -> bool {
        self.key.is_some() && !self.variadic
    }
}

/// A type usable as a parameter of a producer or curried function.
pub trait Param: Sized + Send + 'static {
    fn spec() -> ParamSpec;

    #[doc(hidden)]
    fn from_slot(slot: Slot) -> DiResult<Self>;
}

impl<T> Param for Arc<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    fn spec() -> ParamSpec {
        ParamSpec {
            key: Some(Key::of::<T>()),
            type_name: type_name::<T>(),
            variadic: false,
        }
    }

    fn from_slot(slot: Slot) -> DiResult<Self> {
        let mismatch = || DiError::TypeMismatch(type_name::<T>());
        match slot {
            Slot::Resolved(any) => any
                .downcast::<Arc<T>>()
                .map(|stored| (*stored).clone())
                .map_err(|_| mismatch()),
            Slot::Supplied(boxed) => boxed
                .downcast::<Arc<T>>()
                .map(|value| *value)
                .map_err(|_| mismatch()),
            Slot::Rest(_) => Err(mismatch()),
        }
    }
}

/// A parameter the caller supplies when the curried function is called.
///
/// ```
/// use ferrous_wire::Arg;
///
/// let port = Arg(8080u16);
/// assert_eq!(*port + 1, 8081);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Arg<T>(pub T);

impl<T> Arg<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Arg<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Arg<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T: Send + 'static> Param for Arg<T> {
    fn spec() -> ParamSpec {
        ParamSpec {
            key: None,
            type_name: type_name::<T>(),
            variadic: false,
        }
    }

    fn from_slot(slot: Slot) -> DiResult<Self> {
        match slot {
            Slot::Supplied(boxed) => boxed
                .downcast::<T>()
                .map(|value| Arg(*value))
                .map_err(|_| DiError::TypeMismatch(type_name::<T>())),
            _ => Err(DiError::TypeMismatch(type_name::<T>())),
        }
    }
}

/// Trailing variadic parameter. Collects every supplied argument left over
/// after the fixed open slots are filled.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rest<T>(pub Vec<T>);

impl<T> Deref for Rest<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Vec<T> {
        &self.0
    }
}

impl<T: Send + 'static> Param for Rest<T> {
    fn spec() -> ParamSpec {
        ParamSpec {
            key: None,
            type_name: type_name::<Rest<T>>(),
            variadic: true,
        }
    }

    fn from_slot(slot: Slot) -> DiResult<Self> {
        match slot {
            Slot::Rest(values) => values
                .into_iter()
                .map(|boxed| {
                    boxed
                        .downcast::<T>()
                        .map(|value| *value)
                        .map_err(|_| DiError::TypeMismatch(type_name::<T>()))
                })
                .collect::<DiResult<Vec<T>>>()
                .map(Rest),
            _ => Err(DiError::TypeMismatch(type_name::<Rest<T>>())),
        }
    }
}

/// A function whose parameters are all [`Param`]s.
///
/// Implemented for every `Fn` of up to eight parameters; `Args` is the tuple
/// of parameter types.
pub trait Callable<Args>: Send + Sync + 'static {
    type Output;

    fn params() -> Vec<ParamSpec>;

    #[doc(hidden)]
    fn call_with(&self, slots: Vec<Slot>) -> DiResult<Self::Output>;
}

macro_rules! count {
    () => { 0usize };
    ($head:ident $($tail:ident)*) => { 1usize + count!($($tail)*) };
}

macro_rules! impl_callable {
    ($($P:ident),*) => {
        impl<Func, Out, $($P,)*> Callable<($($P,)*)> for Func
        where
            Func: Fn($($P),*) -> Out + Send + Sync + 'static,
            $($P: Param,)*
        {
            type Output = Out;

            fn params() -> Vec<ParamSpec> {
                vec![$(<$P as Param>::spec()),*]
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn call_with(&self, slots: Vec<Slot>) -> DiResult<Out> {
                let expected = count!($($P)*);
                let supplied = slots.len();
                if supplied != expected {
                    return Err(DiError::ArgumentCount { expected, supplied });
                }

                let mut slots = slots.into_iter();
                $(
                    let $P = <$P as Param>::from_slot(
                        slots.next().ok_or(DiError::ArgumentCount { expected, supplied })?,
                    )?;
                )*
                Ok((self)($($P),*))
            }
        }
    };
}

impl_callable!();
impl_callable!(P1);
impl_callable!(P1, P2);
impl_callable!(P1, P2, P3);
impl_callable!(P1, P2, P3, P4);
impl_callable!(P1, P2, P3, P4, P5);
impl_callable!(P1, P2, P3, P4, P5, P6);
impl_callable!(P1, P2, P3, P4, P5, P6, P7);
impl_callable!(P1, P2, P3, P4, P5, P6, P7, P8);

/// Return type of a producer: `Arc<T>`, or `Result<Arc<T>, E>` for
/// producers that can fail.
pub trait Produce: Send + 'static {
    /// The type the producer defines.
    type Service: ?Sized + Send + Sync + 'static;

    /// Whether the producer declares an error return.
    const FALLIBLE: bool;

    #[doc(hidden)]
    fn into_service(self) -> Result<Arc<Self::Service>, BoxError>;
}

impl<T> Produce for Arc<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    type Service = T;
    const FALLIBLE: bool = false;

    fn into_service(self) -> Result<Arc<T>, BoxError> {
        Ok(self)
    }
}

impl<T, E> Produce for Result<Arc<T>, E>
where
    T: ?Sized + Send + Sync + 'static,
    E: Into<BoxError> + Send + 'static,
{
    type Service = T;
    const FALLIBLE: bool = true;

    fn into_service(self) -> Result<Arc<T>, BoxError> {
        self.map_err(Into::into)
    }
}

/// Return type of an invoked function: `()` or `Result<(), E>`.
pub trait Outcome {
    fn into_outcome(self) -> DiResult<()>;
}

impl Outcome for () {
    fn into_outcome(self) -> DiResult<()> {
        Ok(())
    }
}

impl<E: Into<BoxError>> Outcome for Result<(), E> {
    fn into_outcome(self) -> DiResult<()> {
        self.map_err(|err| {
            let boxed: BoxError = err.into();
            DiError::InvokeFailed(SharedError::from(boxed))
        })
    }
}

enum Bound {
    Resolved(AnyArc),
    Open(ParamSpec),
    Rest(ParamSpec),
}

/// A function with its resolvable parameters already bound.
///
/// Calling it fills the open slots, in declaration order, from the supplied
/// arguments; a variadic tail takes whatever is left.
pub struct Curried<R> {
    function: &'static str,
    slots: Vec<Bound>,
    call: Box<dyn Fn(Vec<Slot>) -> DiResult<R> + Send + Sync>,
}

impl<R> Curried<R> {
    /// Number of fixed open slots.
    pub fn arity(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, Bound::Open(_)))
            .count()
    }

    /// True when the function ends in a [`Rest`] parameter.
    pub fn is_variadic(&self) -> bool {
        matches!(self.slots.last(), Some(Bound::Rest(_)))
    }

    /// Type names of the open slots, variadic tail included.
    pub fn open_params(&self) -> Vec<&'static str> {
        self.slots
            .iter()
            .filter_map(|slot| match slot {
                Bound::Resolved(_) => None,
                Bound::Open(spec) | Bound::Rest(spec) => Some(spec.type_name),
            })
            .collect()
    }

    /// Calls the function, merging `args` into the open slots.
    pub fn call(&self, args: Vec<Supplied>) -> DiResult<R> {
        let expected = self.arity();
        let supplied = args.len();
        if supplied < expected || (supplied > expected && !self.is_variadic()) {
            return Err(DiError::ArgumentCount { expected, supplied });
        }

        let mut args = args.into_iter();
        let mut slots = Vec::with_capacity(self.slots.len());
        for bound in &self.slots {
            let slot = match bound {
                Bound::Resolved(value) => Slot::Resolved(value.clone()),
                Bound::Open(_) => Slot::Supplied(
                    args.next()
                        .ok_or(DiError::ArgumentCount { expected, supplied })?,
                ),
                Bound::Rest(_) => Slot::Rest(args.by_ref().collect()),
            };
            slots.push(slot);
        }

        (self.call)(slots)
    }
}

impl<R> fmt::Debug for Curried<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Curried")
            .field("function", &self.function)
            .field("open", &self.open_params())
            .finish()
    }
}

pub(crate) fn curry<R, F, Args>(resolver: &R, function: F) -> DiResult<Curried<F::Output>>
where
    R: ResolverCore + ?Sized,
    F: Callable<Args>,
{
    let name = type_name::<F>();
    let params = <F as Callable<Args>>::params();
    let mut slots = Vec::with_capacity(params.len());

    for (position, spec) in params.iter().enumerate() {
        if spec.variadic {
            if position + 1 != params.len() {
                return Err(DiError::InvalidProducer {
                    producer: name,
                    reason: format!("variadic parameter {} must be last", spec.type_name),
                });
            }
            slots.push(Bound::Rest(*spec));
            continue;
        }

        let Some(key) = spec.key else {
            slots.push(Bound::Open(*spec));
            continue;
        };

        match resolver.resolve_any(&key) {
            Ok(value) => slots.push(Bound::Resolved(value)),
            Err(err) if err.is_top_level_missing() => slots.push(Bound::Open(*spec)),
            Err(err) => return Err(err),
        }
    }

    let curried = Curried {
        function: name,
        slots,
        call: Box::new(move |slots| <F as Callable<Args>>::call_with(&function, slots)),
    };
    tracing::trace!(function = name, open = curried.arity(), "curried");
    Ok(curried)
}

pub(crate) fn invoke<R, F, Args>(resolver: &R, function: F) -> DiResult<()>
where
    R: ResolverCore + ?Sized,
    F: Callable<Args>,
    F::Output: Outcome,
{
    let curried = curry(resolver, function)?;
    let open = curried.open_params();
    if !open.is_empty() {
        return Err(DiError::UnboundParameters(open));
    }
    curried.call(Vec::new())?.into_outcome()
}
