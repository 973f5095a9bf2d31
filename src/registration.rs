//! Type-erased producer definitions.

use std::any::{type_name, Any, TypeId};
use std::sync::Arc;

use crate::callable::{Callable, Produce, Slot};
use crate::error::{DiError, DiResult, SharedError};
use crate::internal::CloseHook;
use crate::key::Key;
use crate::lifetime::{IntoLifetime, Lifetime};
use crate::traits::{Close, ResolverCore};

// Type-erased Arc for storage
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

/// Why an erased producer call failed.
pub(crate) enum ProduceError {
    /// The engine could not hand the inputs to the producer.
    Engine(DiError),
    /// The producer returned its own error.
    Producer(SharedError),
}

pub(crate) type Ctor = Arc<dyn Fn(Vec<AnyArc>) -> Result<AnyArc, ProduceError> + Send + Sync>;

/// Extracts a cleanup hook from a freshly produced value.
pub(crate) type Closer = fn(&AnyArc) -> Option<CloseHook>;

/// Identity of a producer: the Rust type of the function or closure.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ProducerId {
    pub(crate) id: TypeId,
    pub(crate) name: &'static str,
}

impl PartialEq for ProducerId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// One validated producer definition.
#[derive(Clone)]
pub(crate) struct Registration {
    pub(crate) key: Key,
    pub(crate) lifetime: Lifetime,
    pub(crate) inputs: Vec<Key>,
    pub(crate) ctor: Ctor,
    pub(crate) fallible: bool,
    pub(crate) producer: ProducerId,
    pub(crate) closer: Option<Closer>,
}

impl Registration {
    /// Validates `producer` and erases it.
    pub(crate) fn from_producer<F, Args>(
        producer: F,
        lifetime: impl IntoLifetime,
        closer: Option<Closer>,
    ) -> DiResult<Self>
    where
        F: Callable<Args>,
        F::Output: Produce,
    {
        let id = ProducerId {
            id: TypeId::of::<F>(),
            name: type_name::<F>(),
        };
        let key = Key::of::<<F::Output as Produce>::Service>();

        let invalid = |reason: String| DiError::InvalidProducer {
            producer: id.name,
            reason,
        };
        if !key.is_polymorphic() {
            return Err(invalid(format!(
                "produces concrete type {}; producers must return a trait object",
                key.type_name()
            )));
        }
        if key.is_error_contract() {
            return Err(invalid(format!("produces error type {}", key.type_name())));
        }
        if key == Key::of::<dyn ResolverCore>() {
            return Err(invalid("the resolver self binding cannot be redefined".to_string()));
        }

        let mut inputs = Vec::new();
        for param in <F as Callable<Args>>::params() {
            match param.key {
                Some(input) if param.is_injectable() => inputs.push(input),
                _ => {
                    return Err(invalid(format!(
                        "parameter {} cannot be injected",
                        param.type_name
                    )))
                }
            }
        }

        let lifetime = lifetime.into_lifetime()?;

        let ctor: Ctor = Arc::new(move |values: Vec<AnyArc>| {
            let slots = values.into_iter().map(Slot::Resolved).collect();
            let output = <F as Callable<Args>>::call_with(&producer, slots)
                .map_err(ProduceError::Engine)?;
            match output.into_service() {
                Ok(service) => Ok(Arc::new(service) as AnyArc),
                Err(err) => Err(ProduceError::Producer(SharedError::from(err))),
            }
        });

        Ok(Self {
            key,
            lifetime,
            inputs,
            ctor,
            fallible: <F::Output as Produce>::FALLIBLE,
            producer: id,
            closer,
        })
    }
}

/// Cleanup extractor for values of type `T`.
pub(crate) fn close_hook<T>(value: &AnyArc) -> Option<CloseHook>
where
    T: ?Sized + Close + 'static,
{
    let service = value.clone().downcast::<Arc<T>>().ok()?;
    Some(Box::new(move || service.close()))
}
