//! Cleanup capability for request-scoped resources.

use crate::error::BoxError;

/// Teardown hook for instances created inside a request scope.
///
/// Register the producer with [`Registry::add_closable`](crate::Registry::add_closable)
/// and every instance it builds in a request scope is closed when that scope
/// ends, in creation order, whether or not the request succeeded. A failing
/// hook does not stop the hooks after it.
///
/// The produced trait must carry `Close` as a supertrait so the trait object
/// itself is closable.
///
/// # Examples
///
/// ```
/// use ferrous_wire::{Close, BoxError, Lifetime, Registry, Ambient, Resolver};
/// use std::sync::{Arc, Mutex};
///
/// trait Connection: Close {
///     fn id(&self) -> u32;
/// }
///
/// struct Pooled(Arc<Mutex<Vec<u32>>>);
///
/// impl Connection for Pooled {
///     fn id(&self) -> u32 { 7 }
/// }
///
/// impl Close for Pooled {
///     fn close(&self) -> Result<(), BoxError> {
///         self.0.lock().unwrap().push(self.id());
///         Ok(())
///     }
/// }
///
/// let closed = Arc::new(Mutex::new(Vec::new()));
/// let log = closed.clone();
///
/// let mut registry = Registry::new();
/// registry
///     .add_closable(move || Arc::new(Pooled(log.clone())) as Arc<dyn Connection>, Lifetime::PerRequest)
///     .unwrap();
/// let graph = registry.build().unwrap();
///
/// let scope = graph.new_request_scope(Ambient::new());
/// assert_eq!(scope.resolve::<dyn Connection>().unwrap().id(), 7);
/// scope.end().unwrap();
/// assert_eq!(*closed.lock().unwrap(), vec![7]);
/// ```
pub trait Close: Send + Sync {
    /// Release whatever the instance holds for the request.
    fn close(&self) -> Result<(), BoxError>;
}
