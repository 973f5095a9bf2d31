//! Request binding: ambient values and request-scoped handlers.
//!
//! The transport (an HTTP server, a queue consumer, ...) stays outside the
//! crate. It builds an [`Ambient`] from whatever it has per request, and
//! either opens a request scope itself with
//! [`Graph::new_request_scope`] / [`Scope::end`](crate::Scope::end), or lets
//! a [`RequestHandler`] do both around one handler call.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::callable::{Callable, Slot};
use crate::error::{DiError, DiResult, MissingDependency};
use crate::internal::Map;
use crate::key::Key;
use crate::observer::ResolutionLogger;
use crate::provider::{Graph, Scope};
use crate::registration::AnyArc;
use crate::traits::{Resolver, ResolverCore};

/// Values a request scope supplies directly, keyed by type.
///
/// Ambient values take priority over nodes producing the same type.
///
/// ```
/// use ferrous_wire::Ambient;
/// use std::sync::Arc;
///
/// struct RequestId(u64);
///
/// let ambient = Ambient::new().with(Arc::new(RequestId(42)));
/// assert_eq!(ambient.get::<RequestId>().unwrap().0, 42);
/// assert!(ambient.get::<String>().is_none());
/// ```
#[derive(Clone, Default)]
pub struct Ambient {
    values: Map<Key, AnyArc>,
}

impl Ambient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `value` under `T`, replacing any earlier value of that type.
    pub fn with<T>(mut self, value: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.insert(value);
        self
    }

    pub fn insert<T>(&mut self, value: Arc<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.values.insert(Key::of::<T>(), Arc::new(value));
        self
    }

    pub fn get<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.values
            .get(&Key::of::<T>())
            .and_then(|any| any.downcast_ref::<Arc<T>>())
            .cloned()
    }

    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.values.contains_key(&Key::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn get_any(&self, key: &Key) -> Option<AnyArc> {
        self.values.get(key).cloned()
    }
}

impl fmt::Debug for Ambient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

type ErrorSink = Arc<dyn Fn(&DiError, &Ambient) + Send + Sync>;

/// A function whose parameters are resolved in a fresh request scope on
/// every call.
///
/// Each [`handle`](RequestHandler::handle):
///
/// 1. opens a request scope over the given ambient values
/// 2. resolves every parameter; on failure hands the error to the error
///    sink and skips the call
/// 3. reports the time spent resolving to the graph's
///    [`ResolutionLogger`], when one is defined; a logger that fails to
///    resolve is reported like any other resolution error
/// 4. calls the handler
/// 5. ends the scope, closing every closable instance built for it
///
/// # Examples
///
/// ```
/// use ferrous_wire::{Ambient, Lifetime, Registry};
/// use std::sync::{Arc, Mutex};
///
/// struct Path(String);
///
/// trait Router: Send + Sync {
///     fn route(&self, path: &str) -> String;
/// }
/// struct Echo;
/// impl Router for Echo {
///     fn route(&self, path: &str) -> String { format!("GET {}", path) }
/// }
///
/// let mut registry = Registry::new();
/// registry.add_ambient::<Path>();
/// registry.add(|| Arc::new(Echo) as Arc<dyn Router>, Lifetime::Singleton).unwrap();
/// let graph = registry.build().unwrap();
///
/// let errors = Arc::new(Mutex::new(Vec::new()));
/// let sink = errors.clone();
/// let handler = graph
///     .handler(
///         |path: Arc<Path>, router: Arc<dyn Router>| router.route(&path.0),
///         move |err, _| sink.lock().unwrap().push(err.to_string()),
///     )
///     .unwrap();
///
/// let ambient = Ambient::new().with(Arc::new(Path("/users".into())));
/// assert_eq!(handler.handle(ambient).as_deref(), Some("GET /users"));
///
/// // Without the ambient path the call is skipped and the error reported.
/// assert_eq!(handler.handle(Ambient::new()), None);
/// assert_eq!(errors.lock().unwrap().len(), 1);
/// ```
pub struct RequestHandler<F, Args> {
    graph: Graph,
    handler: F,
    on_error: ErrorSink,
    _args: PhantomData<fn() -> Args>,
}

impl Graph {
    /// Wraps `handler` so that each call runs in its own request scope.
    ///
    /// Every parameter must be injectable and known to the graph as a node,
    /// a declared ambient type or the self binding; otherwise this fails
    /// with `InvalidProducer` or `MissingDependency`.
    pub fn handler<F, Args, E>(&self, handler: F, on_error: E) -> DiResult<RequestHandler<F, Args>>
    where
        F: Callable<Args>,
        E: Fn(&DiError, &Ambient) + Send + Sync + 'static,
    {
        let name = std::any::type_name::<F>();
        let mut missing = Vec::new();
        for param in <F as Callable<Args>>::params() {
            let Some(key) = param.key.filter(|_| param.is_injectable()) else {
                return Err(DiError::InvalidProducer {
                    producer: name,
                    reason: format!("parameter {} cannot be injected", param.type_name),
                });
            };
            if !self.inner.index.contains_key(&key) && !self.inner.ambient.contains(&key) {
                missing.push(MissingDependency {
                    required_by: name,
                    missing: key.type_name(),
                });
            }
        }
        if !missing.is_empty() {
            return Err(DiError::MissingDependency(missing));
        }

        Ok(RequestHandler {
            graph: self.clone(),
            handler,
            on_error: Arc::new(on_error),
            _args: PhantomData,
        })
    }
}

impl<F, Args> RequestHandler<F, Args>
where
    F: Callable<Args>,
{
    /// Runs one request. Returns `None` when resolution failed; the error
    /// has then been passed to the error sink.
    pub fn handle(&self, ambient: Ambient) -> Option<F::Output> {
        let scope = self.graph.new_request_scope(ambient);
        let started = Instant::now();

        let output = self
            .resolve_params(&scope)
            .and_then(|slots| {
                self.report_duration(&scope, started.elapsed())?;
                <F as Callable<Args>>::call_with(&self.handler, slots)
            })
            .map_err(|err| self.fail(&err, &scope))
            .ok();

        if let Err(err) = scope.end() {
            tracing::warn!(error = %err, "request cleanup failed");
        }
        output
    }

    fn resolve_params(&self, scope: &Scope) -> DiResult<Vec<Slot>> {
        <F as Callable<Args>>::params()
            .iter()
            .filter_map(|param| param.key)
            .map(|key| scope.resolve_any(&key).map(Slot::Resolved))
            .collect()
    }

    fn report_duration(&self, scope: &Scope, elapsed: Duration) -> DiResult<()> {
        if self.graph.inner.has_logger {
            scope.resolve::<dyn ResolutionLogger>()?.request_duration(elapsed);
        }
        Ok(())
    }

    fn fail(&self, err: &DiError, scope: &Scope) {
        tracing::debug!(error = %err, "request resolution failed");
        match scope.ambient() {
            Some(ambient) => (self.on_error)(err, ambient),
            None => (self.on_error)(err, &Ambient::default()),
        }
    }
}

impl<F, Args> fmt::Debug for RequestHandler<F, Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandler")
            .field("handler", &std::any::type_name::<F>())
            .finish()
    }
}
