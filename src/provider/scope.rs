//! Resolution scopes: per-call caches, ambient bindings and cleanup.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use smallvec::SmallVec;

use super::context::ScopeHandle;
use super::Graph;
use crate::error::{DiError, DiResult};
use crate::graph::Node;
use crate::internal::{CleanupList, Map, StackGuard};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::{AnyArc, ProduceError};
use crate::request::Ambient;
use crate::traits::ResolverCore;

/// One bounded resolution session.
///
/// A scope owns the PerScope cache, and when opened with
/// [`Graph::new_request_scope`] also a PerRequest cache, the request's
/// ambient values and the cleanup hooks of closable instances built for the
/// request. Singletons come from the graph.
///
/// A scope belongs to one call; do not share it between concurrent calls.
/// End it with [`end`](Scope::end) to run cleanups and collect their
/// failures. A scope dropped without `end` still runs its cleanups.
///
/// # Lifetime Behavior
///
/// - **Singleton**: the graph's cell, shared by every scope
/// - **PerDependency**: built for every input slot
/// - **PerScope**: cached in this scope
/// - **PerRequest**: cached in the request cache, or in the scope cache
///   when this is not a request scope
///
/// # Examples
///
/// ```
/// use ferrous_wire::{Lifetime, Registry, Resolver};
/// use std::sync::Arc;
///
/// trait Session: Send + Sync {}
/// struct Id;
/// impl Session for Id {}
///
/// let mut registry = Registry::new();
/// registry.add(|| Arc::new(Id) as Arc<dyn Session>, Lifetime::PerScope).unwrap();
/// let graph = registry.build().unwrap();
///
/// let first = graph.new_scope();
/// let a = first.resolve::<dyn Session>().unwrap();
/// let b = first.resolve::<dyn Session>().unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
///
/// let second = graph.new_scope();
/// let c = second.resolve::<dyn Session>().unwrap();
/// assert!(!Arc::ptr_eq(&a, &c));
/// ```
pub struct Scope {
    pub(crate) inner: Arc<ScopeInner>,
}

pub(crate) struct ScopeInner {
    graph: Graph,
    scoped: Mutex<Map<Key, AnyArc>>,
    request: Option<RequestState>,
    cleanups: Mutex<CleanupList>,
}

struct RequestState {
    cache: Mutex<Map<Key, AnyArc>>,
    ambient: Ambient,
}

impl Scope {
    pub(crate) fn new(graph: Graph, ambient: Option<Ambient>) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                graph,
                scoped: Mutex::new(Map::default()),
                request: ambient.map(|ambient| RequestState {
                    cache: Mutex::new(Map::default()),
                    ambient,
                }),
                cleanups: Mutex::new(CleanupList::default()),
            }),
        }
    }

    /// The graph this scope resolves against.
    pub fn graph(&self) -> &Graph {
        &self.inner.graph
    }

    /// True for scopes opened with [`Graph::new_request_scope`].
    pub fn is_request_scope(&self) -> bool {
        self.inner.request.is_some()
    }

    /// The request's ambient values.
    pub fn ambient(&self) -> Option<&Ambient> {
        self.inner.request.as_ref().map(|request| &request.ambient)
    }

    /// Cleanup hooks waiting for the scope to end.
    pub fn pending_cleanups(&self) -> usize {
        self.inner.cleanups.lock().len()
    }

    /// Ends the scope, running every cleanup hook in creation order.
    ///
    /// Each hook runs even when earlier ones fail; all failures are returned
    /// together as `CleanupFailed`.
    pub fn end(self) -> DiResult<()> {
        let mut cleanups = std::mem::take(&mut *self.inner.cleanups.lock());
        if cleanups.is_empty() {
            return Ok(());
        }

        tracing::debug!(hooks = cleanups.len(), "ending scope");
        let failures = cleanups.run_all_in_order();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(DiError::CleanupFailed(failures))
        }
    }
}

impl ResolverCore for Scope {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        self.inner.resolve_key(key, &[])
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("request", &self.is_request_scope())
            .field("cached", &self.inner.scoped.lock().len())
            .field("pending_cleanups", &self.pending_cleanups())
            .finish()
    }
}

impl ScopeInner {
    /// Resolves `key`; `chain` holds the types leading up to it.
    pub(crate) fn resolve_key(
        self: &Arc<Self>,
        key: &Key,
        chain: &[&'static str],
    ) -> DiResult<AnyArc> {
        // Ambient bindings come first: the scope itself, then request values.
        if *key == Key::of::<dyn ResolverCore>() {
            return Ok(ScopeHandle::erased(
                Arc::downgrade(self),
                Arc::downgrade(&self.graph.inner),
            ));
        }
        if let Some(value) = self
            .request
            .as_ref()
            .and_then(|request| request.ambient.get_any(key))
        {
            return Ok(value);
        }

        let graph = &self.graph.inner;
        let Some(&index) = graph.index.get(key) else {
            return Err(DiError::DefMissing {
                type_name: key.type_name(),
                chain: chain.to_vec(),
            });
        };
        let node = &graph.nodes[index];
        let _guard = StackGuard::enter(self.graph.identity(), *key)?;

        match node.lifetime {
            Lifetime::Singleton => {
                let cell = &graph.singletons[index];
                if let Some(value) = cell.get() {
                    tracing::trace!(service = key.type_name(), "singleton hit");
                    return Ok(value.clone());
                }
                cell.get_or_try_init(|| self.construct(node, chain)).cloned()
            }
            Lifetime::PerDependency => self.construct(node, chain),
            Lifetime::PerScope => self.cached(&self.scoped, node, chain),
            Lifetime::PerRequest => match &self.request {
                Some(request) => self.cached(&request.cache, node, chain),
                None => self.cached(&self.scoped, node, chain),
            },
        }
    }

    fn cached(
        self: &Arc<Self>,
        cache: &Mutex<Map<Key, AnyArc>>,
        node: &Node,
        chain: &[&'static str],
    ) -> DiResult<AnyArc> {
        if let Some(value) = cache.lock().get(&node.key) {
            tracing::trace!(service = node.key.type_name(), lifetime = %node.lifetime, "cache hit");
            return Ok(value.clone());
        }

        let value = self.construct(node, chain)?;
        Ok(cache.lock().entry(node.key).or_insert(value).clone())
    }

    /// Resolves the node's inputs in declared order and calls its producer.
    fn construct(self: &Arc<Self>, node: &Node, chain: &[&'static str]) -> DiResult<AnyArc> {
        let mut path: SmallVec<[&'static str; 8]> = SmallVec::from_slice(chain);
        path.push(node.key.type_name());

        let mut inputs = Vec::with_capacity(node.inputs.len());
        for input in &node.inputs {
            inputs.push(self.resolve_key(input, &path)?);
        }

        let value = (node.ctor)(inputs).map_err(|err| match err {
            ProduceError::Engine(err) => err,
            ProduceError::Producer(source) => DiError::ResolutionFailed {
                type_name: node.key.type_name(),
                chain: chain.to_vec(),
                source,
            },
        })?;
        tracing::trace!(service = node.key.type_name(), lifetime = %node.lifetime, "constructed");

        if let Some(closer) = node.closer {
            if self.request.is_some() && node.lifetime != Lifetime::Singleton {
                if let Some(hook) = closer(&value) {
                    self.cleanups.lock().push(node.key.type_name(), hook);
                }
            }
        }

        Ok(value)
    }
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        let cleanups = self.cleanups.get_mut();
        if !cleanups.is_empty() {
            tracing::warn!(
                hooks = cleanups.len(),
                "scope dropped without end, running cleanup hooks"
            );
            cleanups.run_all_in_order();
        }
    }
}
