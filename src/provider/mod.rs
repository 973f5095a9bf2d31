//! The built graph and its resolution scopes.
//!
//! This module contains the [`Graph`] returned by
//! [`Registry::build`](crate::Registry::build), the [`Scope`] that resolves
//! against it, and the self binding handed to producers that ask for
//! `Arc<dyn ResolverCore>`.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::callable::{self, Callable, Curried, Outcome};
use crate::descriptors::NodeDescriptor;
use crate::error::DiResult;
use crate::graph::{Node, NodeSet};
use crate::internal::{Map, Set};
use crate::key::Key;
use crate::observer::ResolutionLogger;
use crate::registration::AnyArc;
use crate::request::Ambient;
use crate::traits::Resolver;

pub mod context;
pub mod scope;
pub use scope::Scope;

/// Immutable dependency graph.
///
/// Built once from a [`Registry`](crate::Registry); safe to share across
/// threads and cheap to clone (it uses `Arc` internally). The singleton cache
/// lives here: each Singleton node owns a cell whose first construction is
/// single-flight, so concurrent first requests block and reuse one instance.
///
/// `resolve`, `curry` and `invoke` on the graph each run in a fresh scope
/// that ends when the call returns.
///
/// # Examples
///
/// ```
/// use ferrous_wire::{Lifetime, Registry};
/// use std::sync::Arc;
///
/// trait Counter: Send + Sync {}
/// struct Zero;
/// impl Counter for Zero {}
///
/// let mut registry = Registry::new();
/// registry.add(|| Arc::new(Zero) as Arc<dyn Counter>, Lifetime::Singleton).unwrap();
/// let graph = registry.build().unwrap();
///
/// let a = graph.resolve::<dyn Counter>().unwrap();
/// let b = graph.resolve::<dyn Counter>().unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
#[derive(Clone)]
pub struct Graph {
    pub(crate) inner: Arc<GraphInner>,
}

pub(crate) struct GraphInner {
    pub(crate) nodes: Vec<Node>,
    pub(crate) index: Map<Key, usize>,
    pub(crate) ambient: Set<Key>,
    /// One cell per node; only Singleton nodes use theirs.
    pub(crate) singletons: Box<[OnceCell<AnyArc>]>,
    pub(crate) has_logger: bool,
}

impl Graph {
    pub(crate) fn from_nodes(set: NodeSet) -> Self {
        let singletons = (0..set.nodes.len())
            .map(|_| OnceCell::new())
            .collect::<Vec<_>>()
            .into_boxed_slice();
        let has_logger = set.index.contains_key(&Key::of::<dyn ResolutionLogger>());

        Self {
            inner: Arc::new(GraphInner {
                nodes: set.nodes,
                index: set.index,
                ambient: set.ambient,
                singletons,
                has_logger,
            }),
        }
    }

    /// Identity used to keep runtime cycle tracking per graph.
    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    /// Opens a scope with its own per-scope cache and cleanup list.
    pub fn new_scope(&self) -> Scope {
        Scope::new(self.clone(), None)
    }

    /// Opens a request scope: a per-request cache plus ambient values that
    /// take priority over nodes producing the same type.
    pub fn new_request_scope(&self, ambient: Ambient) -> Scope {
        Scope::new(self.clone(), Some(ambient))
    }

    /// Resolves `T` in a fresh scope.
    pub fn resolve<T>(&self) -> DiResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.in_scope(|scope| scope.resolve::<T>())
    }

    /// Curries `f` against a fresh scope. See [`Resolver::curry`].
    pub fn curry<F, Args>(&self, f: F) -> DiResult<Curried<F::Output>>
    where
        F: Callable<Args>,
    {
        self.in_scope(|scope| callable::curry(scope, f))
    }

    /// Invokes `f` against a fresh scope. See [`Resolver::invoke`].
    pub fn invoke<F, Args>(&self, f: F) -> DiResult<()>
    where
        F: Callable<Args>,
        F::Output: Outcome,
    {
        self.in_scope(|scope| callable::invoke(scope, f))
    }

    fn in_scope<R>(&self, call: impl FnOnce(&Scope) -> DiResult<R>) -> DiResult<R> {
        let scope = self.new_scope();
        let result = call(&scope);
        let ended = scope.end();
        let value = result?;
        ended?;
        Ok(value)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.inner.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.nodes.is_empty()
    }

    /// True when a node defines `T`.
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.inner.index.contains_key(&Key::of::<T>())
    }

    /// True when `T` is declared as supplied by request scopes.
    pub fn is_ambient<T: ?Sized + 'static>(&self) -> bool {
        self.inner.ambient.contains(&Key::of::<T>())
    }

    /// Describes every node, in definition order.
    pub fn descriptors(&self) -> Vec<NodeDescriptor> {
        self.inner.nodes.iter().map(NodeDescriptor::from_node).collect()
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field(
                "nodes",
                &self
                    .inner
                    .nodes
                    .iter()
                    .map(|node| node.key.type_name())
                    .collect::<Vec<_>>(),
            )
            .field("ambient", &self.inner.ambient.len())
            .finish()
    }
}
