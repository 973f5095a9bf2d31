//! The self binding: a scope handle producers can hold.

use std::sync::{Arc, Weak};

use super::scope::ScopeInner;
use super::{Graph, GraphInner};
use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::registration::AnyArc;
use crate::traits::ResolverCore;

/// What a producer receives for an `Arc<dyn ResolverCore>` parameter.
///
/// The handle is weak: it keeps neither its scope nor its graph alive.
/// While the scope lives, resolution goes through it and shares its caches.
/// Once the scope has ended, each call runs in a fresh scope of the same
/// graph, so handles obtained through `Graph::resolve` or bound by
/// `Graph::curry` keep working. Only when the graph is gone too does
/// resolution fail with `ScopeEnded`.
pub(crate) struct ScopeHandle {
    scope: Weak<ScopeInner>,
    graph: Weak<GraphInner>,
}

impl ScopeHandle {
    /// The handle, erased the way trait objects are stored.
    pub(crate) fn erased(scope: Weak<ScopeInner>, graph: Weak<GraphInner>) -> AnyArc {
        let handle: Arc<dyn ResolverCore> = Arc::new(ScopeHandle { scope, graph });
        Arc::new(handle)
    }
}

impl ResolverCore for ScopeHandle {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        if let Some(scope) = self.scope.upgrade() {
            return scope.resolve_key(key, &[]);
        }
        let inner = self.graph.upgrade().ok_or(DiError::ScopeEnded)?;
        Graph { inner }.in_scope(|scope| scope.resolve_any(key))
    }
}
