//! Node descriptors for introspection and diagnostics.

use crate::graph::Node;
use crate::lifetime::Lifetime;

/// What a built graph knows about one node.
///
/// # Use Cases
///
/// - **Debugging**: see which types are defined and with which lifetime
/// - **Health checks**: verify at startup that overrides took effect
/// - **Documentation**: render the dependency graph
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{Lifetime, Registry};
/// use std::sync::Arc;
///
/// trait Store: Send + Sync {}
/// trait Users: Send + Sync {}
/// struct Memory;
/// impl Store for Memory {}
/// impl Users for Memory {}
///
/// let mut registry = Registry::new();
/// registry.add(|| Arc::new(Memory) as Arc<dyn Store>, Lifetime::Singleton).unwrap();
/// registry
///     .add(|_: Arc<dyn Store>| Arc::new(Memory) as Arc<dyn Users>, Lifetime::PerRequest)
///     .unwrap();
/// let graph = registry.build().unwrap();
///
/// let descriptors = graph.descriptors();
/// let users = descriptors.iter().find(|d| d.type_name.ends_with("Users")).unwrap();
/// assert_eq!(users.lifetime, Lifetime::PerRequest);
/// assert_eq!(users.inputs.len(), 1);
/// assert!(!users.fallible);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDescriptor {
    /// The defined type.
    pub type_name: &'static str,
    /// Effective lifetime, after configured overrides.
    pub lifetime: Lifetime,
    /// Input types, in declared order.
    pub inputs: Vec<&'static str>,
    /// Type name of the producer.
    pub producer: &'static str,
    /// Whether the producer declares an error return.
    pub fallible: bool,
    /// Whether instances get a cleanup hook in request scopes.
    pub closable: bool,
}

impl NodeDescriptor {
    pub(crate) fn from_node(node: &Node) -> Self {
        Self {
            type_name: node.key.type_name(),
            lifetime: node.lifetime,
            inputs: node.inputs.iter().map(|key| key.type_name()).collect(),
            producer: node.producer.name,
            fallible: node.fallible,
            closable: node.closer.is_some(),
        }
    }

    /// True when the node has no inputs.
    pub fn is_leaf(&self) -> bool {
        self.inputs.is_empty()
    }
}
