//! Graph assembly: one node per defined type, edge wiring, missing-input
//! batching and cycle detection.

use crate::config::GraphOptions;
use crate::error::{DiError, DiResult, MissingDependency};
use crate::internal::{Map, Set};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::{Closer, Ctor, ProducerId, Registration};
use crate::traits::ResolverCore;

/// One defined type.
pub(crate) struct Node {
    pub(crate) key: Key,
    pub(crate) lifetime: Lifetime,
    pub(crate) inputs: Vec<Key>,
    /// Node index for each input, `None` when an ambient binding supplies it.
    pub(crate) edges: Vec<Option<usize>>,
    pub(crate) ctor: Ctor,
    pub(crate) fallible: bool,
    pub(crate) producer: ProducerId,
    pub(crate) closer: Option<Closer>,
}

/// Validated nodes in definition order.
pub(crate) struct NodeSet {
    pub(crate) nodes: Vec<Node>,
    pub(crate) index: Map<Key, usize>,
    pub(crate) ambient: Set<Key>,
}

/// Turns flattened, de-duplicated registrations into a validated node set.
pub(crate) fn assemble(
    registrations: Vec<Registration>,
    ambient: Vec<Key>,
    options: &GraphOptions,
) -> DiResult<NodeSet> {
    let mut ambient: Set<Key> = ambient.into_iter().collect();
    ambient.insert(Key::of::<dyn ResolverCore>());

    let mut index = Map::default();
    let mut nodes = Vec::with_capacity(registrations.len());
    for (position, reg) in registrations.into_iter().enumerate() {
        index.insert(reg.key, position);
        let lifetime = options.lifetime_for(reg.key.type_name()).unwrap_or(reg.lifetime);
        nodes.push(Node {
            key: reg.key,
            lifetime,
            edges: Vec::with_capacity(reg.inputs.len()),
            inputs: reg.inputs,
            ctor: reg.ctor,
            fallible: reg.fallible,
            producer: reg.producer,
            closer: reg.closer,
        });
    }

    for name in options.unmatched_overrides(nodes.iter().map(|node| node.key.type_name())) {
        tracing::warn!(service = %name, "lifetime override matches no definition");
    }

    let mut missing = Vec::new();
    for node in &mut nodes {
        for input in &node.inputs {
            let edge = index.get(input).copied();
            if edge.is_none() && !ambient.contains(input) {
                missing.push(MissingDependency {
                    required_by: node.key.type_name(),
                    missing: input.type_name(),
                });
            }
            node.edges.push(edge);
        }
    }
    if !missing.is_empty() {
        return Err(DiError::MissingDependency(missing));
    }

    detect_cycles(&nodes)?;

    tracing::debug!(
        nodes = nodes.len(),
        ambient = ambient.len(),
        "dependency graph assembled"
    );
    Ok(NodeSet {
        nodes,
        index,
        ambient,
    })
}

/// Depth-first walk from every unchecked node in definition order.
///
/// A node whose subtree is walked cycle-free is marked checked and never
/// walked again, so the total work is O(V + E).
pub(crate) fn detect_cycles(nodes: &[Node]) -> DiResult<()> {
    let mut walk = Walk {
        nodes,
        checked: vec![false; nodes.len()],
        on_path: vec![false; nodes.len()],
        path: Vec::new(),
    };
    for root in 0..nodes.len() {
        if !walk.checked[root] {
            walk.visit(root)?;
        }
    }
    Ok(())
}

struct Walk<'a> {
    nodes: &'a [Node],
    checked: Vec<bool>,
    on_path: Vec<bool>,
    path: Vec<usize>,
}

impl Walk<'_> {
    fn visit(&mut self, current: usize) -> DiResult<()> {
        if self.on_path[current] {
            let start = self
                .path
                .iter()
                .position(|&node| node == current)
                .unwrap_or(0);
            let chain = self.path[start..]
                .iter()
                .chain(std::iter::once(&current))
                .map(|&node| self.nodes[node].key.type_name())
                .collect();
            return Err(DiError::CircularDependency(chain));
        }
        if self.checked[current] {
            return Ok(());
        }

        self.on_path[current] = true;
        self.path.push(current);

        let nodes = self.nodes;
        for edge in nodes[current].edges.iter().flatten() {
            self.visit(*edge)?;
        }

        self.path.pop();
        self.on_path[current] = false;
        self.checked[current] = true;
        Ok(())
    }
}
