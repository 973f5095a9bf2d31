//! Runtime cycle guard for resolutions that re-enter through the self binding.
//!
//! Build rejects every static cycle, but a producer holding the scope handle
//! can still ask for its own type while it is being constructed. Without a
//! guard that would recurse forever, or deadlock on a singleton cell.

use std::cell::RefCell;

use crate::error::{DiError, DiResult};
use crate::key::Key;

// Per-thread stack of (graph identity, key) pairs currently under construction
thread_local! {
    static RESOLVING: RefCell<Vec<(usize, Key)>> = const { RefCell::new(Vec::new()) };
}

/// Marks `key` as under construction until dropped.
pub(crate) struct StackGuard {
    graph: usize,
    key: Key,
}

impl StackGuard {
    /// Pushes `key`, or fails with the cycle when it is already on the stack.
    pub(crate) fn enter(graph: usize, key: Key) -> DiResult<Self> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();

            if let Some(start) = stack.iter().position(|entry| *entry == (graph, key)) {
                let mut path: Vec<&'static str> = stack[start..]
                    .iter()
                    .filter(|(owner, _)| *owner == graph)
                    .map(|(_, key)| key.type_name())
                    .collect();
                path.push(key.type_name());
                return Err(DiError::CircularDependency(path));
            }

            stack.push((graph, key));
            Ok(Self { graph, key })
        })
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|entry| *entry == (self.graph, self.key)) {
                stack.remove(pos);
            }
        });
    }
}
