//! Ordered cleanup hooks owned by a scope.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::error::{BoxError, CleanupFailure};

/// A deferred `Close::close` call.
pub(crate) type CloseHook = Box<dyn FnOnce() -> Result<(), BoxError> + Send>;

/// Cleanup hooks in creation order.
///
/// Every hook runs exactly once. Errors and panics from one hook are
/// collected and the remaining hooks still run.
#[derive(Default)]
pub(crate) struct CleanupList {
    hooks: Vec<(&'static str, CloseHook)>,
}

impl CleanupList {
    pub(crate) fn push(&mut self, type_name: &'static str, hook: CloseHook) {
        self.hooks.push((type_name, hook));
    }

    pub(crate) fn len(&self) -> usize {
        self.hooks.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Runs and drains every hook, first registered first.
    pub(crate) fn run_all_in_order(&mut self) -> Vec<CleanupFailure> {
        let mut failures = Vec::new();

        for (type_name, hook) in self.hooks.drain(..) {
            let message = match panic::catch_unwind(AssertUnwindSafe(hook)) {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => err.to_string(),
                Err(payload) => panic_message(payload.as_ref()),
            };
            tracing::warn!(service = type_name, error = %message, "cleanup hook failed");
            failures.push(CleanupFailure { type_name, message });
        }

        failures
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}
