//! Module system for grouping related definitions.

use crate::collection::Registry;
use crate::error::DiResult;

/// A reusable group of definitions.
///
/// # Example
///
/// ```rust
/// use ferrous_wire::{DiResult, Lifetime, Registry, RegistryModule};
/// use std::sync::Arc;
///
/// trait Mailer: Send + Sync {}
/// struct Smtp;
/// impl Mailer for Smtp {}
///
/// struct MailModule;
///
/// impl RegistryModule for MailModule {
///     fn register(self, registry: &mut Registry) -> DiResult<()> {
///         registry.add(|| Arc::new(Smtp) as Arc<dyn Mailer>, Lifetime::Singleton)?;
///         Ok(())
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let mut registry = Registry::new();
/// registry.add_module(MailModule)?;
/// let graph = registry.build()?;
/// assert!(graph.contains::<dyn Mailer>());
/// # Ok(())
/// # }
/// ```
pub trait RegistryModule {
    /// Adds this module's definitions to `registry`.
    fn register(self, registry: &mut Registry) -> DiResult<()>;
}

impl<F> RegistryModule for F
where
    F: FnOnce(&mut Registry) -> DiResult<()>,
{
    fn register(self, registry: &mut Registry) -> DiResult<()> {
        self(registry)
    }
}

impl Registry {
    /// Adds a module's definitions in place.
    pub fn add_module<M: RegistryModule>(&mut self, module: M) -> DiResult<&mut Self> {
        module.register(self)?;
        Ok(self)
    }

    /// Builds a standalone registry from a module, ready to be joined.
    pub fn from_module<M: RegistryModule>(module: M) -> DiResult<Self> {
        let mut registry = Self::new();
        module.register(&mut registry)?;
        Ok(registry)
    }
}
