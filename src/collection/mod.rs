//! Definition registry.
//!
//! This module contains the [`Registry`] that collects producer definitions
//! and the [`Definition`] type used for bulk registration.

use std::fmt;

use crate::callable::{Callable, Produce};
use crate::config::GraphOptions;
use crate::error::{DiError, DiResult};
use crate::graph;
use crate::internal::Map;
use crate::key::Key;
use crate::lifetime::IntoLifetime;
use crate::provider::Graph;
use crate::registration::{close_hook, Closer, Registration};
use crate::traits::Close;

pub mod module_system;
pub use module_system::*;

/// A producer paired with its lifetime, validated but not yet registered.
///
/// Validation errors are kept and surface when the definition is added, so
/// [`Registry::add_all`] stops at the first bad definition.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{Definition, Lifetime, Registry};
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync {}
/// struct System;
/// impl Clock for System {}
///
/// let mut registry = Registry::new();
/// registry
///     .add_all([Definition::new(|| Arc::new(System) as Arc<dyn Clock>, Lifetime::Singleton)])
///     .unwrap();
/// assert_eq!(registry.len(), 1);
/// ```
pub struct Definition {
    registration: DiResult<Registration>,
}

impl Definition {
    /// Defines `producer` with `lifetime`.
    pub fn new<F, Args>(producer: F, lifetime: impl IntoLifetime) -> Self
    where
        F: Callable<Args>,
        F::Output: Produce,
    {
        Self {
            registration: Registration::from_producer(producer, lifetime, None),
        }
    }

    /// Defines `producer` with `lifetime`; instances built in a request scope
    /// are closed when the scope ends.
    pub fn closable<F, Args>(producer: F, lifetime: impl IntoLifetime) -> Self
    where
        F: Callable<Args>,
        F::Output: Produce,
        <F::Output as Produce>::Service: Close,
    {
        Self {
            registration: Registration::from_producer(
                producer,
                lifetime,
                Some(close_hook::<<F::Output as Produce>::Service> as Closer),
            ),
        }
    }

    /// The defined type, when the definition is valid.
    pub fn key(&self) -> Option<Key> {
        self.registration.as_ref().ok().map(|reg| reg.key)
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.registration {
            Ok(reg) => f
                .debug_struct("Definition")
                .field("type", &reg.key.type_name())
                .field("lifetime", &reg.lifetime)
                .field("producer", &reg.producer.name)
                .finish(),
            Err(err) => f.debug_tuple("Definition").field(err).finish(),
        }
    }
}

/// Collects producer definitions and builds them into a [`Graph`].
///
/// Producers are functions or closures whose parameters are `Arc<dyn Trait>`
/// inputs and whose return value is the `Arc<dyn Trait>` they define,
/// optionally wrapped in a `Result`.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{Lifetime, Registry};
/// use std::sync::Arc;
///
/// trait Store: Send + Sync {
///     fn name(&self) -> &str;
/// }
/// trait Service: Send + Sync {
///     fn describe(&self) -> String;
/// }
///
/// struct Memory;
/// impl Store for Memory {
///     fn name(&self) -> &str { "memory" }
/// }
///
/// struct Users(Arc<dyn Store>);
/// impl Service for Users {
///     fn describe(&self) -> String { format!("users on {}", self.0.name()) }
/// }
///
/// let mut registry = Registry::new();
/// registry
///     .add(|| Arc::new(Memory) as Arc<dyn Store>, Lifetime::Singleton)?
///     .add(|store: Arc<dyn Store>| Arc::new(Users(store)) as Arc<dyn Service>, "per_scope")?;
///
/// let graph = registry.build()?;
/// assert_eq!(graph.resolve::<dyn Service>()?.describe(), "users on memory");
/// # Ok::<(), ferrous_wire::DiError>(())
/// ```
#[derive(Default)]
pub struct Registry {
    definitions: Vec<Registration>,
    index: Map<Key, usize>,
    ambient: Vec<Key>,
    joined: Vec<Registry>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins several registries into one. Nothing is validated until
    /// [`build`](Self::build).
    pub fn join<I>(registries: I) -> Self
    where
        I: IntoIterator<Item = Registry>,
    {
        let mut joined = Self::new();
        joined.joined.extend(registries);
        joined
    }

    /// Defines `producer` with `lifetime`.
    ///
    /// Fails with `InvalidProducer` when the producer does not return a
    /// trait object or takes a parameter that cannot be injected, with
    /// `UnknownLifetime` for an unrecognized lifetime, and with
    /// `DuplicateDefinition` when the type is already defined by a different
    /// producer or with a different lifetime. Re-adding an identical
    /// definition is a no-op.
    ///
    /// Producers may not define an error type. Error types are recognized
    /// by name only, as `dyn Error` trait objects: a user trait that has
    /// `std::error::Error` as a supertrait is not detected and is accepted
    /// like any other trait object.
    pub fn add<F, Args>(&mut self, producer: F, lifetime: impl IntoLifetime) -> DiResult<&mut Self>
    where
        F: Callable<Args>,
        F::Output: Produce,
    {
        self.add_definition(Definition::new(producer, lifetime))
    }

    /// Like [`add`](Self::add) for producers of [`Close`] types. Instances
    /// built in a request scope are closed when that scope ends.
    pub fn add_closable<F, Args>(
        &mut self,
        producer: F,
        lifetime: impl IntoLifetime,
    ) -> DiResult<&mut Self>
    where
        F: Callable<Args>,
        F::Output: Produce,
        <F::Output as Produce>::Service: Close,
    {
        self.add_definition(Definition::closable(producer, lifetime))
    }

    /// Adds one prepared definition.
    pub fn add_definition(&mut self, definition: Definition) -> DiResult<&mut Self> {
        self.insert(definition.registration?)?;
        Ok(self)
    }

    /// Adds definitions in order, stopping at the first error.
    pub fn add_all<I>(&mut self, definitions: I) -> DiResult<&mut Self>
    where
        I: IntoIterator<Item = Definition>,
    {
        for definition in definitions {
            self.add_definition(definition)?;
        }
        Ok(self)
    }

    /// Declares `T` as supplied by request scopes rather than by a producer.
    ///
    /// Build accepts inputs of an ambient type without a definition; resolving
    /// one outside a request scope that supplies it fails with `DefMissing`.
    pub fn add_ambient<T>(&mut self) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = Key::of::<T>();
        if !self.ambient.contains(&key) {
            self.ambient.push(key);
        }
        self
    }

    /// Lazily unions `other` into this registry; conflicts surface at build.
    pub fn merge(&mut self, other: Registry) -> &mut Self {
        self.joined.push(other);
        self
    }

    /// Number of definitions, counting joined registries before duplicates
    /// collapse.
    pub fn len(&self) -> usize {
        self.definitions.len() + self.joined.iter().map(Registry::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when this registry itself defines `T`.
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.index.contains_key(&Key::of::<T>())
    }

    /// Builds the graph with default options.
    pub fn build(self) -> DiResult<Graph> {
        self.build_with(&GraphOptions::default())
    }

    /// Flattens every joined registry, checks duplicates, missing inputs and
    /// cycles, and assembles the immutable graph.
    pub fn build_with(self, options: &GraphOptions) -> DiResult<Graph> {
        let mut flat = Registry::new();
        self.flatten_into(&mut flat)?;

        let nodes = graph::assemble(flat.definitions, flat.ambient, options)?;
        Ok(Graph::from_nodes(nodes))
    }

    fn flatten_into(self, target: &mut Registry) -> DiResult<()> {
        for registration in self.definitions {
            target.insert(registration)?;
        }
        for key in self.ambient {
            if !target.ambient.contains(&key) {
                target.ambient.push(key);
            }
        }
        for registry in self.joined {
            registry.flatten_into(target)?;
        }
        Ok(())
    }

    fn insert(&mut self, registration: Registration) -> DiResult<()> {
        if let Some(&position) = self.index.get(&registration.key) {
            let existing = &self.definitions[position];
            if existing.producer == registration.producer
                && existing.lifetime == registration.lifetime
            {
                return Ok(());
            }
            return Err(DiError::DuplicateDefinition {
                type_name: registration.key.type_name(),
                existing: existing.producer.name,
                incoming: registration.producer.name,
            });
        }

        self.index.insert(registration.key, self.definitions.len());
        self.definitions.push(registration);
        Ok(())
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field(
                "definitions",
                &self
                    .definitions
                    .iter()
                    .map(|reg| reg.key.type_name())
                    .collect::<Vec<_>>(),
            )
            .field("ambient", &self.ambient)
            .field("joined", &self.joined.len())
            .finish()
    }
}
