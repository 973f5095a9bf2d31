//! # ferrous-wire
//!
//! Graph-validated dependency resolution for Rust.
//!
//! Producers are plain functions and closures: their parameters are the
//! capabilities they need (`Arc<dyn Trait>`), their return value is the
//! capability they define. A [`Registry`] collects them, [`Registry::build`]
//! validates the whole set once and returns an immutable [`Graph`], and the
//! graph resolves, curries and invokes against it.
//!
//! ## Features
//!
//! - **Build-time validation**: duplicate definitions, every missing input
//!   at once, and dependency cycles with their full path
//! - **Lifetimes**: Singleton, PerDependency, PerScope and PerRequest
//! - **Single-flight singletons**: concurrent first requests build once
//! - **Currying**: bind what the graph can supply, leave the rest open
//! - **Request scopes**: ambient values plus ordered cleanup hooks
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_wire::{Lifetime, Registry};
//! use std::sync::Arc;
//!
//! trait Database: Send + Sync {
//!     fn url(&self) -> &str;
//! }
//! trait UserService: Send + Sync {
//!     fn describe(&self) -> String;
//! }
//!
//! struct Postgres;
//! impl Database for Postgres {
//!     fn url(&self) -> &str { "postgres://localhost" }
//! }
//!
//! struct Users {
//!     db: Arc<dyn Database>,
//! }
//! impl UserService for Users {
//!     fn describe(&self) -> String { format!("users@{}", self.db.url()) }
//! }
//!
//! let mut registry = Registry::new();
//! registry.add(|| Arc::new(Postgres) as Arc<dyn Database>, Lifetime::Singleton)?;
//! registry.add(
//!     |db: Arc<dyn Database>| Arc::new(Users { db }) as Arc<dyn UserService>,
//!     Lifetime::PerDependency,
//! )?;
//!
//! let graph = registry.build()?;
//! let users = graph.resolve::<dyn UserService>()?;
//! assert_eq!(users.describe(), "users@postgres://localhost");
//! # Ok::<(), ferrous_wire::DiError>(())
//! ```
//!
//! ## Fallible Producers
//!
//! ```rust
//! use ferrous_wire::{DiError, Lifetime, Registry};
//! use std::sync::Arc;
//!
//! trait Socket: Send + Sync {}
//!
//! let mut registry = Registry::new();
//! registry
//!     .add(
//!         || -> Result<Arc<dyn Socket>, std::io::Error> {
//!             Err(std::io::Error::new(std::io::ErrorKind::Other, "refused"))
//!         },
//!         Lifetime::Singleton,
//!     )
//!     .unwrap();
//! let graph = registry.build().unwrap();
//!
//! match graph.resolve::<dyn Socket>() {
//!     Err(DiError::ResolutionFailed { source, .. }) => assert_eq!(source.to_string(), "refused"),
//!     _ => unreachable!(),
//! }
//! ```
//!
//! ## Currying
//!
//! ```rust
//! use ferrous_wire::{args, Arg, Lifetime, Registry};
//! use std::sync::Arc;
//!
//! trait Offset: Send + Sync {
//!     fn value(&self) -> i32;
//! }
//! struct Ten;
//! impl Offset for Ten {
//!     fn value(&self) -> i32 { 10 }
//! }
//!
//! let mut registry = Registry::new();
//! registry.add(|| Arc::new(Ten) as Arc<dyn Offset>, Lifetime::Singleton).unwrap();
//! let graph = registry.build().unwrap();
//!
//! let add = graph.curry(|x: Arg<i32>, offset: Arc<dyn Offset>| *x + offset.value()).unwrap();
//! assert_eq!(add.arity(), 1);
//! assert_eq!(add.call(args![1i32]).unwrap(), 11);
//! ```

// Module declarations
pub mod callable;
pub mod collection;
pub mod config;
pub mod descriptors;
pub mod error;
pub mod key;
pub mod lifetime;
pub mod observer;
pub mod provider;
pub mod request;
pub mod traits;

mod graph;
mod internal;
mod registration;

// Re-export core types
pub use callable::{Arg, Callable, Curried, Outcome, Param, ParamSpec, Produce, Rest, Supplied};
pub use collection::{Definition, Registry, RegistryModule};
pub use config::GraphOptions;
pub use descriptors::NodeDescriptor;
pub use error::{BoxError, CleanupFailure, DiError, DiResult, MissingDependency, SharedError};
pub use key::Key;
pub use lifetime::{IntoLifetime, Lifetime};
pub use observer::{ResolutionLogger, TracingLogger};
pub use provider::{Graph, Scope};
pub use request::{Ambient, RequestHandler};
pub use traits::{Close, Resolver, ResolverCore};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    trait Token: Send + Sync {
        fn serial(&self) -> usize;
    }

    struct Serial(usize);
    impl Token for Serial {
        fn serial(&self) -> usize {
            self.0
        }
    }

    fn counting_graph(lifetime: Lifetime) -> (Graph, Arc<AtomicUsize>) {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = built.clone();
        let mut registry = Registry::new();
        registry
            .add(
                move || Arc::new(Serial(counter.fetch_add(1, Ordering::SeqCst))) as Arc<dyn Token>,
                lifetime,
            )
            .unwrap();
        (registry.build().unwrap(), built)
    }

    #[test]
    fn test_singleton_resolution() {
        let (graph, built) = counting_graph(Lifetime::Singleton);
        let a = graph.resolve::<dyn Token>().unwrap();
        let b = graph.resolve::<dyn Token>().unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_per_dependency_resolution() {
        let (graph, built) = counting_graph(Lifetime::PerDependency);
        let scope = graph.new_scope();
        let a = scope.resolve::<dyn Token>().unwrap();
        let b = scope.resolve::<dyn Token>().unwrap();

        assert_ne!(a.serial(), b.serial());
        assert_eq!(built.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_per_scope_resolution() {
        let (graph, _) = counting_graph(Lifetime::PerScope);
        let scope1 = graph.new_scope();
        let a = scope1.resolve::<dyn Token>().unwrap();
        let b = scope1.resolve::<dyn Token>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let scope2 = graph.new_scope();
        let c = scope2.resolve::<dyn Token>().unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_graph_resolve_uses_fresh_scope() {
        let (graph, _) = counting_graph(Lifetime::PerScope);
        let a = graph.resolve::<dyn Token>().unwrap();
        let b = graph.resolve::<dyn Token>().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_self_binding_resolves_through_scope() {
        let (graph, _) = counting_graph(Lifetime::PerScope);
        let scope = graph.new_scope();
        let handle = scope.resolve::<dyn ResolverCore>().unwrap();

        let via_handle = handle.resolve::<dyn Token>().unwrap();
        let direct = scope.resolve::<dyn Token>().unwrap();
        assert!(Arc::ptr_eq(&via_handle, &direct));

        drop(scope);
        let fresh = handle.resolve::<dyn Token>().unwrap();
        assert!(!Arc::ptr_eq(&fresh, &direct));

        drop(graph);
        assert!(matches!(handle.resolve::<dyn Token>(), Err(DiError::ScopeEnded)));
    }

    #[test]
    fn test_self_binding_from_graph_resolve_stays_usable() {
        let (graph, built) = counting_graph(Lifetime::Singleton);
        let handle = graph.resolve::<dyn ResolverCore>().unwrap();

        let a = handle.resolve::<dyn Token>().unwrap();
        let b = handle.resolve::<dyn Token>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }
}
