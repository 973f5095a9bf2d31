use ferrous_wire::{Ambient, GraphOptions, Lifetime, Registry, Resolver};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

trait Connection: Send + Sync {
    fn id(&self) -> usize;
}

trait Repository: Send + Sync {
    fn connection(&self) -> usize;
}

struct Pooled(usize);
impl Connection for Pooled {
    fn id(&self) -> usize {
        self.0
    }
}

struct Users(Arc<dyn Connection>);
impl Repository for Users {
    fn connection(&self) -> usize {
        self.0.id()
    }
}

fn registry_with(connection: Lifetime) -> (Registry, Arc<AtomicUsize>) {
    let opened = Arc::new(AtomicUsize::new(0));
    let counter = opened.clone();
    let mut registry = Registry::new();
    registry
        .add(
            move || Arc::new(Pooled(counter.fetch_add(1, Ordering::SeqCst))) as Arc<dyn Connection>,
            connection,
        )
        .unwrap();
    registry
        .add(
            |conn: Arc<dyn Connection>| Arc::new(Users(conn)) as Arc<dyn Repository>,
            Lifetime::PerDependency,
        )
        .unwrap();
    (registry, opened)
}

#[test]
fn test_singleton_shared_across_scopes() {
    let (registry, opened) = registry_with(Lifetime::Singleton);
    let graph = registry.build().unwrap();

    let a = graph.new_scope().resolve::<dyn Repository>().unwrap();
    let b = graph.new_scope().resolve::<dyn Repository>().unwrap();

    assert_eq!(a.connection(), b.connection());
    assert_eq!(opened.load(Ordering::SeqCst), 1);
}

#[test]
fn test_per_dependency_built_for_every_slot() {
    let (registry, opened) = registry_with(Lifetime::PerDependency);
    let graph = registry.build().unwrap();
    let scope = graph.new_scope();

    let a = scope.resolve::<dyn Repository>().unwrap();
    let b = scope.resolve::<dyn Repository>().unwrap();

    assert_ne!(a.connection(), b.connection());
    assert_eq!(opened.load(Ordering::SeqCst), 2);
}

#[test]
fn test_per_scope_shared_within_scope_only() {
    let (registry, opened) = registry_with(Lifetime::PerScope);
    let graph = registry.build().unwrap();

    let scope = graph.new_scope();
    let a = scope.resolve::<dyn Repository>().unwrap();
    let b = scope.resolve::<dyn Repository>().unwrap();
    assert_eq!(a.connection(), b.connection());

    let other = graph.new_scope();
    let c = other.resolve::<dyn Repository>().unwrap();
    assert_ne!(a.connection(), c.connection());
    assert_eq!(opened.load(Ordering::SeqCst), 2);
}

#[test]
fn test_per_request_shared_within_request() {
    let (registry, opened) = registry_with(Lifetime::PerRequest);
    let graph = registry.build().unwrap();

    let request = graph.new_request_scope(Ambient::new());
    let a = request.resolve::<dyn Connection>().unwrap();
    let b = request.resolve::<dyn Connection>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    request.end().unwrap();

    let next = graph.new_request_scope(Ambient::new());
    let c = next.resolve::<dyn Connection>().unwrap();
    assert!(!Arc::ptr_eq(&a, &c));
    assert_eq!(opened.load(Ordering::SeqCst), 2);
}

#[test]
fn test_per_request_outside_request_acts_per_scope() {
    let (registry, opened) = registry_with(Lifetime::PerRequest);
    let graph = registry.build().unwrap();

    let scope = graph.new_scope();
    assert!(!scope.is_request_scope());
    let a = scope.resolve::<dyn Connection>().unwrap();
    let b = scope.resolve::<dyn Connection>().unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(opened.load(Ordering::SeqCst), 1);
}

#[test]
fn test_lifetime_override_applies_at_build() {
    let (registry, opened) = registry_with(Lifetime::PerDependency);
    let options = GraphOptions::new().override_lifetime_of::<dyn Connection>(Lifetime::Singleton);
    let graph = registry.build_with(&options).unwrap();

    let a = graph.resolve::<dyn Repository>().unwrap();
    let b = graph.resolve::<dyn Repository>().unwrap();
    assert_eq!(a.connection(), b.connection());
    assert_eq!(opened.load(Ordering::SeqCst), 1);

    let connection = graph
        .descriptors()
        .into_iter()
        .find(|d| d.type_name.ends_with("Connection"))
        .unwrap();
    assert_eq!(connection.lifetime, Lifetime::Singleton);
}

#[test]
fn test_parsed_overrides_match_full_type_names() {
    let (registry, _) = registry_with(Lifetime::PerDependency);
    let raw = format!(
        "{}=per_scope; dyn unknown::Thing=singleton",
        std::any::type_name::<dyn Connection>()
    );
    let options = GraphOptions::parse_overrides(&raw).unwrap();
    let graph = registry.build_with(&options).unwrap();

    let scope = graph.new_scope();
    let a = scope.resolve::<dyn Connection>().unwrap();
    let b = scope.resolve::<dyn Connection>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn test_lifetime_aliases() {
    assert_eq!("transient".parse::<Lifetime>().unwrap(), Lifetime::PerDependency);
    assert_eq!("per_resolve".parse::<Lifetime>().unwrap(), Lifetime::PerScope);
    assert_eq!("scoped".parse::<Lifetime>().unwrap(), Lifetime::PerScope);
    assert_eq!("per_http_request".parse::<Lifetime>().unwrap(), Lifetime::PerRequest);
    assert_eq!(Lifetime::try_from(3u8).unwrap(), Lifetime::PerScope);
    assert!(Lifetime::try_from(9u8).is_err());
}
