use ferrous_wire::{Ambient, BoxError, Close, DiError, Lifetime, Registry, Resolver};
use std::sync::{Arc, Mutex};

type Log = Arc<Mutex<Vec<String>>>;

trait Connection: Close {
    fn name(&self) -> &str;
}

trait Transaction: Close {}

trait Cache: Close {}

struct Named {
    name: String,
    log: Log,
    fail: bool,
}

impl Connection for Named {
    fn name(&self) -> &str {
        &self.name
    }
}
impl Transaction for Named {}
impl Cache for Named {}

impl Close for Named {
    fn close(&self) -> Result<(), BoxError> {
        self.log.lock().unwrap().push(self.name.clone());
        if self.fail {
            Err(format!("{} refused to close", self.name).into())
        } else {
            Ok(())
        }
    }
}

fn named(name: &str, log: &Log, fail: bool) -> Arc<Named> {
    Arc::new(Named {
        name: name.to_string(),
        log: log.clone(),
        fail,
    })
}

fn registry(log: &Log, fail_transaction: bool) -> Registry {
    let mut registry = Registry::new();
    let conn_log = log.clone();
    registry
        .add_closable(
            move || named("connection", &conn_log, false) as Arc<dyn Connection>,
            Lifetime::PerRequest,
        )
        .unwrap();
    let tx_log = log.clone();
    registry
        .add_closable(
            move |_: Arc<dyn Connection>| {
                named("transaction", &tx_log, fail_transaction) as Arc<dyn Transaction>
            },
            Lifetime::PerDependency,
        )
        .unwrap();
    registry
}

#[test]
fn test_cleanups_run_in_creation_order() {
    let log: Log = Arc::default();
    let graph = registry(&log, false).build().unwrap();

    let scope = graph.new_request_scope(Ambient::new());
    scope.resolve::<dyn Transaction>().unwrap();
    assert_eq!(scope.pending_cleanups(), 2);
    assert!(log.lock().unwrap().is_empty());

    scope.end().unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["connection", "transaction"]);
}

#[test]
fn test_each_instance_closed_exactly_once() {
    let log: Log = Arc::default();
    let graph = registry(&log, false).build().unwrap();

    let scope = graph.new_request_scope(Ambient::new());
    scope.resolve::<dyn Transaction>().unwrap();
    scope.resolve::<dyn Transaction>().unwrap();
    scope.resolve::<dyn Connection>().unwrap();
    scope.end().unwrap();

    // One cached connection, two per-dependency transactions.
    assert_eq!(
        *log.lock().unwrap(),
        vec!["connection", "transaction", "transaction"]
    );
}

#[test]
fn test_failing_hook_does_not_stop_the_rest() {
    let log: Log = Arc::default();
    let mut registry = registry(&log, true);
    let cache_log = log.clone();
    registry
        .add_closable(
            move |_: Arc<dyn Transaction>| named("cache", &cache_log, false) as Arc<dyn Cache>,
            Lifetime::PerRequest,
        )
        .unwrap();
    let graph = registry.build().unwrap();

    let scope = graph.new_request_scope(Ambient::new());
    scope.resolve::<dyn Cache>().unwrap();

    match scope.end() {
        Err(DiError::CleanupFailed(failures)) => {
            assert_eq!(failures.len(), 1);
            assert!(failures[0].type_name.ends_with("Transaction"));
            assert_eq!(failures[0].message, "transaction refused to close");
        }
        other => panic!("expected CleanupFailed, got {:?}", other),
    }
    assert_eq!(*log.lock().unwrap(), vec!["connection", "transaction", "cache"]);
}

#[test]
fn test_panicking_hook_is_reported() {
    struct Exploding;
    impl Close for Exploding {
        fn close(&self) -> Result<(), BoxError> {
            panic!("kaboom")
        }
    }
    impl Cache for Exploding {}

    let mut registry = Registry::new();
    registry
        .add_closable(|| Arc::new(Exploding) as Arc<dyn Cache>, Lifetime::PerRequest)
        .unwrap();
    let graph = registry.build().unwrap();

    let scope = graph.new_request_scope(Ambient::new());
    scope.resolve::<dyn Cache>().unwrap();

    match scope.end() {
        Err(DiError::CleanupFailed(failures)) => {
            assert_eq!(failures[0].message, "panicked: kaboom");
        }
        other => panic!("expected CleanupFailed, got {:?}", other),
    }
}

#[test]
fn test_failed_sibling_still_closes_built_instances() {
    let log: Log = Arc::default();
    let mut registry = registry(&log, false);
    registry
        .add(
            |_: Arc<dyn Connection>| -> Result<Arc<dyn Cache>, String> {
                Err("cache offline".to_string())
            },
            Lifetime::PerRequest,
        )
        .unwrap();
    let graph = registry.build().unwrap();

    let scope = graph.new_request_scope(Ambient::new());
    assert!(scope.resolve::<dyn Cache>().is_err());
    assert_eq!(scope.pending_cleanups(), 1);

    scope.end().unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["connection"]);
}

#[test]
fn test_dropped_scope_runs_cleanups() {
    let log: Log = Arc::default();
    let graph = registry(&log, false).build().unwrap();

    {
        let scope = graph.new_request_scope(Ambient::new());
        scope.resolve::<dyn Connection>().unwrap();
    }

    assert_eq!(*log.lock().unwrap(), vec!["connection"]);
}

#[test]
fn test_no_cleanups_outside_request_scopes() {
    let log: Log = Arc::default();
    let graph = registry(&log, false).build().unwrap();

    let scope = graph.new_scope();
    scope.resolve::<dyn Transaction>().unwrap();
    assert_eq!(scope.pending_cleanups(), 0);
    scope.end().unwrap();

    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn test_singletons_are_never_closed_by_requests() {
    let log: Log = Arc::default();
    let conn_log = log.clone();
    let mut registry = Registry::new();
    registry
        .add_closable(
            move || named("shared", &conn_log, false) as Arc<dyn Connection>,
            Lifetime::Singleton,
        )
        .unwrap();
    let graph = registry.build().unwrap();

    let scope = graph.new_request_scope(Ambient::new());
    assert_eq!(scope.resolve::<dyn Connection>().unwrap().name(), "shared");
    scope.end().unwrap();

    assert!(log.lock().unwrap().is_empty());
}
