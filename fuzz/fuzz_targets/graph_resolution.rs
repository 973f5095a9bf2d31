#![no_main]

use libfuzzer_sys::fuzz_target;
use ferrous_wire::{Ambient, DiError, Lifetime, Registry, Resolver};
use std::sync::Arc;

trait Config: Send + Sync {
    fn value(&self) -> u32;
}
trait Database: Send + Sync {
    fn value(&self) -> u32;
}
trait Service: Send + Sync {
    fn value(&self) -> u32;
}

struct Holder(u32);
impl Config for Holder {
    fn value(&self) -> u32 {
        self.0
    }
}
impl Database for Holder {
    fn value(&self) -> u32 {
        self.0
    }
}
impl Service for Holder {
    fn value(&self) -> u32 {
        self.0
    }
}

fn lifetime(byte: u8) -> Lifetime {
    Lifetime::try_from(byte % 4).unwrap()
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 8 {
        return;
    }

    let value = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let pattern = data[4];

    let mut registry = Registry::new();
    if pattern & 1 != 0 {
        registry
            .add(move || Arc::new(Holder(value)) as Arc<dyn Config>, lifetime(data[5]))
            .unwrap();
    }
    if pattern & 2 != 0 {
        registry
            .add(
                |config: Arc<dyn Config>| Arc::new(Holder(config.value())) as Arc<dyn Database>,
                lifetime(data[6]),
            )
            .unwrap();
    }
    if pattern & 4 != 0 {
        registry
            .add(
                |db: Arc<dyn Database>| Arc::new(Holder(db.value())) as Arc<dyn Service>,
                lifetime(data[7]),
            )
            .unwrap();
    }
    if pattern & 8 != 0 {
        // Closes the loop Config -> Service -> Database -> Config.
        registry
            .add(
                |service: Arc<dyn Service>| Arc::new(Holder(service.value())) as Arc<dyn Config>,
                Lifetime::PerDependency,
            )
            .ok();
    }

    let graph = match registry.build() {
        Ok(graph) => graph,
        Err(DiError::MissingDependency(missing)) => {
            assert!(!missing.is_empty());
            return;
        }
        Err(DiError::CircularDependency(chain)) => {
            assert_eq!(chain.first(), chain.last());
            return;
        }
        Err(DiError::DuplicateDefinition { .. }) => return,
        Err(other) => panic!("unexpected build error: {}", other),
    };

    let scope = if pattern & 16 != 0 {
        graph.new_request_scope(Ambient::new())
    } else {
        graph.new_scope()
    };
    match scope.resolve::<dyn Service>() {
        Ok(service) => assert_eq!(service.value(), value),
        Err(err) => assert!(err.is_top_level_missing(), "unexpected: {}", err),
    }
    scope.end().unwrap();
});
