//! Property-based tests for registration and build
//!
//! These tests use proptest to vary definition order, lifetimes and
//! repetition, and check what must hold for every valid registry.

use ferrous_wire::{Definition, Lifetime, Registry, Resolver};
use proptest::prelude::*;
use std::sync::Arc;

trait Level0: Send + Sync {
    fn depth(&self) -> usize;
}
trait Level1: Send + Sync {
    fn depth(&self) -> usize;
}
trait Level2: Send + Sync {
    fn depth(&self) -> usize;
}
trait Level3: Send + Sync {
    fn depth(&self) -> usize;
}

struct Depth(usize);
impl Level0 for Depth {
    fn depth(&self) -> usize {
        self.0
    }
}
impl Level1 for Depth {
    fn depth(&self) -> usize {
        self.0
    }
}
impl Level2 for Depth {
    fn depth(&self) -> usize {
        self.0
    }
}
impl Level3 for Depth {
    fn depth(&self) -> usize {
        self.0
    }
}

fn level0() -> Arc<dyn Level0> {
    Arc::new(Depth(0))
}
fn level1(below: Arc<dyn Level0>) -> Arc<dyn Level1> {
    Arc::new(Depth(below.depth() + 1))
}
fn level2(below: Arc<dyn Level1>) -> Arc<dyn Level2> {
    Arc::new(Depth(below.depth() + 1))
}
fn level3(below: Arc<dyn Level2>, root: Arc<dyn Level0>) -> Arc<dyn Level3> {
    Arc::new(Depth(below.depth() + 1 + root.depth()))
}

fn lifetime() -> impl Strategy<Value = Lifetime> {
    prop_oneof![
        Just(Lifetime::Singleton),
        Just(Lifetime::PerDependency),
        Just(Lifetime::PerScope),
        Just(Lifetime::PerRequest),
    ]
}

fn definition(level: usize, lifetime: Lifetime) -> Definition {
    match level {
        0 => Definition::new(level0, lifetime),
        1 => Definition::new(level1, lifetime),
        2 => Definition::new(level2, lifetime),
        _ => Definition::new(level3, lifetime),
    }
}

proptest! {
    #[test]
    fn acyclic_chain_builds_in_any_order(
        order in Just(vec![0usize, 1, 2, 3]).prop_shuffle(),
        lifetimes in prop::collection::vec(lifetime(), 4),
    ) {
        let mut registry = Registry::new();
        registry
            .add_all(order.iter().map(|&level| definition(level, lifetimes[level])))
            .unwrap();

        let graph = registry.build().unwrap();
        prop_assert_eq!(graph.len(), 4);

        let top = graph.resolve::<dyn Level3>().unwrap();
        prop_assert_eq!(top.depth(), 3);

        let descriptors = graph.descriptors();
        for (descriptor, &level) in descriptors.iter().zip(order.iter()) {
            prop_assert_eq!(descriptor.lifetime, lifetimes[level]);
        }
    }
}

proptest! {
    #[test]
    fn repeated_identical_definitions_collapse(repeats in 1usize..8, chosen in lifetime()) {
        let mut registry = Registry::new();
        for _ in 0..repeats {
            registry.add(level0, chosen).unwrap();
        }

        let graph = registry.build().unwrap();
        prop_assert_eq!(graph.len(), 1);
        prop_assert!(graph.contains::<dyn Level0>());
    }
}

proptest! {
    #[test]
    fn joined_parts_match_single_registry(split in 0usize..=4) {
        let levels = [0usize, 1, 2, 3];
        let mut left = Registry::new();
        left.add_all(levels[..split].iter().map(|&l| definition(l, Lifetime::Singleton))).unwrap();
        let mut right = Registry::new();
        right.add_all(levels[split..].iter().map(|&l| definition(l, Lifetime::Singleton))).unwrap();

        let graph = Registry::join([left, right]).build().unwrap();
        prop_assert_eq!(graph.len(), 4);
        prop_assert_eq!(graph.resolve::<dyn Level3>().unwrap().depth(), 3);
    }
}

proptest! {
    #[test]
    fn numeric_lifetimes_parse_back_by_name(raw in 0u8..4) {
        let lifetime = Lifetime::try_from(raw).unwrap();
        prop_assert_eq!(lifetime.as_str().parse::<Lifetime>().unwrap(), lifetime);
    }

    #[test]
    fn out_of_range_lifetimes_are_rejected(raw in 4u8..=255) {
        prop_assert!(Lifetime::try_from(raw).is_err());
    }
}
