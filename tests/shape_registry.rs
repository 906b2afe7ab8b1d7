//! Shape registry concurrency tests
//!
//! The registry must publish at most one entry per (entity, signature) even
//! when many threads miss the cache at once.

mod fixtures;

use std::sync::{Arc, Barrier};
use std::thread;

use aeroquery::projection::{ProjectionCompiler, ShapeRegistry};
use aeroquery::schema::PropertyResolver;

use fixtures::{catalog, Product};

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Concurrent first requests for one column set share a single entry.
#[test]
fn test_concurrent_get_or_create_publishes_once() {
    let registry = ShapeRegistry::new();
    let resolver = PropertyResolver::<Product>::shared();
    let variants = [
        columns(&["id", "name", "price"]),
        columns(&["PRICE", "Id", "name"]),
        columns(&["name", "price", "ID"]),
        columns(&["Price", "NAME", "id", "price"]),
    ];
    let threads = 16;
    let barrier = Barrier::new(threads);

    let entries: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let registry = &registry;
                let resolver = &resolver;
                let barrier = &barrier;
                let cols = &variants[i % variants.len()];
                scope.spawn(move || {
                    barrier.wait();
                    registry.get_or_create(resolver, cols).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(registry.len(), 1);
    let first = &entries[0];
    for entry in &entries {
        assert!(Arc::ptr_eq(first, entry));
    }
}

/// Distinct column sets under contention each get exactly one entry.
#[test]
fn test_concurrent_distinct_shapes() {
    let registry = ShapeRegistry::new();
    let resolver = PropertyResolver::<Product>::shared();
    let sets = [
        columns(&["id"]),
        columns(&["id", "name"]),
        columns(&["rating", "tag"]),
    ];

    thread::scope(|scope| {
        for _ in 0..4 {
            for cols in &sets {
                let registry = &registry;
                let resolver = &resolver;
                scope.spawn(move || {
                    registry.get_or_create(resolver, cols).unwrap();
                });
            }
        }
    });

    assert_eq!(registry.len(), sets.len());
}

/// Projectors built concurrently from one entry agree on every record.
#[test]
fn test_concurrent_projection_is_consistent() {
    let registry = ShapeRegistry::new();
    let resolver = PropertyResolver::<Product>::shared();
    let entry = registry
        .get_or_create(&resolver, &columns(&["name", "rating"]))
        .unwrap();
    let rows = catalog();

    let outputs: Vec<Vec<String>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let entry = Arc::clone(&entry);
                let resolver = &resolver;
                let rows = &rows;
                scope.spawn(move || {
                    let projector = ProjectionCompiler::build(entry, resolver).unwrap();
                    rows.iter()
                        .map(|row| serde_json::to_string(&projector.project(row)).unwrap())
                        .collect()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for output in &outputs {
        assert_eq!(output, &outputs[0]);
    }
}

/// Failed resolution leaves the registry untouched.
#[test]
fn test_failed_lookup_publishes_nothing() {
    let registry = ShapeRegistry::new();
    let resolver = PropertyResolver::<Product>::shared();

    assert!(registry
        .get_or_create(&resolver, &columns(&["id", "missing"]))
        .is_err());
    assert!(registry.is_empty());
}
