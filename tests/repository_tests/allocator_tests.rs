//! Tests for CounterAllocator
//!
//! These tests verify:
//! - First issued ID is 1, then strictly increasing
//! - Failed increments issue nothing
//! - Concurrent callers never share an ID

use std::collections::HashSet;
use std::sync::Arc;

use itemcatalog::store::{KeyValueStore, MemoryStore, StoreOp};
use itemcatalog::{CatalogError, Config, CounterAllocator, ItemId, Key};

fn setup_allocator() -> (Arc<MemoryStore>, CounterAllocator) {
    let store = Arc::new(MemoryStore::new());
    let allocator = CounterAllocator::from_config(store.clone(), &Config::default());
    (store, allocator)
}

#[test]
fn test_first_id_is_one() {
    let (_store, allocator) = setup_allocator();

    assert_eq!(allocator.next_id().unwrap(), ItemId::new("1"));
}

#[test]
fn test_ids_strictly_increase() {
    let (_store, allocator) = setup_allocator();

    let ids: Vec<String> = (0..5)
        .map(|_| allocator.next_id().unwrap().to_string())
        .collect();

    assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
}

#[test]
fn test_counter_record_layout() {
    let (store, allocator) = setup_allocator();
    allocator.next_id().unwrap();
    allocator.next_id().unwrap();

    let key = Key::single(CounterAllocator::KEY_ATTRIBUTE, Config::DEFAULT_COUNTER_NAME);
    let record = store
        .get(Config::DEFAULT_COUNTER_TABLE, &key)
        .unwrap()
        .unwrap();

    assert_eq!(record[CounterAllocator::VALUE_FIELD].as_number(), Some(2));
}

#[test]
fn test_failed_increment_issues_nothing() {
    let (store, allocator) = setup_allocator();
    allocator.next_id().unwrap();

    store.fail_next(StoreOp::Increment, 1);
    let result = allocator.next_id();
    assert!(matches!(result, Err(CatalogError::StoreUnavailable(_))));

    assert_eq!(allocator.next_id().unwrap(), ItemId::new("2"));
}

#[test]
fn test_allocators_sharing_a_store_share_the_counter() {
    let store = Arc::new(MemoryStore::new());
    let a = CounterAllocator::new(store.clone(), "Counters", "ItemIdCounter");
    let b = CounterAllocator::new(store.clone(), "Counters", "ItemIdCounter");
    let other = CounterAllocator::new(store, "Counters", "OtherCounter");

    assert_eq!(a.next_id().unwrap().as_str(), "1");
    assert_eq!(b.next_id().unwrap().as_str(), "2");
    assert_eq!(other.next_id().unwrap().as_str(), "1");
}

#[test]
fn test_concurrent_allocation_is_unique() {
    let (_store, allocator) = setup_allocator();

    let ids: Vec<ItemId> = crossbeam::scope(|scope| {
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let allocator = allocator.clone();
                scope.spawn(move |_| {
                    (0..50)
                        .map(|_| allocator.next_id().unwrap())
                        .collect::<Vec<ItemId>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    })
    .unwrap();

    let unique: HashSet<&ItemId> = ids.iter().collect();
    assert_eq!(unique.len(), 800);

    let max = ids
        .iter()
        .map(|id| id.as_str().parse::<i64>().unwrap())
        .max()
        .unwrap();
    assert_eq!(max, 800);
    assert_eq!(allocator.next_id().unwrap().as_str(), "801");
}
