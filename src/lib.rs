//! # itemcatalog
//!
//! Data-access core of a course catalog:
//! - Atomic ID allocation from a single counter record
//! - Composite-key `(ItemId, Course)` CRUD
//! - Lookups by course (secondary index) and by year (filtered scan)
//! - A durable, WAL-backed key-value store to run it on
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Transport adapter (CLI)                     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ Outcome (Created/Ok/NotFound/...)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    CatalogService                            │
//! │               (presentation policy)                          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ Result<_, CatalogError>
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    ItemRepository                            │
//! │        (validation, keys, error normalization)               │
//! └──────────┬──────────────────────────────────┬───────────────┘
//!            │                                  │
//!            ▼                                  ▼
//!   ┌─────────────────┐              ┌─────────────────────┐
//!   │CounterAllocator │─────────────▶│   KeyValueStore     │
//!   └─────────────────┘              │ Memory / Journaled  │
//!                                    └──────────┬──────────┘
//!                                               ▼
//!                                        ┌─────────────┐
//!                                        │     WAL     │
//!                                        └─────────────┘
//! ```
//!
//! The core holds no mutable state of its own; every handle is injected at
//! construction and all concurrency-sensitive state lives in the store.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod model;
pub mod wal;
pub mod store;
pub mod allocator;
pub mod repository;
pub mod service;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use allocator::CounterAllocator;
pub use config::Config;
pub use error::{CatalogError, Result, StoreError, StoreResult};
pub use model::{AttributeValue, Fields, Item, ItemId, Key, Record};
pub use repository::ItemRepository;
pub use service::{CatalogService, Outcome, Payload, Status};
pub use store::{JournaledStore, KeyValueStore, MemoryStore};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of itemcatalog
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
