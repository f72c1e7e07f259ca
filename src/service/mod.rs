//! Service Module
//!
//! Orchestrates repository calls per logical operation and applies the
//! presentation policy:
//!
//! | Repository result            | Outcome         |
//! |------------------------------|-----------------|
//! | validation failure           | `BadRequest`    |
//! | not found (get/delete)       | `NotFound`      |
//! | empty list                   | `NotFound` (*)  |
//! | missing index                | `BadRequest`    |
//! | store failure                | `InternalError` |
//! | created                      | `Created`       |
//! | anything else                | `Ok`            |
//!
//! (*) unless `Config::empty_list_as_not_found` is off, in which case an
//! empty list is an `Ok` with no items.

mod outcome;

pub use outcome::{Outcome, Payload, Status};

use std::sync::Arc;

use crate::config::Config;
use crate::error::{CatalogError, Result};
use crate::model::{AttributeValue, Fields, Item};
use crate::repository::ItemRepository;
use crate::store::KeyValueStore;

const INVALID_PAYLOAD: &str = "Invalid request payload";
const ITEM_NOT_FOUND: &str = "Item not found";
const ADD_FAILED: &str = "An error occurred while adding the item";

/// Catalog use-case service
#[derive(Clone)]
pub struct CatalogService {
    repository: ItemRepository,
    empty_list_as_not_found: bool,
}

impl CatalogService {
    /// Creates a service over a repository, reporting empty lists as not found
    pub fn new(repository: ItemRepository) -> Self {
        Self {
            repository,
            empty_list_as_not_found: true,
        }
    }

    /// Build repository and service for a store
    pub fn from_store(store: Arc<dyn KeyValueStore>, config: &Config) -> Self {
        Self::new(ItemRepository::new(store, config))
            .with_empty_list_as_not_found(config.empty_list_as_not_found)
    }

    pub fn with_empty_list_as_not_found(mut self, enabled: bool) -> Self {
        self.empty_list_as_not_found = enabled;
        self
    }

    pub fn repository(&self) -> &ItemRepository {
        &self.repository
    }

    /// Create an item from typed fields
    pub fn add_item(&self, fields: Fields) -> Outcome {
        match self.repository.create(fields) {
            Ok(item) => Outcome::Created(item),
            Err(e) => self.failure(e, ADD_FAILED),
        }
    }

    /// Create an item from a JSON object body
    pub fn add_item_json(&self, body: &str) -> Outcome {
        let object = match serde_json::from_str::<serde_json::Value>(body) {
            Ok(serde_json::Value::Object(object)) => object,
            _ => return Outcome::bad_request(INVALID_PAYLOAD),
        };

        // Missing required fields are reported before any value is converted
        let missing: Vec<&str> = ItemRepository::REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|name| match object.get(*name) {
                None | Some(serde_json::Value::Null) => true,
                Some(serde_json::Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            })
            .collect();
        if !missing.is_empty() {
            return self.failure(CatalogError::missing_fields(missing), ADD_FAILED);
        }

        let mut fields = Fields::new();
        for (name, value) in object {
            match AttributeValue::from_json(&value) {
                Ok(value) => {
                    fields.insert(name, value);
                }
                Err(reason) => {
                    return self.failure(CatalogError::invalid_field(name, reason), ADD_FAILED)
                }
            }
        }

        self.add_item(fields)
    }

    pub fn get_item(&self, item_id: &str, course: &str) -> Outcome {
        match self.repository.get(item_id, course) {
            Ok(item) => Outcome::Ok(Payload::Item(item)),
            Err(e) => self.failure(e, "An error occurred while retrieving the item"),
        }
    }

    pub fn delete_item(&self, item_id: &str, course: &str) -> Outcome {
        match self.repository.delete(item_id, course) {
            Ok(item) => Outcome::Ok(Payload::Deleted(item)),
            Err(e) => self.failure(e, "An error occurred while deleting the item"),
        }
    }

    pub fn list_items(&self) -> Outcome {
        self.listing(
            self.repository.list_all(),
            "No items found in the database",
        )
    }

    pub fn list_items_by_course(&self, course: &str) -> Outcome {
        match self.repository.list_by_course(course) {
            Err(CatalogError::Schema(reason)) => {
                tracing::warn!("Course lookup failed on index configuration: {}", reason);
                Outcome::bad_request(format!(
                    "The table does not have the specified index: {}",
                    self.repository.course_index()
                ))
            }
            result => self.listing(result, "No items found for the given course"),
        }
    }

    pub fn list_items_by_year(&self, year: &str) -> Outcome {
        self.listing(
            self.repository.list_by_year(year),
            "No items found for the given year",
        )
    }

    fn listing(&self, result: Result<Vec<Item>>, empty_message: &str) -> Outcome {
        match result {
            Ok(items) if items.is_empty() && self.empty_list_as_not_found => {
                Outcome::not_found(empty_message)
            }
            Ok(items) => Outcome::Ok(Payload::Items(items)),
            Err(e) => self.failure(e, "An error occurred while listing items"),
        }
    }

    fn failure(&self, err: CatalogError, context: &str) -> Outcome {
        match err {
            CatalogError::Validation { message, .. } => Outcome::bad_request(message),
            CatalogError::NotFound { .. } => Outcome::not_found(ITEM_NOT_FOUND),
            CatalogError::Schema(reason) => Outcome::bad_request(reason),
            CatalogError::StoreUnavailable(cause) => {
                tracing::warn!("{}: {}", context, cause);
                Outcome::internal_error(format!("{}: {}", context, cause))
            }
        }
    }
}
