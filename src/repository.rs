//! Item repository
//!
//! CRUD core over a [`KeyValueStore`]: validates input, allocates IDs,
//! builds composite keys and normalizes store failures into
//! [`CatalogError`].
//!
//! ## Access paths
//! - Point get/delete by `(ItemId, Course)`
//! - Course lookups through the course secondary index (never a scan)
//! - Year lookups through a filtered full scan (Year is not indexed)
//!
//! No operation retries; retrying belongs to the caller.

use std::sync::Arc;

use crate::allocator::CounterAllocator;
use crate::config::Config;
use crate::error::{CatalogError, Result};
use crate::model::{AttributeValue, Fields, Item, Record};
use crate::store::KeyValueStore;

/// Repository for catalog items
#[derive(Clone)]
pub struct ItemRepository {
    store: Arc<dyn KeyValueStore>,
    allocator: CounterAllocator,
    table: String,
    course_index: String,
}

impl ItemRepository {
    /// Caller field names required by [`create`](Self::create)
    pub const REQUIRED_FIELDS: [&'static str; 3] = ["name", "course", "year"];

    /// Caller-facing name of the item ID parameter
    pub const ID_PARAM: &'static str = "id";

    pub fn new(store: Arc<dyn KeyValueStore>, config: &Config) -> Self {
        Self {
            allocator: CounterAllocator::from_config(Arc::clone(&store), config),
            store,
            table: config.items_table.clone(),
            course_index: config.course_index.clone(),
        }
    }

    /// Name of the index used for course lookups
    pub fn course_index(&self) -> &str {
        &self.course_index
    }

    /// Create an item from caller fields
    ///
    /// `name`, `course` and `year` are required and must be non-empty;
    /// numbers and booleans given for them are stored as their text. Every
    /// other field is kept as an extra attribute, except names that collide
    /// with stored item attributes, which are dropped.
    ///
    /// If the put fails after allocation, the issued ID is burned.
    pub fn create(&self, mut fields: Fields) -> Result<Item> {
        let missing: Vec<&str> = Self::REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|name| fields.get(*name).map_or(true, |v| v.to_string().trim().is_empty()))
            .collect();
        if !missing.is_empty() {
            return Err(CatalogError::missing_fields(missing));
        }

        let mut take = |field: &str| fields.remove(field).map(|v| v.to_string()).unwrap_or_default();
        let name = take("name");
        let course = take("course");
        let year = take("year");

        let attributes = fields
            .into_iter()
            .filter(|(attribute, _)| {
                let reserved = Item::is_reserved(attribute);
                if reserved {
                    tracing::warn!("Dropping field {} that collides with a stored attribute", attribute);
                }
                !reserved
            })
            .collect();

        let item_id = self.allocator.next_id()?;
        let item = Item {
            item_id,
            course,
            name,
            year,
            attributes,
        };

        if let Err(e) = self.store.put(&self.table, &item.key(), item.to_record()) {
            tracing::warn!("Item id {} was allocated but not stored: {}", item.item_id, e);
            return Err(e.into());
        }

        tracing::info!("Created item {} in course {}", item.item_id, item.course);
        Ok(item)
    }

    /// Point lookup by composite key
    pub fn get(&self, item_id: &str, course: &str) -> Result<Item> {
        validate_key(item_id, course)?;

        let key = Item::key_for(item_id, course);
        tracing::debug!("Get {} from {}", key, self.table);

        match self.store.get(&self.table, &key)? {
            Some(record) => Ok(Item::from_record(record)?),
            None => Err(not_found(item_id, course)),
        }
    }

    /// Delete by composite key, returning the removed item
    pub fn delete(&self, item_id: &str, course: &str) -> Result<Item> {
        validate_key(item_id, course)?;

        let key = Item::key_for(item_id, course);
        tracing::debug!("Delete {} from {}", key, self.table);

        match self.store.delete(&self.table, &key)? {
            Some(record) => {
                tracing::info!("Deleted item {} in course {}", item_id, course);
                Ok(Item::from_record(record)?)
            }
            None => Err(not_found(item_id, course)),
        }
    }

    /// Every item, in store scan order; empty is a valid result
    pub fn list_all(&self) -> Result<Vec<Item>> {
        tracing::debug!("Scan {}", self.table);
        to_items(self.store.scan(&self.table, None)?)
    }

    /// Items of one course, served by the course index
    pub fn list_by_course(&self, course: &str) -> Result<Vec<Item>> {
        require_non_empty("course", course)?;
        tracing::debug!("Query {} on {} for course {}", self.course_index, self.table, course);

        let records = self.store.query_index(
            &self.table,
            &self.course_index,
            Item::COURSE,
            &AttributeValue::from(course),
        )?;
        to_items(records)
    }

    /// Items of one year, via a filtered full scan
    pub fn list_by_year(&self, year: &str) -> Result<Vec<Item>> {
        require_non_empty("year", year)?;
        tracing::debug!("Scan {} for year {}", self.table, year);

        let filter = AttributeValue::from(year);
        to_items(self.store.scan(&self.table, Some((Item::YEAR, &filter)))?)
    }
}

fn validate_key(item_id: &str, course: &str) -> Result<()> {
    let missing: Vec<&str> = [(ItemRepository::ID_PARAM, item_id), ("course", course)]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CatalogError::missing_fields(missing))
    }
}

fn require_non_empty(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CatalogError::missing_fields([name]));
    }
    Ok(())
}

fn not_found(item_id: &str, course: &str) -> CatalogError {
    CatalogError::NotFound {
        item_id: item_id.to_string(),
        course: course.to_string(),
    }
}

fn to_items(records: Vec<Record>) -> Result<Vec<Item>> {
    records
        .into_iter()
        .map(|record| Item::from_record(record).map_err(CatalogError::from))
        .collect()
}
