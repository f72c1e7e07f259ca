//! Service outcomes
//!
//! Tagged results handed to transport adapters. An adapter maps
//! [`Status`] to its own status codes and serializes [`Outcome::body`].

use serde_json::{json, Value};

use crate::model::Item;

/// Outcome status codes (HTTP-compatible)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Status {
    Ok = 200,
    Created = 201,
    BadRequest = 400,
    NotFound = 404,
    InternalError = 500,
}

impl Status {
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn is_success(self) -> bool {
        matches!(self, Status::Ok | Status::Created)
    }
}

/// Successful payloads
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A single item (get)
    Item(Item),

    /// A list of items (list operations)
    Items(Vec<Item>),

    /// The item a delete removed
    Deleted(Item),
}

/// Result of a catalog operation
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Created(Item),
    Ok(Payload),
    NotFound(String),
    BadRequest(String),
    InternalError(String),
}

impl Outcome {
    /// Create a NOT_FOUND outcome
    pub fn not_found(message: impl Into<String>) -> Self {
        Outcome::NotFound(message.into())
    }

    /// Create a BAD_REQUEST outcome
    pub fn bad_request(message: impl Into<String>) -> Self {
        Outcome::BadRequest(message.into())
    }

    /// Create an INTERNAL_ERROR outcome
    pub fn internal_error(message: impl Into<String>) -> Self {
        Outcome::InternalError(message.into())
    }

    pub fn status(&self) -> Status {
        match self {
            Outcome::Created(_) => Status::Created,
            Outcome::Ok(_) => Status::Ok,
            Outcome::NotFound(_) => Status::NotFound,
            Outcome::BadRequest(_) => Status::BadRequest,
            Outcome::InternalError(_) => Status::InternalError,
        }
    }

    /// Error message for failure outcomes
    pub fn message(&self) -> Option<&str> {
        match self {
            Outcome::NotFound(m) | Outcome::BadRequest(m) | Outcome::InternalError(m) => Some(m),
            Outcome::Created(_) | Outcome::Ok(_) => None,
        }
    }

    /// Items carried by a successful outcome, in payload order
    pub fn items(&self) -> Vec<&Item> {
        match self {
            Outcome::Created(item)
            | Outcome::Ok(Payload::Item(item))
            | Outcome::Ok(Payload::Deleted(item)) => vec![item],
            Outcome::Ok(Payload::Items(items)) => items.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// JSON response body
    ///
    /// ```text
    /// Created        {"message": "Item added successfully", "item": {...}}
    /// Ok(Item)       {...}
    /// Ok(Items)      [{...}, ...]
    /// Ok(Deleted)    {"message": "Item deleted successfully", "item": {...}}
    /// failures       {"error": "..."}
    /// ```
    pub fn body(&self) -> Value {
        match self {
            Outcome::Created(item) => json!({
                "message": "Item added successfully",
                "item": item.to_json(),
            }),
            Outcome::Ok(Payload::Item(item)) => item.to_json(),
            Outcome::Ok(Payload::Items(items)) => {
                Value::Array(items.iter().map(Item::to_json).collect())
            }
            Outcome::Ok(Payload::Deleted(item)) => json!({
                "message": "Item deleted successfully",
                "item": item.to_json(),
            }),
            Outcome::NotFound(m) | Outcome::BadRequest(m) | Outcome::InternalError(m) => {
                json!({ "error": m })
            }
        }
    }
}
