//! Business operations behind the HTTP routes.
//!
//! Every function takes the store by reference and returns a
//! [`ServiceResult`]; handlers only translate requests and errors.

pub mod amc;
pub mod auth;
pub mod blogs;
pub mod dashboard;
pub mod error;
pub mod leads;
pub mod notifications;
pub mod projects;
pub mod quotations;
pub mod seed;
pub mod submissions;
pub mod users;

use chrono::Utc;
use serde_json::{json, Map, Value};

pub use error::{ServiceError, ServiceResult};

use crate::util::{new_id, timestamp};

/// Start a new stored document from a client body: client ids are
/// discarded and a fresh id plus creation stamps are assigned.
pub(crate) fn new_document(body: &Value, failure: &str) -> ServiceResult<Map<String, Value>> {
    let mut fields = body
        .as_object()
        .cloned()
        .ok_or_else(|| ServiceError::invalid_with(failure, "Expected a JSON object"))?;
    let now = timestamp(&Utc::now());
    fields.remove("_id");
    fields.insert("id".into(), json!(new_id()));
    fields.insert("createdAt".into(), json!(now));
    fields.insert("updatedAt".into(), json!(now));
    Ok(fields)
}
