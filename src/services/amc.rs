//! Annual maintenance contracts.

use chrono::Utc;
use serde_json::Value;

use super::{new_document, ServiceError, ServiceResult};
use crate::db::{merge_document, CrmDb};
use crate::types::AmcContract;

fn load(db: &CrmDb, id: &str) -> ServiceResult<AmcContract> {
    db.get_amc(id)?.ok_or(ServiceError::NotFound("AMC contract"))
}

pub fn list(db: &CrmDb) -> ServiceResult<Vec<AmcContract>> {
    Ok(db.list_amc()?)
}

pub fn get(db: &CrmDb, id: &str) -> ServiceResult<AmcContract> {
    load(db, id)
}

pub fn create(db: &CrmDb, body: &Value) -> ServiceResult<AmcContract> {
    let fields = new_document(body, "Failed to create AMC contract")?;
    let contract: AmcContract = serde_json::from_value(Value::Object(fields))
        .map_err(|e| ServiceError::invalid_with("Failed to create AMC contract", e.to_string()))?;
    db.insert_amc(&contract)?;
    log::info!(
        "Created AMC contract {} for {} ({})",
        contract.id,
        contract.customer_name,
        contract.status
    );
    Ok(contract)
}

pub fn update(db: &CrmDb, id: &str, patch: &Value) -> ServiceResult<AmcContract> {
    let existing = load(db, id)?;
    let mut contract: AmcContract = merge_document(&existing, patch)
        .map_err(|e| ServiceError::invalid_with("Failed to update AMC contract", e.to_string()))?;
    contract.updated_at = Utc::now();
    if !db.update_amc(&contract)? {
        return Err(ServiceError::NotFound("AMC contract"));
    }
    Ok(contract)
}

pub fn delete(db: &CrmDb, id: &str) -> ServiceResult<()> {
    if db.delete_amc(id)? {
        log::info!("Deleted AMC contract {}", id);
        Ok(())
    } else {
        Err(ServiceError::NotFound("AMC contract"))
    }
}
