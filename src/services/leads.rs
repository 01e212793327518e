//! Sales leads. Updates run the lead stage workflow after the write.

use chrono::Utc;
use serde_json::Value;

use super::{ServiceError, ServiceResult};
use crate::db::{merge_document, CrmDb};
use crate::types::{Lead, LeadInput, LeadStage};
use crate::util::{new_id, today};
use crate::workflow::{self, ProjectDerivation};

fn load(db: &CrmDb, id: &str) -> ServiceResult<Lead> {
    db.get_lead(id)?.ok_or(ServiceError::NotFound("Lead"))
}

pub fn list(db: &CrmDb) -> ServiceResult<Vec<Lead>> {
    Ok(db.list_leads()?)
}

pub fn get(db: &CrmDb, id: &str) -> ServiceResult<Lead> {
    load(db, id)
}

fn required(value: Option<String>, field: &str, missing: &mut Vec<String>) -> String {
    match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(v) => v,
        None => {
            missing.push(format!("{} is required", field));
            String::new()
        }
    }
}

/// Re-apply the create-time required fields to a merged lead, trimming them.
fn require_merged(lead: &mut Lead) -> ServiceResult<()> {
    let mut missing = Vec::new();
    lead.name = required(Some(std::mem::take(&mut lead.name)), "name", &mut missing);
    lead.email = required(Some(std::mem::take(&mut lead.email)), "email", &mut missing);
    lead.phone = required(Some(std::mem::take(&mut lead.phone)), "phone", &mut missing);
    lead.assigned_to = required(
        Some(std::mem::take(&mut lead.assigned_to)),
        "assignedTo",
        &mut missing,
    );
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::invalid_with("Validation failed", missing.join(", ")))
    }
}

pub fn create(db: &CrmDb, input: LeadInput) -> ServiceResult<Lead> {
    let mut missing = Vec::new();
    let name = required(input.name, "name", &mut missing);
    let email = required(input.email, "email", &mut missing);
    let phone = required(input.phone, "phone", &mut missing);
    let assigned_to = required(input.assigned_to, "assignedTo", &mut missing);
    if !missing.is_empty() {
        return Err(ServiceError::invalid_with("Validation failed", missing.join(", ")));
    }

    let stage = input
        .stage
        .as_deref()
        .map(LeadStage::normalize)
        .unwrap_or_default();
    let now = Utc::now();
    let lead = Lead {
        id: new_id(),
        lead_id: input.lead_id.filter(|l| !l.trim().is_empty()),
        name,
        company: input.company.unwrap_or_default(),
        email,
        phone,
        source: input
            .source
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "Website".to_string()),
        stage,
        value: input.value.unwrap_or(0.0),
        assigned_to,
        last_contact: input.last_contact.unwrap_or_else(today),
        notes: input.notes.unwrap_or_default(),
        contact_report: input.contact_report,
        created_at: now,
        updated_at: now,
    };
    db.insert_lead(&lead)?;
    log::info!("Created lead {} ({}) at stage {}", lead.id, lead.name, stage);
    Ok(lead)
}

/// Merge `patch` into the stored lead, then run the stage workflow.
///
/// The workflow outcome is informational: a failed project derivation
/// leaves the lead update in place.
pub fn update(db: &CrmDb, id: &str, patch: &Value) -> ServiceResult<(Lead, ProjectDerivation)> {
    let existing = load(db, id)?;
    let previous = existing.stage;

    let mut lead: Lead = merge_document(&existing, patch)
        .map_err(|e| ServiceError::invalid_with("Validation error", e.to_string()))?;
    require_merged(&mut lead)?;
    lead.updated_at = Utc::now();
    if !db.update_lead(&lead)? {
        return Err(ServiceError::NotFound("Lead"));
    }
    if previous != lead.stage {
        log::info!("Lead {} moved from {} to {}", lead.id, previous, lead.stage);
    }

    let outcome = workflow::on_lead_updated(db, previous, &lead);
    Ok((lead, outcome))
}

pub fn delete(db: &CrmDb, id: &str) -> ServiceResult<()> {
    if db.delete_lead(id)? {
        log::info!("Deleted lead {}", id);
        Ok(())
    } else {
        Err(ServiceError::NotFound("Lead"))
    }
}
