//! Installation projects. Progress is always derived from the current stage.

use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};

use super::{ServiceError, ServiceResult};
use crate::db::{merge_document, CrmDb};
use crate::types::{Project, ProjectInput};
use crate::util::{new_id, number_from_value, today};
use crate::workflow::DEFAULT_PROJECT_DAYS;

const TRIMMED_FIELDS: [&str; 6] = [
    "projectName",
    "customerName",
    "location",
    "elevatorType",
    "quotationId",
    "assignedEngineer",
];

const NUMERIC_FIELDS: [&str; 5] = [
    "numberOfLifts",
    "numberOfStops",
    "orderValue",
    "advanceAmountReceived",
    "balanceAmount",
];

fn load(db: &CrmDb, id: &str) -> ServiceResult<Project> {
    db.get_project(id)?.ok_or(ServiceError::NotFound("Project"))
}

/// Coerce form-entered numbers; values that cannot be read are dropped.
fn sanitize_numbers(fields: &mut Map<String, Value>) {
    // Derived from the stage on every write
    fields.remove("progress");
    for key in NUMERIC_FIELDS {
        let Some(raw) = fields.get(key) else { continue };
        if raw.is_null() {
            continue;
        }
        match number_from_value(raw) {
            Some(n) => {
                fields.insert(key.into(), json!(n));
            }
            None => {
                log::warn!("Dropping invalid numeric value for {}: {}", key, raw);
                fields.remove(key);
            }
        }
    }
}

fn trim_strings(fields: &mut Map<String, Value>) {
    for key in TRIMMED_FIELDS {
        if let Some(Value::String(s)) = fields.get_mut(key) {
            *s = s.trim().to_string();
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// The create-time required fields, checked again after an update merge.
fn require_merged(project: &Project) -> ServiceResult<()> {
    let fields = [
        ("quotationId", &project.quotation_id),
        ("projectName", &project.project_name),
        ("customerName", &project.customer_name),
        ("location", &project.location),
        ("elevatorType", &project.elevator_type),
        ("assignedEngineer", &project.assigned_engineer),
    ];
    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((field, _)) => Err(ServiceError::invalid(format!("{} is required", field))),
        None => Ok(()),
    }
}

pub fn list(db: &CrmDb) -> ServiceResult<Vec<Project>> {
    Ok(db.list_projects()?)
}

pub fn get(db: &CrmDb, id: &str) -> ServiceResult<Project> {
    load(db, id)
}

pub fn create(db: &CrmDb, body: &Value) -> ServiceResult<Project> {
    let mut fields = body
        .as_object()
        .cloned()
        .ok_or_else(|| ServiceError::invalid("Invalid request body. Expected a JSON object."))?;
    trim_strings(&mut fields);
    sanitize_numbers(&mut fields);

    let input: ProjectInput = serde_json::from_value(Value::Object(fields))
        .map_err(|e| ServiceError::invalid_with("Validation failed", e.to_string()))?;
    let details = input.details;

    let location = non_empty(input.location).or_else(|| {
        details
            .site_address
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    });
    let elevator_type = non_empty(input.elevator_type)
        .or_else(|| details.lift_type.map(|t| t.as_str().to_string()));

    let require = |value: Option<String>, field: &str| {
        non_empty(value).ok_or_else(|| ServiceError::invalid(format!("{} is required", field)))
    };
    let quotation_id = require(input.quotation_id, "quotationId")?;
    let project_name = require(input.project_name, "projectName")?;
    let customer_name = require(input.customer_name, "customerName")?;
    let location = require(location, "location")?;
    let elevator_type = require(elevator_type, "elevatorType")?;
    let assigned_engineer = require(input.assigned_engineer, "assignedEngineer")?;

    let start_date = input
        .start_date
        .or(details.order_date)
        .unwrap_or_else(today);
    let expected_completion = input
        .expected_completion
        .or(details.expected_completion_date)
        .unwrap_or(start_date + Duration::days(DEFAULT_PROJECT_DAYS));
    let current_stage = input.current_stage.unwrap_or_default();

    let now = Utc::now();
    let project = Project {
        id: new_id(),
        project_name,
        customer_name,
        quotation_id,
        location,
        elevator_type,
        current_stage,
        start_date,
        expected_completion,
        progress: current_stage.progress(),
        assigned_engineer,
        status: input.status.unwrap_or_default(),
        details,
        created_at: now,
        updated_at: now,
    };
    db.insert_project(&project)?;
    log::info!(
        "Created project {} ({}) at {} ({}%)",
        project.id,
        project.project_name,
        project.current_stage,
        project.progress
    );
    Ok(project)
}

pub fn update(db: &CrmDb, id: &str, patch: &Value) -> ServiceResult<Project> {
    let existing = load(db, id)?;
    let mut fields = patch
        .as_object()
        .cloned()
        .ok_or_else(|| ServiceError::invalid("Invalid request body. Expected a JSON object."))?;
    trim_strings(&mut fields);
    sanitize_numbers(&mut fields);

    let mut project: Project = merge_document(&existing, &Value::Object(fields))
        .map_err(|e| ServiceError::invalid_with("Failed to update project", e.to_string()))?;
    require_merged(&project)?;
    project.progress = project.current_stage.progress();
    project.updated_at = Utc::now();
    if !db.update_project(&project)? {
        return Err(ServiceError::NotFound("Project"));
    }
    if project.current_stage != existing.current_stage {
        log::info!(
            "Project {} moved to {} ({}%)",
            project.id,
            project.current_stage,
            project.progress
        );
    }
    Ok(project)
}

pub fn delete(db: &CrmDb, id: &str) -> ServiceResult<()> {
    if db.delete_project(id)? {
        log::info!("Deleted project {}", id);
        Ok(())
    } else {
        Err(ServiceError::NotFound("Project"))
    }
}
