//! Lead stage workflow.
//!
//! When a lead is moved into "Order Closed" the installation project is
//! derived from the lead and its most recent quotation. At most one project
//! exists per won lead: a project already registered for the same customer
//! name or quotation suppresses creation.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::db::CrmDb;
use crate::services::notifications::notify;
use crate::services::ServiceError;
use crate::types::{
    Lead, LeadStage, LiftType, NotificationType, Project, ProjectDetails, ProjectHealth,
    ProjectPaymentStatus, ProjectStage, ProjectStatus, Quotation,
};
use crate::util::new_id;

/// Days between a project's start and its expected completion by default.
pub const DEFAULT_PROJECT_DAYS: i64 = 90;

/// What the workflow did in response to a lead update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ProjectDerivation {
    /// The update did not move the lead into Order Closed.
    NotTriggered,
    #[serde(rename_all = "camelCase")]
    AlreadyExists { project_id: String },
    #[serde(rename_all = "camelCase")]
    Created { project_id: String },
    /// Derivation failed; the lead update itself still stands.
    Failed { reason: String },
}

/// Whether a stage change from `previous` to `current` should derive a project.
pub fn closes_order(previous: LeadStage, current: LeadStage) -> bool {
    previous != LeadStage::OrderClosed && current == LeadStage::OrderClosed
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Build the project record for a won lead.
///
/// `quotation_id` is the id the project is filed under: the quotation's id
/// when one exists, otherwise the lead's own id.
pub fn project_from_lead(
    lead: &Lead,
    quotation: Option<&Quotation>,
    quotation_id: &str,
    now: DateTime<Utc>,
) -> Project {
    let today = now.date_naive();
    let company = non_empty(&lead.company);
    let assignee = non_empty(&lead.assigned_to);

    let mut details = ProjectDetails {
        sales_person_name: assignee.map(str::to_string),
        order_date: Some(today),
        project_status: ProjectStatus::Planning,
        ..ProjectDetails::default()
    };

    if let Some(quote) = quotation {
        // Only elevator types that name a lift technology carry over
        details.lift_type = LiftType::parse(quote.elevator_type.trim());
        details.number_of_lifts = Some(1);
        details.capacity = Some(format!("{} kg", quote.capacity));
        details.number_of_stops = Some(quote.floors);
        details.speed = Some(format!("{} m/s", quote.speed));
        details.order_value = Some(quote.total_amount as f64);
        details.payment_status = ProjectPaymentStatus::Pending;
    }

    let stage = ProjectStage::FirstTechnicalVisit;
    Project {
        id: new_id(),
        project_name: format!("{} - Elevator Installation", company.unwrap_or(&lead.name)),
        customer_name: lead.name.clone(),
        quotation_id: quotation_id.to_string(),
        location: company.unwrap_or("To be confirmed").to_string(),
        elevator_type: quotation
            .and_then(|q| non_empty(&q.elevator_type))
            .unwrap_or("Passenger Elevator")
            .to_string(),
        current_stage: stage,
        start_date: today,
        expected_completion: today + Duration::days(DEFAULT_PROJECT_DAYS),
        progress: stage.progress(),
        assigned_engineer: assignee.unwrap_or("To be assigned").to_string(),
        status: ProjectHealth::OnTrack,
        details,
        created_at: now,
        updated_at: now,
    }
}

fn derive_project(db: &CrmDb, lead: &Lead) -> Result<ProjectDerivation, ServiceError> {
    let quotation = db.latest_quotation_for_lead(&lead.id)?;
    let quotation_id = quotation
        .as_ref()
        .map(|q| q.id.clone())
        .unwrap_or_else(|| lead.id.clone());

    db.with_transaction(|tx| {
        if let Some(existing) = tx.find_project_for_customer_or_quotation(&lead.name, &quotation_id)? {
            log::info!(
                "Project {} already exists for lead \"{}\"; skipping creation",
                existing.id,
                lead.name
            );
            return Ok(ProjectDerivation::AlreadyExists {
                project_id: existing.id,
            });
        }

        let project = project_from_lead(lead, quotation.as_ref(), &quotation_id, Utc::now());
        tx.insert_project(&project)?;
        notify(
            tx,
            None,
            format!("Project \"{}\" created for {}", project.project_name, lead.name),
            NotificationType::Project,
            Some(&project.id),
        )?;
        log::info!(
            "Created project {} from lead \"{}\" (quotation {})",
            project.id,
            lead.name,
            quotation_id
        );
        Ok(ProjectDerivation::Created {
            project_id: project.id,
        })
    })
}

/// React to a persisted lead update. Never fails: errors are logged and
/// reported as [`ProjectDerivation::Failed`].
pub fn on_lead_updated(db: &CrmDb, previous: LeadStage, lead: &Lead) -> ProjectDerivation {
    if !closes_order(previous, lead.stage) {
        return ProjectDerivation::NotTriggered;
    }
    log::info!("Lead \"{}\" moved to Order Closed; deriving project", lead.name);
    match derive_project(db, lead) {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!(
                "Failed to create project from lead \"{}\": {}. The lead update was kept.",
                lead.name,
                e
            );
            ProjectDerivation::Failed {
                reason: e.to_string(),
            }
        }
    }
}
