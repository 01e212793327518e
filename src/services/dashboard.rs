//! Headline numbers for the CRM dashboard.

use serde::Serialize;

use super::ServiceResult;
use crate::db::CrmDb;
use crate::types::{AmcStatus, LeadStage, ProjectHealth, QuotationStatus};

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_leads: i64,
    /// Projects currently On Track.
    pub active_projects: i64,
    /// Active AMC contracts.
    pub amc_contracts: i64,
    /// Closed lead value plus approved quotation totals.
    pub revenue: f64,
}

pub fn stats(db: &CrmDb) -> ServiceResult<DashboardStats> {
    let closed = db.sum_lead_value_for_stage(LeadStage::OrderClosed)?;
    let approved = db.sum_quotation_total_for_status(QuotationStatus::Approved)?;
    Ok(DashboardStats {
        total_leads: db.count_leads()?,
        active_projects: db.count_projects_with_status(ProjectHealth::OnTrack)?,
        amc_contracts: db.count_amc_with_status(AmcStatus::Active)?,
        revenue: closed + approved as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::leads::sample_lead;
    use crate::db::projects::sample_project;
    use crate::db::test_db;
    use crate::services::quotations;
    use serde_json::json;

    #[test]
    fn test_empty_store() {
        let db = test_db();
        assert_eq!(
            stats(&db).unwrap(),
            DashboardStats {
                total_leads: 0,
                active_projects: 0,
                amc_contracts: 0,
                revenue: 0.0
            }
        );
    }

    #[test]
    fn test_revenue_combines_closed_leads_and_approved_quotes() {
        let db = test_db();
        let mut won = sample_lead("l1", "Ravi");
        won.stage = LeadStage::OrderClosed;
        won.value = 250_000.0;
        db.insert_lead(&won).unwrap();
        db.insert_lead(&sample_lead("l2", "Meera")).unwrap();
        db.insert_project(&sample_project("p1", "Ravi", "q1")).unwrap();

        let quote = quotations::create(
            &db,
            &json!({
                "leadId": "l1",
                "leadName": "Ravi",
                "elevatorType": "MRL",
                "floors": 4,
                "capacity": 450,
                "speed": 1
            }),
        )
        .unwrap();
        quotations::update(&db, &quote.id, &json!({ "status": "Approved" })).unwrap();

        let stats = stats(&db).unwrap();
        assert_eq!(stats.total_leads, 2);
        assert_eq!(stats.active_projects, 1);
        assert_eq!(stats.revenue, 250_000.0 + 1_699_200.0);
    }
}
