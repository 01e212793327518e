use rusqlite::params;

use super::*;
use crate::types::{Lead, LeadStage};
use crate::util::timestamp;

impl CrmDb {
    pub fn insert_lead(&self, lead: &Lead) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO leads (id, name, stage, doc, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                lead.id,
                lead.name,
                lead.stage.as_str(),
                encode(lead)?,
                timestamp(&lead.created_at),
                timestamp(&lead.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_lead(&self, id: &str) -> Result<Option<Lead>, DbError> {
        self.query_doc("SELECT doc FROM leads WHERE id = ?1", params![id])
    }

    /// All leads, newest first.
    pub fn list_leads(&self) -> Result<Vec<Lead>, DbError> {
        self.query_docs(
            "SELECT doc FROM leads ORDER BY created_at DESC, rowid DESC",
            [],
        )
    }

    /// Replace the stored lead. Returns false when no row matched.
    pub fn update_lead(&self, lead: &Lead) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "UPDATE leads SET name = ?2, stage = ?3, doc = ?4, updated_at = ?5 WHERE id = ?1",
            params![
                lead.id,
                lead.name,
                lead.stage.as_str(),
                encode(lead)?,
                timestamp(&lead.updated_at),
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_lead(&self, id: &str) -> Result<bool, DbError> {
        let changed = self
            .conn
            .execute("DELETE FROM leads WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    pub fn count_leads(&self) -> Result<i64, DbError> {
        self.count("SELECT COUNT(*) FROM leads", [])
    }

    /// Sum of `value` across leads in the given stage.
    pub fn sum_lead_value_for_stage(&self, stage: LeadStage) -> Result<f64, DbError> {
        Ok(self.conn.query_row(
            "SELECT COALESCE(SUM(json_extract(doc, '$.value')), 0.0) FROM leads WHERE stage = ?1",
            params![stage.as_str()],
            |row| row.get(0),
        )?)
    }
}

#[cfg(test)]
pub(crate) fn sample_lead(id: &str, name: &str) -> Lead {
    use chrono::{Duration, TimeZone, Utc};

    // Distinct creation times keep ordering deterministic across inserts
    let offset = id.bytes().map(i64::from).sum::<i64>();
    let created = Utc.with_ymd_and_hms(2025, 1, 5, 10, 0, 0).unwrap() + Duration::seconds(offset);
    Lead {
        id: id.to_string(),
        lead_id: None,
        name: name.to_string(),
        company: String::new(),
        email: format!("{}@example.com", id),
        phone: "9876543210".into(),
        source: "Website".into(),
        stage: LeadStage::NewLead,
        value: 0.0,
        assigned_to: "Asha".into(),
        last_contact: created.date_naive(),
        notes: String::new(),
        contact_report: None,
        created_at: created,
        updated_at: created,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use chrono::Duration;

    #[test]
    fn test_insert_get_update_delete() {
        let db = test_db();
        let mut lead = sample_lead("l1", "Ravi Kumar");
        db.insert_lead(&lead).unwrap();

        let fetched = db.get_lead("l1").unwrap().expect("lead should exist");
        assert_eq!(fetched.name, "Ravi Kumar");
        assert_eq!(fetched.stage, LeadStage::NewLead);

        lead.stage = LeadStage::QuotationSent;
        assert!(db.update_lead(&lead).unwrap());
        assert_eq!(
            db.get_lead("l1").unwrap().unwrap().stage,
            LeadStage::QuotationSent
        );

        assert!(db.delete_lead("l1").unwrap());
        assert!(db.get_lead("l1").unwrap().is_none());
        assert!(!db.delete_lead("l1").unwrap());
    }

    #[test]
    fn test_update_missing_lead_reports_no_change() {
        let db = test_db();
        assert!(!db.update_lead(&sample_lead("ghost", "Nobody")).unwrap());
    }

    #[test]
    fn test_list_newest_first() {
        let db = test_db();
        let mut older = sample_lead("a", "Older");
        older.created_at = older.created_at - Duration::days(1);
        db.insert_lead(&older).unwrap();
        db.insert_lead(&sample_lead("b", "Newer")).unwrap();

        let names: Vec<String> = db.list_leads().unwrap().into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["Newer", "Older"]);
        assert_eq!(db.count_leads().unwrap(), 2);
    }

    #[test]
    fn test_sum_value_for_stage() {
        let db = test_db();
        let mut won = sample_lead("w1", "Won");
        won.stage = LeadStage::OrderClosed;
        won.value = 150_000.0;
        db.insert_lead(&won).unwrap();

        let mut open = sample_lead("o1", "Open");
        open.value = 99_000.0;
        db.insert_lead(&open).unwrap();

        assert_eq!(
            db.sum_lead_value_for_stage(LeadStage::OrderClosed).unwrap(),
            150_000.0
        );
        assert_eq!(db.sum_lead_value_for_stage(LeadStage::OrderLost).unwrap(), 0.0);
    }
}
