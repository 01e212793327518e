use rusqlite::params;

use super::*;
use crate::types::{Project, ProjectHealth};
use crate::util::timestamp;

impl CrmDb {
    pub fn insert_project(&self, project: &Project) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO projects (id, customer_name, quotation_id, status, doc, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                project.id,
                project.customer_name,
                project.quotation_id,
                project.status.as_str(),
                encode(project)?,
                timestamp(&project.created_at),
                timestamp(&project.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_project(&self, id: &str) -> Result<Option<Project>, DbError> {
        self.query_doc("SELECT doc FROM projects WHERE id = ?1", params![id])
    }

    /// All projects, newest first.
    pub fn list_projects(&self) -> Result<Vec<Project>, DbError> {
        self.query_docs(
            "SELECT doc FROM projects ORDER BY created_at DESC, rowid DESC",
            [],
        )
    }

    pub fn update_project(&self, project: &Project) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "UPDATE projects
             SET customer_name = ?2, quotation_id = ?3, status = ?4, doc = ?5, updated_at = ?6
             WHERE id = ?1",
            params![
                project.id,
                project.customer_name,
                project.quotation_id,
                project.status.as_str(),
                encode(project)?,
                timestamp(&project.updated_at),
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_project(&self, id: &str) -> Result<bool, DbError> {
        let changed = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// A project already created for this customer or from this quotation.
    pub fn find_project_for_customer_or_quotation(
        &self,
        customer_name: &str,
        quotation_id: &str,
    ) -> Result<Option<Project>, DbError> {
        self.query_doc(
            "SELECT doc FROM projects WHERE customer_name = ?1 OR quotation_id = ?2
             ORDER BY created_at DESC, rowid DESC LIMIT 1",
            params![customer_name, quotation_id],
        )
    }

    pub fn count_projects_with_status(&self, status: ProjectHealth) -> Result<i64, DbError> {
        self.count(
            "SELECT COUNT(*) FROM projects WHERE status = ?1",
            params![status.as_str()],
        )
    }
}

#[cfg(test)]
pub(crate) fn sample_project(id: &str, customer: &str, quotation_id: &str) -> Project {
    use chrono::{NaiveDate, TimeZone, Utc};

    use crate::types::{ProjectDetails, ProjectStage};

    let created = Utc.with_ymd_and_hms(2025, 1, 5, 10, 0, 0).unwrap();
    Project {
        id: id.to_string(),
        project_name: format!("{} - Elevator Installation", customer),
        customer_name: customer.to_string(),
        quotation_id: quotation_id.to_string(),
        location: "Hyderabad".into(),
        elevator_type: "Passenger Elevator".into(),
        current_stage: ProjectStage::FirstTechnicalVisit,
        start_date: NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
        expected_completion: NaiveDate::from_ymd_opt(2025, 4, 5).unwrap(),
        progress: ProjectStage::FirstTechnicalVisit.progress(),
        assigned_engineer: "Kiran".into(),
        status: ProjectHealth::OnTrack,
        details: ProjectDetails::default(),
        created_at: created,
        updated_at: created,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use crate::types::ProjectStage;

    #[test]
    fn test_insert_update_delete() {
        let db = test_db();
        let mut project = sample_project("p1", "Ravi Kumar", "q1");
        db.insert_project(&project).unwrap();

        project.current_stage = ProjectStage::MovedToFactory;
        project.progress = project.current_stage.progress();
        project.status = ProjectHealth::Delayed;
        assert!(db.update_project(&project).unwrap());

        let stored = db.get_project("p1").unwrap().unwrap();
        assert_eq!(stored.current_stage, ProjectStage::MovedToFactory);
        assert_eq!(stored.progress, 56);
        assert_eq!(db.count_projects_with_status(ProjectHealth::Delayed).unwrap(), 1);
        assert_eq!(db.count_projects_with_status(ProjectHealth::OnTrack).unwrap(), 0);

        assert!(db.delete_project("p1").unwrap());
        assert!(db.list_projects().unwrap().is_empty());
    }

    #[test]
    fn test_find_by_customer_or_quotation() {
        let db = test_db();
        db.insert_project(&sample_project("p1", "Ravi Kumar", "q1")).unwrap();

        assert!(db
            .find_project_for_customer_or_quotation("Ravi Kumar", "unrelated")
            .unwrap()
            .is_some());
        assert!(db
            .find_project_for_customer_or_quotation("Someone Else", "q1")
            .unwrap()
            .is_some());
        assert!(db
            .find_project_for_customer_or_quotation("Someone Else", "q2")
            .unwrap()
            .is_none());
    }
}
