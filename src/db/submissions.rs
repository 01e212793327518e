//! Contact messages and demo requests from the public website.

use rusqlite::params;

use super::*;
use crate::types::{ContactMessage, DemoRequest};
use crate::util::timestamp;

impl CrmDb {
    // =========================================================================
    // Contact messages
    // =========================================================================

    pub fn insert_contact(&self, contact: &ContactMessage) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO contacts (id, status, doc, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                contact.id,
                contact.status.as_str(),
                encode(contact)?,
                timestamp(&contact.created_at),
                timestamp(&contact.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_contact(&self, id: &str) -> Result<Option<ContactMessage>, DbError> {
        self.query_doc("SELECT doc FROM contacts WHERE id = ?1", params![id])
    }

    pub fn list_contacts(&self) -> Result<Vec<ContactMessage>, DbError> {
        self.query_docs(
            "SELECT doc FROM contacts ORDER BY created_at DESC, rowid DESC",
            [],
        )
    }

    pub fn update_contact(&self, contact: &ContactMessage) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "UPDATE contacts SET status = ?2, doc = ?3, updated_at = ?4 WHERE id = ?1",
            params![
                contact.id,
                contact.status.as_str(),
                encode(contact)?,
                timestamp(&contact.updated_at),
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_contact(&self, id: &str) -> Result<bool, DbError> {
        let changed = self
            .conn
            .execute("DELETE FROM contacts WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    pub fn contact_status_counts(&self) -> Result<StatusCounts, DbError> {
        self.status_counts("contacts")
    }

    // =========================================================================
    // Demo requests
    // =========================================================================

    pub fn insert_demo(&self, demo: &DemoRequest) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO demos (id, status, doc, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                demo.id,
                demo.status.as_str(),
                encode(demo)?,
                timestamp(&demo.created_at),
                timestamp(&demo.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_demo(&self, id: &str) -> Result<Option<DemoRequest>, DbError> {
        self.query_doc("SELECT doc FROM demos WHERE id = ?1", params![id])
    }

    pub fn list_demos(&self) -> Result<Vec<DemoRequest>, DbError> {
        self.query_docs(
            "SELECT doc FROM demos ORDER BY created_at DESC, rowid DESC",
            [],
        )
    }

    pub fn update_demo(&self, demo: &DemoRequest) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "UPDATE demos SET status = ?2, doc = ?3, updated_at = ?4 WHERE id = ?1",
            params![
                demo.id,
                demo.status.as_str(),
                encode(demo)?,
                timestamp(&demo.updated_at),
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_demo(&self, id: &str) -> Result<bool, DbError> {
        let changed = self
            .conn
            .execute("DELETE FROM demos WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    pub fn demo_status_counts(&self) -> Result<StatusCounts, DbError> {
        self.status_counts("demos")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use crate::types::{ContactStatus, DemoStatus};
    use chrono::{TimeZone, Utc};

    fn contact(id: &str, status: ContactStatus) -> ContactMessage {
        let at = Utc.with_ymd_and_hms(2025, 1, 5, 10, 0, 0).unwrap();
        ContactMessage {
            id: id.to_string(),
            name: "Meera".into(),
            email: "meera@example.com".into(),
            phone: "9000000000".into(),
            subject: "Home lift".into(),
            message: "Please call back".into(),
            status,
            created_at: at,
            updated_at: at,
        }
    }

    fn demo(id: &str, status: DemoStatus) -> DemoRequest {
        let at = Utc.with_ymd_and_hms(2025, 1, 5, 10, 0, 0).unwrap();
        DemoRequest {
            id: id.to_string(),
            name: "Arjun".into(),
            email: "arjun@example.com".into(),
            phone: "9000000001".into(),
            company: String::new(),
            elevator_type: "Home Lift".into(),
            message: String::new(),
            status,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_contact_lifecycle_and_counts() {
        let db = test_db();
        db.insert_contact(&contact("c1", ContactStatus::New)).unwrap();
        db.insert_contact(&contact("c2", ContactStatus::New)).unwrap();

        let mut read = db.get_contact("c1").unwrap().unwrap();
        read.status = ContactStatus::Read;
        assert!(db.update_contact(&read).unwrap());

        let counts = db.contact_status_counts().unwrap();
        assert_eq!(counts.get("New"), 1);
        assert_eq!(counts.get("Read"), 1);
        assert_eq!(counts.get("Replied"), 0);
        assert_eq!(counts.total(), 2);

        assert!(db.delete_contact("c2").unwrap());
        assert_eq!(db.list_contacts().unwrap().len(), 1);
    }

    #[test]
    fn test_demo_lifecycle_and_counts() {
        let db = test_db();
        db.insert_demo(&demo("d1", DemoStatus::Pending)).unwrap();
        db.insert_demo(&demo("d2", DemoStatus::Completed)).unwrap();

        let counts = db.demo_status_counts().unwrap();
        assert_eq!(counts.get("Pending"), 1);
        assert_eq!(counts.get("Completed"), 1);

        let mut contacted = db.get_demo("d1").unwrap().unwrap();
        contacted.status = DemoStatus::Contacted;
        assert!(db.update_demo(&contacted).unwrap());
        assert_eq!(db.demo_status_counts().unwrap().get("Contacted"), 1);

        assert!(db.delete_demo("d1").unwrap());
        assert!(db.get_demo("d1").unwrap().is_none());
    }
}
