use rusqlite::params;

use super::*;
use crate::types::{AmcContract, AmcStatus};
use crate::util::timestamp;

impl CrmDb {
    pub fn insert_amc(&self, contract: &AmcContract) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO amc_contracts (id, status, doc, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                contract.id,
                contract.status.as_str(),
                encode(contract)?,
                timestamp(&contract.created_at),
                timestamp(&contract.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_amc(&self, id: &str) -> Result<Option<AmcContract>, DbError> {
        self.query_doc("SELECT doc FROM amc_contracts WHERE id = ?1", params![id])
    }

    /// All contracts, newest first.
    pub fn list_amc(&self) -> Result<Vec<AmcContract>, DbError> {
        self.query_docs(
            "SELECT doc FROM amc_contracts ORDER BY created_at DESC, rowid DESC",
            [],
        )
    }

    pub fn update_amc(&self, contract: &AmcContract) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "UPDATE amc_contracts SET status = ?2, doc = ?3, updated_at = ?4 WHERE id = ?1",
            params![
                contract.id,
                contract.status.as_str(),
                encode(contract)?,
                timestamp(&contract.updated_at),
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_amc(&self, id: &str) -> Result<bool, DbError> {
        let changed = self
            .conn
            .execute("DELETE FROM amc_contracts WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    pub fn count_amc_with_status(&self, status: AmcStatus) -> Result<i64, DbError> {
        self.count(
            "SELECT COUNT(*) FROM amc_contracts WHERE status = ?1",
            params![status.as_str()],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use serde_json::json;

    fn contract(id: &str, status: &str) -> AmcContract {
        serde_json::from_value(json!({
            "id": id,
            "customerName": "Ravi Kumar",
            "projectName": "Villa Lift",
            "elevatorId": "EL-01",
            "contractStartDate": "2025-01-01",
            "contractEndDate": "2026-01-01",
            "duration": "12",
            "nextServiceDate": "2025-02-01",
            "serviceFrequency": "Monthly",
            "assignedTechnician": "Suresh",
            "status": status,
            "totalValue": "36,000",
            "createdAt": "2025-01-01T09:00:00Z",
            "updatedAt": "2025-01-01T09:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_round_trip_and_status_counts() {
        let db = test_db();
        db.insert_amc(&contract("a1", "Active")).unwrap();
        db.insert_amc(&contract("a2", "Expired")).unwrap();

        let stored = db.get_amc("a1").unwrap().unwrap();
        assert_eq!(stored.total_value, 36_000.0);
        assert_eq!(stored.duration, 12.0);
        assert_eq!(db.count_amc_with_status(AmcStatus::Active).unwrap(), 1);

        let mut renewed = stored;
        renewed.status = AmcStatus::PendingRenewal;
        assert!(db.update_amc(&renewed).unwrap());
        assert_eq!(db.count_amc_with_status(AmcStatus::Active).unwrap(), 0);

        assert!(db.delete_amc("a2").unwrap());
        assert_eq!(db.list_amc().unwrap().len(), 1);
    }
}
