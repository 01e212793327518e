use rusqlite::params;

use super::*;
use crate::types::{Quotation, QuotationStatus};
use crate::util::timestamp;

impl CrmDb {
    pub fn insert_quotation(&self, quote: &Quotation) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO quotations (id, lead_id, status, doc, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                quote.id,
                quote.lead_id,
                quote.status.as_str(),
                encode(quote)?,
                timestamp(&quote.created_at),
                timestamp(&quote.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_quotation(&self, id: &str) -> Result<Option<Quotation>, DbError> {
        self.query_doc("SELECT doc FROM quotations WHERE id = ?1", params![id])
    }

    /// All quotations, newest first.
    pub fn list_quotations(&self) -> Result<Vec<Quotation>, DbError> {
        self.query_docs(
            "SELECT doc FROM quotations ORDER BY created_at DESC, rowid DESC",
            [],
        )
    }

    pub fn update_quotation(&self, quote: &Quotation) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "UPDATE quotations SET lead_id = ?2, status = ?3, doc = ?4, updated_at = ?5
             WHERE id = ?1",
            params![
                quote.id,
                quote.lead_id,
                quote.status.as_str(),
                encode(quote)?,
                timestamp(&quote.updated_at),
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_quotation(&self, id: &str) -> Result<bool, DbError> {
        let changed = self
            .conn
            .execute("DELETE FROM quotations WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// Most recently created quotation raised against a lead.
    pub fn latest_quotation_for_lead(&self, lead_id: &str) -> Result<Option<Quotation>, DbError> {
        self.query_doc(
            "SELECT doc FROM quotations WHERE lead_id = ?1
             ORDER BY created_at DESC, rowid DESC LIMIT 1",
            params![lead_id],
        )
    }

    /// Sum of `totalAmount` across quotations in the given status.
    pub fn sum_quotation_total_for_status(&self, status: QuotationStatus) -> Result<i64, DbError> {
        Ok(self.conn.query_row(
            "SELECT CAST(COALESCE(SUM(json_extract(doc, '$.totalAmount')), 0) AS INTEGER)
             FROM quotations WHERE status = ?1",
            params![status.as_str()],
            |row| row.get(0),
        )?)
    }
}
