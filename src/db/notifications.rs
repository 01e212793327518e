use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use super::*;
use crate::types::{Notification, NotificationType};
use crate::util::timestamp;

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, message, type, related_id, read, created_at, updated_at";

fn parse_stamp(index: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                index,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

impl CrmDb {
    fn map_notification_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Notification> {
        let kind: String = row.get(3)?;
        let created_at: String = row.get(6)?;
        let updated_at: String = row.get(7)?;
        Ok(Notification {
            id: row.get(0)?,
            user_id: row.get(1)?,
            message: row.get(2)?,
            notification_type: kind.parse().unwrap_or_default(),
            related_id: row.get(4)?,
            read: row.get::<_, i32>(5)? != 0,
            created_at: parse_stamp(6, &created_at)?,
            updated_at: parse_stamp(7, &updated_at)?,
        })
    }

    pub fn insert_notification(&self, notification: &Notification) -> Result<(), DbError> {
        self.conn.execute(
            &format!(
                "INSERT INTO notifications ({NOTIFICATION_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
            ),
            params![
                notification.id,
                notification.user_id,
                notification.message,
                notification.notification_type.as_str(),
                notification.related_id,
                notification.read as i32,
                timestamp(&notification.created_at),
                timestamp(&notification.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_notification(&self, id: &str) -> Result<Option<Notification>, DbError> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?1"),
                params![id],
                Self::map_notification_row,
            )
            .optional()?)
    }

    /// Global notifications plus those addressed to `user_id`, newest first.
    pub fn list_notifications_for(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Notification>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications
             WHERE user_id IS NULL OR user_id = ?1
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?2"
        ))?;
        let rows = stmt.query_map(params![user_id, limit as i64], Self::map_notification_row)?;
        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    /// Unread notifications visible to `user_id`, newest first.
    pub fn list_unread_notifications_for(&self, user_id: &str) -> Result<Vec<Notification>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications
             WHERE (user_id IS NULL OR user_id = ?1) AND read = 0
             ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt.query_map(params![user_id], Self::map_notification_row)?;
        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    pub fn mark_notification_read(&self, id: &str) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "UPDATE notifications SET read = 1, updated_at = ?2 WHERE id = ?1",
            params![id, timestamp(&Utc::now())],
        )?;
        Ok(changed > 0)
    }

    /// Mark everything visible to `user_id` as read. Returns the rows touched.
    pub fn mark_all_notifications_read(&self, user_id: &str) -> Result<usize, DbError> {
        Ok(self.conn.execute(
            "UPDATE notifications SET read = 1, updated_at = ?2
             WHERE (user_id IS NULL OR user_id = ?1) AND read = 0",
            params![user_id, timestamp(&Utc::now())],
        )?)
    }

    pub fn delete_notification(&self, id: &str) -> Result<bool, DbError> {
        let changed = self
            .conn
            .execute("DELETE FROM notifications WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// Remove notifications pointing at a record that is being deleted.
    pub fn delete_notifications_for(
        &self,
        kind: NotificationType,
        related_id: &str,
    ) -> Result<usize, DbError> {
        Ok(self.conn.execute(
            "DELETE FROM notifications WHERE type = ?1 AND related_id = ?2",
            params![kind.as_str(), related_id],
        )?)
    }
}

#[cfg(test)]
pub(crate) fn sample_notification(
    id: &str,
    user_id: Option<&str>,
    kind: NotificationType,
    related_id: Option<&str>,
    minute: u32,
) -> Notification {
    use chrono::TimeZone;

    let created = Utc.with_ymd_and_hms(2025, 1, 5, 10, minute, 0).unwrap();
    Notification {
        id: id.to_string(),
        user_id: user_id.map(str::to_string),
        message: format!("Notification {}", id),
        notification_type: kind,
        related_id: related_id.map(str::to_string),
        read: false,
        created_at: created,
        updated_at: created,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    #[test]
    fn test_list_includes_global_and_own_only() {
        let db = test_db();
        db.insert_notification(&sample_notification("g", None, NotificationType::System, None, 1))
            .unwrap();
        db.insert_notification(&sample_notification(
            "mine",
            Some("u1"),
            NotificationType::Lead,
            None,
            2,
        ))
        .unwrap();
        db.insert_notification(&sample_notification(
            "theirs",
            Some("u2"),
            NotificationType::Lead,
            None,
            3,
        ))
        .unwrap();

        let ids: Vec<String> = db
            .list_notifications_for("u1", 50)
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec!["mine", "g"]);
        assert_eq!(db.list_notifications_for("u1", 1).unwrap().len(), 1);
    }

    #[test]
    fn test_unread_counts_and_mark_read() {
        let db = test_db();
        db.insert_notification(&sample_notification("a", None, NotificationType::Demo, None, 1))
            .unwrap();
        db.insert_notification(&sample_notification("b", Some("u1"), NotificationType::Amc, None, 2))
            .unwrap();
        db.insert_notification(&sample_notification("c", Some("u2"), NotificationType::Amc, None, 3))
            .unwrap();

        assert_eq!(db.list_unread_notifications_for("u1").unwrap().len(), 2);
        assert!(db.mark_notification_read("a").unwrap());
        assert!(db.get_notification("a").unwrap().unwrap().read);
        assert_eq!(db.list_unread_notifications_for("u1").unwrap().len(), 1);

        assert_eq!(db.mark_all_notifications_read("u1").unwrap(), 1);
        assert_eq!(db.list_unread_notifications_for("u1").unwrap().len(), 0);
        assert_eq!(db.list_unread_notifications_for("u2").unwrap().len(), 1);
    }

    #[test]
    fn test_delete_for_related_record() {
        let db = test_db();
        db.insert_notification(&sample_notification(
            "n1",
            None,
            NotificationType::Contact,
            Some("c1"),
            1,
        ))
        .unwrap();
        db.insert_notification(&sample_notification(
            "n2",
            None,
            NotificationType::Demo,
            Some("c1"),
            2,
        ))
        .unwrap();

        assert_eq!(
            db.delete_notifications_for(NotificationType::Contact, "c1").unwrap(),
            1
        );
        assert!(db.get_notification("n1").unwrap().is_none());
        assert!(db.get_notification("n2").unwrap().is_some());
    }
}
