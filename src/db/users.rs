use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension};

use super::*;
use crate::permissions::{Permission, Role};
use crate::types::{User, UserStatus};
use crate::util::timestamp;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, permissions, status, last_login, created_at, updated_at";

fn conversion_error(index: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        index,
        rusqlite::types::Type::Text,
        message.into(),
    )
}

fn parse_stamp(index: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(index, e.to_string()))
}

impl CrmDb {
    /// Helper: map a row to `User`.
    fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
        let role_raw: String = row.get(4)?;
        let role =
            Role::parse(&role_raw).ok_or_else(|| conversion_error(4, format!("unknown role {role_raw}")))?;

        let permissions_raw: String = row.get(5)?;
        let names: Vec<String> = serde_json::from_str(&permissions_raw)
            .map_err(|e| conversion_error(5, e.to_string()))?;
        // Unknown names from older data are dropped rather than failing the row
        let permissions = names.iter().filter_map(|n| Permission::parse(n)).collect();

        let status_raw: String = row.get(6)?;
        let status = UserStatus::parse(&status_raw).unwrap_or_default();

        let last_login: Option<String> = row.get(7)?;
        let created_at: String = row.get(8)?;
        let updated_at: String = row.get(9)?;

        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            role,
            permissions,
            status,
            last_login: last_login.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
            created_at: parse_stamp(8, &created_at)?,
            updated_at: parse_stamp(9, &updated_at)?,
        })
    }

    fn permissions_json(user: &User) -> Result<String, DbError> {
        let names: Vec<&str> = user.permissions.iter().map(|p| p.as_str()).collect();
        Ok(serde_json::to_string(&names)?)
    }

    /// Insert a user. A duplicate email surfaces as a UNIQUE violation
    /// (see [`DbError::is_unique_violation`]).
    pub fn insert_user(&self, user: &User) -> Result<(), DbError> {
        self.conn.execute(
            &format!("INSERT INTO users ({USER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
            params![
                user.id,
                user.name,
                user.email,
                user.password_hash,
                user.role.as_str(),
                Self::permissions_json(user)?,
                user.status.as_str(),
                user.last_login.map(|d| d.format("%Y-%m-%d").to_string()),
                timestamp(&user.created_at),
                timestamp(&user.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_user(&self, id: &str) -> Result<Option<User>, DbError> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                Self::map_user_row,
            )
            .optional()?)
    }

    /// Look a user up by (already normalised) email.
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
                Self::map_user_row,
            )
            .optional()?)
    }

    fn query_users<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<User>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, Self::map_user_row)?;
        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }

    /// All users, newest first.
    pub fn list_users(&self) -> Result<Vec<User>, DbError> {
        self.query_users(
            &format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, rowid DESC"),
            [],
        )
    }

    pub fn list_users_with_status(&self, status: UserStatus) -> Result<Vec<User>, DbError> {
        self.query_users(
            &format!(
                "SELECT {USER_COLUMNS} FROM users WHERE status = ?1
                 ORDER BY created_at DESC, rowid DESC"
            ),
            params![status.as_str()],
        )
    }

    /// Persist every mutable column of a user.
    pub fn update_user(&self, user: &User) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "UPDATE users SET name = ?2, email = ?3, password_hash = ?4, role = ?5,
                 permissions = ?6, status = ?7, last_login = ?8, updated_at = ?9
             WHERE id = ?1",
            params![
                user.id,
                user.name,
                user.email,
                user.password_hash,
                user.role.as_str(),
                Self::permissions_json(user)?,
                user.status.as_str(),
                user.last_login.map(|d| d.format("%Y-%m-%d").to_string()),
                timestamp(&user.updated_at),
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_user(&self, id: &str) -> Result<bool, DbError> {
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    pub fn count_users(&self) -> Result<i64, DbError> {
        self.count("SELECT COUNT(*) FROM users", [])
    }
}

#[cfg(test)]
pub(crate) fn sample_user(id: &str, email: &str, role: Role, status: UserStatus) -> User {
    use chrono::TimeZone;

    let created = Utc.with_ymd_and_hms(2025, 1, 5, 10, 0, 0).unwrap();
    User {
        id: id.to_string(),
        name: format!("User {}", id),
        email: email.to_string(),
        password_hash: "salt$digest".into(),
        role,
        permissions: crate::permissions::default_permissions(role),
        status,
        last_login: None,
        created_at: created,
        updated_at: created,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    #[test]
    fn test_insert_and_lookup_by_email() {
        let db = test_db();
        let user = sample_user("u1", "asha@kas.test", Role::SalesExecutive, UserStatus::Active);
        db.insert_user(&user).unwrap();

        let found = db.find_user_by_email("asha@kas.test").unwrap().unwrap();
        assert_eq!(found.id, "u1");
        assert_eq!(found.password_hash, "salt$digest");
        assert_eq!(found.role, Role::SalesExecutive);
        assert!(found.permissions.contains(&Permission::LeadsCreate));
        assert!(db.find_user_by_email("nobody@kas.test").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_email_is_unique_violation() {
        let db = test_db();
        db.insert_user(&sample_user("u1", "dup@kas.test", Role::Admin, UserStatus::Active))
            .unwrap();
        let err = db
            .insert_user(&sample_user("u2", "dup@kas.test", Role::Manager, UserStatus::Pending))
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[test]
    fn test_update_and_status_filter() {
        let db = test_db();
        let mut pending = sample_user("u1", "new@kas.test", Role::Technician, UserStatus::Pending);
        db.insert_user(&pending).unwrap();
        db.insert_user(&sample_user("u2", "old@kas.test", Role::Admin, UserStatus::Active))
            .unwrap();

        assert_eq!(db.list_users_with_status(UserStatus::Pending).unwrap().len(), 1);

        pending.status = UserStatus::Active;
        pending.last_login = NaiveDate::from_ymd_opt(2025, 3, 1);
        assert!(db.update_user(&pending).unwrap());

        let stored = db.get_user("u1").unwrap().unwrap();
        assert_eq!(stored.status, UserStatus::Active);
        assert_eq!(stored.last_login, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert!(db.list_users_with_status(UserStatus::Pending).unwrap().is_empty());
        assert_eq!(db.count_users().unwrap(), 2);

        assert!(db.delete_user("u1").unwrap());
        assert_eq!(db.list_users().unwrap().len(), 1);
    }
}
