//! Default staff accounts for a fresh install.

use chrono::Utc;

use super::auth::hash_password;
use super::ServiceResult;
use crate::db::CrmDb;
use crate::permissions::{default_permissions, Role};
use crate::types::{User, UserStatus};
use crate::util::new_id;

const DEFAULT_USERS: [(&str, &str, &str, Role); 5] = [
    ("Admin User", "admin@kas.com", "admin123", Role::Admin),
    ("Sales Executive 1", "sales1@kas.com", "sales123", Role::SalesExecutive),
    ("Sales Executive 2", "sales2@kas.com", "sales123", Role::SalesExecutive),
    ("Engineer 1", "engineer1@kas.com", "engineer123", Role::ServiceEngineer),
    ("Project Manager 1", "pm1@kas.com", "pm123", Role::ProjectManager),
];

/// Create any default account whose email is not registered yet.
/// Returns how many accounts were added. The stock passwords predate the
/// signup length rule, so accounts are written straight to the store.
pub fn seed_default_users(db: &CrmDb) -> ServiceResult<usize> {
    let mut created = 0;
    for (name, email, password, role) in DEFAULT_USERS {
        if db.find_user_by_email(email)?.is_some() {
            log::debug!("Seed user {} already present", email);
            continue;
        }
        let now = Utc::now();
        db.insert_user(&User {
            id: new_id(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password),
            role,
            permissions: default_permissions(role),
            status: UserStatus::Active,
            last_login: None,
            created_at: now,
            updated_at: now,
        })?;
        created += 1;
    }
    if created > 0 {
        log::info!("Seeded {} default user(s)", created);
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use crate::permissions::Permission;
    use crate::services::auth::{login, LoginRequest};

    #[test]
    fn test_seed_is_idempotent() {
        let db = test_db();
        assert_eq!(seed_default_users(&db).unwrap(), 5);
        assert_eq!(seed_default_users(&db).unwrap(), 0);
        assert_eq!(db.count_users().unwrap(), 5);

        let admin = db.find_user_by_email("admin@kas.com").unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.permissions.len(), Permission::ALL.len());
        let engineer = db.find_user_by_email("engineer1@kas.com").unwrap().unwrap();
        assert!(engineer.permissions.contains(&Permission::AmcUpdate));
    }

    #[test]
    fn test_seeded_account_can_log_in() {
        let db = test_db();
        seed_default_users(&db).unwrap();
        let response = login(
            &db,
            LoginRequest {
                email: Some("PM1@kas.com".into()),
                password: Some("pm123".into()),
            },
        )
        .unwrap();
        assert_eq!(response.user.email, "pm1@kas.com");
    }
}
