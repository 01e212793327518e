//! Staff account management and signup approval.

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use super::auth::{check_password_length, hash_password, normalize_email};
use super::notifications::clear_related;
use super::{ServiceError, ServiceResult};
use crate::db::CrmDb;
use crate::permissions::{default_permissions, parse_permission_list, Permission, Role};
use crate::types::{NotificationType, User, UserStatus};
use crate::util::{is_valid_id, new_id, today};

fn check_id(id: &str) -> ServiceResult<()> {
    if is_valid_id(id) {
        Ok(())
    } else {
        Err(ServiceError::invalid("Invalid user ID format"))
    }
}

fn load(db: &CrmDb, id: &str) -> ServiceResult<User> {
    check_id(id)?;
    db.get_user(id)?.ok_or(ServiceError::NotFound("User"))
}

fn email_taken(err: crate::db::DbError) -> ServiceError {
    if err.is_unique_violation() {
        ServiceError::invalid("User with this email already exists")
    } else {
        ServiceError::from(err)
    }
}

pub fn list(db: &CrmDb) -> ServiceResult<Vec<User>> {
    Ok(db.list_users()?)
}

pub fn list_pending(db: &CrmDb) -> ServiceResult<Vec<User>> {
    Ok(db.list_users_with_status(UserStatus::Pending)?)
}

pub fn get(db: &CrmDb, id: &str) -> ServiceResult<User> {
    load(db, id)
}

#[derive(Debug, Default, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub status: Option<UserStatus>,
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
}

/// Create an account directly (Active unless told otherwise). Permissions
/// default to the role's set.
pub fn create(db: &CrmDb, input: NewUser) -> ServiceResult<User> {
    let name = input.name.map(|n| n.trim().to_string()).unwrap_or_default();
    let email = input.email.as_deref().map(normalize_email).unwrap_or_default();
    let password = input.password.unwrap_or_default();
    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(ServiceError::invalid("Name, email, and password are required"));
    }
    check_password_length(&password)?;
    if db.find_user_by_email(&email)?.is_some() {
        return Err(ServiceError::invalid("User with this email already exists"));
    }

    let role = input.role.unwrap_or_default();
    let permissions = match input.permissions {
        Some(raw) => validated_permissions(&raw)?,
        None => default_permissions(role),
    };

    let now = Utc::now();
    let user = User {
        id: new_id(),
        name,
        email,
        password_hash: hash_password(&password),
        role,
        permissions,
        status: input.status.unwrap_or(UserStatus::Active),
        last_login: Some(today()),
        created_at: now,
        updated_at: now,
    };
    db.insert_user(&user).map_err(email_taken)?;
    log::info!("Created user {} ({})", user.email, role.as_str());
    Ok(user)
}

#[derive(Debug, Default, Deserialize)]
pub struct UserChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub status: Option<UserStatus>,
}

/// Apply profile changes on behalf of `actor`.
///
/// Only an Admin may change a role, and nobody may change their own.
pub fn update(db: &CrmDb, actor: &User, id: &str, changes: UserChanges) -> ServiceResult<User> {
    let mut user = load(db, id)?;

    if let Some(role) = changes.role.filter(|r| *r != user.role) {
        if actor.role != Role::Admin {
            return Err(ServiceError::Forbidden(
                "Only administrators can change user roles.".into(),
            ));
        }
        if actor.id == user.id {
            return Err(ServiceError::Forbidden(
                "You cannot change your own role. Please contact another administrator.".into(),
            ));
        }
        log::info!(
            "{} changed role of {} from {} to {}",
            actor.email,
            user.email,
            user.role.as_str(),
            role.as_str()
        );
        user.role = role;
    }

    if let Some(name) = changes.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
        user.name = name;
    }
    if let Some(email) = changes
        .email
        .as_deref()
        .map(normalize_email)
        .filter(|e| !e.is_empty())
    {
        user.email = email;
    }
    if let Some(password) = changes.password.filter(|p| !p.is_empty()) {
        check_password_length(&password)?;
        user.password_hash = hash_password(&password);
    }
    if let Some(status) = changes.status {
        user.status = status;
    }

    user.updated_at = Utc::now();
    db.update_user(&user).map_err(email_taken)?;
    Ok(user)
}

fn validated_permissions(raw: &[String]) -> ServiceResult<Vec<Permission>> {
    parse_permission_list(raw).map_err(|invalid| {
        let valid: Vec<&str> = Permission::ALL.iter().map(|p| p.as_str()).collect();
        ServiceError::invalid_with(
            format!("Invalid permissions: {}", invalid.join(", ")),
            format!("Valid permissions: {}", valid.join(", ")),
        )
    })
}

/// Replace a user's permission list. `body` is the raw request body and must
/// carry a `permissions` array of strings.
pub fn set_permissions(db: &CrmDb, id: &str, body: &Value) -> ServiceResult<User> {
    check_id(id)?;
    let raw: Vec<String> = match body.get("permissions") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ServiceError::invalid("Permissions must be an array of strings"))
            })
            .collect::<ServiceResult<_>>()?,
        _ => return Err(ServiceError::invalid("Permissions must be an array")),
    };
    let permissions = validated_permissions(&raw)?;

    let mut user = load(db, id)?;
    user.permissions = permissions;
    user.updated_at = Utc::now();
    db.update_user(&user)?;
    log::info!(
        "Permissions updated for {}: {} granted",
        user.email,
        user.permissions.len()
    );
    Ok(user)
}

/// Activate a Pending signup with its role's default permissions.
pub fn approve(db: &CrmDb, id: &str) -> ServiceResult<User> {
    let mut user = load(db, id)?;
    if user.status != UserStatus::Pending {
        return Err(ServiceError::invalid("User is not pending approval"));
    }
    user.status = UserStatus::Active;
    user.permissions = default_permissions(user.role);
    user.updated_at = Utc::now();
    db.update_user(&user)?;
    clear_related(db, NotificationType::Signup, &user.id);
    log::info!("Approved signup for {}", user.email);
    Ok(user)
}

/// Delete a Pending signup.
pub fn reject(db: &CrmDb, id: &str) -> ServiceResult<()> {
    let user = load(db, id)?;
    if user.status != UserStatus::Pending {
        return Err(ServiceError::invalid("Only pending users can be rejected"));
    }
    clear_related(db, NotificationType::Signup, &user.id);
    db.delete_user(&user.id)?;
    log::info!("Rejected signup for {}", user.email);
    Ok(())
}

pub fn delete(db: &CrmDb, id: &str) -> ServiceResult<()> {
    let user = load(db, id)?;
    if user.role == Role::Admin {
        return Err(ServiceError::Forbidden("Admin users cannot be deleted".into()));
    }
    db.delete_user(&user.id)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use crate::services::auth::{signup, verify_password, SignupRequest};
    use serde_json::json;

    fn new_user(email: &str, role: Option<Role>) -> NewUser {
        NewUser {
            name: Some("Test".into()),
            email: Some(email.into()),
            password: Some("secret1".into()),
            role,
            ..Default::default()
        }
    }

    fn admin(db: &CrmDb) -> User {
        create(db, new_user("admin@kas.test", Some(Role::Admin))).unwrap()
    }

    #[test]
    fn test_create_defaults() {
        let db = test_db();
        let user = create(&db, new_user("Sales@KAS.test", None)).unwrap();
        assert_eq!(user.email, "sales@kas.test");
        assert_eq!(user.role, Role::SalesExecutive);
        assert_eq!(user.status, UserStatus::Active);
        assert_eq!(user.permissions, default_permissions(Role::SalesExecutive));
        assert!(verify_password("secret1", &user.password_hash));

        let dup = create(&db, new_user("sales@kas.test", None));
        assert!(matches!(dup, Err(ServiceError::Validation { .. })));
    }

    #[test]
    fn test_get_rejects_malformed_id() {
        let db = test_db();
        assert!(matches!(get(&db, "nope"), Err(ServiceError::Validation { .. })));
        assert!(matches!(
            get(&db, &new_id()),
            Err(ServiceError::NotFound("User"))
        ));
    }

    #[test]
    fn test_role_change_rules() {
        let db = test_db();
        let admin = admin(&db);
        let sales = create(&db, new_user("s@kas.test", None)).unwrap();

        let by_sales = update(
            &db,
            &sales,
            &sales.id,
            UserChanges {
                role: Some(Role::Admin),
                ..Default::default()
            },
        );
        assert!(matches!(by_sales, Err(ServiceError::Forbidden(_))));

        let own = update(
            &db,
            &admin,
            &admin.id,
            UserChanges {
                role: Some(Role::Manager),
                ..Default::default()
            },
        );
        assert!(matches!(own, Err(ServiceError::Forbidden(_))));

        let promoted = update(
            &db,
            &admin,
            &sales.id,
            UserChanges {
                role: Some(Role::Manager),
                name: Some("Renamed".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(promoted.role, Role::Manager);
        assert_eq!(promoted.name, "Renamed");

        // Sending the current role back is not a change
        let same_role = update(
            &db,
            &promoted,
            &promoted.id,
            UserChanges {
                role: Some(Role::Manager),
                ..Default::default()
            },
        );
        assert!(same_role.is_ok());

        let short = update(
            &db,
            &admin,
            &sales.id,
            UserChanges {
                password: Some("123".into()),
                ..Default::default()
            },
        );
        assert!(matches!(short, Err(ServiceError::Validation { .. })));
    }

    #[test]
    fn test_set_permissions_validates_and_filters_legacy() {
        let db = test_db();
        let user = create(&db, new_user("p@kas.test", Some(Role::Technician))).unwrap();

        let updated = set_permissions(
            &db,
            &user.id,
            &json!({ "permissions": ["leads:view", "form_submissions:update", "amc:view"] }),
        )
        .unwrap();
        assert_eq!(
            updated.permissions,
            vec![Permission::LeadsView, Permission::AmcView]
        );

        let bad = set_permissions(&db, &user.id, &json!({ "permissions": ["leads:fly"] }));
        match bad {
            Err(ServiceError::Validation { message, details }) => {
                assert_eq!(message, "Invalid permissions: leads:fly");
                assert!(details.unwrap().contains("leads:view"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }

        let not_array = set_permissions(&db, &user.id, &json!({ "permissions": "leads:view" }));
        assert!(matches!(not_array, Err(ServiceError::Validation { .. })));
    }

    #[test]
    fn test_approve_and_reject_signups() {
        let db = test_db();
        let pending = signup(
            &db,
            SignupRequest {
                name: Some("Asha".into()),
                email: Some("asha@kas.test".into()),
                password: Some("secret1".into()),
                role: Some(Role::ServiceEngineer),
            },
        )
        .unwrap();
        assert_eq!(list_pending(&db).unwrap().len(), 1);

        let approved = approve(&db, &pending.id).unwrap();
        assert_eq!(approved.status, UserStatus::Active);
        assert!(db.list_notifications_for("x", 10).unwrap().is_empty());
        assert!(matches!(
            approve(&db, &pending.id),
            Err(ServiceError::Validation { .. })
        ));
        assert!(matches!(
            reject(&db, &pending.id),
            Err(ServiceError::Validation { .. })
        ));

        let second = signup(
            &db,
            SignupRequest {
                name: Some("Ravi".into()),
                email: Some("ravi@kas.test".into()),
                password: Some("secret1".into()),
                role: None,
            },
        )
        .unwrap();
        reject(&db, &second.id).unwrap();
        assert!(db.get_user(&second.id).unwrap().is_none());
        assert!(db.list_notifications_for("x", 10).unwrap().is_empty());
    }

    #[test]
    fn test_admins_cannot_be_deleted() {
        let db = test_db();
        let admin = admin(&db);
        assert!(matches!(
            delete(&db, &admin.id),
            Err(ServiceError::Forbidden(_))
        ));
        let sales = create(&db, new_user("s@kas.test", None)).unwrap();
        delete(&db, &sales.id).unwrap();
        assert!(matches!(
            delete(&db, &sales.id),
            Err(ServiceError::NotFound("User"))
        ));
    }
}
