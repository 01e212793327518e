//! In-app notifications: creation helpers used by the other services, and
//! the per-user feed with stale entries filtered out.

use chrono::Utc;
use serde::Deserialize;

use super::{ServiceError, ServiceResult};
use crate::db::{CrmDb, DbError};
use crate::types::{Notification, NotificationType, UserStatus};
use crate::util::new_id;

/// Most recent notifications returned by the feed.
pub const FEED_LIMIT: usize = 50;

/// Store a notification. `user_id == None` addresses every user.
pub fn notify(
    db: &CrmDb,
    user_id: Option<&str>,
    message: String,
    kind: NotificationType,
    related_id: Option<&str>,
) -> Result<Notification, DbError> {
    let now = Utc::now();
    let notification = Notification {
        id: new_id(),
        user_id: user_id.map(str::to_string),
        message,
        notification_type: kind,
        related_id: related_id.map(str::to_string),
        read: false,
        created_at: now,
        updated_at: now,
    };
    db.insert_notification(&notification)?;
    Ok(notification)
}

/// Like [`notify`], but a failure is logged instead of returned. Used where
/// the triggering operation has already succeeded.
pub fn notify_best_effort(
    db: &CrmDb,
    message: String,
    kind: NotificationType,
    related_id: Option<&str>,
) {
    if let Err(e) = notify(db, None, message, kind, related_id) {
        log::error!("Failed to create {} notification: {}", kind.as_str(), e);
    }
}

/// Drop related notifications after the record they point at is removed.
pub fn clear_related(db: &CrmDb, kind: NotificationType, related_id: &str) {
    match db.delete_notifications_for(kind, related_id) {
        Ok(0) => {}
        Ok(n) => log::debug!("Removed {} {} notification(s) for {}", n, kind.as_str(), related_id),
        Err(e) => log::error!(
            "Failed to delete {} notifications for {}: {}",
            kind.as_str(),
            related_id,
            e
        ),
    }
}

/// A notification is stale when the submission it announces is gone, or a
/// signup has already been approved or rejected.
fn is_stale(db: &CrmDb, notification: &Notification) -> Result<bool, DbError> {
    let Some(related_id) = notification.related_id.as_deref() else {
        return Ok(false);
    };
    let stale = match notification.notification_type {
        NotificationType::Contact => db.get_contact(related_id)?.is_none(),
        NotificationType::Demo => db.get_demo(related_id)?.is_none(),
        NotificationType::Signup => !matches!(
            db.get_user(related_id)?,
            Some(user) if user.status == UserStatus::Pending
        ),
        _ => false,
    };
    Ok(stale)
}

fn without_stale(db: &CrmDb, items: Vec<Notification>) -> Result<Vec<Notification>, DbError> {
    let mut fresh = Vec::with_capacity(items.len());
    for item in items {
        if !is_stale(db, &item)? {
            fresh.push(item);
        }
    }
    Ok(fresh)
}

/// Global notifications plus the user's own, newest first.
pub fn feed(db: &CrmDb, user_id: &str) -> ServiceResult<Vec<Notification>> {
    let items = db.list_notifications_for(user_id, FEED_LIMIT)?;
    Ok(without_stale(db, items)?)
}

pub fn unread_count(db: &CrmDb, user_id: &str) -> ServiceResult<usize> {
    let items = db.list_unread_notifications_for(user_id)?;
    Ok(without_stale(db, items)?.len())
}

pub fn mark_read(db: &CrmDb, id: &str) -> ServiceResult<Notification> {
    if !db.mark_notification_read(id)? {
        return Err(ServiceError::NotFound("Notification"));
    }
    db.get_notification(id)?
        .ok_or(ServiceError::NotFound("Notification"))
}

pub fn mark_all_read(db: &CrmDb, user_id: &str) -> ServiceResult<usize> {
    Ok(db.mark_all_notifications_read(user_id)?)
}

/// Body of `POST /notifications`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "type")]
    pub notification_type: Option<NotificationType>,
    #[serde(default)]
    pub related_id: Option<String>,
}

pub fn create(db: &CrmDb, input: NewNotification) -> ServiceResult<Notification> {
    let message = input
        .message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ServiceError::invalid("message is required"))?;
    let user_id = input.user_id.filter(|u| !u.is_empty());
    let related_id = input.related_id.filter(|r| !r.is_empty());
    Ok(notify(
        db,
        user_id.as_deref(),
        message,
        input.notification_type.unwrap_or_default(),
        related_id.as_deref(),
    )?)
}

pub fn delete(db: &CrmDb, id: &str) -> ServiceResult<()> {
    if db.delete_notification(id)? {
        Ok(())
    } else {
        Err(ServiceError::NotFound("Notification"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use crate::db::users::sample_user;
    use crate::permissions::Role;

    #[test]
    fn test_feed_hides_notifications_for_missing_submissions() {
        let db = test_db();
        notify(&db, None, "Contact from Meera".into(), NotificationType::Contact, Some("gone"))
            .unwrap();
        notify(&db, None, "Maintenance window".into(), NotificationType::System, None).unwrap();

        let feed = feed(&db, "u1").unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].message, "Maintenance window");
        assert_eq!(unread_count(&db, "u1").unwrap(), 1);
    }

    #[test]
    fn test_signup_notification_stale_once_user_is_active() {
        let db = test_db();
        let mut user = sample_user("u9", "new@kas.test", Role::Technician, UserStatus::Pending);
        db.insert_user(&user).unwrap();
        notify(&db, None, "New signup".into(), NotificationType::Signup, Some("u9")).unwrap();
        assert_eq!(feed(&db, "admin").unwrap().len(), 1);

        user.status = UserStatus::Active;
        db.update_user(&user).unwrap();
        assert!(feed(&db, "admin").unwrap().is_empty());
    }

    #[test]
    fn test_create_requires_message_and_defaults_type() {
        let db = test_db();
        let err = create(&db, NewNotification::default()).unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));

        let created = create(
            &db,
            NewNotification {
                user_id: Some("u1".into()),
                message: Some("Hello".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(created.notification_type, NotificationType::System);
        assert_eq!(created.user_id.as_deref(), Some("u1"));
    }

    #[test]
    fn test_mark_read_and_delete_missing() {
        let db = test_db();
        let n = notify(&db, Some("u1"), "Ping".into(), NotificationType::Lead, None).unwrap();
        assert!(mark_read(&db, &n.id).unwrap().read);
        assert!(matches!(
            mark_read(&db, "missing"),
            Err(ServiceError::NotFound("Notification"))
        ));
        delete(&db, &n.id).unwrap();
        assert!(matches!(
            delete(&db, &n.id),
            Err(ServiceError::NotFound("Notification"))
        ));
    }
}
