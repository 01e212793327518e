//! Website form submissions: contact messages and demo requests, plus the
//! admin overview of both.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::notifications::{clear_related, notify_best_effort};
use super::{ServiceError, ServiceResult};
use crate::db::{merge_document, CrmDb};
use crate::types::{
    ContactMessage, ContactStatus, DemoRequest, DemoStatus, NotificationType,
};
use crate::util::new_id;

fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Contact messages
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ContactInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

pub fn submit_contact(db: &CrmDb, input: ContactInput) -> ServiceResult<ContactMessage> {
    let fields = [
        trimmed(input.name),
        trimmed(input.email),
        trimmed(input.phone),
        trimmed(input.subject),
        trimmed(input.message),
    ];
    if fields.iter().any(String::is_empty) {
        return Err(ServiceError::invalid("All fields are required"));
    }
    let [name, email, phone, subject, message] = fields;

    let now = Utc::now();
    let contact = ContactMessage {
        id: new_id(),
        name,
        email,
        phone,
        subject,
        message,
        status: ContactStatus::New,
        created_at: now,
        updated_at: now,
    };
    db.insert_contact(&contact)?;
    log::info!("Contact message {} from {}", contact.id, contact.email);

    notify_best_effort(
        db,
        format!("New contact form submission from {}", contact.name),
        NotificationType::Contact,
        Some(&contact.id),
    );
    Ok(contact)
}

pub fn list_contacts(db: &CrmDb) -> ServiceResult<Vec<ContactMessage>> {
    Ok(db.list_contacts()?)
}

pub fn get_contact(db: &CrmDb, id: &str) -> ServiceResult<ContactMessage> {
    db.get_contact(id)?
        .ok_or(ServiceError::NotFound("Contact message"))
}

pub fn update_contact(db: &CrmDb, id: &str, patch: &Value) -> ServiceResult<ContactMessage> {
    let existing = get_contact(db, id)?;
    let mut contact: ContactMessage = merge_document(&existing, patch).map_err(|e| {
        ServiceError::invalid_with("Failed to update contact message", e.to_string())
    })?;
    contact.updated_at = Utc::now();
    if !db.update_contact(&contact)? {
        return Err(ServiceError::NotFound("Contact message"));
    }
    Ok(contact)
}

pub fn delete_contact(db: &CrmDb, id: &str) -> ServiceResult<()> {
    if !db.delete_contact(id)? {
        return Err(ServiceError::NotFound("Contact message"));
    }
    clear_related(db, NotificationType::Contact, id);
    log::info!("Deleted contact message {}", id);
    Ok(())
}

// ---------------------------------------------------------------------------
// Demo requests
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub elevator_type: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

pub fn submit_demo(db: &CrmDb, input: DemoInput) -> ServiceResult<DemoRequest> {
    let name = trimmed(input.name);
    let email = trimmed(input.email).to_lowercase();
    let phone = trimmed(input.phone);
    if name.is_empty() || email.is_empty() || phone.is_empty() {
        return Err(ServiceError::invalid("Name, email, and phone are required"));
    }

    let now = Utc::now();
    let demo = DemoRequest {
        id: new_id(),
        name,
        email,
        phone,
        company: trimmed(input.company),
        elevator_type: input.elevator_type.unwrap_or_default(),
        message: trimmed(input.message),
        status: DemoStatus::Pending,
        created_at: now,
        updated_at: now,
    };
    db.insert_demo(&demo)?;
    log::info!("Demo request {} from {}", demo.id, demo.email);

    notify_best_effort(
        db,
        format!("New demo request received from {}", demo.name),
        NotificationType::Demo,
        Some(&demo.id),
    );
    Ok(demo)
}

pub fn list_demos(db: &CrmDb) -> ServiceResult<Vec<DemoRequest>> {
    Ok(db.list_demos()?)
}

pub fn get_demo(db: &CrmDb, id: &str) -> ServiceResult<DemoRequest> {
    db.get_demo(id)?.ok_or(ServiceError::NotFound("Demo request"))
}

pub fn update_demo(db: &CrmDb, id: &str, patch: &Value) -> ServiceResult<DemoRequest> {
    let existing = get_demo(db, id)?;
    let mut demo: DemoRequest = merge_document(&existing, patch).map_err(|e| {
        ServiceError::invalid_with("Failed to update demo request", e.to_string())
    })?;
    demo.updated_at = Utc::now();
    if !db.update_demo(&demo)? {
        return Err(ServiceError::NotFound("Demo request"));
    }
    Ok(demo)
}

pub fn delete_demo(db: &CrmDb, id: &str) -> ServiceResult<()> {
    if !db.delete_demo(id)? {
        return Err(ServiceError::NotFound("Demo request"));
    }
    clear_related(db, NotificationType::Demo, id);
    log::info!("Deleted demo request {}", id);
    Ok(())
}

// ---------------------------------------------------------------------------
// Admin overview
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submissions {
    pub contacts: Vec<ContactMessage>,
    pub demos: Vec<DemoRequest>,
    pub total_contacts: usize,
    pub total_demos: usize,
}

pub fn submissions(db: &CrmDb) -> ServiceResult<Submissions> {
    let contacts = db.list_contacts()?;
    let demos = db.list_demos()?;
    Ok(Submissions {
        total_contacts: contacts.len(),
        total_demos: demos.len(),
        contacts,
        demos,
    })
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ContactStats {
    pub total: i64,
    pub new: i64,
    pub read: i64,
    pub replied: i64,
    /// Older dashboards read replied messages under this name.
    pub contacted: i64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct DemoStats {
    pub total: i64,
    pub pending: i64,
    pub contacted: i64,
}

#[derive(Debug, Serialize)]
pub struct SubmissionStats {
    pub contacts: ContactStats,
    pub demos: DemoStats,
}

pub fn stats(db: &CrmDb) -> ServiceResult<SubmissionStats> {
    let contacts = db.contact_status_counts()?;
    let demos = db.demo_status_counts()?;
    let replied = contacts.get(ContactStatus::Replied.as_str());
    Ok(SubmissionStats {
        contacts: ContactStats {
            total: contacts.total(),
            new: contacts.get(ContactStatus::New.as_str()),
            read: contacts.get(ContactStatus::Read.as_str()),
            replied,
            contacted: replied,
        },
        demos: DemoStats {
            total: demos.total(),
            pending: demos.get(DemoStatus::Pending.as_str()),
            contacted: demos.get(DemoStatus::Contacted.as_str()),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use crate::services::notifications;
    use serde_json::json;

    fn contact_input(name: &str) -> ContactInput {
        ContactInput {
            name: Some(name.into()),
            email: Some("meera@example.com".into()),
            phone: Some("9000000000".into()),
            subject: Some("Home lift".into()),
            message: Some("Need a quote for G+3".into()),
        }
    }

    #[test]
    fn test_contact_requires_every_field() {
        let db = test_db();
        let mut input = contact_input("Meera");
        input.subject = Some("  ".into());
        match submit_contact(&db, input).unwrap_err() {
            ServiceError::Validation { message, .. } => assert_eq!(message, "All fields are required"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_contact_lifecycle_keeps_notifications_in_step() {
        let db = test_db();
        let contact = submit_contact(&db, contact_input("Meera")).unwrap();
        assert_eq!(contact.status, ContactStatus::New);

        let feed = notifications::feed(&db, "u1").unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].message, "New contact form submission from Meera");

        let read = update_contact(&db, &contact.id, &json!({ "status": "Read" })).unwrap();
        assert_eq!(read.status, ContactStatus::Read);
        assert!(update_contact(&db, &contact.id, &json!({ "status": "Archived" })).is_err());

        delete_contact(&db, &contact.id).unwrap();
        assert!(db.list_notifications_for("u1", 10).unwrap().is_empty());
        assert!(matches!(
            delete_contact(&db, &contact.id),
            Err(ServiceError::NotFound("Contact message"))
        ));
    }

    #[test]
    fn test_demo_normalizes_input() {
        let db = test_db();
        let demo = submit_demo(
            &db,
            DemoInput {
                name: Some("  Arjun ".into()),
                email: Some(" Arjun@Example.COM ".into()),
                phone: Some("9111111111".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(demo.name, "Arjun");
        assert_eq!(demo.email, "arjun@example.com");
        assert_eq!(demo.status, DemoStatus::Pending);

        let missing = submit_demo(
            &db,
            DemoInput {
                name: Some("No Phone".into()),
                email: Some("np@example.com".into()),
                ..Default::default()
            },
        );
        assert!(matches!(missing, Err(ServiceError::Validation { .. })));

        delete_demo(&db, &demo.id).unwrap();
        assert!(db.list_notifications_for("u1", 10).unwrap().is_empty());
    }

    #[test]
    fn test_admin_stats_and_overview() {
        let db = test_db();
        let first = submit_contact(&db, contact_input("Meera")).unwrap();
        submit_contact(&db, contact_input("Ravi")).unwrap();
        update_contact(&db, &first.id, &json!({ "status": "Replied" })).unwrap();
        let demo = submit_demo(
            &db,
            DemoInput {
                name: Some("Arjun".into()),
                email: Some("arjun@example.com".into()),
                phone: Some("9111111111".into()),
                ..Default::default()
            },
        )
        .unwrap();
        update_demo(&db, &demo.id, &json!({ "status": "Contacted" })).unwrap();

        let stats = stats(&db).unwrap();
        assert_eq!(
            stats.contacts,
            ContactStats {
                total: 2,
                new: 1,
                read: 0,
                replied: 1,
                contacted: 1
            }
        );
        assert_eq!(
            stats.demos,
            DemoStats {
                total: 1,
                pending: 0,
                contacted: 1
            }
        );

        let overview = submissions(&db).unwrap();
        assert_eq!(overview.total_contacts, 2);
        assert_eq!(overview.total_demos, 1);
    }
}
