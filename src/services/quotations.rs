//! Quotations. Every write recomputes the derived totals from the two rate
//! schedules, so client-supplied totals are never trusted.

use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};

use super::notifications::notify_best_effort;
use super::{new_document, ServiceError, ServiceResult};
use crate::db::{merge_document, CrmDb};
use crate::pricing::RateSchedule;
use crate::types::{NotificationType, Quotation, QuotationStatus};
use crate::util::{date_from_value, today};

/// Days a new quotation stays valid when the client gives no date.
pub const DEFAULT_VALIDITY_DAYS: i64 = 30;

const RATE_KEYS: [&str; 2] = ["standardRates", "signatureRates"];

fn load(db: &CrmDb, id: &str) -> ServiceResult<Quotation> {
    db.get_quotation(id)?.ok_or(ServiceError::NotFound("Quotation"))
}

/// Lay the client's rate entries over `base`, keeping untouched lines.
fn overlay_rates(base: &RateSchedule, patch: &Value) -> Result<RateSchedule, serde_json::Error> {
    match patch {
        Value::Null => Ok(*base),
        other => merge_document(base, other),
    }
}

fn base_rates(key: &str, existing: Option<&Quotation>) -> RateSchedule {
    match (key, existing) {
        ("standardRates", Some(q)) => q.standard_rates,
        ("signatureRates", Some(q)) => q.signature_rates,
        ("standardRates", None) => RateSchedule::standard_default(),
        _ => RateSchedule::signature_default(),
    }
}

/// Normalise the date and rate fields of an incoming body in place.
fn prepare_fields(
    fields: &mut Map<String, Value>,
    existing: Option<&Quotation>,
) -> Result<(), serde_json::Error> {
    if let Some(raw) = fields.get("validUntil") {
        match date_from_value(raw) {
            Some(date) => {
                fields.insert("validUntil".into(), json!(date));
            }
            None => {
                fields.remove("validUntil");
            }
        }
    }
    for key in RATE_KEYS {
        let patch = fields.get(key).cloned();
        if patch.is_some() || existing.is_none() {
            let merged = overlay_rates(&base_rates(key, existing), &patch.unwrap_or(Value::Null))?;
            fields.insert(key.into(), serde_json::to_value(merged)?);
        }
    }
    // Server-owned
    fields.remove("version");
    Ok(())
}

pub fn list(db: &CrmDb) -> ServiceResult<Vec<Quotation>> {
    Ok(db.list_quotations()?)
}

pub fn get(db: &CrmDb, id: &str) -> ServiceResult<Quotation> {
    load(db, id)
}

pub fn create(db: &CrmDb, body: &Value) -> ServiceResult<Quotation> {
    let failed = |e: serde_json::Error| {
        ServiceError::invalid_with("Failed to create quotation", e.to_string())
    };
    let mut fields = new_document(body, "Failed to create quotation")?;
    prepare_fields(&mut fields, None).map_err(failed)?;
    fields
        .entry("validUntil")
        .or_insert_with(|| json!(today() + Duration::days(DEFAULT_VALIDITY_DAYS)));

    let mut quote: Quotation = serde_json::from_value(Value::Object(fields)).map_err(failed)?;
    quote.version = 1;
    quote.recompute();
    db.insert_quotation(&quote)?;
    log::info!(
        "Created quotation {} for {} (net {})",
        quote.id,
        quote.lead_name,
        quote.total_amount
    );
    Ok(quote)
}

/// Apply a partial update. A status change bumps the version; approving
/// announces the quotation to every user.
pub fn update(db: &CrmDb, id: &str, patch: &Value) -> ServiceResult<Quotation> {
    let failed = |e: serde_json::Error| {
        ServiceError::invalid_with("Failed to update quotation", e.to_string())
    };
    let existing = load(db, id)?;
    let mut fields = patch.as_object().cloned().ok_or_else(|| {
        ServiceError::invalid_with("Failed to update quotation", "Expected a JSON object")
    })?;
    prepare_fields(&mut fields, Some(&existing)).map_err(failed)?;

    let rates_changed = RATE_KEYS.iter().any(|k| fields.contains_key(*k));
    let terms_given = fields.contains_key("paymentTerms");

    let mut quote: Quotation = merge_document(&existing, &Value::Object(fields)).map_err(failed)?;
    if quote.status != existing.status {
        quote.version = existing.version + 1;
        log::info!(
            "Quotation {} status {} -> {} (version {})",
            quote.id,
            existing.status,
            quote.status,
            quote.version
        );
    }
    if rates_changed && !terms_given {
        // Instalments follow the new net price
        quote.payment_terms.amount1 = 0;
        quote.payment_terms.amount2 = 0;
    }
    quote.recompute();
    quote.updated_at = Utc::now();
    if !db.update_quotation(&quote)? {
        return Err(ServiceError::NotFound("Quotation"));
    }

    let approving = patch.get("status").and_then(Value::as_str)
        == Some(QuotationStatus::Approved.as_str());
    if approving && quote.status == QuotationStatus::Approved {
        notify_best_effort(
            db,
            format!("Quotation approved for {}", quote.lead_name),
            NotificationType::Quotation,
            Some(&quote.id),
        );
    }
    Ok(quote)
}

pub fn delete(db: &CrmDb, id: &str) -> ServiceResult<()> {
    if db.delete_quotation(id)? {
        log::info!("Deleted quotation {}", id);
        Ok(())
    } else {
        Err(ServiceError::NotFound("Quotation"))
    }
}
