//! Customer-facing quotation PDF.
//!
//! Rendering is two steps: [`layout::compose`] positions text, rectangles
//! and template images on A4 pages, then [`writer::write`] serialises the
//! result. Template images are optional; each page has a text fallback.

pub mod fonts;
pub mod layout;
pub mod templates;
pub mod writer;

use thiserror::Error;

use crate::types::Quotation;

pub use layout::{compose, Composition};
pub use templates::TemplateSet;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Invalid template image: {0}")]
    InvalidImage(String),

    #[error("Failed to write PDF: {0}")]
    Write(String),
}

/// Render the quotation document to PDF bytes.
pub fn render_quotation(quote: &Quotation, templates: &TemplateSet) -> Result<Vec<u8>, PdfError> {
    let composition = compose(quote, templates);
    let bytes = writer::write(&composition)?;
    log::info!(
        "Rendered quotation {} ({} pages, {} bytes)",
        quote.id,
        composition.pages.len(),
        bytes.len()
    );
    Ok(bytes)
}

/// Attachment name for a downloaded quotation.
pub fn file_name(quote_id: &str) -> String {
    format!("Quotation-{}.pdf", quote_id)
}

#[cfg(test)]
pub(crate) fn test_quotation() -> Quotation {
    use chrono::{NaiveDate, TimeZone, Utc};

    use crate::pricing::{PaymentTerms, RateSchedule};
    use crate::types::{QuotationStatus, DEFAULT_TIME_OF_DELIVERY};

    let created = Utc.with_ymd_and_hms(2025, 1, 5, 10, 0, 0).unwrap();
    let mut quote = Quotation {
        id: "q-test".into(),
        lead_id: "lead-1".into(),
        lead_name: "Ravi Kumar".into(),
        project_address: String::new(),
        contact_number: String::new(),
        elevator_type: "Passenger Elevator".into(),
        model_number: "KAS-GX630".into(),
        floors: 4,
        capacity: 450,
        speed: 1.0,
        shaft_type: "G S".into(),
        application: "Outdoor".into(),
        cabin_type: "Standard".into(),
        door_type: "Automatic Door".into(),
        features: vec!["Auto rescue device".into(), "Voice announcer".into()],
        standard_rates: RateSchedule::standard_default(),
        signature_rates: RateSchedule::signature_default(),
        standard_total: 0,
        standard_gst: 0,
        standard_net: 0,
        signature_total: 0,
        signature_gst: 0,
        signature_net: 0,
        time_of_delivery: DEFAULT_TIME_OF_DELIVERY.into(),
        payment_terms: PaymentTerms::default(),
        base_price: 0,
        installation_cost: 0,
        tax: 0,
        total_amount: 0,
        status: QuotationStatus::Pending,
        valid_until: NaiveDate::from_ymd_opt(2025, 2, 4).unwrap(),
        version: 1,
        created_at: created,
        updated_at: created,
    };
    quote.recompute();
    quote
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::templates::tests::tiny_jpeg;
    use lopdf::Document;

    fn page_text(doc: &Document, page_number: u32) -> String {
        let pages = doc.get_pages();
        let page_id = pages[&page_number];
        let content = doc.get_page_content(page_id).unwrap();
        String::from_utf8_lossy(&content).into_owned()
    }

    #[test]
    fn test_render_without_templates_parses_back() {
        let bytes = render_quotation(&test_quotation(), &TemplateSet::none()).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 7);

        let cover = page_text(&doc, 1);
        assert!(cover.contains("MODEL NUMBER: KAS-GX630"));
        assert!(cover.contains("05 Jan 2025"));

        // Rupee amounts are written in a WinAnsi-safe form
        let costs = page_text(&doc, 5);
        assert!(costs.contains("Rs.14,40,000"));
        assert!(!costs.contains('₹'));
    }

    #[test]
    fn test_render_embeds_template_images() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(templates::COVER), tiny_jpeg(595, 842, 3)).unwrap();

        let bytes = render_quotation(&test_quotation(), &TemplateSet::at(dir.path())).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 7);

        let cover = page_text(&doc, 1);
        assert!(cover.contains("/Im1 Do"));

        let has_dct_image = doc.objects.values().any(|obj| match obj {
            lopdf::Object::Stream(stream) => stream
                .dict
                .get(b"Filter")
                .and_then(|f| f.as_name())
                .map(|n| n == b"DCTDecode")
                .unwrap_or(false),
            _ => false,
        });
        assert!(has_dct_image);
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("abc123"), "Quotation-abc123.pdf");
    }
}
