//! Page composition for the quotation document.
//!
//! Produces a list of pages with positioned draw operations. Nothing here
//! touches the PDF object model, so layouts can be inspected in tests.

use std::collections::BTreeMap;

use super::fonts::{wrap_text, Font};
use super::templates::{self, JpegImage, TemplateSet};
use crate::pricing::{
    format_inr, format_quote_date, signature_cell, standard_cell, CostLine, PaymentTerms,
    RateSummary,
};
use crate::types::{Quotation, DEFAULT_MODEL_NUMBER, DEFAULT_TIME_OF_DELIVERY};

/// A4 in points.
pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;

const FALLBACK_PROJECT_ADDRESS: &str = "Alwaal";
const FALLBACK_CONTACT_NUMBER: &str = "+91 9603295811";

const TABLE_X: f32 = 50.0;
const STANDARD_COLUMN_X: f32 = 300.0;
const SIGNATURE_COLUMN_X: f32 = 450.0;
const ROW_STEP: f32 = 20.0;

const TERMS_AND_CONDITIONS: [&str; 7] = [
    "Payment: For seamless online payment experiences, customers should forward transaction details (name, city, amount) to crm@kashomeelevators.com. Upon successful payment, an acknowledgment and receipt will be provided.",
    "Power Connection: For optimum performance, a stabilized Single Phase 230V - 50/60 Hz power connection is required, complemented by a minimum 32 Amp supply and a circuit breaker.",
    "Civil Works & Structural Support: Customer partnership is essential. For lift installation, customers are requested to manage any required civil works and arrange for structural support if needed.",
    "Installation Flexibility: Installation requests outside of standard working hours can be accommodated, subject to a nominal fee and the team's availability.",
    "Warranties: 5-year warranty for motors, a 7-year manufacturer warranty against rusting, and a 1-year service warranty. These warranties are contingent on the lift receiving regular care and service by trained KAS Home Elevators experts.",
    "Legal Standards: Operations uphold India's legal standards, and disputes will be addressed exclusively within India's jurisdiction.",
    "Safety Compliance: Compliance with safety standards established by regulatory bodies in India, Europe, Australia, and the United States.",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BRAND_GREEN: Color = Color::rgb(0.09, 0.64, 0.29);
    pub const DARK_TEXT: Color = Color::rgb(0.15, 0.15, 0.15);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Color { r, g, b }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Image {
        template: &'static str,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
        size: f32,
        font: Font,
        color: Color,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub elements: Vec<Element>,
}

impl Page {
    fn text(&mut self, text: impl Into<String>, x: f32, y: f32, size: f32, font: Font, color: Color) {
        self.elements.push(Element::Text {
            text: text.into(),
            x,
            y,
            size,
            font,
            color,
        });
    }

    /// Draw `text` wrapped to `max_width`, first baseline at `y`.
    fn wrapped_text(&mut self, text: &str, x: f32, y: f32, size: f32, font: Font, max_width: f32) {
        let line_height = size * 1.2;
        for (i, line) in wrap_text(text, font, size, max_width).into_iter().enumerate() {
            self.text(line, x, y - i as f32 * line_height, size, font, Color::BLACK);
        }
    }

    /// Text runs on this page, in drawing order.
    pub fn texts(&self) -> Vec<&str> {
        self.elements
            .iter()
            .filter_map(|e| match e {
                Element::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn find_text(&self, needle: &str) -> Option<&Element> {
        self.elements
            .iter()
            .find(|e| matches!(e, Element::Text { text, .. } if text == needle))
    }

    pub fn has_image(&self) -> bool {
        self.elements.iter().any(|e| matches!(e, Element::Image { .. }))
    }
}

/// Composed pages plus the template images they reference.
#[derive(Debug, Clone, Default)]
pub struct Composition {
    pub pages: Vec<Page>,
    pub images: BTreeMap<&'static str, JpegImage>,
}

struct Composer<'a> {
    templates: &'a TemplateSet,
    out: Composition,
}

impl<'a> Composer<'a> {
    fn new_page(&mut self) -> Page {
        Page::default()
    }

    /// Place a template image on `page`; false when it is unavailable.
    fn background(
        &mut self,
        page: &mut Page,
        template: &'static str,
        y: f32,
        height: f32,
    ) -> bool {
        if !self.out.images.contains_key(template) {
            match self.templates.load(template) {
                Some(image) => {
                    self.out.images.insert(template, image);
                }
                None => return false,
            }
        }
        page.elements.push(Element::Image {
            template,
            x: 0.0,
            y,
            width: PAGE_WIDTH,
            height,
        });
        true
    }

    fn full_page_background(&mut self, page: &mut Page, template: &'static str) -> bool {
        self.background(page, template, 0.0, PAGE_HEIGHT)
    }

    fn finish(&mut self, page: Page) {
        self.out.pages.push(page);
    }
}

fn or_default<'q>(value: &'q str, fallback: &'q str) -> &'q str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

/// Lay out every page of the customer-facing quotation.
pub fn compose(quote: &Quotation, templates: &TemplateSet) -> Composition {
    let mut composer = Composer {
        templates,
        out: Composition::default(),
    };

    let model_number = or_default(&quote.model_number, DEFAULT_MODEL_NUMBER);
    let standard = RateSummary::from_schedule(&quote.standard_rates);
    let signature = RateSummary::from_schedule(&quote.signature_rates);

    cover_page(&mut composer, quote, model_number);
    about_page(&mut composer);
    specification_page(&mut composer, quote, model_number);
    features_page(&mut composer, quote);
    cost_page(&mut composer, quote, &standard, &signature);
    payment_terms_page(&mut composer, quote, &signature);
    terms_pages(&mut composer);

    composer.out
}

fn cover_page(c: &mut Composer<'_>, quote: &Quotation, model_number: &str) {
    let mut page = c.new_page();
    let has_template = c.full_page_background(&mut page, templates::COVER);
    let h = PAGE_HEIGHT;

    if !has_template {
        page.text("KAS HOME ELEVATORS", 50.0, h - 120.0, 28.0, Font::Bold, Color::BRAND_GREEN);
        page.text("Elevator Quotation", 50.0, h - 160.0, 18.0, Font::Bold, Color::DARK_TEXT);
    }

    let address = or_default(&quote.project_address, FALLBACK_PROJECT_ADDRESS);
    let contact = or_default(&quote.contact_number, FALLBACK_CONTACT_NUMBER);
    let date = format_quote_date(quote.created_at.date_naive());

    page.text(quote.lead_name.as_str(), 50.0, h - 400.0, 12.0, Font::Bold, Color::BLACK);
    page.text(address, 50.0, h - 425.0, 12.0, Font::Bold, Color::BLACK);
    page.text(contact, 300.0, h - 425.0, 12.0, Font::Bold, Color::BLACK);
    page.text(date, 300.0, h - 450.0, 12.0, Font::Bold, Color::BLACK);

    let model_color = if has_template {
        Color::WHITE
    } else {
        Color::DARK_TEXT
    };
    page.text(
        format!("MODEL NUMBER: {}", model_number),
        50.0,
        h - 550.0,
        16.0,
        Font::Bold,
        model_color,
    );
    c.finish(page);
}

fn about_page(c: &mut Composer<'_>) {
    let mut page = c.new_page();
    if !c.full_page_background(&mut page, templates::ABOUT) {
        page.text("About Us", 50.0, PAGE_HEIGHT - 80.0, 22.0, Font::Bold, Color::BRAND_GREEN);
        page.wrapped_text(
            "KAS Home Elevators designs, supplies and installs home elevators. Our own \
             engineers handle installation and after-sales service, including annual \
             maintenance contracts.",
            50.0,
            PAGE_HEIGHT - 120.0,
            11.0,
            Font::Regular,
            PAGE_WIDTH - 100.0,
        );
    }
    c.finish(page);
}

fn specification_page(c: &mut Composer<'_>, quote: &Quotation, model_number: &str) {
    let mut page = c.new_page();
    let has_template = c.full_page_background(&mut page, templates::SPECIFICATION);
    let top = PAGE_HEIGHT - 200.0;

    let rows: [(&str, String); 9] = [
        ("Model Number", model_number.to_string()),
        ("Application", quote.application.clone()),
        ("Shaft Type", quote.shaft_type.clone()),
        ("Number Of Stops", format!("G+{} Stops", quote.floors)),
        ("Cabin Type", quote.cabin_type.clone()),
        ("Rated Load", format!("Upto {} Kg", quote.capacity)),
        ("Power Efficiency and Usage", "Class A, 230V, 1 Phase 50Hz".to_string()),
        ("Max Speed", format!("Up to {}m / second", quote.speed)),
        ("Door type", quote.door_type.clone()),
    ];

    if !has_template {
        page.text(
            "Lift Specification",
            50.0,
            PAGE_HEIGHT - 120.0,
            22.0,
            Font::Bold,
            Color::BRAND_GREEN,
        );
    }
    for (i, (label, value)) in rows.iter().enumerate() {
        let y = top - i as f32 * 35.0;
        if !has_template {
            page.text(*label, 50.0, y, 11.0, Font::Bold, Color::BLACK);
        }
        page.text(value.as_str(), 300.0, y, 11.0, Font::Regular, Color::BLACK);
    }
    c.finish(page);
}

fn features_page(c: &mut Composer<'_>, quote: &Quotation) {
    let mut page = c.new_page();
    if !c.full_page_background(&mut page, templates::FEATURES) {
        page.text("Features", 50.0, PAGE_HEIGHT - 80.0, 22.0, Font::Bold, Color::BRAND_GREEN);
        let mut y = PAGE_HEIGHT - 120.0;
        for feature in &quote.features {
            page.text(format!("• {}", feature), 60.0, y, 11.0, Font::Regular, Color::BLACK);
            y -= 20.0;
        }
    }
    c.finish(page);
}

fn cost_page(
    c: &mut Composer<'_>,
    quote: &Quotation,
    standard: &RateSummary,
    signature: &RateSummary,
) {
    let mut page = c.new_page();
    if !c.background(&mut page, templates::PAYMENT_TOP, PAGE_HEIGHT - 200.0, 200.0) {
        page.text(
            "Cost Breakdown",
            50.0,
            PAGE_HEIGHT - 100.0,
            22.0,
            Font::Bold,
            Color::BRAND_GREEN,
        );
    }

    let header_y = PAGE_HEIGHT - 250.0;
    page.text("KAS", TABLE_X, header_y, 12.0, Font::Bold, Color::BLACK);
    page.text("Standard Rate", STANDARD_COLUMN_X, header_y, 12.0, Font::Bold, Color::BLACK);
    page.text("Signature Rate", SIGNATURE_COLUMN_X, header_y, 12.0, Font::Bold, Color::BLACK);

    let first_row_y = header_y - 25.0;
    for (i, line) in CostLine::ALL.iter().enumerate() {
        let y = first_row_y - i as f32 * ROW_STEP;
        page.wrapped_text(
            line.label(),
            TABLE_X,
            y,
            9.0,
            Font::Regular,
            STANDARD_COLUMN_X - TABLE_X - 10.0,
        );
        page.text(
            standard_cell(quote.standard_rates.line(*line)),
            STANDARD_COLUMN_X,
            y,
            9.0,
            Font::Regular,
            Color::BLACK,
        );
        page.text(
            signature_cell(*line, quote.signature_rates.line(*line)),
            SIGNATURE_COLUMN_X,
            y,
            9.0,
            Font::Regular,
            Color::BLACK,
        );
    }

    let totals_y = first_row_y - CostLine::ALL.len() as f32 * ROW_STEP - 20.0;
    let totals = [
        ("Total", standard.total, signature.total),
        ("GST 18%", standard.gst, signature.gst),
        ("Nett", standard.net, signature.net),
    ];
    for (i, (label, standard_amount, signature_amount)) in totals.iter().enumerate() {
        let y = totals_y - i as f32 * ROW_STEP;
        page.text(*label, TABLE_X, y, 11.0, Font::Bold, Color::BLACK);
        page.text(format_inr(*standard_amount), STANDARD_COLUMN_X, y, 11.0, Font::Bold, Color::BLACK);
        page.text(format_inr(*signature_amount), SIGNATURE_COLUMN_X, y, 11.0, Font::Bold, Color::BLACK);
    }
    c.finish(page);
}

fn payment_terms_page(c: &mut Composer<'_>, quote: &Quotation, signature: &RateSummary) {
    let mut page = c.new_page();
    let top = PAGE_HEIGHT - 150.0;

    page.elements.push(Element::Rect {
        x: 50.0,
        y: top - 30.0,
        width: PAGE_WIDTH - 100.0,
        height: 30.0,
        color: Color::BRAND_GREEN,
    });
    page.text("Payment Terms", 60.0, top - 20.0, 12.0, Font::Bold, Color::WHITE);

    let mut terms: PaymentTerms = quote.payment_terms;
    terms.fill_missing_amounts(signature.net);
    let delivery = or_default(&quote.time_of_delivery, DEFAULT_TIME_OF_DELIVERY);

    let rows = [
        ("Total Cost", format!("{} (inc Tax)", format_inr(signature.net))),
        ("Time of Delivery", delivery.to_string()),
        (
            "Payment Terms",
            format!(
                "{}% While Placing order {}",
                terms.percentage1,
                format_inr(terms.amount1)
            ),
        ),
        (
            "",
            format!(
                "{}% Against Readiness Notification: {}",
                terms.percentage2,
                format_inr(terms.amount2)
            ),
        ),
    ];

    for (i, (label, value)) in rows.iter().enumerate() {
        let y = top - 60.0 - i as f32 * 40.0;
        if !label.is_empty() {
            page.text(*label, 60.0, y, 11.0, Font::Bold, Color::BLACK);
        }
        page.wrapped_text(value, 60.0, y - 15.0, 10.0, Font::Regular, PAGE_WIDTH - 120.0);
    }
    c.finish(page);
}

fn terms_pages(c: &mut Composer<'_>) {
    let mut any_template = false;
    for template in templates::TERMS {
        let mut page = c.new_page();
        if c.full_page_background(&mut page, template) {
            any_template = true;
            c.finish(page);
        }
    }
    if any_template {
        return;
    }

    let mut page = c.new_page();
    page.text(
        "Terms & Conditions",
        50.0,
        PAGE_HEIGHT - 50.0,
        24.0,
        Font::Bold,
        Color::BRAND_GREEN,
    );

    let mut y = PAGE_HEIGHT - 100.0;
    for (i, clause) in TERMS_AND_CONDITIONS.iter().enumerate() {
        if y < 100.0 {
            c.finish(std::mem::take(&mut page));
            y = PAGE_HEIGHT - 50.0;
        }
        page.wrapped_text(
            &format!("{}. {}", i + 1, clause),
            50.0,
            y,
            10.0,
            Font::Regular,
            PAGE_WIDTH - 100.0,
        );
        y -= 80.0;
    }

    page.text("Yours sincerely,", 50.0, 100.0, 10.0, Font::Regular, Color::BLACK);
    page.text("Sujith R", 50.0, 85.0, 10.0, Font::Regular, Color::BLACK);
    page.text("KAS HOME ELEVATORS", 50.0, 70.0, 10.0, Font::Regular, Color::BLACK);
    page.text("Customer Signature", PAGE_WIDTH - 150.0, 70.0, 10.0, Font::Regular, Color::BLACK);
    c.finish(page);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::templates::tests::tiny_jpeg;
    use crate::pdf::test_quotation;

    fn position(page: &Page, needle: &str) -> (f32, f32, f32, Font, Color) {
        match page.find_text(needle) {
            Some(Element::Text {
                x,
                y,
                size,
                font,
                color,
                ..
            }) => (*x, *y, *size, *font, *color),
            _ => panic!("{needle:?} not found in {:?}", page.texts()),
        }
    }

    #[test]
    fn test_fallback_layout_without_templates() {
        let quote = test_quotation();
        let doc = compose(&quote, &TemplateSet::none());

        // cover, about, spec, features, costs, payment terms, T&C
        assert_eq!(doc.pages.len(), 7);
        assert!(doc.images.is_empty());

        let cover = &doc.pages[0];
        let (x, y, size, font, color) = position(cover, "Ravi Kumar");
        assert_eq!((x, size, font), (50.0, 12.0, Font::Bold));
        assert!((y - (PAGE_HEIGHT - 400.0)).abs() < 0.01);
        assert_eq!(color, Color::BLACK);

        let (_, _, _, _, model_color) = position(cover, "MODEL NUMBER: KAS-GX630");
        assert_eq!(model_color, Color::DARK_TEXT);
        assert!(cover.find_text("05 Jan 2025").is_some());
        assert!(cover.find_text("Alwaal").is_some());
        assert!(cover.find_text("+91 9603295811").is_some());
    }

    #[test]
    fn test_specification_values() {
        let doc = compose(&test_quotation(), &TemplateSet::none());
        let spec = &doc.pages[2];
        assert!(spec.find_text("G+4 Stops").is_some());
        assert!(spec.find_text("Upto 450 Kg").is_some());
        assert!(spec.find_text("Up to 1m / second").is_some());
        // Labels are only drawn when there is no template behind the values
        assert!(spec.find_text("Rated Load").is_some());
        let (x, y, ..) = position(spec, "Upto 450 Kg");
        assert_eq!(x, 300.0);
        assert!((y - (PAGE_HEIGHT - 200.0 - 5.0 * 35.0)).abs() < 0.01);
    }

    #[test]
    fn test_cost_table() {
        let doc = compose(&test_quotation(), &TemplateSet::none());
        let costs = &doc.pages[4];
        let texts = costs.texts();
        assert!(texts.contains(&"₹14,50,000"));
        assert!(texts.contains(&"₹14,40,000"));
        assert!(texts.contains(&"Included"));
        assert!(texts.contains(&"₹19,37,000"));
        assert!(texts.contains(&"₹3,48,660"));
        assert!(texts.contains(&"₹22,85,660"));
        assert!(texts.contains(&"₹16,99,200"));

        let (_, header_y, ..) = position(costs, "Standard Rate");
        let (_, nett_y, ..) = position(costs, "Nett");
        assert!((header_y - (PAGE_HEIGHT - 250.0)).abs() < 0.01);
        let expected_nett = PAGE_HEIGHT - 250.0 - 25.0 - 12.0 * 20.0 - 20.0 - 40.0;
        assert!((nett_y - expected_nett).abs() < 0.01);
    }

    #[test]
    fn test_payment_terms_rows() {
        let doc = compose(&test_quotation(), &TemplateSet::none());
        let terms = &doc.pages[5];
        let texts = terms.texts();
        assert!(texts.contains(&"₹16,99,200 (inc Tax)"));
        assert!(texts.contains(&"50% While Placing order ₹8,49,600"));
        assert!(texts.contains(&"50% Against Readiness Notification: ₹8,49,600"));
        assert!(terms
            .elements
            .iter()
            .any(|e| matches!(e, Element::Rect { color, .. } if *color == Color::BRAND_GREEN)));
    }

    #[test]
    fn test_fallback_terms_page() {
        let doc = compose(&test_quotation(), &TemplateSet::none());
        let last = doc.pages.last().unwrap();
        assert!(last.find_text("Terms & Conditions").is_some());
        assert!(last.find_text("Customer Signature").is_some());
        assert!(last.texts().iter().any(|t| t.starts_with("7. Safety Compliance")));
    }

    #[test]
    fn test_templates_replace_fallbacks() {
        let dir = tempfile::tempdir().unwrap();
        for name in [templates::COVER, templates::SPECIFICATION, templates::TERMS[0], templates::TERMS[2]] {
            std::fs::write(dir.path().join(name), tiny_jpeg(595, 842, 3)).unwrap();
        }
        // Present but unusable: must fall back silently
        std::fs::write(dir.path().join(templates::ABOUT), b"garbage").unwrap();

        let doc = compose(&test_quotation(), &TemplateSet::at(dir.path()));

        // 6 fixed pages + 2 terms images
        assert_eq!(doc.pages.len(), 8);
        assert_eq!(doc.images.len(), 4);

        let cover = &doc.pages[0];
        assert!(cover.has_image());
        let (_, _, _, _, model_color) = position(cover, "MODEL NUMBER: KAS-GX630");
        assert_eq!(model_color, Color::WHITE);

        assert!(!doc.pages[1].has_image());
        assert!(doc.pages[1].find_text("About Us").is_some());

        let spec = &doc.pages[2];
        assert!(spec.find_text("Rated Load").is_none());
        assert!(spec.find_text("Upto 450 Kg").is_some());

        assert!(doc.pages[6].has_image());
        assert!(doc.pages[7].has_image());
        assert!(doc
            .pages
            .iter()
            .all(|p| p.find_text("Terms & Conditions").is_none()));
    }
}
