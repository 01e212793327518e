//! Quotation pricing: the twelve cost lines, GST, payment split, and the
//! rupee/date formatting shared by the API and the PDF renderer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::Quotation;
use crate::util::lenient;

/// GST charged on elevator supply and installation, in percent.
pub const GST_PERCENT: i64 = 18;

/// One row of the cost breakdown table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CostLine {
    BasicCost,
    ShaftMasonry,
    ShaftFilling,
    Installation,
    ExtraTravelHeight,
    PremiumCabin,
    MultiColorLed,
    GlassDoor,
    PremiumRalColor,
    CustomizedCabinSize,
    Transportation,
    AdvancedFeatures,
}

impl CostLine {
    pub const ALL: [CostLine; 12] = [
        CostLine::BasicCost,
        CostLine::ShaftMasonry,
        CostLine::ShaftFilling,
        CostLine::Installation,
        CostLine::ExtraTravelHeight,
        CostLine::PremiumCabin,
        CostLine::MultiColorLed,
        CostLine::GlassDoor,
        CostLine::PremiumRalColor,
        CostLine::CustomizedCabinSize,
        CostLine::Transportation,
        CostLine::AdvancedFeatures,
    ];

    /// JSON key inside a rate schedule.
    pub fn key(&self) -> &'static str {
        match self {
            CostLine::BasicCost => "basicCost",
            CostLine::ShaftMasonry => "shaftMasonry",
            CostLine::ShaftFilling => "shaftFilling",
            CostLine::Installation => "installation",
            CostLine::ExtraTravelHeight => "extraTravelHeight",
            CostLine::PremiumCabin => "premiumCabin",
            CostLine::MultiColorLed => "multiColorLED",
            CostLine::GlassDoor => "glassDoor",
            CostLine::PremiumRalColor => "premiumRALColor",
            CostLine::CustomizedCabinSize => "customizedCabinSize",
            CostLine::Transportation => "transportation",
            CostLine::AdvancedFeatures => "advancedFeatures",
        }
    }

    /// Row label printed on the quotation.
    pub fn label(&self) -> &'static str {
        match self {
            CostLine::BasicCost => "Basic Cost",
            CostLine::ShaftMasonry => "Shaft - Masonry by Others",
            CostLine::ShaftFilling => "Shaft Filling",
            CostLine::Installation => "Installation",
            CostLine::ExtraTravelHeight => "Extra Travel Height Cost",
            CostLine::PremiumCabin => "Premium Cabin (Glass/Mirror/RAL/Wood Finish)",
            CostLine::MultiColorLed => "Multi Colour LED Ceiling",
            CostLine::GlassDoor => "Glass Door",
            CostLine::PremiumRalColor => "Premium RAL Colour for Door",
            CostLine::CustomizedCabinSize => "Customised Cabin Size",
            CostLine::Transportation => "Transportation & Unloading",
            CostLine::AdvancedFeatures => {
                "Advanced Features (20 inch Touch Screen, Biometric, camera Compatibility)"
            }
        }
    }

    /// Whether a zero signature-rate amount means the item is bundled.
    pub fn included_when_free(&self) -> bool {
        matches!(
            self,
            CostLine::ShaftFilling
                | CostLine::Installation
                | CostLine::PremiumCabin
                | CostLine::MultiColorLed
                | CostLine::GlassDoor
                | CostLine::PremiumRalColor
                | CostLine::CustomizedCabinSize
                | CostLine::Transportation
        )
    }
}

/// Amounts (whole rupees) for each cost line of one pricing tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateSchedule {
    #[serde(default, deserialize_with = "lenient::amount_or_zero")]
    pub basic_cost: i64,
    #[serde(default, deserialize_with = "lenient::amount_or_zero")]
    pub shaft_masonry: i64,
    #[serde(default, deserialize_with = "lenient::amount_or_zero")]
    pub shaft_filling: i64,
    #[serde(default, deserialize_with = "lenient::amount_or_zero")]
    pub installation: i64,
    #[serde(default, deserialize_with = "lenient::amount_or_zero")]
    pub extra_travel_height: i64,
    #[serde(default, deserialize_with = "lenient::amount_or_zero")]
    pub premium_cabin: i64,
    #[serde(default, rename = "multiColorLED", deserialize_with = "lenient::amount_or_zero")]
    pub multi_color_led: i64,
    #[serde(default, deserialize_with = "lenient::amount_or_zero")]
    pub glass_door: i64,
    #[serde(default, rename = "premiumRALColor", deserialize_with = "lenient::amount_or_zero")]
    pub premium_ral_color: i64,
    #[serde(default, deserialize_with = "lenient::amount_or_zero")]
    pub customized_cabin_size: i64,
    #[serde(default, deserialize_with = "lenient::amount_or_zero")]
    pub transportation: i64,
    #[serde(default, deserialize_with = "lenient::amount_or_zero")]
    pub advanced_features: i64,
}

impl RateSchedule {
    /// Itemised list prices.
    pub fn standard_default() -> Self {
        RateSchedule {
            basic_cost: 1_450_000,
            installation: 60_000,
            premium_cabin: 80_000,
            multi_color_led: 25_000,
            glass_door: 75_000,
            premium_ral_color: 45_000,
            customized_cabin_size: 40_000,
            transportation: 50_000,
            advanced_features: 112_000,
            ..Default::default()
        }
    }

    /// Bundled signature price: everything folded into the basic cost.
    pub fn signature_default() -> Self {
        RateSchedule {
            basic_cost: 1_440_000,
            ..Default::default()
        }
    }

    pub fn line(&self, line: CostLine) -> i64 {
        match line {
            CostLine::BasicCost => self.basic_cost,
            CostLine::ShaftMasonry => self.shaft_masonry,
            CostLine::ShaftFilling => self.shaft_filling,
            CostLine::Installation => self.installation,
            CostLine::ExtraTravelHeight => self.extra_travel_height,
            CostLine::PremiumCabin => self.premium_cabin,
            CostLine::MultiColorLed => self.multi_color_led,
            CostLine::GlassDoor => self.glass_door,
            CostLine::PremiumRalColor => self.premium_ral_color,
            CostLine::CustomizedCabinSize => self.customized_cabin_size,
            CostLine::Transportation => self.transportation,
            CostLine::AdvancedFeatures => self.advanced_features,
        }
    }

    pub fn total(&self) -> i64 {
        CostLine::ALL.iter().map(|l| self.line(*l)).sum()
    }
}

/// GST on `total`, rounded half-up to the rupee.
pub fn gst_for(total: i64) -> i64 {
    round_div(total * GST_PERCENT, 100)
}

fn round_div(numerator: i64, denominator: i64) -> i64 {
    if numerator >= 0 {
        (numerator + denominator / 2) / denominator
    } else {
        -((-numerator + denominator / 2) / denominator)
    }
}

/// Total, GST and net for one rate schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateSummary {
    pub total: i64,
    pub gst: i64,
    pub net: i64,
}

impl RateSummary {
    pub fn from_schedule(schedule: &RateSchedule) -> Self {
        let total = schedule.total();
        let gst = gst_for(total);
        RateSummary {
            total,
            gst,
            net: total + gst,
        }
    }
}

/// Two-instalment payment plan against the signature net price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTerms {
    #[serde(default = "half", deserialize_with = "lenient::f64_or_zero")]
    pub percentage1: f64,
    #[serde(default, deserialize_with = "lenient::i64_or_zero")]
    pub amount1: i64,
    #[serde(default = "half", deserialize_with = "lenient::f64_or_zero")]
    pub percentage2: f64,
    #[serde(default, deserialize_with = "lenient::i64_or_zero")]
    pub amount2: i64,
}

fn half() -> f64 {
    50.0
}

impl Default for PaymentTerms {
    fn default() -> Self {
        PaymentTerms {
            percentage1: 50.0,
            amount1: 0,
            percentage2: 50.0,
            amount2: 0,
        }
    }
}

impl PaymentTerms {
    pub fn split(net: i64, percentage1: f64, percentage2: f64) -> Self {
        PaymentTerms {
            percentage1,
            amount1: share_of(net, percentage1),
            percentage2,
            amount2: share_of(net, percentage2),
        }
    }

    /// Derive any instalment amount that was left at zero.
    pub fn fill_missing_amounts(&mut self, net: i64) {
        if self.amount1 == 0 {
            self.amount1 = share_of(net, self.percentage1);
        }
        if self.amount2 == 0 {
            self.amount2 = share_of(net, self.percentage2);
        }
    }
}

fn share_of(net: i64, percentage: f64) -> i64 {
    (net as f64 * percentage / 100.0).round() as i64
}

impl Quotation {
    /// Refresh every derived amount from the two rate schedules.
    pub fn recompute(&mut self) {
        let standard = RateSummary::from_schedule(&self.standard_rates);
        let signature = RateSummary::from_schedule(&self.signature_rates);

        self.standard_total = standard.total;
        self.standard_gst = standard.gst;
        self.standard_net = standard.net;
        self.signature_total = signature.total;
        self.signature_gst = signature.gst;
        self.signature_net = signature.net;

        self.payment_terms.fill_missing_amounts(signature.net);

        self.base_price = signature.total;
        self.installation_cost = 0;
        self.tax = signature.gst;
        self.total_amount = signature.net;
    }
}

/// Indian-grouped rupee amount without fraction digits: `₹14,40,000`.
pub fn format_inr(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let grouped = if digits.len() <= 3 {
        digits
    } else {
        let (head, tail) = digits.split_at(digits.len() - 3);
        let mut groups: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 0 {
            let start = end.saturating_sub(2);
            groups.push(&head[start..end]);
            end = start;
        }
        groups.reverse();
        format!("{},{}", groups.join(","), tail)
    };
    if amount < 0 {
        format!("-₹{}", grouped)
    } else {
        format!("₹{}", grouped)
    }
}

/// Quotation date as printed on the cover: `05 Jan 2025`.
pub fn format_quote_date(date: NaiveDate) -> String {
    date.format("%d %b %Y").to_string()
}

/// Cost table cell for the standard tier.
pub fn standard_cell(amount: i64) -> String {
    if amount == 0 {
        "-".to_string()
    } else {
        format_inr(amount)
    }
}

/// Cost table cell for the signature tier.
pub fn signature_cell(line: CostLine, amount: i64) -> String {
    match amount {
        0 if line.included_when_free() => "Included".to_string(),
        _ => format_inr(amount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_schedule_totals() {
        let standard = RateSummary::from_schedule(&RateSchedule::standard_default());
        assert_eq!(standard.total, 1_937_000);
        assert_eq!(standard.gst, 348_660);
        assert_eq!(standard.net, 2_285_660);

        let signature = RateSummary::from_schedule(&RateSchedule::signature_default());
        assert_eq!(signature.total, 1_440_000);
        assert_eq!(signature.gst, 259_200);
        assert_eq!(signature.net, 1_699_200);
    }

    #[test]
    fn test_gst_rounds_half_up() {
        assert_eq!(gst_for(0), 0);
        assert_eq!(gst_for(25), 5); // 4.5
        assert_eq!(gst_for(12), 2); // 2.16
        assert_eq!(gst_for(1_000_003), 180_001); // 180000.54
    }

    #[test]
    fn test_payment_split() {
        let terms = PaymentTerms::split(1_699_200, 50.0, 50.0);
        assert_eq!(terms.amount1, 849_600);
        assert_eq!(terms.amount2, 849_600);

        let mut partial = PaymentTerms {
            percentage1: 40.0,
            amount1: 500_000,
            percentage2: 60.0,
            amount2: 0,
        };
        partial.fill_missing_amounts(1_000_000);
        assert_eq!(partial.amount1, 500_000);
        assert_eq!(partial.amount2, 600_000);
    }

    #[test]
    fn test_format_inr() {
        assert_eq!(format_inr(0), "₹0");
        assert_eq!(format_inr(999), "₹999");
        assert_eq!(format_inr(1_000), "₹1,000");
        assert_eq!(format_inr(100_000), "₹1,00,000");
        assert_eq!(format_inr(1_440_000), "₹14,40,000");
        assert_eq!(format_inr(12_345_678), "₹1,23,45,678");
        assert_eq!(format_inr(-2_500), "-₹2,500");
    }

    #[test]
    fn test_format_quote_date() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        assert_eq!(format_quote_date(date), "05 Jan 2025");
    }

    #[test]
    fn test_cells() {
        assert_eq!(standard_cell(0), "-");
        assert_eq!(standard_cell(60_000), "₹60,000");
        assert_eq!(signature_cell(CostLine::Installation, 0), "Included");
        assert_eq!(signature_cell(CostLine::ShaftMasonry, 0), "₹0");
        assert_eq!(signature_cell(CostLine::AdvancedFeatures, 0), "₹0");
        assert_eq!(signature_cell(CostLine::BasicCost, 1_440_000), "₹14,40,000");
    }

    #[test]
    fn test_schedule_wire_keys() {
        let value = serde_json::to_value(RateSchedule::standard_default()).unwrap();
        for line in CostLine::ALL {
            assert!(value.get(line.key()).is_some(), "missing key {}", line.key());
        }
        assert_eq!(value["multiColorLED"], json!(25_000));

        let parsed: RateSchedule =
            serde_json::from_value(json!({ "basicCost": "15,00,000", "premiumRALColor": 10 }))
                .unwrap();
        assert_eq!(parsed.basic_cost, 1_500_000);
        assert_eq!(parsed.premium_ral_color, 10);
        assert_eq!(parsed.total(), 1_500_010);
    }
}
