//! Record types for every collection the CRM stores.
//!
//! Field names serialize in camelCase to match the frontend. Records that
//! arrive from forms use the tolerant helpers in [`crate::util::lenient`]
//! for numbers and dates.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::permissions::{Permission, Role};
use crate::pricing::{PaymentTerms, RateSchedule};
use crate::util::{lenient, today};

/// String-valued enum whose wire form is a display label ("On Track").
macro_rules! labeled_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            pub fn parse(raw: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|v| v.as_str() == raw)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident => $label:literal),+ $(,)? } default $default:ident
    ) => {
        labeled_enum! {
            $(#[$meta])*
            pub enum $name { $($variant => $label),+ }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Leads
// ---------------------------------------------------------------------------

labeled_enum! {
    /// Sales funnel position of a lead, in pipeline order.
    pub enum LeadStage {
        NewLead => "New Lead",
        LeadContacted => "Lead Contacted",
        MeetingScheduled => "Meeting Scheduled",
        MeetingCompleted => "Meeting Completed",
        QuotationSent => "Quotation Sent",
        ManagerDeliberation => "Manager Deliberation",
        OrderClosed => "Order Closed",
        OrderLost => "Order Lost",
    } default NewLead
}

impl LeadStage {
    /// Map a client-supplied stage onto the pipeline.
    ///
    /// Exact labels win, then case-insensitive labels, then the names older
    /// clients used. Anything else starts the lead at the beginning.
    pub fn normalize(raw: &str) -> LeadStage {
        if let Some(stage) = LeadStage::parse(raw) {
            return stage;
        }
        let lowered = raw.trim().to_lowercase();
        if let Some(stage) = LeadStage::ALL
            .iter()
            .copied()
            .find(|s| s.as_str().to_lowercase() == lowered)
        {
            return stage;
        }
        match lowered.as_str() {
            "new" => LeadStage::NewLead,
            "contacted" => LeadStage::LeadContacted,
            "follow-up" => LeadStage::MeetingScheduled,
            "quotation sent" => LeadStage::QuotationSent,
            "negotiation" => LeadStage::ManagerDeliberation,
            "won" => LeadStage::OrderClosed,
            "lost" => LeadStage::OrderLost,
            _ => LeadStage::NewLead,
        }
    }
}

fn default_source() -> String {
    "Website".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub company: String,
    pub email: String,
    pub phone: String,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub stage: LeadStage,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub value: f64,
    pub assigned_to: String,
    #[serde(default = "today", deserialize_with = "lenient::date_or_today")]
    pub last_contact: NaiveDate,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_report: Option<ContactReport>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lead fields accepted on create. Everything is optional so that missing
/// required fields can be reported together.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadInput {
    #[serde(default)]
    pub lead_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub value: Option<f64>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_date")]
    pub last_contact: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub contact_report: Option<ContactReport>,
}

/// Structured notes from the first call with a lead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactReport {
    pub contact_confirmation: ContactConfirmation,
    pub contact_details: ContactDetails,
    pub property_details: PropertyDetails,
    pub site_readiness: SiteReadiness,
    pub elevator_preference: ElevatorPreference,
    pub client_intent: ClientIntent,
    pub next_action: NextAction,
    pub sales_owner: SalesOwner,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactConfirmation {
    pub successful: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactDetails {
    pub mode: String,
    pub date_time: Option<String>,
    pub spoken_to: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertyDetails {
    #[serde(rename = "type")]
    pub property_type: String,
    pub floors: String,
    pub usage: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteReadiness {
    pub pit_available: String,
    pub pit_depth: String,
    pub shaft_available: String,
    pub shaft_type: String,
    pub shaft_size: String,
    pub machine_room: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElevatorPreference {
    #[serde(rename = "type")]
    pub elevator_type: String,
    pub brand: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientIntent {
    pub interest_level: String,
    pub budget: String,
    pub timeline: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NextAction {
    #[serde(rename = "type")]
    pub action_type: String,
    pub meeting_time: String,
    pub follow_up_date: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SalesOwner {
    pub name: String,
    pub remarks: String,
}

// ---------------------------------------------------------------------------
// Quotations
// ---------------------------------------------------------------------------

labeled_enum! {
    pub enum QuotationStatus {
        Pending => "Pending",
        Approved => "Approved",
        Rejected => "Rejected",
    } default Pending
}

pub const DEFAULT_MODEL_NUMBER: &str = "KAS-GX630";
pub const DEFAULT_TIME_OF_DELIVERY: &str =
    "3 months from customer's confirmation of drawings and finishes.";

fn default_model_number() -> String {
    DEFAULT_MODEL_NUMBER.to_string()
}
fn default_shaft_type() -> String {
    "G S".to_string()
}
fn default_application() -> String {
    "Outdoor".to_string()
}
fn default_cabin_type() -> String {
    "Standard".to_string()
}
fn default_door_type() -> String {
    "Automatic Door".to_string()
}
fn default_time_of_delivery() -> String {
    DEFAULT_TIME_OF_DELIVERY.to_string()
}
fn default_version() -> u32 {
    1
}

/// A priced offer for one lead. Derived totals are refreshed by
/// [`Quotation::recompute`] before every write.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    pub id: String,
    pub lead_id: String,
    pub lead_name: String,
    #[serde(default)]
    pub project_address: String,
    #[serde(default)]
    pub contact_number: String,

    pub elevator_type: String,
    #[serde(default = "default_model_number")]
    pub model_number: String,
    #[serde(deserialize_with = "lenient::i64_or_zero")]
    pub floors: i64,
    #[serde(deserialize_with = "lenient::i64_or_zero")]
    pub capacity: i64,
    #[serde(deserialize_with = "lenient::f64_or_zero")]
    pub speed: f64,
    #[serde(default = "default_shaft_type")]
    pub shaft_type: String,
    #[serde(default = "default_application")]
    pub application: String,
    #[serde(default = "default_cabin_type")]
    pub cabin_type: String,
    #[serde(default = "default_door_type")]
    pub door_type: String,
    #[serde(default)]
    pub features: Vec<String>,

    #[serde(default = "RateSchedule::standard_default")]
    pub standard_rates: RateSchedule,
    #[serde(default = "RateSchedule::signature_default")]
    pub signature_rates: RateSchedule,
    #[serde(default)]
    pub standard_total: i64,
    #[serde(default, rename = "standardGST")]
    pub standard_gst: i64,
    #[serde(default)]
    pub standard_net: i64,
    #[serde(default)]
    pub signature_total: i64,
    #[serde(default, rename = "signatureGST")]
    pub signature_gst: i64,
    #[serde(default)]
    pub signature_net: i64,

    #[serde(default = "default_time_of_delivery")]
    pub time_of_delivery: String,
    #[serde(default)]
    pub payment_terms: PaymentTerms,

    #[serde(default)]
    pub base_price: i64,
    #[serde(default)]
    pub installation_cost: i64,
    #[serde(default)]
    pub tax: i64,
    #[serde(default)]
    pub total_amount: i64,

    #[serde(default)]
    pub status: QuotationStatus,
    pub valid_until: NaiveDate,
    #[serde(default = "default_version")]
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

labeled_enum! {
    /// Installation pipeline, in order.
    pub enum ProjectStage {
        FirstTechnicalVisit => "First Technical Visit",
        DrawingsPrepared => "Drawings Prepared",
        ClientConfirmationOfDrawings => "Client Confirmation of Drawings",
        InteriorSelection => "Interior Selection",
        MovedToFactory => "Moved to Factory",
        ReadyForDispatch => "Ready for Dispatch",
        InstallationTeamScheduled => "Installation Team Scheduled",
        InstallationInProgress => "Installation in Progress",
        TestingAndFinalHandover => "Testing & Final Handover",
    } default FirstTechnicalVisit
}

impl ProjectStage {
    /// Completion percentage for a project sitting at this stage.
    pub fn progress(&self) -> u8 {
        let index = Self::ALL.iter().position(|s| s == self).unwrap_or(0);
        let pct = ((index + 1) as f64 / Self::ALL.len() as f64 * 100.0).round();
        pct.clamp(0.0, 100.0) as u8
    }
}

labeled_enum! {
    /// Schedule health of a project.
    pub enum ProjectHealth {
        OnTrack => "On Track",
        Delayed => "Delayed",
        OnHold => "On Hold",
    } default OnTrack
}

labeled_enum! {
    pub enum ProjectType {
        NewInstallation => "New Installation",
        Modernization => "Modernization",
    }
}

labeled_enum! {
    pub enum ProjectStatus {
        Planning => "Planning",
        InProgress => "In Progress",
        OnHold => "On Hold",
        Completed => "Completed",
    } default Planning
}

labeled_enum! {
    pub enum LiftType {
        Mrl => "MRL",
        Hydraulic => "Hydraulic",
        Gearless => "Gearless",
    }
}

labeled_enum! {
    pub enum ShaftStatus {
        Ready => "Ready",
        UnderConstruction => "Under Construction",
    }
}

labeled_enum! {
    pub enum ProjectPaymentStatus {
        Paid => "Paid",
        Partial => "Partial",
        Pending => "Pending",
    } default Pending
}

labeled_enum! {
    pub enum TaskStatus {
        Pending => "Pending",
        InProgress => "In Progress",
        Completed => "Completed",
    } default Pending
}

labeled_enum! {
    pub enum IssueType {
        MaterialDelay => "Material Delay",
        CivilWorkPending => "Civil Work Pending",
        PaymentDelay => "Payment Delay",
        Other => "Other",
    }
}

labeled_enum! {
    pub enum IssueStatus {
        Open => "Open",
        InProgress => "In Progress",
        Resolved => "Resolved",
    } default Open
}

labeled_enum! {
    pub enum DocumentType {
        PurchaseOrder => "Purchase Order",
        Drawings => "Drawings",
        TestCertificates => "Test Certificates",
        HandoverDocuments => "Handover Documents",
        Photos => "Photos",
        Videos => "Videos",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectIssue {
    pub description: String,
    pub issue_type: IssueType,
    #[serde(default = "today", deserialize_with = "lenient::date_or_today")]
    pub raised_date: NaiveDate,
    #[serde(default, deserialize_with = "lenient::opt_date")]
    pub expected_resolution_date: Option<NaiveDate>,
    #[serde(default)]
    pub current_status: IssueStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDocument {
    #[serde(rename = "type")]
    pub document_type: DocumentType,
    pub file_name: String,
    pub file_url: String,
    #[serde(default = "today", deserialize_with = "lenient::date_or_today")]
    pub uploaded_date: NaiveDate,
}

/// The optional sections of a project record: basic details, technical
/// details, commercials, installation tracking, team, issues, handover and
/// documents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetails {
    // Basic details
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub project_type: Option<ProjectType>,
    #[serde(default)]
    pub site_address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub sales_person_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_date")]
    pub order_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::opt_date")]
    pub expected_completion_date: Option<NaiveDate>,
    #[serde(default)]
    pub project_status: ProjectStatus,

    // Lift / technical
    #[serde(default)]
    pub lift_type: Option<LiftType>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub number_of_lifts: Option<i64>,
    #[serde(default)]
    pub capacity: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub number_of_stops: Option<i64>,
    #[serde(default)]
    pub speed: Option<String>,
    #[serde(default)]
    pub door_type: Option<String>,
    #[serde(default)]
    pub power_requirement: Option<String>,
    #[serde(default)]
    pub shaft_status: Option<ShaftStatus>,

    // Commercial
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub order_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub advance_amount_received: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub balance_amount: Option<f64>,
    #[serde(default)]
    pub payment_milestones: Vec<String>,
    #[serde(default)]
    pub invoice_numbers: Vec<String>,
    #[serde(default)]
    pub gst_details: Option<String>,
    #[serde(default)]
    pub payment_status: ProjectPaymentStatus,

    // Installation tracking
    #[serde(default, deserialize_with = "lenient::opt_date")]
    pub material_dispatch_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::opt_date")]
    pub material_received_date: Option<NaiveDate>,
    #[serde(default)]
    pub machine_installation_status: TaskStatus,
    #[serde(default)]
    pub guide_rail_installation: TaskStatus,
    #[serde(default)]
    pub wiring_electrical_work: TaskStatus,
    #[serde(default)]
    pub cabin_installation: TaskStatus,
    #[serde(default)]
    pub door_installation: TaskStatus,
    #[serde(default)]
    pub testing_commissioning: TaskStatus,
    #[serde(default)]
    pub safety_inspection_status: TaskStatus,
    #[serde(default)]
    pub government_approval: Option<String>,

    // Team
    #[serde(default)]
    pub site_engineer_name: Option<String>,
    #[serde(default)]
    pub installation_technician: Option<String>,
    #[serde(default)]
    pub supervisor: Option<String>,
    #[serde(default)]
    pub contact_numbers: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_date")]
    pub assigned_date: Option<NaiveDate>,

    #[serde(default)]
    pub issues: Vec<ProjectIssue>,

    // Handover & closure
    #[serde(default, deserialize_with = "lenient::opt_date")]
    pub installation_completion_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::opt_date")]
    pub handover_date: Option<NaiveDate>,
    #[serde(default)]
    pub client_sign_off: bool,
    #[serde(default, deserialize_with = "lenient::opt_date")]
    pub warranty_start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::opt_date")]
    pub warranty_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub amc_offered: bool,
    #[serde(default)]
    pub amc_linked: Option<String>,

    #[serde(default)]
    pub documents: Vec<ProjectDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub project_name: String,
    pub customer_name: String,
    pub quotation_id: String,
    pub location: String,
    pub elevator_type: String,
    #[serde(default)]
    pub current_stage: ProjectStage,
    #[serde(default = "today", deserialize_with = "lenient::date_or_today")]
    pub start_date: NaiveDate,
    #[serde(default = "today", deserialize_with = "lenient::date_or_today")]
    pub expected_completion: NaiveDate,
    #[serde(default)]
    pub progress: u8,
    pub assigned_engineer: String,
    #[serde(default)]
    pub status: ProjectHealth,
    #[serde(flatten)]
    pub details: ProjectDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Project fields accepted on create, before fallbacks are applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInput {
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub quotation_id: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub elevator_type: Option<String>,
    #[serde(default)]
    pub current_stage: Option<ProjectStage>,
    #[serde(default, deserialize_with = "lenient::opt_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::opt_date")]
    pub expected_completion: Option<NaiveDate>,
    #[serde(default)]
    pub assigned_engineer: Option<String>,
    #[serde(default)]
    pub status: Option<ProjectHealth>,
    #[serde(flatten)]
    pub details: ProjectDetails,
}

// ---------------------------------------------------------------------------
// AMC contracts
// ---------------------------------------------------------------------------

labeled_enum! {
    pub enum AmcStatus {
        Active => "Active",
        Expired => "Expired",
        PendingRenewal => "Pending Renewal",
    } default Active
}

labeled_enum! {
    pub enum AmcType {
        Comprehensive => "Comprehensive",
        NonComprehensive => "Non-Comprehensive",
    }
}

labeled_enum! {
    pub enum AmountType {
        Yearly => "Yearly",
        Monthly => "Monthly",
    }
}

labeled_enum! {
    pub enum AmcPaymentStatus {
        Paid => "Paid",
        Pending => "Pending",
        Overdue => "Overdue",
    }
}

labeled_enum! {
    pub enum PaymentMode {
        Cash => "Cash",
        Upi => "UPI",
        BankTransfer => "Bank Transfer",
        Cheque => "Cheque",
    }
}

/// Annual maintenance contract on an installed elevator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmcContract {
    pub id: String,
    #[serde(default)]
    pub contract_id: Option<String>,
    pub customer_name: String,
    #[serde(default)]
    pub elevator_name: Option<String>,
    #[serde(default)]
    pub amc_type: Option<AmcType>,
    pub project_name: String,
    pub elevator_id: String,
    #[serde(default = "today", deserialize_with = "lenient::date_or_today")]
    pub contract_start_date: NaiveDate,
    #[serde(default = "today", deserialize_with = "lenient::date_or_today")]
    pub contract_end_date: NaiveDate,
    #[serde(deserialize_with = "lenient::f64_or_zero")]
    pub duration: f64,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub amc_amount: Option<f64>,
    #[serde(default)]
    pub amount_type: Option<AmountType>,
    #[serde(default)]
    pub payment_status: Option<AmcPaymentStatus>,
    #[serde(default)]
    pub payment_mode: Option<PaymentMode>,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_date")]
    pub invoice_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub gst_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub net_revenue: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_date")]
    pub next_payment_due_date: Option<NaiveDate>,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default = "today", deserialize_with = "lenient::date_or_today")]
    pub next_service_date: NaiveDate,
    pub service_frequency: String,
    pub assigned_technician: String,
    #[serde(default)]
    pub status: AmcStatus,
    #[serde(deserialize_with = "lenient::f64_or_zero")]
    pub total_value: f64,
    #[serde(default, deserialize_with = "lenient::i64_or_zero")]
    pub services_completed: i64,
    #[serde(default, deserialize_with = "lenient::i64_or_zero")]
    pub services_pending: i64,
    #[serde(default)]
    pub month_wise_revenue: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub year_wise_revenue: Option<BTreeMap<String, f64>>,
    #[serde(default, rename = "totalAMCIncome", deserialize_with = "lenient::opt_f64")]
    pub total_amc_income: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub pending_amount: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

labeled_enum! {
    pub enum UserStatus {
        Active => "Active",
        Inactive => "Inactive",
        Pending => "Pending",
    } default Pending
}

/// A staff account. The password digest never leaves the store layer in
/// serialized form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub role: Role,
    pub permissions: Vec<Permission>,
    pub status: UserStatus,
    pub last_login: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn has_permission(&self, required: Permission) -> bool {
        crate::permissions::has(self.role, &self.permissions, required)
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Demo,
    Quotation,
    Project,
    Amc,
    Lead,
    Contact,
    Signup,
    #[default]
    System,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Demo => "demo",
            NotificationType::Quotation => "quotation",
            NotificationType::Project => "project",
            NotificationType::Amc => "amc",
            NotificationType::Lead => "lead",
            NotificationType::Contact => "contact",
            NotificationType::Signup => "signup",
            NotificationType::System => "system",
        }
    }
}

impl std::str::FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "demo" => Ok(NotificationType::Demo),
            "quotation" => Ok(NotificationType::Quotation),
            "project" => Ok(NotificationType::Project),
            "amc" => Ok(NotificationType::Amc),
            "lead" => Ok(NotificationType::Lead),
            "contact" => Ok(NotificationType::Contact),
            "signup" => Ok(NotificationType::Signup),
            "system" => Ok(NotificationType::System),
            _ => Err(format!("Unknown notification type: {}", s)),
        }
    }
}

/// In-app notification. `user_id == None` means every user sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: Option<String>,
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub related_id: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Website submissions and blog posts
// ---------------------------------------------------------------------------

labeled_enum! {
    pub enum ContactStatus {
        New => "New",
        Read => "Read",
        Replied => "Replied",
    } default New
}

labeled_enum! {
    pub enum DemoStatus {
        Pending => "Pending",
        Contacted => "Contacted",
        Completed => "Completed",
    } default Pending
}

/// Message left through the public contact form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub subject: String,
    pub message: String,
    #[serde(default)]
    pub status: ContactStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Demo request left through the public website.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoRequest {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub elevator_type: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: DemoStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub author: String,
    pub category: String,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_review_url: Option<String>,
    pub published: bool,
    pub views: i64,
    /// Display date, e.g. "January 5, 2025".
    pub date: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lead_stage_normalize() {
        assert_eq!(LeadStage::normalize("Quotation Sent"), LeadStage::QuotationSent);
        assert_eq!(LeadStage::normalize("order closed"), LeadStage::OrderClosed);
        assert_eq!(LeadStage::normalize("won"), LeadStage::OrderClosed);
        assert_eq!(LeadStage::normalize("Negotiation"), LeadStage::ManagerDeliberation);
        assert_eq!(LeadStage::normalize("follow-up"), LeadStage::MeetingScheduled);
        assert_eq!(LeadStage::normalize("lost"), LeadStage::OrderLost);
        assert_eq!(LeadStage::normalize("something else"), LeadStage::NewLead);
    }

    #[test]
    fn test_project_stage_progress() {
        let progress: Vec<u8> = ProjectStage::ALL.iter().map(|s| s.progress()).collect();
        assert_eq!(progress, vec![11, 22, 33, 44, 56, 67, 78, 89, 100]);
    }

    #[test]
    fn test_labeled_enum_serde() {
        assert_eq!(
            serde_json::to_value(ProjectHealth::OnTrack).unwrap(),
            json!("On Track")
        );
        let stage: ProjectStage = serde_json::from_value(json!("Testing & Final Handover")).unwrap();
        assert_eq!(stage, ProjectStage::TestingAndFinalHandover);
        assert!(serde_json::from_value::<ProjectStage>(json!("Painting")).is_err());
        assert_eq!(PaymentMode::parse("UPI"), Some(PaymentMode::Upi));
    }

    #[test]
    fn test_project_details_flatten_round_trip() {
        let project: Project = serde_json::from_value(json!({
            "id": "p1",
            "projectName": "Villa Lift",
            "customerName": "Ravi",
            "quotationId": "q1",
            "location": "Hyderabad",
            "elevatorType": "Passenger Elevator",
            "startDate": "2025-01-05",
            "expectedCompletion": "2025-04-05T00:00:00.000Z",
            "assignedEngineer": "Kiran",
            "liftType": "MRL",
            "orderValue": "12,50,000",
            "issues": [{ "description": "Late steel", "issueType": "Material Delay" }],
            "createdAt": "2025-01-05T10:00:00Z",
            "updatedAt": "2025-01-05T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(project.details.lift_type, Some(LiftType::Mrl));
        assert_eq!(project.details.order_value, Some(1_250_000.0));
        assert_eq!(project.details.project_status, ProjectStatus::Planning);
        assert_eq!(project.details.issues[0].current_status, IssueStatus::Open);
        assert_eq!(
            project.expected_completion,
            NaiveDate::from_ymd_opt(2025, 4, 5).unwrap()
        );

        let value = serde_json::to_value(&project).unwrap();
        assert_eq!(value["liftType"], json!("MRL"));
        assert_eq!(value["currentStage"], json!("First Technical Visit"));
        assert_eq!(value["paymentStatus"], json!("Pending"));
    }

    #[test]
    fn test_user_serialization_hides_password() {
        let user = User {
            id: "u1".into(),
            name: "Asha".into(),
            email: "asha@kas.test".into(),
            password_hash: "secret".into(),
            role: Role::SalesExecutive,
            permissions: vec![Permission::LeadsView],
            status: UserStatus::Active,
            last_login: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("passwordHash").is_none());
        assert_eq!(value["role"], json!("Sales Executive"));
        assert_eq!(value["permissions"], json!(["leads:view"]));
    }
}
