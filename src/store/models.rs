use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// The whole persisted document: `{"users": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub users: Vec<UserRecord>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "admin" => Role::Admin,
            // Anything unrecognized in stored data degrades to a regular user.
            _ => Role::User,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum PayrollStatus {
    #[default]
    Pending,
    InProgress,
    Transferred,
}

impl From<String> for PayrollStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "in_progress" => PayrollStatus::InProgress,
            "transferred" => PayrollStatus::Transferred,
            _ => PayrollStatus::Pending,
        }
    }
}

fn default_true() -> bool {
    true
}

/// A stored user. Every field that older documents may lack carries a serde
/// default, so a sparse record is backfilled once, at deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: u32,
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    // Records written before verification existed are grandfathered in.
    #[serde(default = "default_true")]
    pub email_verified: bool,
    #[serde(default)]
    pub verification_token: Option<String>,
    #[serde(default)]
    pub verification_sent_at: Option<String>,
    #[serde(default)]
    pub verification_expires_at: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub emergency_contact_name: String,
    #[serde(default)]
    pub emergency_contact_phone: String,
    #[serde(default)]
    pub payroll_history: Vec<PayrollRecord>,
}

/// One month of payroll for a user, keyed by `month` (`YYYY-MM`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayrollRecord {
    pub month: String,
    #[serde(default)]
    pub base_salary: f64,
    #[serde(default)]
    pub allowances: f64,
    #[serde(default)]
    pub deductions: f64,
    #[serde(default)]
    pub net_salary: f64,
    #[serde(default)]
    pub status: PayrollStatus,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

pub fn to_iso(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339).expect("utc timestamp formats as rfc3339")
}

pub fn now_iso() -> String {
    to_iso(OffsetDateTime::now_utc())
}

/// Lenient parse: stored timestamps come from several app generations, so an
/// unparsable value reads as "absent" instead of failing the document.
pub fn parse_iso(raw: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(raw, &Rfc3339).ok()
}
