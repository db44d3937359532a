use serde::{Deserialize, Serialize};

use crate::store::PayrollRecord;

/// Upsert body. Money fields arrive as raw JSON because clients send both
/// numbers and formatted strings like `"1,200.50"`.
#[derive(Debug, Deserialize)]
pub struct UpsertRequest {
    pub month: Option<String>,
    #[serde(default)]
    pub base_salary: Option<serde_json::Value>,
    #[serde(default)]
    pub allowances: Option<serde_json::Value>,
    #[serde(default)]
    pub deductions: Option<serde_json::Value>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub payroll_history: Vec<PayrollRecord>,
}

#[derive(Debug, Serialize)]
pub struct UpsertResponse {
    pub success: bool,
    pub record: PayrollRecord,
}

#[derive(Debug, Deserialize)]
pub struct SlipQuery {
    pub month: Option<String>,
}

/// Composed payslip. Rendering (PDF or otherwise) happens client-side; this
/// is the document content the original slip lays out.
#[derive(Debug, Serialize)]
pub struct Payslip {
    pub title: String,
    pub employee: SlipEmployee,
    pub month: String,
    pub lines: Vec<SlipLine>,
    pub net_salary: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct SlipEmployee {
    pub id: u32,
    pub name: String,
    pub department: String,
    pub position: String,
}

#[derive(Debug, Serialize)]
pub struct SlipLine {
    pub label: String,
    pub amount: f64,
}
