use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::info;

use crate::payroll::dto::{Payslip, SlipEmployee, SlipLine};
use crate::store::{now_iso, PayrollRecord, PayrollStatus, Store, StoreError, UserRecord};

lazy_static! {
    static ref MONTH_RE: Regex = Regex::new(r"^\d{4}-(0[1-9]|1[0-2])$").unwrap();
}

/// Lenient money parsing: numbers pass through, strings lose commas and
/// spaces, anything unparsable becomes 0.0. Kept for wire compatibility.
pub fn parse_money(value: Option<&Value>) -> f64 {
    match value {
        None | Some(Value::Null) => 0.0,
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.replace([',', ' '], "").parse().unwrap_or(0.0),
        Some(other) => other
            .to_string()
            .replace([',', ' '], "")
            .parse()
            .unwrap_or(0.0),
    }
}

/// Strict status parsing for input: empty defers to the existing record.
pub fn parse_status(raw: Option<&str>) -> Result<Option<PayrollStatus>, StoreError> {
    match raw.map(|s| s.trim().to_lowercase()).as_deref() {
        None | Some("") => Ok(None),
        Some("pending") => Ok(Some(PayrollStatus::Pending)),
        Some("in_progress") => Ok(Some(PayrollStatus::InProgress)),
        Some("transferred") => Ok(Some(PayrollStatus::Transferred)),
        Some(_) => Err(StoreError::Validation("Invalid status".into())),
    }
}

#[derive(Debug, Clone)]
pub struct UpsertInput {
    pub month: String,
    pub base_salary: f64,
    pub allowances: f64,
    pub deductions: f64,
    pub status: Option<PayrollStatus>,
    pub notes: String,
}

/// Insert-or-update keyed by month. An existing month keeps its `created_at`
/// and, unless a status was supplied, its status; the written record moves to
/// the front of the history.
pub async fn upsert_record(
    store: &Store,
    user_id: u32,
    input: UpsertInput,
) -> Result<PayrollRecord, StoreError> {
    if !MONTH_RE.is_match(&input.month) {
        return Err(StoreError::Validation(
            "Invalid month format (expected YYYY-MM)".into(),
        ));
    }

    let net_salary = input.base_salary + input.allowances - input.deductions;
    let (_, record) = store
        .with_user_mut(user_id, move |user| {
            let now = now_iso();
            let previous = user
                .payroll_history
                .iter()
                .position(|r| r.month == input.month)
                .map(|idx| user.payroll_history.remove(idx));

            let record = PayrollRecord {
                month: input.month,
                base_salary: input.base_salary,
                allowances: input.allowances,
                deductions: input.deductions,
                net_salary,
                status: match (&previous, input.status) {
                    (_, Some(status)) => status,
                    (Some(old), None) => old.status,
                    (None, None) => PayrollStatus::Pending,
                },
                notes: input.notes,
                created_at: previous
                    .as_ref()
                    .map(|old| old.created_at.clone())
                    .unwrap_or_else(|| now.clone()),
                updated_at: now,
            };

            user.payroll_history.insert(0, record.clone());
            Ok(record)
        })
        .await?;

    info!(user_id, month = %record.month, "payroll record upserted");
    Ok(record)
}

pub async fn history(store: &Store, user_id: u32) -> Result<Vec<PayrollRecord>, StoreError> {
    let user = store
        .user_by_id(user_id)
        .await?
        .ok_or(StoreError::NotFound)?;
    Ok(user.payroll_history)
}

/// `Ok(None)` means the user exists but has no record for that month.
pub async fn record_for_month(
    store: &Store,
    user_id: u32,
    month: &str,
) -> Result<Option<PayrollRecord>, StoreError> {
    Ok(history(store, user_id)
        .await?
        .into_iter()
        .find(|r| r.month == month))
}

pub fn compose_slip(user: &UserRecord, record: &PayrollRecord) -> Payslip {
    let name = if user.full_name.is_empty() {
        user.username.clone()
    } else {
        user.full_name.clone()
    };
    Payslip {
        title: "Slip Gaji (Payroll Slip)".into(),
        employee: SlipEmployee {
            id: user.id,
            name,
            department: user.department.clone(),
            position: user.position.clone(),
        },
        month: record.month.clone(),
        lines: vec![
            SlipLine {
                label: "Gaji Pokok".into(),
                amount: record.base_salary,
            },
            SlipLine {
                label: "Tunjangan".into(),
                amount: record.allowances,
            },
            SlipLine {
                label: "Potongan".into(),
                amount: record.deductions,
            },
            SlipLine {
                label: "Total Diterima".into(),
                amount: record.net_salary,
            },
        ],
        net_salary: record.net_salary,
        notes: (!record.notes.is_empty()).then(|| record.notes.clone()),
        filename: format!("slip-gaji-{}-{}", user.username, record.month),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryBackend, NewUser};
    use serde_json::json;
    use std::sync::Arc;

    fn mem_store() -> Store {
        Store::new(Arc::new(MemoryBackend::default()))
    }

    async fn store_with_user() -> (Store, u32) {
        let store = mem_store();
        let user = store
            .create_user(NewUser {
                username: "emp".into(),
                email: "emp@x.com".into(),
                password: "pw".into(),
                full_name: "Employee One".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        (store, user.id)
    }

    fn input(month: &str, base: f64, allowances: f64, deductions: f64) -> UpsertInput {
        UpsertInput {
            month: month.into(),
            base_salary: base,
            allowances,
            deductions,
            status: None,
            notes: String::new(),
        }
    }

    #[test]
    fn parse_money_cases() {
        assert_eq!(parse_money(Some(&json!(1200.5))), 1200.5);
        assert_eq!(parse_money(Some(&json!(1000))), 1000.0);
        assert_eq!(parse_money(Some(&json!("1,200.50"))), 1200.5);
        assert_eq!(parse_money(Some(&json!(" 900 "))), 900.0);
        assert_eq!(parse_money(Some(&json!("garbage"))), 0.0);
        assert_eq!(parse_money(Some(&json!(true))), 0.0);
        assert_eq!(parse_money(Some(&json!(null))), 0.0);
        assert_eq!(parse_money(None), 0.0);
    }

    #[test]
    fn parse_status_cases() {
        assert_eq!(parse_status(None).unwrap(), None);
        assert_eq!(parse_status(Some("")).unwrap(), None);
        assert_eq!(parse_status(Some("  ")).unwrap(), None);
        assert_eq!(
            parse_status(Some("Pending")).unwrap(),
            Some(PayrollStatus::Pending)
        );
        assert_eq!(
            parse_status(Some("transferred")).unwrap(),
            Some(PayrollStatus::Transferred)
        );
        assert!(parse_status(Some("done")).is_err());
    }

    #[tokio::test]
    async fn upsert_computes_net_and_defaults_status() {
        let (store, id) = store_with_user().await;
        let record = upsert_record(&store, id, input("2024-01", 1000.0, 100.0, 50.0))
            .await
            .unwrap();
        assert_eq!(record.net_salary, 1050.0);
        assert_eq!(record.status, PayrollStatus::Pending);
        assert_eq!(record.created_at, record.updated_at);
    }

    #[tokio::test]
    async fn upsert_same_month_preserves_created_at_and_overrides_status() {
        let (store, id) = store_with_user().await;
        let first = upsert_record(&store, id, input("2024-01", 1000.0, 100.0, 50.0))
            .await
            .unwrap();

        let mut second_input = input("2024-01", 1000.0, 100.0, 50.0);
        second_input.status = Some(PayrollStatus::Transferred);
        let second = upsert_record(&store, id, second_input).await.unwrap();

        assert_eq!(second.net_salary, first.net_salary);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.status, PayrollStatus::Transferred);

        // empty status on a later update keeps the stored one
        let third = upsert_record(&store, id, input("2024-01", 1200.0, 0.0, 0.0))
            .await
            .unwrap();
        assert_eq!(third.status, PayrollStatus::Transferred);
        assert_eq!(third.net_salary, 1200.0);
        assert_eq!(third.created_at, first.created_at);

        // only one record per month
        assert_eq!(history(&store, id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn updated_record_moves_to_front_rest_keep_order() {
        let (store, id) = store_with_user().await;
        upsert_record(&store, id, input("2024-01", 1.0, 0.0, 0.0))
            .await
            .unwrap();
        upsert_record(&store, id, input("2024-02", 2.0, 0.0, 0.0))
            .await
            .unwrap();
        upsert_record(&store, id, input("2024-03", 3.0, 0.0, 0.0))
            .await
            .unwrap();
        upsert_record(&store, id, input("2024-01", 10.0, 0.0, 0.0))
            .await
            .unwrap();

        let months: Vec<String> = history(&store, id)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.month)
            .collect();
        assert_eq!(months, vec!["2024-01", "2024-03", "2024-02"]);
    }

    #[tokio::test]
    async fn bad_month_and_missing_user_are_errors() {
        let (store, id) = store_with_user().await;
        let err = upsert_record(&store, id, input("January", 1.0, 0.0, 0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        let err = upsert_record(&store, 99, input("2024-01", 1.0, 0.0, 0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));

        let err = history(&store, 99).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn record_for_month_distinguishes_missing_record_from_missing_user() {
        let (store, id) = store_with_user().await;
        upsert_record(&store, id, input("2024-01", 1.0, 0.0, 0.0))
            .await
            .unwrap();

        assert!(record_for_month(&store, id, "2024-01")
            .await
            .unwrap()
            .is_some());
        assert!(record_for_month(&store, id, "2024-02")
            .await
            .unwrap()
            .is_none());
        assert!(matches!(
            record_for_month(&store, 99, "2024-01").await.unwrap_err(),
            StoreError::NotFound
        ));
    }

    #[tokio::test]
    async fn slip_reflects_the_stored_record() {
        let (store, id) = store_with_user().await;
        let record = upsert_record(&store, id, {
            let mut i = input("2024-02", 1000.0, 250.0, 100.0);
            i.notes = "bonus month".into();
            i
        })
        .await
        .unwrap();

        let user = store.user_by_id(id).await.unwrap().unwrap();
        let slip = compose_slip(&user, &record);

        assert_eq!(slip.employee.name, "Employee One");
        assert_eq!(slip.month, "2024-02");
        assert_eq!(slip.net_salary, 1150.0);
        assert_eq!(slip.lines.len(), 4);
        assert_eq!(slip.lines[3].amount, 1150.0);
        assert_eq!(slip.notes.as_deref(), Some("bonus month"));
        assert_eq!(slip.filename, "slip-gaji-emp-2024-02");
    }
}
