use crate::models::{Account, Host, Sale, Session, Target, WorkHourDeduction, parse_timestamp};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

const MIN_TARGET_YEAR: i32 = 2020;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{field} must be a date (YYYY-MM-DD) or date-time, got '{value}'")]
    InvalidDate { field: &'static str, value: String },
    #[error("{0} must be greater than 0")]
    NotPositive(&'static str),
    #[error("{0} must not be negative")]
    Negative(&'static str),
    #[error("revenue_end must not be less than revenue_start")]
    RevenueDecreased,
    #[error("month must be between 1 and 12")]
    MonthOutOfRange,
    #[error("year must be 2020 or later")]
    YearOutOfRange,
}

/// Checks a record before it is written.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Request body for creating or partially updating a record. Absent fields
/// leave the stored value untouched.
pub trait Patch {
    type Target: Validate + Default;

    fn merge_into(self, record: &mut Self::Target) -> Result<(), ValidationError>;
}

fn required(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(())
}

fn timestamp(
    raw: String,
    field: &'static str,
) -> Result<chrono::NaiveDateTime, ValidationError> {
    parse_timestamp(&raw).ok_or(ValidationError::InvalidDate { field, value: raw })
}

impl Validate for Host {
    fn validate(&self) -> Result<(), ValidationError> {
        required(&self.name, "name")?;
        if self.mandatory_daily_hours.is_some_and(|hours| hours < 0.0) {
            return Err(ValidationError::Negative("mandatory_daily_hours"));
        }
        Ok(())
    }
}

impl Validate for Account {
    fn validate(&self) -> Result<(), ValidationError> {
        required(&self.name, "name")
    }
}

impl Validate for Sale {
    fn validate(&self) -> Result<(), ValidationError> {
        required(&self.host_id, "host_id")?;
        required(&self.account_id, "account_id")?;
        if self.sale_date.is_none() {
            return Err(ValidationError::Required("sale_date"));
        }
        if self.duration_minutes <= 0 {
            return Err(ValidationError::NotPositive("duration_minutes"));
        }
        if self.revenue_start < 0 {
            return Err(ValidationError::Negative("revenue_start"));
        }
        if self.revenue_end < 0 {
            return Err(ValidationError::Negative("revenue_end"));
        }
        if self.revenue_end < self.revenue_start {
            return Err(ValidationError::RevenueDecreased);
        }
        Ok(())
    }
}

impl Validate for Target {
    fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=12).contains(&self.month) {
            return Err(ValidationError::MonthOutOfRange);
        }
        if self.year < MIN_TARGET_YEAR {
            return Err(ValidationError::YearOutOfRange);
        }
        if self.target_amount <= 0 {
            return Err(ValidationError::NotPositive("target_amount"));
        }
        Ok(())
    }
}

impl Validate for WorkHourDeduction {
    fn validate(&self) -> Result<(), ValidationError> {
        required(&self.host_id, "host_id")?;
        if self.date.is_none() {
            return Err(ValidationError::Required("date"));
        }
        if self.hours <= 0.0 {
            return Err(ValidationError::NotPositive("hours"));
        }
        required(&self.note, "note")
    }
}

// Absent field => None, explicit `null` => Some(None).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize)]
pub struct HostPatch {
    pub name: Option<String>,
    /// `null` clears the quota.
    #[serde(default, deserialize_with = "nullable")]
    pub mandatory_daily_hours: Option<Option<f64>>,
}

impl Patch for HostPatch {
    type Target = Host;

    fn merge_into(self, record: &mut Host) -> Result<(), ValidationError> {
        if let Some(name) = self.name {
            record.name = name.trim().to_string();
        }
        if let Some(hours) = self.mandatory_daily_hours {
            record.mandatory_daily_hours = hours;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AccountPatch {
    pub name: Option<String>,
}

impl Patch for AccountPatch {
    type Target = Account;

    fn merge_into(self, record: &mut Account) -> Result<(), ValidationError> {
        if let Some(name) = self.name {
            record.name = name.trim().to_string();
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SalePatch {
    pub host_id: Option<String>,
    pub account_id: Option<String>,
    pub sale_date: Option<String>,
    pub session: Option<Session>,
    pub duration_minutes: Option<i64>,
    pub revenue_start: Option<i64>,
    pub revenue_end: Option<i64>,
}

impl Patch for SalePatch {
    type Target = Sale;

    fn merge_into(self, record: &mut Sale) -> Result<(), ValidationError> {
        if let Some(host_id) = self.host_id {
            record.host_id = host_id;
        }
        if let Some(account_id) = self.account_id {
            record.account_id = account_id;
        }
        if let Some(raw) = self.sale_date {
            record.sale_date = Some(timestamp(raw, "sale_date")?);
        }
        if let Some(session) = self.session {
            record.session = session;
        }
        if let Some(minutes) = self.duration_minutes {
            record.duration_minutes = minutes;
        }
        if let Some(start) = self.revenue_start {
            record.revenue_start = start;
        }
        if let Some(end) = self.revenue_end {
            record.revenue_end = end;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TargetPatch {
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub target_amount: Option<i64>,
    pub reward_note: Option<String>,
}

impl Patch for TargetPatch {
    type Target = Target;

    fn merge_into(self, record: &mut Target) -> Result<(), ValidationError> {
        if let Some(month) = self.month {
            record.month = month;
        }
        if let Some(year) = self.year {
            record.year = year;
        }
        if let Some(amount) = self.target_amount {
            record.target_amount = amount;
        }
        if let Some(note) = self.reward_note {
            let note = note.trim().to_string();
            record.reward_note = (!note.is_empty()).then_some(note);
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DeductionPatch {
    pub host_id: Option<String>,
    pub date: Option<String>,
    pub hours: Option<f64>,
    pub note: Option<String>,
}

impl Patch for DeductionPatch {
    type Target = WorkHourDeduction;

    fn merge_into(self, record: &mut WorkHourDeduction) -> Result<(), ValidationError> {
        if let Some(host_id) = self.host_id {
            record.host_id = host_id;
        }
        if let Some(raw) = self.date {
            record.date = Some(timestamp(raw, "date")?);
        }
        if let Some(hours) = self.hours {
            record.hours = hours;
        }
        if let Some(note) = self.note {
            record.note = note.trim().to_string();
        }
        Ok(())
    }
}

/// Builds a new record from a patch and validates it.
pub fn build<P: Patch>(patch: P) -> Result<P::Target, ValidationError> {
    let mut record = P::Target::default();
    patch.merge_into(&mut record)?;
    record.validate()?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sale_patch() -> SalePatch {
        SalePatch {
            host_id: Some("h1".into()),
            account_id: Some("k1".into()),
            sale_date: Some("2026-10-19".into()),
            session: Some(Session::Night),
            duration_minutes: Some(120),
            revenue_start: Some(1_000),
            revenue_end: Some(2_500),
        }
    }

    #[test]
    fn valid_sale_builds() {
        let sale = build(sale_patch()).unwrap();
        assert_eq!(sale.net_turnover(), 1_500);
        assert_eq!(sale.session, Session::Night);
        assert!(sale.sale_date.is_some());
    }

    #[test]
    fn sale_rejects_bad_input() {
        let patch = SalePatch { revenue_end: Some(500), ..sale_patch() };
        assert_eq!(build(patch).unwrap_err(), ValidationError::RevenueDecreased);

        let patch = SalePatch { duration_minutes: Some(0), ..sale_patch() };
        assert_eq!(
            build(patch).unwrap_err(),
            ValidationError::NotPositive("duration_minutes")
        );

        let patch = SalePatch { host_id: Some(" ".into()), ..sale_patch() };
        assert_eq!(build(patch).unwrap_err(), ValidationError::Required("host_id"));

        let patch = SalePatch { sale_date: None, ..sale_patch() };
        assert_eq!(build(patch).unwrap_err(), ValidationError::Required("sale_date"));

        let patch = SalePatch { revenue_start: Some(i64::MIN), revenue_end: Some(0), ..sale_patch() };
        assert_eq!(build(patch).unwrap_err(), ValidationError::Negative("revenue_start"));

        let patch = SalePatch { revenue_start: Some(-10), revenue_end: Some(-5), ..sale_patch() };
        assert_eq!(build(patch).unwrap_err(), ValidationError::Negative("revenue_start"));

        let patch = SalePatch { revenue_start: Some(0), revenue_end: Some(-5), ..sale_patch() };
        assert_eq!(build(patch).unwrap_err(), ValidationError::Negative("revenue_end"));

        let patch = SalePatch { sale_date: Some("kemarin".into()), ..sale_patch() };
        assert!(matches!(
            build(patch).unwrap_err(),
            ValidationError::InvalidDate { field: "sale_date", .. }
        ));
    }

    #[test]
    fn partial_merge_keeps_untouched_fields() {
        let mut sale = build(sale_patch()).unwrap();
        SalePatch { revenue_end: Some(9_000), ..SalePatch::default() }
            .merge_into(&mut sale)
            .unwrap();

        assert_eq!(sale.host_id, "h1");
        assert_eq!(sale.revenue_start, 1_000);
        assert_eq!(sale.revenue_end, 9_000);
        assert!(sale.validate().is_ok());
    }

    #[test]
    fn target_rules() {
        let target = |month, year, amount| TargetPatch {
            month: Some(month),
            year: Some(year),
            target_amount: Some(amount),
            reward_note: Some("  ".into()),
        };

        let ok = build(target(10, 2026, 1_000_000)).unwrap();
        assert_eq!(ok.reward_note, None);
        assert_eq!(build(target(13, 2026, 1)).unwrap_err(), ValidationError::MonthOutOfRange);
        assert_eq!(build(target(10, 2019, 1)).unwrap_err(), ValidationError::YearOutOfRange);
        assert_eq!(
            build(target(10, 2026, 0)).unwrap_err(),
            ValidationError::NotPositive("target_amount")
        );
    }

    #[test]
    fn host_quota_is_cleared_only_by_explicit_null() {
        let mut host = build(HostPatch {
            name: Some("Ayu".into()),
            mandatory_daily_hours: Some(Some(8.0)),
        })
        .unwrap();

        let rename: HostPatch = serde_json::from_value(serde_json::json!({ "name": "Ayu S" })).unwrap();
        rename.merge_into(&mut host).unwrap();
        assert_eq!(host.name, "Ayu S");
        assert_eq!(host.mandatory_daily_hours, Some(8.0));

        let clear: HostPatch =
            serde_json::from_value(serde_json::json!({ "mandatory_daily_hours": null })).unwrap();
        clear.merge_into(&mut host).unwrap();
        assert_eq!(host.mandatory_daily_hours, None);
        assert!(host.validate().is_ok());
    }

    #[test]
    fn names_and_deductions_are_required() {
        assert_eq!(
            build(HostPatch { name: Some("  ".into()), ..HostPatch::default() }).unwrap_err(),
            ValidationError::Required("name")
        );
        assert_eq!(
            build(HostPatch { name: Some("Ayu".into()), mandatory_daily_hours: Some(Some(-1.0)) })
                .unwrap_err(),
            ValidationError::Negative("mandatory_daily_hours")
        );
        assert_eq!(
            build(AccountPatch::default()).unwrap_err(),
            ValidationError::Required("name")
        );

        let deduction = DeductionPatch {
            host_id: Some("h1".into()),
            date: Some("2026-10-02".into()),
            hours: Some(2.0),
            note: Some("".into()),
        };
        assert_eq!(build(deduction).unwrap_err(), ValidationError::Required("note"));

        let deduction = DeductionPatch {
            host_id: Some("h1".into()),
            date: Some("2026-10-02".into()),
            hours: Some(0.0),
            note: Some("sakit".into()),
        };
        assert_eq!(build(deduction).unwrap_err(), ValidationError::NotPositive("hours"));
    }
}
