use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Session {
    #[default]
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl Session {
    pub fn as_str(self) -> &'static str {
        match self {
            Session::Morning => "MORNING",
            Session::Afternoon => "AFTERNOON",
            Session::Evening => "EVENING",
            Session::Night => "NIGHT",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Host {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "lenient_opt_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub mandatory_daily_hours: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Account {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// One livestream selling session.
///
/// `sale_date` is `None` when the stored value was missing or could not be
/// parsed; such records are kept but never pass a [`crate::filter::SaleFilter`].
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Sale {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub host_id: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub sale_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub session: Session,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub duration_minutes: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub revenue_start: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub revenue_end: i64,
}

impl Sale {
    /// Saturates instead of overflowing on extreme stored values.
    pub fn net_turnover(&self) -> i64 {
        self.revenue_end.saturating_sub(self.revenue_start)
    }

    pub fn sale_day(&self) -> Option<NaiveDate> {
        self.sale_date.map(|date| date.date())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Target {
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub month: u32,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub year: i32,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub target_amount: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_note: Option<String>,
}

/// Hours taken off a host's mandatory quota on one day.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct WorkHourDeduction {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub host_id: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub date: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub hours: f64,
    #[serde(default)]
    pub note: String,
}

impl WorkHourDeduction {
    pub fn day(&self) -> Option<NaiveDate> {
        self.date.map(|date| date.date())
    }
}

#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct AppData {
    pub hosts: Vec<Host>,
    pub accounts: Vec<Account>,
    pub sales: Vec<Sale>,
    pub targets: Vec<Target>,
    pub deductions: Vec<WorkHourDeduction>,
}

#[derive(Deserialize)]
struct RawAppData {
    #[serde(default)]
    hosts: Vec<Value>,
    #[serde(default)]
    accounts: Vec<Value>,
    #[serde(default)]
    sales: Vec<Value>,
    #[serde(default)]
    targets: Vec<Value>,
    #[serde(default)]
    deductions: Vec<Value>,
}

impl<'de> Deserialize<'de> for AppData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawAppData::deserialize(deserializer)?;
        Ok(Self {
            hosts: readable_rows(raw.hosts, "hosts"),
            accounts: readable_rows(raw.accounts, "accounts"),
            sales: readable_rows(raw.sales, "sales"),
            targets: readable_rows(raw.targets, "targets"),
            deductions: readable_rows(raw.deductions, "deductions"),
        })
    }
}

// A single unreadable record must not take the whole collection down.
fn readable_rows<T: DeserializeOwned>(values: Vec<Value>, collection: &str) -> Vec<T> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(row) => Some(row),
            Err(err) => {
                warn!("skipping unreadable record {index} in {collection}: {err}");
                None
            }
        })
        .collect()
}

/// Parses the timestamp shapes the service accepts: a naive date-time, an
/// RFC 3339 date-time (kept at its own wall-clock time) or a bare date.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(value) = raw.parse::<NaiveDateTime>() {
        return Some(value);
    }
    if let Ok(value) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(value);
    }
    if let Ok(value) = DateTime::parse_from_rfc3339(raw) {
        return Some(value.naive_local());
    }
    raw.parse::<NaiveDate>()
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

fn number_from(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<NaiveDateTime>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_str)
        .and_then(parse_timestamp))
}

fn lenient_opt_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from))
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(lenient_opt_f64(deserializer)?.unwrap_or(0.0))
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|n| n as i64))
            .unwrap_or(0),
        Some(other) => number_from(&other).map(|n| n as i64).unwrap_or(0),
        None => 0,
    })
}

fn lenient_i32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    Ok(i32::try_from(lenient_i64(deserializer)?).unwrap_or(0))
}

fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(u32::try_from(lenient_i64(deserializer)?).unwrap_or(0))
}

/// A sale joined with the names of its host and account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaleRow {
    pub id: String,
    pub host_id: String,
    pub host_name: String,
    pub account_id: String,
    pub account_name: String,
    pub sale_date: Option<NaiveDateTime>,
    pub session: Session,
    pub duration_minutes: i64,
    pub revenue_start: i64,
    pub revenue_end: i64,
    pub net_turnover: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobalTotals {
    pub total_turnover: i64,
    pub total_sessions: u64,
    pub average_turnover: f64,
    pub average_daily_turnover: f64,
    pub best_host: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostSummary {
    pub host_id: String,
    pub host_name: String,
    pub total_sessions: u64,
    pub total_net_turnover: i64,
    pub total_duration_minutes: i64,
    pub work_days: usize,
    pub total_worked_hours: f64,
    pub gross_mandatory_hours: f64,
    pub deduction_hours: f64,
    pub net_mandatory_hours: f64,
    pub overtime_hours: f64,
    pub average_turnover_per_session: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountSummary {
    pub account_id: String,
    pub account_name: String,
    pub total_sessions: u64,
    pub total_net_turnover: i64,
    pub total_duration_minutes: i64,
    pub average_turnover_per_session: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostChartPoint {
    pub host_id: String,
    pub name: String,
    pub turnover: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetAchievement {
    pub label: String,
    pub month: u32,
    pub year: i32,
    pub target_amount: i64,
    pub month_revenue: i64,
    pub achievement_pct: f64,
    pub reward_note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardResponse {
    pub totals: GlobalTotals,
    pub hosts: Vec<HostSummary>,
    pub accounts: Vec<AccountSummary>,
    pub host_chart: Vec<HostChartPoint>,
    pub target: Option<TargetAchievement>,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkDeleteResponse {
    pub deleted: usize,
}
