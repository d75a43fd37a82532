use crate::models::Sale;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};

/// Date range and host/account selector applied to the sales list.
///
/// Query strings send empty values for "any", so blank fields deserialize to
/// `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaleFilter {
    #[serde(default, deserialize_with = "blank_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_string")]
    pub host_id: Option<String>,
    #[serde(default, deserialize_with = "blank_string")]
    pub account_id: Option<String>,
}

impl SaleFilter {
    pub fn includes(&self, sale: &Sale) -> bool {
        let Some(sale_date) = sale.sale_date else {
            return false;
        };

        if let Some(start) = self.start_date {
            if sale_date < start_of_day(start) {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if sale_date > end_of_day(end) {
                return false;
            }
        }
        if let Some(host_id) = &self.host_id {
            if &sale.host_id != host_id {
                return false;
            }
        }
        if let Some(account_id) = &self.account_id {
            if &sale.account_id != account_id {
                return false;
            }
        }

        true
    }

    pub fn apply<'a>(&self, sales: &'a [Sale]) -> Vec<&'a Sale> {
        sales.iter().filter(|sale| self.includes(sale)).collect()
    }
}

fn start_of_day(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN)
}

// 23:59:59.999 of the given day
fn end_of_day(day: NaiveDate) -> NaiveDateTime {
    start_of_day(day) + Duration::days(1) - Duration::milliseconds(1)
}

fn blank_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty()))
}

fn blank_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
    match blank_string(deserializer)? {
        Some(text) => text
            .parse::<NaiveDate>()
            .map(Some)
            .map_err(|err| D::Error::custom(format!("invalid date '{text}': {err}"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sale_at(id: &str, host: &str, account: &str, date: Option<NaiveDateTime>) -> Sale {
        Sale {
            id: id.to_string(),
            host_id: host.to_string(),
            account_id: account.to_string(),
            sale_date: date,
            duration_minutes: 60,
            revenue_start: 0,
            revenue_end: 100,
            ..Sale::default()
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, s)
    }

    fn day(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn date_bounds_cover_whole_days() {
        let filter = SaleFilter {
            start_date: day(2026, 10, 1),
            end_date: day(2026, 10, 31),
            ..SaleFilter::default()
        };

        assert!(filter.includes(&sale_at("a", "h", "k", at(2026, 10, 1, 0, 0, 0))));
        assert!(filter.includes(&sale_at("b", "h", "k", at(2026, 10, 31, 23, 59, 59))));
        assert!(!filter.includes(&sale_at("c", "h", "k", at(2026, 9, 30, 23, 59, 59))));
        assert!(!filter.includes(&sale_at("d", "h", "k", at(2026, 11, 1, 0, 0, 0))));
    }

    #[test]
    fn host_and_account_must_match_when_given() {
        let filter = SaleFilter {
            host_id: Some("h1".into()),
            account_id: Some("k1".into()),
            ..SaleFilter::default()
        };
        let date = at(2026, 10, 5, 9, 0, 0);

        assert!(filter.includes(&sale_at("a", "h1", "k1", date)));
        assert!(!filter.includes(&sale_at("b", "h2", "k1", date)));
        assert!(!filter.includes(&sale_at("c", "h1", "k2", date)));
    }

    #[test]
    fn undated_sales_never_pass() {
        let undated = sale_at("a", "h1", "k1", None);
        assert!(!SaleFilter::default().includes(&undated));
        assert!(
            !SaleFilter {
                host_id: Some("h1".into()),
                ..SaleFilter::default()
            }
            .includes(&undated)
        );
    }

    #[test]
    fn apply_keeps_list_order() {
        let sales = vec![
            sale_at("a", "h1", "k", at(2026, 10, 3, 9, 0, 0)),
            sale_at("b", "h2", "k", at(2026, 10, 2, 9, 0, 0)),
            sale_at("c", "h1", "k", at(2026, 10, 1, 9, 0, 0)),
        ];
        let filter = SaleFilter {
            host_id: Some("h1".into()),
            ..SaleFilter::default()
        };

        let ids: Vec<_> = filter.apply(&sales).iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn blank_query_values_mean_any() {
        let filter: SaleFilter = serde_json::from_value(serde_json::json!({
            "start_date": "",
            "end_date": "2026-10-31",
            "host_id": "  ",
            "account_id": "k1"
        }))
        .unwrap();

        assert_eq!(filter.start_date, None);
        assert_eq!(filter.end_date, day(2026, 10, 31));
        assert_eq!(filter.host_id, None);
        assert_eq!(filter.account_id.as_deref(), Some("k1"));
    }
}
