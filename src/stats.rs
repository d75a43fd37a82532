use crate::filter::SaleFilter;
use crate::models::{
    Account, AccountSummary, AppData, DashboardResponse, GlobalTotals, Host, HostChartPoint,
    HostSummary, Sale, SaleRow, Target, TargetAchievement, WorkHourDeduction,
};
use chrono::{Datelike, Local, NaiveDate};
use std::collections::{BTreeSet, HashMap};

/// Name shown for a host or account id that no longer resolves.
pub const MISSING_NAME: &str = "N/A";
/// Best-host value when there is nothing to rank.
pub const NO_BEST_HOST: &str = "-";

const MONTH_NAMES: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

pub fn build_dashboard(data: &AppData, filter: &SaleFilter) -> DashboardResponse {
    build_dashboard_at(Local::now().date_naive(), data, filter)
}

pub fn build_dashboard_at(today: NaiveDate, data: &AppData, filter: &SaleFilter) -> DashboardResponse {
    let sales = filter.apply(&data.sales);

    DashboardResponse {
        totals: global_totals(&sales, &data.hosts),
        hosts: host_summaries(&sales, &data.hosts, &data.deductions),
        accounts: account_summaries(&sales, &data.accounts),
        host_chart: host_turnover_chart(&sales, &data.hosts),
        target: target_achievement_at(today, &data.targets, &data.sales),
    }
}

/// Joins each sale with its host and account names.
pub fn sale_rows(sales: &[&Sale], hosts: &[Host], accounts: &[Account]) -> Vec<SaleRow> {
    let host_names = name_lookup(hosts.iter().map(|h| (h.id.as_str(), h.name.as_str())));
    let account_names = name_lookup(accounts.iter().map(|a| (a.id.as_str(), a.name.as_str())));

    sales
        .iter()
        .map(|sale| SaleRow {
            id: sale.id.clone(),
            host_id: sale.host_id.clone(),
            host_name: resolve(&host_names, &sale.host_id),
            account_id: sale.account_id.clone(),
            account_name: resolve(&account_names, &sale.account_id),
            sale_date: sale.sale_date,
            session: sale.session,
            duration_minutes: sale.duration_minutes,
            revenue_start: sale.revenue_start,
            revenue_end: sale.revenue_end,
            net_turnover: sale.net_turnover(),
        })
        .collect()
}

pub fn global_totals(sales: &[&Sale], hosts: &[Host]) -> GlobalTotals {
    let total_turnover = saturating_total(sales.iter().map(|sale| sale.net_turnover()));
    let total_sessions = sales.len() as u64;
    let sale_days: BTreeSet<NaiveDate> = sales.iter().filter_map(|sale| sale.sale_day()).collect();

    // Ties keep the host that was encountered first.
    let tallies = tally_hosts(sales);
    let mut best: Option<&HostTally> = None;
    for tally in &tallies {
        if best.is_none_or(|current| tally.turnover > current.turnover) {
            best = Some(tally);
        }
    }

    let best_host = match best {
        Some(tally) => {
            let host_names = name_lookup(hosts.iter().map(|h| (h.id.as_str(), h.name.as_str())));
            resolve(&host_names, tally.host_id)
        }
        None => NO_BEST_HOST.to_string(),
    };

    GlobalTotals {
        total_turnover,
        total_sessions,
        average_turnover: ratio(total_turnover as f64, total_sessions as f64),
        average_daily_turnover: ratio(total_turnover as f64, sale_days.len() as f64),
        best_host,
    }
}

/// Per-host totals with worked, mandatory and overtime hours.
///
/// Work days are taken from `sales` as given, so a filtered list narrows the
/// mandatory quota too. Deductions only count on those work days.
pub fn host_summaries(
    sales: &[&Sale],
    hosts: &[Host],
    deductions: &[WorkHourDeduction],
) -> Vec<HostSummary> {
    let hosts_by_id: HashMap<&str, &Host> = hosts.iter().map(|h| (h.id.as_str(), h)).collect();

    let mut summaries: Vec<HostSummary> = tally_hosts(sales)
        .into_iter()
        .map(|tally| {
            let host = hosts_by_id.get(tally.host_id);
            let mandatory_daily = host.and_then(|h| h.mandatory_daily_hours).unwrap_or(0.0);

            let total_worked_hours = tally.duration as f64 / 60.0;
            let gross_mandatory_hours = mandatory_daily * tally.work_days.len() as f64;
            let deduction_hours: f64 = deductions
                .iter()
                .filter(|d| d.host_id == tally.host_id)
                .filter(|d| d.day().is_some_and(|day| tally.work_days.contains(&day)))
                .map(|d| d.hours)
                .sum();
            let net_mandatory_hours = gross_mandatory_hours - deduction_hours;

            HostSummary {
                host_id: tally.host_id.to_string(),
                host_name: host.map_or_else(|| MISSING_NAME.to_string(), |h| h.name.clone()),
                total_sessions: tally.sessions,
                total_net_turnover: tally.turnover,
                total_duration_minutes: tally.duration,
                work_days: tally.work_days.len(),
                total_worked_hours,
                gross_mandatory_hours,
                deduction_hours,
                net_mandatory_hours,
                overtime_hours: (total_worked_hours - net_mandatory_hours).max(0.0),
                average_turnover_per_session: ratio(tally.turnover as f64, tally.sessions as f64),
            }
        })
        .collect();

    summaries.sort_by(|a, b| b.total_net_turnover.cmp(&a.total_net_turnover));
    summaries
}

pub fn account_summaries(sales: &[&Sale], accounts: &[Account]) -> Vec<AccountSummary> {
    let account_names = name_lookup(accounts.iter().map(|a| (a.id.as_str(), a.name.as_str())));
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut summaries: Vec<AccountSummary> = Vec::new();

    for &sale in sales {
        let position = *index.entry(sale.account_id.as_str()).or_insert_with(|| {
            summaries.push(AccountSummary {
                account_id: sale.account_id.clone(),
                account_name: resolve(&account_names, &sale.account_id),
                total_sessions: 0,
                total_net_turnover: 0,
                total_duration_minutes: 0,
                average_turnover_per_session: 0.0,
            });
            summaries.len() - 1
        });

        let summary = &mut summaries[position];
        summary.total_sessions += 1;
        summary.total_net_turnover = summary.total_net_turnover.saturating_add(sale.net_turnover());
        summary.total_duration_minutes = summary
            .total_duration_minutes
            .saturating_add(sale.duration_minutes);
    }

    for summary in &mut summaries {
        summary.average_turnover_per_session = ratio(
            summary.total_net_turnover as f64,
            summary.total_sessions as f64,
        );
    }

    summaries.sort_by(|a, b| b.total_net_turnover.cmp(&a.total_net_turnover));
    summaries
}

/// One bar per known host, in host-list order.
pub fn host_turnover_chart(sales: &[&Sale], hosts: &[Host]) -> Vec<HostChartPoint> {
    if sales.is_empty() || hosts.is_empty() {
        return Vec::new();
    }

    let mut turnover: HashMap<&str, i64> = hosts.iter().map(|h| (h.id.as_str(), 0)).collect();
    for sale in sales {
        if let Some(total) = turnover.get_mut(sale.host_id.as_str()) {
            *total = total.saturating_add(sale.net_turnover());
        }
    }

    hosts
        .iter()
        .map(|host| HostChartPoint {
            host_id: host.id.clone(),
            name: host.name.clone(),
            turnover: turnover.get(host.id.as_str()).copied().unwrap_or(0),
        })
        .collect()
}

/// Progress against the target of `today`'s month, over every sale in that
/// month regardless of any active filter. The first matching target wins.
pub fn target_achievement_at(
    today: NaiveDate,
    targets: &[Target],
    sales: &[Sale],
) -> Option<TargetAchievement> {
    let (month, year) = (today.month(), today.year());
    let target = targets.iter().find(|t| t.month == month && t.year == year)?;

    let month_revenue = saturating_total(
        sales
            .iter()
            .filter(|sale| {
                sale.sale_day()
                    .is_some_and(|day| day.month() == month && day.year() == year)
            })
            .map(Sale::net_turnover),
    );

    let achievement_pct = if target.target_amount > 0 {
        round2(month_revenue as f64 / target.target_amount as f64 * 100.0)
    } else {
        0.0
    };

    Some(TargetAchievement {
        label: format!("Target {}", month_name(month)),
        month,
        year,
        target_amount: target.target_amount,
        month_revenue,
        achievement_pct,
        reward_note: target.reward_note.clone(),
    })
}

pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|index| MONTH_NAMES.get(index as usize))
        .copied()
        .unwrap_or("?")
}

struct HostTally<'a> {
    host_id: &'a str,
    sessions: u64,
    turnover: i64,
    duration: i64,
    work_days: BTreeSet<NaiveDate>,
}

// Groups by host id in first-encounter order.
fn tally_hosts<'a>(sales: &[&'a Sale]) -> Vec<HostTally<'a>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut tallies: Vec<HostTally<'a>> = Vec::new();

    for &sale in sales {
        let position = *index.entry(sale.host_id.as_str()).or_insert_with(|| {
            tallies.push(HostTally {
                host_id: sale.host_id.as_str(),
                sessions: 0,
                turnover: 0,
                duration: 0,
                work_days: BTreeSet::new(),
            });
            tallies.len() - 1
        });

        let tally = &mut tallies[position];
        tally.sessions += 1;
        tally.turnover = tally.turnover.saturating_add(sale.net_turnover());
        tally.duration = tally.duration.saturating_add(sale.duration_minutes);
        if let Some(day) = sale.sale_day() {
            tally.work_days.insert(day);
        }
    }

    tallies
}

fn name_lookup<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> HashMap<&'a str, &'a str> {
    pairs.collect()
}

fn resolve(names: &HashMap<&str, &str>, id: &str) -> String {
    names.get(id).copied().unwrap_or(MISSING_NAME).to_string()
}

fn saturating_total(values: impl Iterator<Item = i64>) -> i64 {
    values.fold(0, i64::saturating_add)
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
