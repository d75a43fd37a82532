use crate::models::SaleRow;
use serde::Serialize;
use thiserror::Error;

pub const CSV_HEADER: [&str; 8] = [
    "Host",
    "Account",
    "Date",
    "Session",
    "Duration",
    "RevenueStart",
    "RevenueEnd",
    "NetTurnover",
];

pub const REPORT_HEADER: [&str; 6] = ["Host", "Account", "Date", "Session", "Duration", "NetTurnover"];

pub const DEFAULT_PAGE_SIZE: usize = 25;

const REPORT_TITLE: &str = "Laporan Penjualan";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush csv: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize)]
struct CsvSale<'a> {
    host: &'a str,
    account: &'a str,
    date: String,
    session: &'static str,
    duration: i64,
    revenue_start: i64,
    revenue_end: i64,
    net_turnover: i64,
}

/// Day in the `dd/mm/yyyy` form used by the id-ID locale; empty for undated rows.
pub fn format_date(row: &SaleRow) -> String {
    row.sale_date
        .map(|date| date.format("%d/%m/%Y").to_string())
        .unwrap_or_default()
}

/// Groups digits in threes with `.` as the id-ID locale does.
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    if value < 0 {
        grouped.insert(0, '-');
    }
    grouped
}

pub fn sales_to_csv(rows: &[SaleRow]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for row in rows {
        writer.serialize(CsvSale {
            host: &row.host_name,
            account: &row.account_name,
            date: format_date(row),
            session: row.session.as_str(),
            duration: row.duration_minutes,
            revenue_start: row.revenue_start,
            revenue_end: row.revenue_end,
            net_turnover: row.net_turnover,
        })?;
    }

    writer.into_inner().map_err(|err| ExportError::Io(err.into_error()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportPage {
    pub number: usize,
    pub rows: Vec<[String; 6]>,
}

fn report_cells(row: &SaleRow) -> [String; 6] {
    [
        row.host_name.clone(),
        row.account_name.clone(),
        format_date(row),
        row.session.as_str().to_string(),
        format!("{} menit", row.duration_minutes),
        format_thousands(row.net_turnover),
    ]
}

/// Splits the rows into pages of `page_size`. An empty list still yields a
/// single empty page so the document always has a header.
pub fn paginate(rows: &[SaleRow], page_size: usize) -> Vec<ReportPage> {
    let page_size = page_size.max(1);
    if rows.is_empty() {
        return vec![ReportPage { number: 1, rows: Vec::new() }];
    }

    rows.chunks(page_size)
        .enumerate()
        .map(|(index, chunk)| ReportPage {
            number: index + 1,
            rows: chunk.iter().map(report_cells).collect(),
        })
        .collect()
}

pub fn render_report(rows: &[SaleRow], page_size: usize) -> String {
    let pages = paginate(rows, page_size);

    let mut widths = REPORT_HEADER.map(str::len);
    for page in &pages {
        for cells in &page.rows {
            for (width, cell) in widths.iter_mut().zip(cells) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let total = pages.len();
    let rule = "-".repeat(widths.iter().sum::<usize>() + 3 * (widths.len() - 1));
    let mut out = String::new();

    for page in &pages {
        if page.number > 1 {
            out.push('\u{c}');
        }
        out.push_str(&format!("{REPORT_TITLE}  (Page {}/{total})\n", page.number));
        out.push_str(&render_line(&REPORT_HEADER.map(String::from), &widths));
        out.push_str(&rule);
        out.push('\n');
        for cells in &page.rows {
            out.push_str(&render_line(cells, &widths));
        }
    }

    out
}

fn render_line(cells: &[String; 6], widths: &[usize; 6]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(index, (cell, &width))| {
            // numbers right-aligned
            if index == REPORT_HEADER.len() - 1 {
                format!("{cell:>width$}")
            } else {
                format!("{cell:<width$}")
            }
        })
        .collect();
    format!("{}\n", padded.join(" | ").trim_end())
}
