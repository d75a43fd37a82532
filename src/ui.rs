use crate::export::format_thousands;
use crate::models::DashboardResponse;

pub fn render_index(today: &str, dashboard: &DashboardResponse) -> String {
    let totals = &dashboard.totals;

    let host_rows: String = dashboard
        .hosts
        .iter()
        .map(|host| {
            format!(
                "<tr><td>{}</td><td>{}</td><td class=\"num\">Rp {}</td><td class=\"num\">{:.2} jam</td><td class=\"num\">{:.2} jam</td><td class=\"num\">{:.2} jam</td></tr>",
                escape_html(&host.host_name),
                host.total_sessions,
                format_thousands(host.total_net_turnover),
                host.total_worked_hours,
                host.net_mandatory_hours,
                host.overtime_hours,
            )
        })
        .collect();

    let account_rows: String = dashboard
        .accounts
        .iter()
        .map(|account| {
            format!(
                "<tr><td>{}</td><td>{}</td><td class=\"num\">Rp {}</td><td class=\"num\">Rp {}</td></tr>",
                escape_html(&account.account_name),
                account.total_sessions,
                format_thousands(account.total_net_turnover),
                format_thousands(account.average_turnover_per_session.round() as i64),
            )
        })
        .collect();

    let target = match &dashboard.target {
        Some(target) => format!(
            "<p><strong>{}</strong>: Rp {} / Rp {} ({:.2}%)</p><div class=\"bar\"><span style=\"width:{:.0}%\"></span></div>",
            escape_html(&target.label),
            format_thousands(target.month_revenue),
            format_thousands(target.target_amount),
            target.achievement_pct,
            target.achievement_pct.clamp(0.0, 100.0),
        ),
        None => "<p class=\"muted\">Belum ada target untuk bulan ini.</p>".to_string(),
    };

    INDEX_HTML
        .replace("{{DATE}}", today)
        .replace("{{TOTAL}}", &format_thousands(totals.total_turnover))
        .replace("{{SESSIONS}}", &totals.total_sessions.to_string())
        .replace(
            "{{DAILY}}",
            &format_thousands(totals.average_daily_turnover.round() as i64),
        )
        .replace("{{BEST}}", &escape_html(&totals.best_host))
        .replace("{{TARGET}}", &target)
        .replace("{{HOST_ROWS}}", &host_rows)
        .replace("{{ACCOUNT_ROWS}}", &account_rows)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            // keeps names from forming template placeholders
            '{' => escaped.push_str("&#123;"),
            '}' => escaped.push_str("&#125;"),
            other => escaped.push(other),
        }
    }
    escaped
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="id">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Penjualan Live</title>
  <style>
    :root {
      --bg: #0f172a;
      --card: #1e293b;
      --ink: #e2e8f0;
      --muted: #94a3b8;
      --accent: #6366f1;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: "Inter", "Segoe UI", sans-serif;
      padding: 32px 18px 48px;
    }

    main {
      width: min(1040px, 100%);
      margin: 0 auto;
      display: grid;
      gap: 24px;
    }

    .cards {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
      gap: 16px;
    }

    .card,
    section {
      background: var(--card);
      border-radius: 14px;
      padding: 20px;
    }

    .card h2 {
      margin: 0 0 8px;
      font-size: 0.85rem;
      color: var(--muted);
      font-weight: 500;
    }

    .card p {
      margin: 0;
      font-size: 1.5rem;
      font-weight: 600;
    }

    table {
      width: 100%;
      border-collapse: collapse;
      font-size: 0.9rem;
    }

    th,
    td {
      padding: 8px 10px;
      border-bottom: 1px solid #334155;
      text-align: left;
    }

    .num {
      text-align: right;
    }

    .muted {
      color: var(--muted);
    }

    .bar {
      height: 10px;
      background: #334155;
      border-radius: 999px;
      overflow: hidden;
    }

    .bar span {
      display: block;
      height: 100%;
      background: var(--accent);
    }
  </style>
</head>
<body>
  <main>
    <header>
      <h1>Penjualan Live</h1>
      <p class="muted">Ringkasan per {{DATE}}</p>
    </header>

    <div class="cards">
      <div class="card"><h2>Total Omset Bersih</h2><p>Rp {{TOTAL}}</p></div>
      <div class="card"><h2>Total Sesi Live</h2><p>{{SESSIONS}}</p></div>
      <div class="card"><h2>Rata-rata Omset / Hari</h2><p>Rp {{DAILY}}</p></div>
      <div class="card"><h2>Host Performa Terbaik</h2><p>{{BEST}}</p></div>
    </div>

    <section>
      <h3>Pencapaian Target</h3>
      {{TARGET}}
    </section>

    <section>
      <h3>Ringkasan per Host</h3>
      <table>
        <thead>
          <tr><th>Host</th><th>Sesi</th><th class="num">Omset Bersih</th><th class="num">Jam Kerja</th><th class="num">Jam Wajib</th><th class="num">Lembur</th></tr>
        </thead>
        <tbody>{{HOST_ROWS}}</tbody>
      </table>
    </section>

    <section>
      <h3>Ringkasan per Akun</h3>
      <table>
        <thead>
          <tr><th>Akun</th><th>Sesi</th><th class="num">Omset Bersih</th><th class="num">Rata-rata / Sesi</th></tr>
        </thead>
        <tbody>{{ACCOUNT_ROWS}}</tbody>
      </table>
    </section>
  </main>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountSummary, GlobalTotals, HostSummary};

    #[test]
    fn renders_totals_and_escapes_names() {
        let dashboard = DashboardResponse {
            totals: GlobalTotals {
                total_turnover: 1_500_000,
                total_sessions: 3,
                average_turnover: 500_000.0,
                average_daily_turnover: 750_000.0,
                best_host: "<Ayu>".into(),
            },
            hosts: vec![HostSummary {
                host_id: "h1".into(),
                host_name: "<Ayu>".into(),
                total_sessions: 3,
                total_net_turnover: 1_500_000,
                total_duration_minutes: 600,
                work_days: 2,
                total_worked_hours: 10.0,
                gross_mandatory_hours: 16.0,
                deduction_hours: 2.0,
                net_mandatory_hours: 14.0,
                overtime_hours: 0.0,
                average_turnover_per_session: 500_000.0,
            }],
            accounts: Vec::new(),
            host_chart: Vec::new(),
            target: None,
        };

        let html = render_index("2026-10-19", &dashboard);
        assert!(html.contains("Rp 1.500.000"));
        assert!(html.contains("Rp 750.000"));
        assert!(html.contains("&lt;Ayu&gt;"));
        assert!(!html.contains("<Ayu>"));
        assert!(html.contains("14.00 jam"));
        assert!(html.contains("Belum ada target"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn placeholder_like_names_are_not_expanded() {
        let dashboard = DashboardResponse {
            totals: GlobalTotals {
                total_turnover: 0,
                total_sessions: 0,
                average_turnover: 0.0,
                average_daily_turnover: 0.0,
                best_host: "{{TOTAL}}".into(),
            },
            hosts: Vec::new(),
            accounts: vec![AccountSummary {
                account_id: "k1".into(),
                account_name: "{{ACCOUNT_ROWS}}".into(),
                total_sessions: 1,
                total_net_turnover: 0,
                total_duration_minutes: 60,
                average_turnover_per_session: 0.0,
            }],
            host_chart: Vec::new(),
            target: None,
        };

        let html = render_index("2026-10-19", &dashboard);
        assert!(html.contains("&#123;&#123;ACCOUNT_ROWS&#125;&#125;"));
        assert!(html.contains("&#123;&#123;TOTAL&#125;&#125;"));
        assert!(!html.contains("{{"));
    }
}
