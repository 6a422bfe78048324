use colored::{ColoredString, Colorize};
use market_data::ForexError;
use playbook::{Analysis, Decision, IndicatorTag, TrendSummary};
use time_series::{IndicatorRow, PricePoint};
use crate::config::Config;

pub const HEAD_ROWS: usize = 5;
pub const TAIL_ROWS: usize = 5;

pub fn banner() -> String {
  format!(
    "{}\n{}\n",
    "Currency Data Analysis App".bold(),
    "Type `help` for commands, `key=value` to change a parameter.".dimmed()
  )
}

pub fn help() -> String {
  [
    "Commands:",
    "  sma_window=<1..30>        N-day SMA and Bollinger Band window",
    "  bollinger_window=<5..30>  accepted, bands follow sma_window",
    "  ticker=<SYMBOL>           e.g. EURINR=X",
    "  start_date=<YYYY-MM-DD>",
    "  end_date=<YYYY-MM-DD>",
    "  plot_file=<PATH>          chart output path",
    "  show                      recompute and print the dashboard",
    "  plot                      draw the indicator chart",
    "  export <PATH>             write the indicator table to CSV",
    "  help",
    "  quit",
  ]
  .join("\n")
    + "\n"
}

pub fn parameters(config: &Config) -> String {
  format!(
    "{} {} | {} to {} | {}-day SMA | Bollinger window {}\n",
    "Ticker:".green(),
    config.ticker,
    config.start,
    config.end,
    config.sma_window,
    config.bollinger_window
  )
}

/// Full dashboard: price head, indicator tail, decisions and the recent trend.
pub fn dashboard(config: &Config, prices: &[PricePoint], analysis: &Analysis) -> String {
  let mut out = parameters(config);
  out.push_str(&section("Data Head:"));
  out.push_str(&data_head(prices));
  out.push_str(&section("Data with Indicators:"));
  out.push_str(&indicator_tail(analysis.indicators.tail(TAIL_ROWS)));
  out.push_str(&section("Indicator Decisions Table:"));
  out.push_str(&decisions(&analysis.decisions));
  out.push_str(&section("Indicator Summary (Recent Trends):"));
  out.push_str(&summary(&analysis.summary));
  out
}

pub fn error(err: &ForexError) -> String {
  let label = match err.is_validation() {
    true => "Invalid input:".yellow(),
    false => "Error:".red(),
  };
  format!("{} {}\n", label, err)
}

fn section(title: &str) -> String {
  format!("\n{}\n", format!("### {}", title).bold())
}

pub fn data_head(prices: &[PricePoint]) -> String {
  let mut out = format!("{:<12}{:>14}\n", "Date", "Close");
  for p in prices.iter().take(HEAD_ROWS) {
    out.push_str(&format!("{:<12}{:>14.6}\n", p.date.to_string(), p.close));
  }
  out
}

pub fn indicator_tail(rows: &[IndicatorRow]) -> String {
  let mut out = format!(
    "{:<12}{:>12}{:>12}{:>12}{:>12}{:>12}{:>12}\n",
    "Date", "Close", "1-Day SMA", "N-Day SMA", "Upper Band", "Lower Band", "CCI"
  );
  for row in rows {
    out.push_str(&format!(
      "{:<12}{:>12.6}{:>12}{:>12}{:>12}{:>12}{:>12}\n",
      row.date.to_string(),
      row.close,
      cell(row.sma_1),
      cell(row.sma_n),
      cell(row.upper_band),
      cell(row.lower_band),
      cell(row.cci)
    ));
  }
  out
}

fn cell(value: Option<f64>) -> String {
  match value {
    Some(v) => format!("{:.6}", v),
    None => "NaN".to_string(),
  }
}

pub fn decisions(table: &[(IndicatorTag, Decision)]) -> String {
  let mut out = format!("{:<30}{:^10}\n", "Indicator", "Decision");
  for (tag, decision) in table {
    out.push_str(&format!("{:<30}{}\n", tag.as_str(), badge(*decision)));
  }
  out
}

fn badge(decision: Decision) -> ColoredString {
  let text = format!("{:^10}", decision.as_str());
  match decision {
    Decision::Buy => text.black().on_green(),
    Decision::Sell => text.white().on_red(),
    Decision::Neutral => text.black().on_bright_black(),
  }
}

pub fn summary(summary: &TrendSummary) -> String {
  format!(
    "{:<14}{:<14}\n{:<14}{:<14}\n",
    "SMA Trend",
    "CCI Trend",
    summary.sma_trend.as_str(),
    summary.cci_trend.as_str()
  )
}


// ==========================================================================================
//                                 Render Tests
// ==========================================================================================

#[cfg(test)]
fn row(day: u32, cci: Option<f64>) -> IndicatorRow {
  IndicatorRow {
    date: chrono::NaiveDate::from_ymd_opt(2023, 5, day).unwrap(),
    close: 83.25,
    sma_1: Some(83.25),
    sma_n: Some(83.1),
    std_dev: None,
    upper_band: None,
    lower_band: None,
    cci,
  }
}

#[test]
fn indicator_table_marks_missing_values() {
  colored::control::set_override(false);
  let text = indicator_tail(&[row(1, None), row(2, Some(-42.5))]);
  let lines: Vec<&str> = text.lines().collect();
  assert_eq!(lines.len(), 3);
  assert!(lines[0].starts_with("Date"));
  assert!(lines[1].starts_with("2023-05-01"));
  assert!(lines[1].ends_with("NaN"));
  assert!(lines[2].ends_with("-42.500000"));
}

#[test]
fn head_is_capped_at_five_rows() {
  let start = chrono::NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
  let prices: Vec<PricePoint> = (0..9)
    .map(|i| PricePoint::new(start + chrono::Duration::days(i), 88.0 + i as f64))
    .collect();
  let text = data_head(&prices);
  assert_eq!(text.lines().count(), 1 + HEAD_ROWS);
  assert!(text.contains("2023-01-06"));
  assert!(!text.contains("2023-01-07"));
}

#[test]
fn decisions_and_summary_use_labels() {
  use playbook::{CciTrend, SmaTrend};
  colored::control::set_override(false);
  let text = decisions(&[
    (IndicatorTag::OneDaySma, Decision::Buy),
    (IndicatorTag::Cci, Decision::Neutral),
  ]);
  assert!(text.contains("1-Day SMA"));
  assert!(text.contains("BUY"));
  assert!(text.contains("NEUTRAL"));

  let text = summary(&TrendSummary {
    sma_trend: SmaTrend::Increasing,
    cci_trend: CciTrend::Oversold,
  });
  assert!(text.contains("Increasing"));
  assert!(text.contains("Oversold"));
}

#[test]
fn validation_errors_are_labelled() {
  colored::control::set_override(false);
  let text = error(&ForexError::EmptyTicker);
  assert!(text.starts_with("Invalid input:"));
  let text = error(&ForexError::NoData("XYZ=X".to_string()));
  assert_eq!(text, "Error: No data found for the given ticker symbol XYZ=X. Please try again.\n");
}
