use serde::{Deserialize, Serialize};
use time_series::{IndicatorSeries, CCI_OVERBOUGHT, CCI_OVERSOLD};

/// Default trailing window of the summary, in calendar days.
pub const SUMMARY_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmaTrend {
  Increasing,
  Decreasing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CciTrend {
  Overbought,
  Oversold,
  Neutral,
}

impl SmaTrend {
  pub fn as_str(&self) -> &'static str {
    match self {
      SmaTrend::Increasing => "Increasing",
      SmaTrend::Decreasing => "Decreasing",
    }
  }
}

impl CciTrend {
  pub fn as_str(&self) -> &'static str {
    match self {
      CciTrend::Overbought => "Overbought",
      CciTrend::Oversold => "Oversold",
      CciTrend::Neutral => "Neutral",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendSummary {
  pub sma_trend: SmaTrend,
  pub cci_trend: CciTrend,
}

impl TrendSummary {
  /// Trend over the rows dated within the last `days` calendar days of the series.
  /// `None` when the series is empty.
  pub fn compute(series: &IndicatorSeries, days: i64) -> Option<Self> {
    let recent = series.trailing_days(days);
    let (first, last) = (recent.first()?, recent.last()?);

    // strict: an unchanged or missing SMA reads as Decreasing
    let sma_trend = match (first.sma_n, last.sma_n) {
      (Some(first), Some(last)) if last > first => SmaTrend::Increasing,
      _ => SmaTrend::Decreasing,
    };
    let cci_trend = match last.cci {
      Some(cci) if cci > CCI_OVERBOUGHT => CciTrend::Overbought,
      Some(cci) if cci < CCI_OVERSOLD => CciTrend::Oversold,
      _ => CciTrend::Neutral,
    };
    Some(Self { sma_trend, cci_trend })
  }
}


// ==========================================================================================
//                                 TrendSummary Tests
// ==========================================================================================

#[cfg(test)]
fn series(rows: &[(u32, Option<f64>, Option<f64>)]) -> IndicatorSeries {
  use time_series::IndicatorRow;
  IndicatorSeries {
    sma_window: 7,
    rows: rows
      .iter()
      .map(|(day, sma_n, cci)| IndicatorRow {
        date: chrono::NaiveDate::from_ymd_opt(2024, 3, *day).unwrap(),
        close: 1.0,
        sma_1: Some(1.0),
        sma_n: *sma_n,
        std_dev: None,
        upper_band: None,
        lower_band: None,
        cci: *cci,
      })
      .collect(),
  }
}

#[test]
fn sma_trend_compares_window_ends() {
  let rising = series(&[(1, Some(1.0), None), (4, Some(1.1), None), (8, Some(1.2), Some(120.0))]);
  let summary = TrendSummary::compute(&rising, SUMMARY_DAYS).unwrap();
  // 2024-03-01 is exactly 7 days before the last row, so the window starts at 03-04
  assert_eq!(summary.sma_trend, SmaTrend::Increasing);
  assert_eq!(summary.cci_trend, CciTrend::Overbought);

  let falling_inside_window = series(&[(1, Some(0.5), None), (4, Some(1.3), None), (8, Some(1.2), Some(-120.0))]);
  let summary = TrendSummary::compute(&falling_inside_window, SUMMARY_DAYS).unwrap();
  assert_eq!(summary.sma_trend, SmaTrend::Decreasing);
  assert_eq!(summary.cci_trend, CciTrend::Oversold);
}

#[test]
fn flat_or_missing_sma_is_decreasing() {
  let flat = series(&[(4, Some(1.1), None), (8, Some(1.1), Some(100.0))]);
  let summary = TrendSummary::compute(&flat, SUMMARY_DAYS).unwrap();
  assert_eq!(summary.sma_trend, SmaTrend::Decreasing);
  assert_eq!(summary.cci_trend, CciTrend::Neutral);

  let unfilled = series(&[(4, None, None), (8, Some(1.1), None)]);
  assert_eq!(TrendSummary::compute(&unfilled, SUMMARY_DAYS).unwrap().sma_trend, SmaTrend::Decreasing);
}

#[test]
fn single_row_and_empty() {
  let one = series(&[(8, Some(1.1), Some(-100.0))]);
  let summary = TrendSummary::compute(&one, SUMMARY_DAYS).unwrap();
  assert_eq!(summary.sma_trend, SmaTrend::Decreasing);
  assert_eq!(summary.cci_trend, CciTrend::Neutral);
  assert!(TrendSummary::compute(&series(&[]), SUMMARY_DAYS).is_none());
}
