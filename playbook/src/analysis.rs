use log::*;
use time_series::{IndicatorSeries, PriceSeries};
use crate::{decision_table, Decision, IndicatorTag, TrendSummary, SUMMARY_DAYS};

/// Everything the dashboard shows for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
  pub indicators: IndicatorSeries,
  pub decisions: Vec<(IndicatorTag, Decision)>,
  pub summary: TrendSummary,
}

impl Analysis {
  /// `Ok(None)` when there are no prices: nothing is computed for an empty series.
  pub fn run(prices: &PriceSeries, sma_window: usize) -> anyhow::Result<Option<Self>> {
    if prices.is_empty() {
      warn!("No prices to analyze");
      return Ok(None);
    }
    let indicators = IndicatorSeries::compute(prices, sma_window)?;
    let decisions = decision_table(&indicators);
    let summary = match TrendSummary::compute(&indicators, SUMMARY_DAYS) {
      Some(summary) => summary,
      None => return Ok(None),
    };
    info!(
      "{} rows, {}-day SMA: {}",
      indicators.len(),
      sma_window,
      decisions
        .iter()
        .map(|(tag, d)| format!("{}={}", tag, d))
        .collect::<Vec<String>>()
        .join(", ")
    );
    Ok(Some(Self {
      indicators,
      decisions,
      summary,
    }))
  }
}


// ==========================================================================================
//                                 Analysis Tests
// ==========================================================================================

#[test]
fn empty_prices_produce_nothing() -> anyhow::Result<()> {
  assert!(Analysis::run(&PriceSeries::empty(), 7)?.is_none());
  Ok(())
}

#[test]
fn analysis_on_rising_prices() -> anyhow::Result<()> {
  use crate::{CciTrend, SmaTrend, DECISION_TABLE};
  use time_series::PricePoint;
  let start = chrono::NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
  // flat for 25 days, then a jump on the last day
  let prices: PriceSeries = (0..26)
    .map(|i| {
      let close = if i == 25 { 2.0 } else { 1.0 + (i % 2) as f64 * 0.01 };
      PricePoint::new(start + chrono::Duration::days(i), close)
    })
    .collect();
  let analysis = Analysis::run(&prices, 7)?.unwrap();

  assert_eq!(analysis.indicators.len(), 26);
  assert_eq!(analysis.decisions.len(), DECISION_TABLE.len());
  let get = |tag: IndicatorTag| analysis.decisions.iter().find(|(t, _)| *t == tag).unwrap().1;
  assert_eq!(get(IndicatorTag::OneDaySma), Decision::Buy);
  assert_eq!(get(IndicatorTag::SmaCrossover), Decision::Buy);
  assert_eq!(get(IndicatorTag::UpperBand), Decision::Sell);
  assert_eq!(get(IndicatorTag::LowerBand), Decision::Neutral);
  assert_eq!(get(IndicatorTag::Cci), Decision::Sell);
  assert_eq!(analysis.summary.sma_trend, SmaTrend::Increasing);
  assert_eq!(analysis.summary.cci_trend, CciTrend::Overbought);
  Ok(())
}
