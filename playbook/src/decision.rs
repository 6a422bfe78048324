use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time_series::{IndicatorRow, IndicatorSeries, CCI_OVERBOUGHT, CCI_OVERSOLD};

pub const CCI_LEANING_HIGH: f64 = 50.0;
pub const CCI_LEANING_LOW: f64 = -50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Decision {
  Buy,
  Sell,
  #[default]
  Neutral,
}

impl Decision {
  pub fn as_str(&self) -> &'static str {
    match self {
      Decision::Buy => "BUY",
      Decision::Sell => "SELL",
      Decision::Neutral => "NEUTRAL",
    }
  }

  /// Display color of the decision cell.
  pub fn color_name(&self) -> &'static str {
    match self {
      Decision::Buy => "green",
      Decision::Sell => "red",
      Decision::Neutral => "grey",
    }
  }
}

impl std::fmt::Display for Decision {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// The indicators a decision can be asked for, named as they are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndicatorTag {
  OneDaySma,
  SmaCrossover,
  ClosePrice,
  UpperBand,
  LowerBand,
  Cci,
}

/// Rows of the decision table, in display order.
pub const DECISION_TABLE: [IndicatorTag; 5] = [
  IndicatorTag::OneDaySma,
  IndicatorTag::SmaCrossover,
  IndicatorTag::UpperBand,
  IndicatorTag::LowerBand,
  IndicatorTag::Cci,
];

pub type Rule = fn(&Snapshot) -> Decision;

impl IndicatorTag {
  pub const ALL: [IndicatorTag; 6] = [
    IndicatorTag::OneDaySma,
    IndicatorTag::SmaCrossover,
    IndicatorTag::ClosePrice,
    IndicatorTag::UpperBand,
    IndicatorTag::LowerBand,
    IndicatorTag::Cci,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      IndicatorTag::OneDaySma => "1-Day SMA",
      IndicatorTag::SmaCrossover => "7-Day SMA",
      IndicatorTag::ClosePrice => "Close Price",
      IndicatorTag::UpperBand => "Bollinger Upper Band",
      IndicatorTag::LowerBand => "Bollinger Lower Band",
      IndicatorTag::Cci => "CCI",
    }
  }

  pub fn rule(&self) -> Rule {
    match self {
      IndicatorTag::OneDaySma => close_vs_sma,
      IndicatorTag::SmaCrossover => sma_crossover,
      IndicatorTag::ClosePrice => close_outside_bands,
      IndicatorTag::UpperBand => upper_band,
      IndicatorTag::LowerBand => lower_band,
      IndicatorTag::Cci => cci,
    }
  }
}

impl FromStr for IndicatorTag {
  type Err = ();
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    IndicatorTag::ALL
      .iter()
      .find(|tag| tag.as_str() == s)
      .copied()
      .ok_or(())
  }
}

impl std::fmt::Display for IndicatorTag {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Latest row and the row before it.
/// Without history the previous row is the current one, so no crossover can fire.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot {
  pub current: IndicatorRow,
  pub previous: IndicatorRow,
}

impl Snapshot {
  pub fn new(current: IndicatorRow, previous: Option<IndicatorRow>) -> Self {
    Self {
      current,
      previous: previous.unwrap_or(current),
    }
  }

  /// Latest row of `history` against its second to last row.
  pub fn latest(history: &IndicatorSeries) -> Option<Self> {
    history
      .latest()
      .map(|current| Self::new(*current, history.previous().copied()))
  }
}

/// Decision for one indicator given the latest row and the full history.
pub fn decide(tag: IndicatorTag, latest: &IndicatorRow, history: &IndicatorSeries) -> Decision {
  let snapshot = Snapshot::new(*latest, history.previous().copied());
  (tag.rule())(&snapshot)
}

/// Same as [`decide`] for a display name; unknown names are NEUTRAL.
pub fn decide_by_name(name: &str, latest: &IndicatorRow, history: &IndicatorSeries) -> Decision {
  match name.parse::<IndicatorTag>() {
    Ok(tag) => decide(tag, latest, history),
    Err(_) => Decision::Neutral,
  }
}

/// Every row of [`DECISION_TABLE`] for the latest row of the series.
pub fn decision_table(series: &IndicatorSeries) -> Vec<(IndicatorTag, Decision)> {
  match Snapshot::latest(series) {
    Some(snapshot) => DECISION_TABLE
      .iter()
      .map(|tag| (*tag, (tag.rule())(&snapshot)))
      .collect(),
    None => vec![],
  }
}

// Comparisons with a missing value are false, so missing inputs fall through to NEUTRAL.
fn gt(a: Option<f64>, b: Option<f64>) -> bool {
  matches!((a, b), (Some(a), Some(b)) if a > b)
}

fn lt(a: Option<f64>, b: Option<f64>) -> bool {
  matches!((a, b), (Some(a), Some(b)) if a < b)
}

fn ge(a: Option<f64>, b: Option<f64>) -> bool {
  matches!((a, b), (Some(a), Some(b)) if a >= b)
}

fn le(a: Option<f64>, b: Option<f64>) -> bool {
  matches!((a, b), (Some(a), Some(b)) if a <= b)
}

/// Close above the N-day SMA is BUY, below is SELL.
pub fn close_vs_sma(s: &Snapshot) -> Decision {
  let close = Some(s.current.close);
  if gt(close, s.current.sma_n) {
    Decision::Buy
  } else if lt(close, s.current.sma_n) {
    Decision::Sell
  } else {
    Decision::Neutral
  }
}

/// 1-day SMA crossing the N-day SMA between the previous and the current row.
pub fn sma_crossover(s: &Snapshot) -> Decision {
  let (cur, prev) = (&s.current, &s.previous);
  if gt(cur.sma_1, cur.sma_n) && le(prev.sma_1, prev.sma_n) {
    Decision::Buy
  } else if lt(cur.sma_1, cur.sma_n) && ge(prev.sma_1, prev.sma_n) {
    Decision::Sell
  } else {
    Decision::Neutral
  }
}

/// Close outside the Bollinger bands.
pub fn close_outside_bands(s: &Snapshot) -> Decision {
  let close = Some(s.current.close);
  if lt(close, s.current.lower_band) {
    Decision::Buy
  } else if gt(close, s.current.upper_band) {
    Decision::Sell
  } else {
    Decision::Neutral
  }
}

/// Close above the upper band, or merely above the band midpoint, is SELL.
pub fn upper_band(s: &Snapshot) -> Decision {
  let close = Some(s.current.close);
  if gt(close, s.current.upper_band) || gt(close, s.current.band_midpoint()) {
    Decision::Sell
  } else {
    Decision::Neutral
  }
}

/// Close below the lower band, or merely below the band midpoint, is BUY.
pub fn lower_band(s: &Snapshot) -> Decision {
  let close = Some(s.current.close);
  let midpoint = match (s.current.upper_band, s.current.lower_band) {
    (Some(upper), Some(lower)) => Some(lower + (upper - lower) / 2.0),
    _ => None,
  };
  if lt(close, s.current.lower_band) || lt(close, midpoint) {
    Decision::Buy
  } else {
    Decision::Neutral
  }
}

/// Branch order matters: the outer thresholds are checked before the 50..100 bands.
pub fn cci(s: &Snapshot) -> Decision {
  let cci = s.current.cci;
  if gt(cci, Some(CCI_OVERBOUGHT)) {
    Decision::Sell
  } else if lt(cci, Some(CCI_OVERSOLD)) {
    Decision::Buy
  } else if gt(cci, Some(CCI_LEANING_HIGH)) && le(cci, Some(CCI_OVERBOUGHT)) {
    Decision::Sell
  } else if ge(cci, Some(CCI_OVERSOLD)) && lt(cci, Some(CCI_LEANING_LOW)) {
    Decision::Buy
  } else {
    Decision::Neutral
  }
}


// ==========================================================================================
//                                 Decision Tests
// ==========================================================================================

#[cfg(test)]
fn row(close: f64) -> IndicatorRow {
  IndicatorRow {
    date: chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
    close,
    sma_1: Some(close),
    sma_n: None,
    std_dev: None,
    upper_band: None,
    lower_band: None,
    cci: None,
  }
}

#[cfg(test)]
fn banded(close: f64, sma: f64, upper: f64, lower: f64) -> Snapshot {
  let current = IndicatorRow {
    sma_n: Some(sma),
    upper_band: Some(upper),
    lower_band: Some(lower),
    ..row(close)
  };
  Snapshot::new(current, None)
}

#[cfg(test)]
fn with_cci(cci: f64) -> Snapshot {
  Snapshot::new(IndicatorRow { cci: Some(cci), ..row(1.0) }, None)
}

#[test]
fn bands_scenario() {
  let s = banded(1.10, 1.05, 1.12, 0.98);
  assert_eq!(close_outside_bands(&s), Decision::Neutral);
  // 1.10 sits above the 1.05 midpoint
  assert_eq!(upper_band(&s), Decision::Sell);
  assert_eq!(lower_band(&s), Decision::Neutral);
  assert_eq!(close_vs_sma(&s), Decision::Buy);

  assert_eq!(close_outside_bands(&banded(0.97, 1.05, 1.12, 0.98)), Decision::Buy);
  assert_eq!(lower_band(&banded(0.97, 1.05, 1.12, 0.98)), Decision::Buy);
  assert_eq!(close_outside_bands(&banded(1.13, 1.05, 1.12, 0.98)), Decision::Sell);
  assert_eq!(upper_band(&banded(1.13, 1.05, 1.12, 0.98)), Decision::Sell);
  assert_eq!(lower_band(&banded(1.00, 1.05, 1.12, 0.98)), Decision::Buy);
  assert_eq!(upper_band(&banded(1.00, 1.05, 1.12, 0.98)), Decision::Neutral);
  // exactly on a band is inside
  assert_eq!(close_outside_bands(&banded(1.12, 1.05, 1.12, 0.98)), Decision::Neutral);
}

#[test]
fn cci_thresholds_in_order() {
  assert_eq!(cci(&with_cci(150.0)), Decision::Sell);
  assert_eq!(cci(&with_cci(-150.0)), Decision::Buy);
  assert_eq!(cci(&with_cci(75.0)), Decision::Sell);
  assert_eq!(cci(&with_cci(100.0)), Decision::Sell);
  assert_eq!(cci(&with_cci(-100.0)), Decision::Buy);
  assert_eq!(cci(&with_cci(-75.0)), Decision::Buy);
  assert_eq!(cci(&with_cci(50.0)), Decision::Neutral);
  assert_eq!(cci(&with_cci(-50.0)), Decision::Neutral);
  assert_eq!(cci(&with_cci(0.0)), Decision::Neutral);
  assert_eq!(cci(&Snapshot::new(row(1.0), None)), Decision::Neutral);
}

#[test]
fn sma_crossover_scenarios() {
  let previous = IndicatorRow { sma_1: Some(1.00), sma_n: Some(1.02), ..row(1.00) };
  let current = IndicatorRow { sma_1: Some(1.05), sma_n: Some(1.03), ..row(1.05) };
  assert_eq!(sma_crossover(&Snapshot::new(current, Some(previous))), Decision::Buy);
  // reversed is a downward cross
  assert_eq!(sma_crossover(&Snapshot::new(previous, Some(current))), Decision::Sell);
  // already above on both rows
  assert_eq!(sma_crossover(&Snapshot::new(current, Some(current))), Decision::Neutral);
  // no history: previous falls back to current
  assert_eq!(sma_crossover(&Snapshot::new(current, None)), Decision::Neutral);
  // missing SMA on the previous row never crosses
  let unfilled = IndicatorRow { sma_n: None, ..previous };
  assert_eq!(sma_crossover(&Snapshot::new(current, Some(unfilled))), Decision::Neutral);
}

#[test]
fn one_day_sma_is_exclusive() {
  for (close, sma) in [(1.0, 0.9), (0.9, 1.0), (1.0, 1.0)] {
    let s = Snapshot::new(IndicatorRow { sma_n: Some(sma), ..row(close) }, None);
    let d = close_vs_sma(&s);
    let expected = if close > sma {
      Decision::Buy
    } else if close < sma {
      Decision::Sell
    } else {
      Decision::Neutral
    };
    assert_eq!(d, expected);
  }
  // unfilled SMA window
  assert_eq!(close_vs_sma(&Snapshot::new(row(1.0), None)), Decision::Neutral);
}

#[test]
fn tags_round_trip_display_names() {
  for tag in IndicatorTag::ALL {
    assert_eq!(tag.as_str().parse::<IndicatorTag>(), Ok(tag));
  }
  assert!("RSI".parse::<IndicatorTag>().is_err());
  assert_eq!(Decision::Buy.color_name(), "green");
  assert_eq!(Decision::Sell.color_name(), "red");
  assert_eq!(Decision::Neutral.color_name(), "grey");
}

#[test]
fn unknown_name_is_neutral() {
  let latest = IndicatorRow { sma_n: Some(0.5), cci: Some(500.0), ..row(1.0) };
  let history = IndicatorSeries { sma_window: 7, rows: vec![latest] };
  assert_eq!(decide_by_name("MACD", &latest, &history), Decision::Neutral);
  assert_eq!(decide_by_name("CCI", &latest, &history), Decision::Sell);
  assert_eq!(decide_by_name("1-Day SMA", &latest, &history), Decision::Buy);
}

#[test]
fn decision_table_uses_previous_row() {
  let previous = IndicatorRow { sma_1: Some(1.00), sma_n: Some(1.02), ..row(1.00) };
  let current = IndicatorRow { sma_1: Some(1.05), sma_n: Some(1.03), ..row(1.05) };
  let series = IndicatorSeries { sma_window: 7, rows: vec![previous, current] };
  let table = decision_table(&series);
  let tags: Vec<IndicatorTag> = table.iter().map(|(t, _)| *t).collect();
  assert_eq!(tags, DECISION_TABLE.to_vec());
  assert_eq!(table[1], (IndicatorTag::SmaCrossover, Decision::Buy));
  assert_eq!(decide(IndicatorTag::SmaCrossover, &current, &series), Decision::Buy);

  let empty = IndicatorSeries { sma_window: 7, rows: vec![] };
  assert!(decision_table(&empty).is_empty());
}
