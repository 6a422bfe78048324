use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use crate::{Data, Dataset, PriceSeries};

/// Default window of the N-day simple moving average and the Bollinger Bands.
pub const DEFAULT_SMA_WINDOW: usize = 7;
/// CCI always looks back 20 periods, whatever the SMA window is.
pub const CCI_WINDOW: usize = 20;
pub const CCI_CONSTANT: f64 = 0.015;
pub const BOLLINGER_STD_DEVS: f64 = 2.0;
pub const CCI_OVERBOUGHT: f64 = 100.0;
pub const CCI_OVERSOLD: f64 = -100.0;

/// One date of the indicator table.
/// `None` marks a value whose rolling window is not yet filled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
  pub date: NaiveDate,
  pub close: f64,
  pub sma_1: Option<f64>,
  pub sma_n: Option<f64>,
  pub std_dev: Option<f64>,
  pub upper_band: Option<f64>,
  pub lower_band: Option<f64>,
  pub cci: Option<f64>,
}

impl IndicatorRow {
  /// Half way between the Bollinger bands, computed the same way as the band rules expect.
  pub fn band_midpoint(&self) -> Option<f64> {
    match (self.upper_band, self.lower_band) {
      (Some(upper), Some(lower)) => Some(upper - (upper - lower) / 2.0),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
  pub sma_window: usize,
  pub rows: Vec<IndicatorRow>,
}

impl IndicatorSeries {
  /// Derives every indicator column from the close prices.
  pub fn compute(prices: &PriceSeries, sma_window: usize) -> anyhow::Result<Self> {
    if sma_window == 0 {
      return Err(anyhow::anyhow!("SMA window must be a positive integer"));
    }
    let closes = prices.closes();

    let sma_1 = rolling_mean(&closes, 1);
    let sma_n = rolling_mean(&closes, sma_window);
    let std_n = rolling_std(&closes, sma_window);
    let sma_cci = rolling_mean(&closes, CCI_WINDOW);
    let std_cci = rolling_std(&closes, CCI_WINDOW);

    let rows = prices
      .points()
      .iter()
      .enumerate()
      .map(|(i, p)| {
        let upper_band = sma_n[i].zip(std_n[i]).map(|(m, s)| m + s * BOLLINGER_STD_DEVS);
        let lower_band = sma_n[i].zip(std_n[i]).map(|(m, s)| m - s * BOLLINGER_STD_DEVS);
        let cci = match (sma_cci[i], std_cci[i]) {
          (Some(mean), Some(std)) if std != 0.0 => Some((p.close - mean) / (CCI_CONSTANT * std)),
          _ => None,
        };
        IndicatorRow {
          date: p.date,
          close: p.close,
          sma_1: sma_1[i],
          sma_n: sma_n[i],
          std_dev: std_n[i],
          upper_band,
          lower_band,
          cci,
        }
      })
      .collect();

    Ok(Self { sma_window, rows })
  }

  pub fn len(&self) -> usize {
    self.rows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }

  pub fn latest(&self) -> Option<&IndicatorRow> {
    self.rows.last()
  }

  /// Row before the latest one, if the series has at least two rows.
  pub fn previous(&self) -> Option<&IndicatorRow> {
    match self.rows.len() {
      len if len > 1 => self.rows.get(len - 2),
      _ => None,
    }
  }

  /// Last `n` rows, like the tail of a dataframe.
  pub fn tail(&self, n: usize) -> &[IndicatorRow] {
    &self.rows[self.rows.len().saturating_sub(n)..]
  }

  /// Rows dated strictly after `last date - days`.
  pub fn trailing_days(&self, days: i64) -> &[IndicatorRow] {
    let last = match self.rows.last() {
      Some(row) => row.date,
      None => return &[],
    };
    let cutoff = last - chrono::Duration::days(days);
    let start = self.rows.partition_point(|r| r.date <= cutoff);
    &self.rows[start..]
  }

  /// One column as plottable data, skipping dates where it is missing.
  pub fn column<F: Fn(&IndicatorRow) -> Option<f64>>(&self, f: F) -> Dataset {
    Dataset::new(
      self.rows
        .iter()
        .filter_map(|r| {
          f(r).map(|y| Data {
            x: date_to_unix_ms(r.date),
            y,
          })
        })
        .collect(),
    )
  }
}

pub fn date_to_unix_ms(date: NaiveDate) -> i64 {
  date.and_hms_opt(0, 0, 0)
    .map(|dt| dt.and_utc().timestamp_millis())
    .unwrap_or_default()
}

/// Mean of each trailing window of `window` values, `None` until the window is filled.
pub fn rolling_mean(series: &[f64], window: usize) -> Vec<Option<f64>> {
  rolling(series, window, mean)
}

/// Sample standard deviation (n - 1 divisor) of each trailing window.
/// A single value has no sample deviation, so a window of 1 is always `None`.
pub fn rolling_std(series: &[f64], window: usize) -> Vec<Option<f64>> {
  rolling(series, window, sample_std_dev)
}

fn rolling<F: Fn(&[f64]) -> Option<f64>>(series: &[f64], window: usize, f: F) -> Vec<Option<f64>> {
  if window == 0 {
    return vec![None; series.len()];
  }
  (0..series.len())
    .map(|i| match i + 1 >= window {
      true => f(&series[i + 1 - window..=i]),
      false => None,
    })
    .collect()
}

fn mean(data: &[f64]) -> Option<f64> {
  let sum = data.iter().sum::<f64>();
  let count = data.len();
  match count {
    positive if positive > 0 => Some(sum / count as f64),
    _ => None,
  }
}

fn sample_std_dev(data: &[f64]) -> Option<f64> {
  match (mean(data), data.len()) {
    (Some(data_mean), count) if count > 1 => {
      let variance = data
        .iter()
        .map(|value| {
          let diff = data_mean - *value;

          diff * diff
        })
        .sum::<f64>()
        / (count - 1) as f64;

      Some(variance.sqrt())
    }
    _ => None,
  }
}


// ==========================================================================================
//                                 Indicator Tests
// ==========================================================================================

#[cfg(test)]
fn wavy_series(len: usize) -> PriceSeries {
  use crate::PricePoint;
  let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
  (0..len)
    .map(|i| {
      let close = 90.0 + (i as f64 * 0.7).sin() * 2.0 + i as f64 * 0.05;
      PricePoint::new(start + chrono::Duration::days(i as i64), close)
    })
    .collect()
}

#[test]
fn one_day_sma_equals_close() -> anyhow::Result<()> {
  let prices = wavy_series(40);
  for window in [1, 2, 7, 30] {
    let series = IndicatorSeries::compute(&prices, window)?;
    for row in series.rows.iter() {
      assert_eq!(row.sma_1, Some(row.close));
    }
  }
  Ok(())
}

#[test]
fn bands_are_four_std_devs_apart() -> anyhow::Result<()> {
  let series = IndicatorSeries::compute(&wavy_series(40), 7)?;
  for row in series.rows.iter() {
    match (row.upper_band, row.lower_band, row.std_dev) {
      (Some(upper), Some(lower), Some(std)) => {
        assert!((upper - lower - 4.0 * std).abs() < 1e-9);
        assert!((row.band_midpoint().unwrap() - row.sma_n.unwrap()).abs() < 1e-9);
      },
      (None, None, None) => (),
      other => panic!("band columns out of step: {:?}", other),
    }
  }
  assert!(series.rows[5].upper_band.is_none());
  assert!(series.rows[6].upper_band.is_some());
  Ok(())
}

#[test]
fn sma_window_is_rolling_mean() -> anyhow::Result<()> {
  let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
  let prices: PriceSeries = [1.0, 2.0, 3.0, 4.0, 5.0]
    .iter()
    .enumerate()
    .map(|(i, c)| crate::PricePoint::new(start + chrono::Duration::days(i as i64), *c))
    .collect();
  let series = IndicatorSeries::compute(&prices, 3)?;
  let sma: Vec<Option<f64>> = series.rows.iter().map(|r| r.sma_n).collect();
  assert_eq!(sma, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
  // sample std of three consecutive integers is exactly 1
  assert_eq!(series.rows[2].std_dev, Some(1.0));
  assert_eq!(series.rows[2].upper_band, Some(4.0));
  assert_eq!(series.rows[2].lower_band, Some(0.0));
  Ok(())
}

#[test]
fn cci_needs_twenty_rows() -> anyhow::Result<()> {
  let series = IndicatorSeries::compute(&wavy_series(30), 7)?;
  for row in series.rows.iter().take(CCI_WINDOW - 1) {
    assert!(row.cci.is_none());
  }
  for row in series.rows.iter().skip(CCI_WINDOW - 1) {
    assert!(row.cci.is_some());
  }

  let closes = wavy_series(30).closes();
  let window = &closes[closes.len() - CCI_WINDOW..];
  let expected = (closes[closes.len() - 1] - mean(window).unwrap())
    / (CCI_CONSTANT * sample_std_dev(window).unwrap());
  assert!((series.latest().unwrap().cci.unwrap() - expected).abs() < 1e-9);
  Ok(())
}

#[test]
fn cci_independent_of_sma_window() -> anyhow::Result<()> {
  let prices = wavy_series(30);
  let a = IndicatorSeries::compute(&prices, 3)?;
  let b = IndicatorSeries::compute(&prices, 25)?;
  let cci_a: Vec<Option<f64>> = a.rows.iter().map(|r| r.cci).collect();
  let cci_b: Vec<Option<f64>> = b.rows.iter().map(|r| r.cci).collect();
  assert_eq!(cci_a, cci_b);
  Ok(())
}

#[test]
fn flat_prices_have_no_cci() -> anyhow::Result<()> {
  let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
  let prices: PriceSeries = (0..25)
    .map(|i| crate::PricePoint::new(start + chrono::Duration::days(i), 1.25))
    .collect();
  let series = IndicatorSeries::compute(&prices, 7)?;
  assert!(series.rows.iter().all(|r| r.cci.is_none()));
  assert_eq!(series.latest().unwrap().std_dev, Some(0.0));
  Ok(())
}

#[test]
fn window_of_one_has_no_bands() -> anyhow::Result<()> {
  let series = IndicatorSeries::compute(&wavy_series(10), 1)?;
  assert!(series.rows.iter().all(|r| r.sma_n == Some(r.close)));
  assert!(series.rows.iter().all(|r| r.upper_band.is_none() && r.lower_band.is_none()));
  Ok(())
}

#[test]
fn compute_is_idempotent() -> anyhow::Result<()> {
  let prices = wavy_series(45);
  let a = IndicatorSeries::compute(&prices, 9)?;
  let b = IndicatorSeries::compute(&prices, 9)?;
  assert_eq!(a, b);
  Ok(())
}

#[test]
fn empty_and_zero_window() -> anyhow::Result<()> {
  let series = IndicatorSeries::compute(&PriceSeries::empty(), 7)?;
  assert!(series.is_empty());
  assert!(series.latest().is_none());
  assert!(series.trailing_days(7).is_empty());
  assert!(IndicatorSeries::compute(&wavy_series(5), 0).is_err());
  Ok(())
}

#[test]
fn trailing_days_is_calendar_based() -> anyhow::Result<()> {
  let series = IndicatorSeries::compute(&wavy_series(20), 7)?;
  let recent = series.trailing_days(7);
  // daily rows: the row exactly 7 days before the last is excluded
  assert_eq!(recent.len(), 7);
  assert_eq!(recent.last().unwrap().date, series.latest().unwrap().date);
  assert_eq!(series.tail(5).len(), 5);
  assert_eq!(series.previous().unwrap().date, series.rows[18].date);
  Ok(())
}
