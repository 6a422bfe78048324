use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
  pub date: NaiveDate,
  pub close: f64,
}

impl PricePoint {
  pub fn new(date: NaiveDate, close: f64) -> Self {
    Self { date, close }
  }
}

/// Daily close prices of a single instrument.
/// 0th index is the earliest date, Nth index is the latest date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries(Vec<PricePoint>);

impl PriceSeries {
  /// Sorts points by date and keeps the last observation of a duplicated date.
  /// Points with a non-finite close are dropped.
  pub fn new(mut points: Vec<PricePoint>) -> Self {
    points.retain(|p| p.close.is_finite());
    // stable sort keeps feed order within a date, so the last one wins below
    points.sort_by_key(|p| p.date);
    let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
    for point in points {
      match deduped.last_mut() {
        Some(last) if last.date == point.date => *last = point,
        _ => deduped.push(point),
      }
    }
    Self(deduped)
  }

  pub fn empty() -> Self {
    Self::default()
  }

  pub fn points(&self) -> &[PricePoint] {
    &self.0
  }

  pub fn closes(&self) -> Vec<f64> {
    self.0.iter().map(|p| p.close).collect()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn first(&self) -> Option<&PricePoint> {
    self.0.first()
  }

  pub fn last(&self) -> Option<&PricePoint> {
    self.0.last()
  }

  /// Points dated `start <= date < end`.
  pub fn within(&self, start: NaiveDate, end: NaiveDate) -> Self {
    Self(
      self
        .0
        .iter()
        .filter(|p| p.date >= start && p.date < end)
        .copied()
        .collect(),
    )
  }

  /// First `n` points, like the head of a dataframe.
  pub fn head(&self, n: usize) -> &[PricePoint] {
    &self.0[..n.min(self.0.len())]
  }
}

impl FromIterator<PricePoint> for PriceSeries {
  fn from_iter<I: IntoIterator<Item = PricePoint>>(iter: I) -> Self {
    Self::new(iter.into_iter().collect())
  }
}


// ==========================================================================================
//                                 PriceSeries Tests
// ==========================================================================================

#[test]
fn price_series_sorts_and_dedups() {
  let d = |day: u32| NaiveDate::from_ymd_opt(2023, 1, day).unwrap();
  let series = PriceSeries::new(vec![
    PricePoint::new(d(3), 3.0),
    PricePoint::new(d(1), 1.0),
    PricePoint::new(d(2), 2.0),
    PricePoint::new(d(2), 2.5),
    PricePoint::new(d(4), f64::NAN),
  ]);
  assert_eq!(series.len(), 3);
  assert_eq!(series.closes(), vec![1.0, 2.5, 3.0]);
  assert_eq!(series.first().unwrap().date, d(1));
  assert_eq!(series.last().unwrap().date, d(3));
  assert_eq!(series.head(2).len(), 2);
  assert_eq!(series.head(10).len(), 3);
}

#[test]
fn within_keeps_start_and_drops_end() {
  let d = |day: u32| NaiveDate::from_ymd_opt(2023, 6, day).unwrap();
  let series: PriceSeries = (1..=6).map(|day| PricePoint::new(d(day), day as f64)).collect();
  let trimmed = series.within(d(2), d(5));
  assert_eq!(trimmed.closes(), vec![2.0, 3.0, 4.0]);
  assert!(series.within(d(5), d(5)).is_empty());
}
