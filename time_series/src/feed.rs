use chrono::NaiveDate;
use log::*;
use std::path::PathBuf;
use crate::{Dataframe, PriceSeries};

/// Source of historical close prices.
pub trait PriceFeed {
  /// Daily closes of `ticker` from `start` (inclusive) to `end` (exclusive).
  /// An unknown ticker or an empty date range is an empty series, not an error.
  fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> anyhow::Result<PriceSeries>;
}

impl<F: PriceFeed + ?Sized> PriceFeed for Box<F> {
  fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> anyhow::Result<PriceSeries> {
    (**self).fetch(ticker, start, end)
  }
}

/// Reads `<dir>/<TICKER>.csv` files exported with `Date` and `Close` columns.
#[derive(Debug, Clone)]
pub struct CsvFeed {
  pub dir: PathBuf,
}

impl CsvFeed {
  pub fn new(dir: PathBuf) -> Self {
    Self { dir }
  }

  pub fn path(&self, ticker: &str) -> PathBuf {
    self.dir.join(format!("{}.csv", ticker))
  }
}

impl PriceFeed for CsvFeed {
  fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> anyhow::Result<PriceSeries> {
    let path = self.path(ticker);
    if !path.exists() {
      warn!("No CSV series for {} at {}", ticker, path.display());
      return Ok(PriceSeries::empty());
    }
    Dataframe::csv_series(&path, Some(start), Some(end))
  }
}
