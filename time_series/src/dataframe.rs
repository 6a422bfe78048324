use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;
use crate::{IndicatorRow, IndicatorSeries, PricePoint, PriceSeries};

/// Column layout of an exported indicator table.
#[derive(Debug, Serialize)]
struct IndicatorRecord {
  #[serde(rename = "Date")]
  date: NaiveDate,
  #[serde(rename = "Close")]
  close: f64,
  #[serde(rename = "1-Day Simple Moving Average")]
  sma_1: Option<f64>,
  #[serde(rename = "N-Day Simple Moving Average")]
  sma_n: Option<f64>,
  #[serde(rename = "Bollinger Upper Band")]
  upper_band: Option<f64>,
  #[serde(rename = "Bollinger Lower Band")]
  lower_band: Option<f64>,
  #[serde(rename = "CCI")]
  cci: Option<f64>,
}

impl From<&IndicatorRow> for IndicatorRecord {
  fn from(row: &IndicatorRow) -> Self {
    Self {
      date: row.date,
      close: row.close,
      sma_1: row.sma_1,
      sma_n: row.sma_n,
      upper_band: row.upper_band,
      lower_band: row.lower_band,
      cci: row.cci,
    }
  }
}

pub struct Dataframe;

impl Dataframe {
  /// Read close prices from a CSV file with `Date` and `Close` headers.
  /// Dates may be `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS...`, `YYYYMMDD` or a UNIX timestamp in seconds.
  /// Keeps rows with `start <= date < end` and sorts them by date.
  pub fn csv_series(csv_path: &Path, start: Option<NaiveDate>, end: Option<NaiveDate>) -> anyhow::Result<PriceSeries> {
    let file_buffer = File::open(csv_path)?;
    let mut csv = csv::Reader::from_reader(file_buffer);

    let headers = csv.headers()?.clone();
    let column = |name: &str| {
      headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| anyhow::anyhow!("CSV {} has no {} column", csv_path.display(), name))
    };
    let date_col = column("Date")?;
    let close_col = column("Close")?;

    let mut points = vec![];
    for record in csv.records() {
      let record = record?;
      let (date, close) = match (record.get(date_col), record.get(close_col)) {
        (Some(date), Some(close)) => (date.trim(), close.trim()),
        _ => continue,
      };
      // blank closes are holidays in yfinance exports
      if close.is_empty() {
        continue;
      }
      points.push(PricePoint {
        date: Self::parse_date(date)?,
        close: f64::from_str(close)?,
      });
    }

    points.retain(|p| {
      match (start, end) {
        (Some(start), Some(end)) => p.date >= start && p.date < end,
        (Some(start), None) => p.date >= start,
        (None, Some(end)) => p.date < end,
        (None, None) => true,
      }
    });

    Ok(PriceSeries::new(points))
  }

  pub fn parse_date(field: &str) -> anyhow::Result<NaiveDate> {
    // compact YYYYMMDD before UNIX seconds, which would read it as 1970
    if field.len() == 8 && field.chars().all(|c| c.is_ascii_digit()) {
      return Ok(NaiveDate::parse_from_str(field, "%Y%m%d")?);
    }
    if let Ok(secs) = field.parse::<i64>() {
      return DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| anyhow::anyhow!("UNIX timestamp out of range: {}", secs));
    }
    let day = field.get(..10).unwrap_or(field);
    Ok(NaiveDate::parse_from_str(day, "%Y-%m-%d")?)
  }

  /// Write the indicator table with one row per date, missing values left blank.
  pub fn write_indicators(series: &IndicatorSeries, csv_path: &Path) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(csv_path)?;
    for row in series.rows.iter() {
      writer.serialize(IndicatorRecord::from(row))?;
    }
    writer.flush()?;
    Ok(())
  }
}


// ==========================================================================================
//                                 Dataframe Tests
// ==========================================================================================

#[test]
fn csv_series_reads_yfinance_export() -> anyhow::Result<()> {
  let path = std::env::temp_dir().join("time_series_csv_series_test.csv");
  std::fs::write(
    &path,
    "Date,Open,High,Low,Close,Adj Close,Volume\n\
     2023-01-04 00:00:00+00:00,88.1,88.9,87.9,88.5,88.5,0\n\
     2023-01-02,88.0,88.4,87.6,88.2,88.2,0\n\
     2023-01-03,88.2,88.6,88.0,,,0\n\
     2023-01-05,88.5,89.0,88.3,88.9,88.9,0\n",
  )?;
  let start = NaiveDate::from_ymd_opt(2023, 1, 1);
  let end = NaiveDate::from_ymd_opt(2023, 1, 5);
  let series = Dataframe::csv_series(&path, start, end)?;
  std::fs::remove_file(&path)?;

  assert_eq!(series.closes(), vec![88.2, 88.5]);
  assert_eq!(series.last().unwrap().date, NaiveDate::from_ymd_opt(2023, 1, 4).unwrap());
  Ok(())
}

#[test]
fn csv_series_requires_close_column() -> anyhow::Result<()> {
  let path = std::env::temp_dir().join("time_series_csv_no_close_test.csv");
  std::fs::write(&path, "Date,Open\n2023-01-02,1.0\n")?;
  let res = Dataframe::csv_series(&path, None, None);
  std::fs::remove_file(&path)?;
  assert!(res.is_err());
  Ok(())
}

#[test]
fn parse_unix_and_compact_dates() -> anyhow::Result<()> {
  assert_eq!(Dataframe::parse_date("1672617600")?, NaiveDate::from_ymd_opt(2023, 1, 2).unwrap());
  assert_eq!(Dataframe::parse_date("20230104")?, NaiveDate::from_ymd_opt(2023, 1, 4).unwrap());
  assert!(Dataframe::parse_date("20231345").is_err());
  assert!(Dataframe::parse_date("02/01/2023").is_err());
  Ok(())
}

#[test]
fn write_indicators_leaves_missing_blank() -> anyhow::Result<()> {
  let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
  let prices: PriceSeries = [1.0, 2.0, 3.0]
    .iter()
    .enumerate()
    .map(|(i, c)| PricePoint::new(start + chrono::Duration::days(i as i64), *c))
    .collect();
  let series = IndicatorSeries::compute(&prices, 2)?;
  let path = std::env::temp_dir().join("time_series_write_indicators_test.csv");
  Dataframe::write_indicators(&series, &path)?;
  let text = std::fs::read_to_string(&path)?;
  std::fs::remove_file(&path)?;

  let lines: Vec<&str> = text.lines().collect();
  assert_eq!(lines.len(), 4);
  assert!(lines[0].starts_with("Date,Close,1-Day Simple Moving Average"));
  assert_eq!(lines[1], "2023-01-02,1.0,1.0,,,,");
  Ok(())
}
