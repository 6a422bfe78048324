use chrono::NaiveDate;
use log::LevelFilter;
use market_data::*;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;
use time_series::{FetchKey, DEFAULT_SMA_WINDOW};

pub const SMA_WINDOW_RANGE: RangeInclusive<usize> = 1..=30;
pub const BOLLINGER_WINDOW_RANGE: RangeInclusive<usize> = 5..=30;
pub const DEFAULT_TICKER: &str = "EURINR=X";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Where prices come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedKind {
  Yahoo,
  /// Directory of `<TICKER>.csv` files
  Csv(PathBuf),
}

/// Parameters of a dashboard request plus the process-wide settings read at start up.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
  pub sma_window: usize,
  /// Accepted and range checked, but the bands always use `sma_window`.
  pub bollinger_window: usize,
  pub ticker: String,
  pub start: NaiveDate,
  pub end: NaiveDate,
  pub interval: Interval,
  pub feed: FeedKind,
  pub cache_capacity: Option<usize>,
  pub plot_file: Option<PathBuf>,
  pub log_level: LevelFilter,
  pub log_file: Option<PathBuf>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      sma_window: DEFAULT_SMA_WINDOW,
      bollinger_window: DEFAULT_SMA_WINDOW,
      ticker: DEFAULT_TICKER.to_string(),
      start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
      end: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
      interval: Interval::default(),
      feed: FeedKind::Yahoo,
      cache_capacity: None,
      plot_file: None,
      log_level: LevelFilter::Info,
      log_file: None,
    }
  }
}

/// Request parameters that can change while the dashboard runs.
pub const PARAMETERS: [&str; 6] = [
  "sma_window",
  "bollinger_window",
  "ticker",
  "start_date",
  "end_date",
  "plot_file",
];

const SETTINGS: [&str; 6] = [
  "interval",
  "feed",
  "csv_dir",
  "cache_capacity",
  "log_level",
  "log_file",
];

impl Config {
  /// Reads the environment (after `.env` is loaded), falling back to defaults.
  pub fn from_env() -> ForexResult<Self> {
    let mut vars = vec![];
    for key in PARAMETERS.iter().chain(SETTINGS.iter()) {
      match std::env::var(key.to_ascii_uppercase()) {
        Ok(value) => vars.push((key.to_string(), value)),
        Err(std::env::VarError::NotPresent) => (),
        Err(e) => return Err(ForexError::EnvInvalid(e)),
      }
    }
    Self::from_vars(vars)
  }

  pub fn from_vars<I: IntoIterator<Item = (String, String)>>(vars: I) -> ForexResult<Self> {
    let mut config = Self::default();
    let mut csv_dir = None;
    for (key, value) in vars {
      let key = key.to_ascii_lowercase();
      let value = value.trim();
      match key.as_str() {
        "interval" => config.interval = Interval::from_str(value)?,
        "csv_dir" => csv_dir = Some(PathBuf::from(value)),
        "feed" => {
          config.feed = match value.to_ascii_lowercase().as_str() {
            "yahoo" => FeedKind::Yahoo,
            "csv" => FeedKind::Csv(PathBuf::new()),
            other => return Err(ForexError::FeedInvalid(other.to_string())),
          }
        }
        "cache_capacity" => config.cache_capacity = Some(value.parse::<usize>()?),
        "log_level" => {
          config.log_level = LevelFilter::from_str(value)
            .map_err(|_| ForexError::Custom(format!("Invalid log level: {}", value)))?
        }
        "log_file" => config.log_file = Some(PathBuf::from(value)),
        _ => config.set(&key, value)?,
      }
    }
    if let FeedKind::Csv(dir) = &mut config.feed {
      *dir = csv_dir.unwrap_or_else(|| PathBuf::from("."));
    }
    Ok(config)
  }

  /// Updates one request parameter from its text form.
  pub fn set(&mut self, key: &str, value: &str) -> ForexResult<()> {
    let value = value.trim();
    match key.trim().to_ascii_lowercase().as_str() {
      "sma_window" => self.sma_window = value.parse::<usize>()?,
      "bollinger_window" => self.bollinger_window = value.parse::<usize>()?,
      "ticker" => self.ticker = value.to_string(),
      "start_date" | "start" => self.start = NaiveDate::parse_from_str(value, DATE_FORMAT)?,
      "end_date" | "end" => self.end = NaiveDate::parse_from_str(value, DATE_FORMAT)?,
      "plot_file" => self.plot_file = Some(PathBuf::from(value)),
      other => return Err(ForexError::UnknownParameter(other.to_string())),
    }
    Ok(())
  }

  /// Checks made before any fetch.
  pub fn validate(&self) -> ForexResult<()> {
    if self.end < self.start {
      return Err(ForexError::DateRange {
        start: self.start,
        end: self.end,
      });
    }
    check_window("SMA window", self.sma_window, &SMA_WINDOW_RANGE)?;
    check_window("Bollinger Band window", self.bollinger_window, &BOLLINGER_WINDOW_RANGE)?;
    if self.ticker.trim().is_empty() {
      return Err(ForexError::EmptyTicker);
    }
    Ok(())
  }

  pub fn fetch_key(&self) -> FetchKey {
    FetchKey::new(self.ticker.trim(), self.start, self.end)
  }

  /// Chart output path, `<ticker>_indicators.png` unless configured.
  pub fn plot_file(&self) -> PathBuf {
    match &self.plot_file {
      Some(path) => path.clone(),
      None => {
        let name: String = self
          .ticker
          .trim()
          .chars()
          .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
          .collect();
        PathBuf::from(format!("{}_indicators.png", name))
      }
    }
  }
}

fn check_window(name: &'static str, value: usize, range: &RangeInclusive<usize>) -> ForexResult<()> {
  match range.contains(&value) {
    true => Ok(()),
    false => Err(ForexError::WindowOutOfRange {
      name,
      value,
      min: *range.start(),
      max: *range.end(),
    }),
  }
}


// ==========================================================================================
//                                 Config Tests
// ==========================================================================================

#[cfg(test)]
fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
  pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn defaults_match_dashboard() -> ForexResult<()> {
  let config = Config::from_vars(vec![])?;
  assert_eq!(config.sma_window, 7);
  assert_eq!(config.bollinger_window, 7);
  assert_eq!(config.ticker, "EURINR=X");
  assert_eq!(config.start.to_string(), "2023-01-01");
  assert_eq!(config.end.to_string(), "2024-01-01");
  assert_eq!(config.feed, FeedKind::Yahoo);
  assert_eq!(config.plot_file(), PathBuf::from("EURINR_X_indicators.png"));
  config.validate()
}

#[test]
fn reads_env_style_keys() -> ForexResult<()> {
  let config = Config::from_vars(vars(&[
    ("SMA_WINDOW", "14"),
    ("TICKER", "USDJPY=X"),
    ("START_DATE", "2022-06-01"),
    ("FEED", "csv"),
    ("CSV_DIR", "data"),
    ("CACHE_CAPACITY", "8"),
    ("LOG_LEVEL", "debug"),
  ]))?;
  assert_eq!(config.sma_window, 14);
  assert_eq!(config.ticker, "USDJPY=X");
  assert_eq!(config.start, NaiveDate::from_ymd_opt(2022, 6, 1).unwrap());
  assert_eq!(config.feed, FeedKind::Csv(PathBuf::from("data")));
  assert_eq!(config.cache_capacity, Some(8));
  assert_eq!(config.log_level, LevelFilter::Debug);

  assert!(matches!(Config::from_vars(vars(&[("FEED", "bloomberg")])), Err(ForexError::FeedInvalid(_))));
  assert!(matches!(Config::from_vars(vars(&[("INTERVAL", "1h")])), Err(ForexError::IntervalInvalid(_))));
  assert!(matches!(Config::from_vars(vars(&[("SMA_WINDOW", "seven")])), Err(ForexError::ParseInt(_))));
  Ok(())
}

#[test]
fn end_before_start_is_rejected() -> ForexResult<()> {
  let mut config = Config::default();
  config.set("end_date", "2022-12-31")?;
  let err = config.validate().unwrap_err();
  assert!(err.is_validation());
  assert!(err.to_string().starts_with("End date must be after the start date."));

  // same day is allowed
  config.set("end_date", "2023-01-01")?;
  config.validate()
}

#[test]
fn windows_are_range_checked() -> ForexResult<()> {
  let mut config = Config::default();
  config.set("sma_window", "31")?;
  assert!(matches!(config.validate(), Err(ForexError::WindowOutOfRange { name: "SMA window", .. })));
  config.set("sma_window", "1")?;
  config.set("bollinger_window", "4")?;
  assert!(matches!(config.validate(), Err(ForexError::WindowOutOfRange { min: 5, max: 30, .. })));
  config.set("bollinger_window", "30")?;
  config.validate()?;

  config.set("ticker", "  ")?;
  assert!(matches!(config.validate(), Err(ForexError::EmptyTicker)));
  assert!(matches!(config.set("rsi_window", "14"), Err(ForexError::UnknownParameter(_))));
  Ok(())
}
