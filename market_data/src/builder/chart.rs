use std::collections::BTreeMap;
use chrono::{Duration, NaiveDate};
use crate::Interval;

pub struct Chart {
  /// Start of the range as UNIX seconds, inclusive
  pub period1: i64,
  /// End of the range as UNIX seconds, exclusive
  pub period2: i64,
  /// Bar size (e.g. 1d, 1wk)
  pub interval: Interval,
}

impl Chart {
  /// Query string for the v8 chart endpoint covering `start..end`.
  /// Bars are stamped at exchange midnight, which can fall on the previous UTC day,
  /// so the range is padded by a day on each side and trimmed once bars are dated.
  pub fn request(start: NaiveDate, end: NaiveDate, interval: Interval) -> String {
    let me = Self {
      period1: Self::midnight(start - Duration::days(1)),
      period2: Self::midnight(end + Duration::days(1)),
      interval,
    };
    me.create_request()
  }

  fn midnight(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
      .map(|dt| dt.and_utc().timestamp())
      .unwrap_or_default()
  }

  fn build(&self) -> BTreeMap<String, String> {
    let mut btree = BTreeMap::<String, String>::new();
    btree.insert("period1".to_string(), self.period1.to_string());
    btree.insert("period2".to_string(), self.period2.to_string());
    btree.insert("interval".to_string(), self.interval.as_str().to_string());
    btree.insert("events".to_string(), "history".to_string());
    btree.insert("includeAdjustedClose".to_string(), "true".to_string());
    btree
  }

  fn create_request(&self) -> String {
    let btree = self.build();
    let mut request = String::new();
    for (key, value) in btree.iter() {
      request.push_str(&format!("{}={}&", key, value));
    }
    request.pop();
    request
  }
}


#[test]
fn chart_request_pads_range_by_a_day() {
  let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
  let end = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
  // 2023-01-01 00:00 UTC .. 2024-01-01 00:00 UTC
  assert_eq!(
    Chart::request(start, end, Interval::OneDay),
    "events=history&includeAdjustedClose=true&interval=1d&period1=1672531200&period2=1704067200"
  );
}
