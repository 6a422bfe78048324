use std::str::FromStr;
use crate::ForexError;

/// Bar size of a Yahoo chart request. Only daily or coarser bars, one per date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interval {
  #[default]
  OneDay,
  FiveDays,
  OneWeek,
  OneMonth,
  ThreeMonths,
}

impl Interval {
  pub fn as_str(&self) -> &'static str {
    match self {
      Interval::OneDay => "1d",
      Interval::FiveDays => "5d",
      Interval::OneWeek => "1wk",
      Interval::OneMonth => "1mo",
      Interval::ThreeMonths => "3mo",
    }
  }
}

impl FromStr for Interval {
  type Err = ForexError;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim() {
      "1d" => Ok(Interval::OneDay),
      "5d" => Ok(Interval::FiveDays),
      "1wk" => Ok(Interval::OneWeek),
      "1mo" => Ok(Interval::OneMonth),
      "3mo" => Ok(Interval::ThreeMonths),
      other => Err(ForexError::IntervalInvalid(other.to_string())),
    }
  }
}

impl std::fmt::Display for Interval {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}


#[test]
fn interval_parses_yahoo_codes() -> Result<(), ForexError> {
  assert_eq!("1d".parse::<Interval>()?, Interval::OneDay);
  assert_eq!("1wk".parse::<Interval>()?, Interval::OneWeek);
  assert_eq!(Interval::default().as_str(), "1d");
  assert!(matches!("2d".parse::<Interval>(), Err(ForexError::IntervalInvalid(_))));
  // intraday bars would collapse to one close per date
  assert!(matches!("1h".parse::<Interval>(), Err(ForexError::IntervalInvalid(_))));
  Ok(())
}
