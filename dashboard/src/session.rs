use log::*;
use market_data::*;
use playbook::Analysis;
use std::io::Write;
use std::path::{Path, PathBuf};
use time_series::{CachedFeed, Dataframe, Plot, PriceFeed, PriceSeries};
use crate::config::Config;
use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
  Continue,
  Quit,
}

/// Result of the last successful request.
#[derive(Debug, Clone)]
pub struct Report {
  pub prices: PriceSeries,
  pub analysis: Analysis,
}

/// Interactive dashboard: holds the current parameters and the fetch cache,
/// and recomputes everything whenever a parameter changes.
pub struct Session<F: PriceFeed> {
  pub config: Config,
  feed: CachedFeed<F>,
  last: Option<Report>,
}

impl<F: PriceFeed> Session<F> {
  pub fn new(config: Config, feed: CachedFeed<F>) -> Self {
    Self {
      config,
      feed,
      last: None,
    }
  }

  pub fn last(&self) -> Option<&Report> {
    self.last.as_ref()
  }

  pub fn feed(&self) -> &CachedFeed<F> {
    &self.feed
  }

  /// Validates the parameters, fetches (or reuses) prices and runs the analysis.
  pub fn request(&mut self) -> ForexResult<Report> {
    self.config.validate()?;
    let key = self.config.fetch_key();
    let prices = self.feed.fetch(&key)?;
    let analysis = Analysis::run(&prices, self.config.sma_window)?
      .ok_or_else(|| ForexError::NoData(key.ticker.clone()))?;
    Ok(Report { prices, analysis })
  }

  /// Recomputes and prints the dashboard. Request errors are printed, not returned.
  pub fn refresh<W: Write>(&mut self, out: &mut W) -> ForexResult<()> {
    match self.request() {
      Ok(report) => {
        write!(
          out,
          "{}",
          render::dashboard(&self.config, report.prices.head(render::HEAD_ROWS), &report.analysis)
        )?;
        self.last = Some(report);
      }
      Err(e) => {
        match e.is_validation() {
          true => warn!("🟡 {}", e),
          false => error!("🛑 {}", e),
        }
        write!(out, "{}", render::error(&e))?;
        self.last = None;
      }
    }
    Ok(())
  }

  /// Handles one line of input. Only failures to write output are returned as errors.
  pub fn handle<W: Write>(&mut self, line: &str, out: &mut W) -> ForexResult<Control> {
    let line = line.trim();
    if line.is_empty() {
      return Ok(Control::Continue);
    }
    // `key=value` only when the key is a single word, so `export a=b.csv` stays a command
    let assignment = line
      .split_once('=')
      .filter(|(key, _)| !key.trim().contains(char::is_whitespace));
    if let Some((key, value)) = assignment {
      match self.config.set(key, value) {
        Ok(()) => self.refresh(out)?,
        Err(e) => write!(out, "{}", render::error(&e))?,
      }
      return Ok(Control::Continue);
    }
    let (command, arg) = match line.split_once(char::is_whitespace) {
      Some((command, arg)) => (command, Some(arg.trim())),
      None => (line, None),
    };
    match command.to_ascii_lowercase().as_str() {
      "quit" | "exit" | "q" => return Ok(Control::Quit),
      "help" | "?" => write!(out, "{}", render::help())?,
      "show" | "refresh" => self.refresh(out)?,
      "plot" => match self.plot() {
        Ok(path) => writeln!(out, "Chart written to {}", path.display())?,
        Err(e) => write!(out, "{}", render::error(&e))?,
      },
      "export" => {
        let path = match arg {
          Some(arg) if !arg.is_empty() => PathBuf::from(arg),
          _ => {
            writeln!(out, "Usage: export <PATH>")?;
            return Ok(Control::Continue);
          }
        };
        match self.export(&path) {
          Ok(()) => writeln!(out, "Indicators written to {}", path.display())?,
          Err(e) => write!(out, "{}", render::error(&e))?,
        }
      }
      other => writeln!(out, "Unknown command: {}. Type `help` for commands.", other)?,
    }
    Ok(Control::Continue)
  }

  fn report(&self) -> ForexResult<&Report> {
    self
      .last()
      .ok_or_else(|| ForexError::NoData(self.config.ticker.clone()))
  }

  /// Draws the chart of the last successful request.
  pub fn plot(&self) -> ForexResult<PathBuf> {
    let report = self.report()?;
    let path = self.config.plot_file();
    Plot::indicators(&report.analysis.indicators, &path, &self.config.ticker)?;
    info!("Plot written to {}", path.display());
    Ok(path)
  }

  pub fn export(&self, path: &Path) -> ForexResult<()> {
    let report = self.report()?;
    Dataframe::write_indicators(&report.analysis.indicators, path)?;
    info!("Indicators written to {}", path.display());
    Ok(())
  }
}


// ==========================================================================================
//                                 Session Tests
// ==========================================================================================

#[cfg(test)]
struct FakeFeed {
  calls: std::cell::Cell<usize>,
}

#[cfg(test)]
impl PriceFeed for FakeFeed {
  fn fetch(&self, ticker: &str, start: chrono::NaiveDate, end: chrono::NaiveDate) -> anyhow::Result<PriceSeries> {
    use time_series::PricePoint;
    self.calls.set(self.calls.get() + 1);
    if ticker == "NOPE=X" {
      return Ok(PriceSeries::empty());
    }
    let days = (end - start).num_days();
    Ok(
      (0..days)
        .map(|i| PricePoint::new(start + chrono::Duration::days(i), 80.0 + (i % 5) as f64 * 0.1))
        .collect(),
    )
  }
}

#[cfg(test)]
fn session() -> Session<FakeFeed> {
  colored::control::set_override(false);
  let feed = FakeFeed {
    calls: std::cell::Cell::new(0),
  };
  Session::new(Config::default(), CachedFeed::new(feed))
}

#[cfg(test)]
fn output(out: Vec<u8>) -> String {
  String::from_utf8(out).unwrap()
}

#[test]
fn refresh_prints_every_section() -> ForexResult<()> {
  let mut session = session();
  let mut out = vec![];
  session.refresh(&mut out)?;
  let text = output(out);
  assert!(text.contains("### Data Head:"));
  assert!(text.contains("### Data with Indicators:"));
  assert!(text.contains("### Indicator Decisions Table:"));
  assert!(text.contains("### Indicator Summary (Recent Trends):"));
  let report = session.last().unwrap();
  assert_eq!(report.prices.len(), 365);
  assert_eq!(report.analysis.indicators.len(), 365);
  Ok(())
}

#[test]
fn unchanged_range_is_fetched_once() -> ForexResult<()> {
  let mut session = session();
  let mut out = vec![];
  session.refresh(&mut out)?;
  // the window only changes the computation, not the fetch
  session.handle("sma_window=14", &mut out)?;
  session.handle("show", &mut out)?;
  assert_eq!(session.feed().feed().calls.get(), 1);
  assert_eq!(session.last().unwrap().analysis.indicators.sma_window, 14);

  session.handle("start_date=2023-06-01", &mut out)?;
  assert_eq!(session.feed().feed().calls.get(), 2);
  Ok(())
}

#[test]
fn invalid_input_is_reported_and_skips_fetch() -> ForexResult<()> {
  let mut session = session();
  let mut out = vec![];
  session.handle("end_date=2022-01-01", &mut out)?;
  session.handle("sma_window=abc", &mut out)?;
  session.handle("rsi=3", &mut out)?;
  let text = output(out);
  assert!(text.contains("End date must be after the start date."));
  assert!(text.contains("UnknownParameter: rsi"));
  assert_eq!(session.feed().feed().calls.get(), 0);
  assert!(session.last().is_none());
  Ok(())
}

#[test]
fn empty_feed_reports_no_data() -> ForexResult<()> {
  let mut session = session();
  let mut out = vec![];
  assert_eq!(session.handle("ticker=NOPE=X", &mut out)?, Control::Continue);
  let text = output(out);
  assert!(text.contains("No data found for the given ticker symbol NOPE=X. Please try again."));
  assert!(matches!(session.plot(), Err(ForexError::NoData(_))));
  Ok(())
}

#[test]
fn export_and_quit() -> ForexResult<()> {
  let mut session = session();
  let mut out = vec![];
  session.refresh(&mut out)?;
  let path = std::env::temp_dir().join("dashboard_session_export.csv");
  session.handle(&format!("export {}", path.display()), &mut out)?;
  let csv = std::fs::read_to_string(&path)?;
  std::fs::remove_file(&path)?;
  assert!(csv.starts_with("Date,Close,1-Day Simple Moving Average"));
  assert_eq!(csv.lines().count(), 366);

  let path = std::env::temp_dir().join("dashboard_session_export=1.csv");
  session.handle(&format!("export {}", path.display()), &mut out)?;
  assert!(path.exists());
  std::fs::remove_file(&path)?;

  assert_eq!(session.handle("bogus", &mut out)?, Control::Continue);
  assert_eq!(session.handle("quit", &mut out)?, Control::Quit);
  Ok(())
}
