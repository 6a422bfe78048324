mod config;
mod render;
mod session;
use config::*;
use session::*;

use dotenv::dotenv;
use log::*;
use market_data::*;
use std::io::{BufRead, Write};
use time_series::{init_logger, CachedFeed, CsvFeed, PriceFeed};

fn main() -> ForexResult<()> {
  dotenv().ok();
  let config = Config::from_env()?;
  init_logger(config.log_level, config.log_file.as_deref())?;

  let feed: Box<dyn PriceFeed> = match &config.feed {
    FeedKind::Yahoo => {
      info!("Fetching {} bars from Yahoo Finance", config.interval);
      Box::new(YahooClient::new(YAHOO_CHART_API.to_string(), config.interval)?)
    }
    FeedKind::Csv(dir) => {
      info!("Reading prices from CSV files in {}", dir.display());
      Box::new(CsvFeed::new(dir.clone()))
    }
  };
  let cache = CachedFeed::with_capacity(feed, config.cache_capacity);
  let mut session = Session::new(config, cache);

  let stdout = std::io::stdout();
  let mut out = stdout.lock();
  write!(out, "{}", render::banner())?;
  session.refresh(&mut out)?;
  out.flush()?;

  let stdin = std::io::stdin();
  for line in stdin.lock().lines() {
    let line = line?;
    let control = session.handle(&line, &mut out)?;
    out.flush()?;
    if control == Control::Quit {
      break;
    }
  }

  let cache = session.feed();
  info!(
    "Shutting down dashboard, cache hits: {}, misses: {}",
    cache.hits, cache.misses
  );
  Ok(())
}
