pub mod price;
pub mod indicators;
pub mod plot;
pub mod data;
pub mod data_cache;
pub mod dataframe;
pub mod feed;

pub use price::*;
pub use indicators::*;
pub use plot::*;
pub use data::*;
pub use data_cache::*;
pub use dataframe::*;
pub use feed::*;

use log::*;
use simplelog::{
  ColorChoice, CombinedLogger, Config as SimpleLogConfig, ConfigBuilder, SharedLogger,
  TermLogger, TerminalMode, WriteLogger,
};
use std::fs::File;
use std::path::Path;

/// Logs to stderr so tables printed on stdout stay readable,
/// and additionally to `log_file` when one is given.
pub fn init_logger(level: LevelFilter, log_file: Option<&Path>) -> anyhow::Result<()> {
  let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
  loggers.push(TermLogger::new(
    level,
    SimpleLogConfig::default(),
    TerminalMode::Stderr,
    ColorChoice::Auto,
  ));
  if let Some(log_file) = log_file {
    loggers.push(WriteLogger::new(
      level,
      ConfigBuilder::new().set_time_format_rfc3339().build(),
      File::create(log_file)?,
    ));
  }
  Ok(CombinedLogger::init(loggers)?)
}
