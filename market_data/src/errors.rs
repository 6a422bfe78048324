use chrono::NaiveDate;
use std::env::VarError;
use std::num::ParseIntError;
use thiserror::Error;

pub type ForexResult<T> = Result<T, ForexError>;

#[derive(Debug, Error)]
pub enum ForexError {
    #[error("End date must be after the start date. (start {start}, end {end})")]
    DateRange { start: NaiveDate, end: NaiveDate },
    #[error("{name} must be between {min} and {max}, got {value}")]
    WindowOutOfRange {
        name: &'static str,
        value: usize,
        min: usize,
        max: usize,
    },
    #[error("No data found for the given ticker symbol {0}. Please try again.")]
    NoData(String),
    #[error("Ticker symbol must not be empty")]
    EmptyTicker,
    #[error("YahooApiError: code: {code}, description: {description}")]
    YahooApi { code: String, description: String },
    #[error("UnknownParameter: {0}")]
    UnknownParameter(String),
    #[error("IntervalInvalid: {0}")]
    IntervalInvalid(String),
    #[error("FeedInvalid: {0}")]
    FeedInvalid(String),
    #[error("Reqwest: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Io: {0}")]
    Io(#[from] std::io::Error),
    #[error("ParseInt: {0}")]
    ParseInt(#[from] ParseIntError),
    #[error("ParseDate: {0}")]
    ParseDate(#[from] chrono::ParseError),
    #[error("UrlParser: {0}")]
    UrlParser(#[from] url::ParseError),
    #[error("Json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("EnvInvalid: {0}")]
    EnvInvalid(#[from] VarError),
    #[error("Anyhow: {0}")]
    Anyhow(#[from] anyhow::Error),
    #[error("Custom: {0}")]
    Custom(String),
}

impl ForexError {
    /// Errors caused by the request parameters, reported to the user before any fetch.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::DateRange { .. }
                | Self::WindowOutOfRange { .. }
                | Self::EmptyTicker
                | Self::UnknownParameter(_)
                | Self::IntervalInvalid(_)
                | Self::FeedInvalid(_)
                | Self::ParseInt(_)
                | Self::ParseDate(_)
        )
    }
}
