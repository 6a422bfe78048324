use chrono::NaiveDate;
use log::*;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::time::SystemTime;
use time_series::{PriceFeed, PriceSeries};
use url::Url;
use crate::builder::Chart;
use crate::errors::{ForexError, ForexResult};
use crate::model::ChartResponse;
use crate::Interval;

pub const YAHOO_CHART_API: &str = "https://query1.finance.yahoo.com/v8/finance/chart/";
// the chart endpoint rejects requests without a browser user agent
const BROWSER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Blocking client of the Yahoo Finance chart API.
#[derive(Clone)]
pub struct YahooClient {
    host: String,
    interval: Interval,
    inner_client: HttpClient,
}

impl YahooClient {
    pub fn new(host: String, interval: Interval) -> ForexResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_AGENT));
        let inner_client = HttpClient::builder()
            .default_headers(headers)
            .build()?;
        Ok(Self {
            host,
            interval,
            inner_client,
        })
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// Chart endpoint URL, with the symbol percent-encoded as one path segment.
    pub fn url(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> ForexResult<Url> {
        let mut url = Url::parse(&self.host)?;
        url.path_segments_mut()
            .map_err(|_| ForexError::Custom(format!("Host cannot be a base URL: {}", self.host)))?
            .pop_if_empty()
            .push(ticker);
        url.set_query(Some(&Chart::request(start, end, self.interval)));
        Ok(url)
    }

    /// Daily closes from `start` to `end` (exclusive).
    /// An unknown symbol or an empty range comes back as an empty series.
    pub fn chart(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> ForexResult<PriceSeries> {
        let url = self.url(ticker, start, end)?;
        let pre = SystemTime::now();
        let response = self.inner_client.get(url).send()?;
        let status = response.status();
        let body = response.text()?;
        let dur = SystemTime::now()
            .duration_since(pre)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        info!("Fetched {} {}..{} in {}ms ({})", ticker, start, end, dur, status);

        match serde_json::from_str::<ChartResponse>(&body) {
            Ok(chart) => Ok(chart.price_series()?.within(start, end)),
            Err(e) if status.is_success() => Err(ForexError::Json(e)),
            Err(_) => {
                error!("🛑 Yahoo returned {} for {}: {}", status, ticker, body);
                Err(ForexError::YahooApi {
                    code: status.to_string(),
                    description: body,
                })
            }
        }
    }
}

impl PriceFeed for YahooClient {
    fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> anyhow::Result<PriceSeries> {
        Ok(self.chart(ticker, start, end)?)
    }
}


#[test]
fn url_encodes_symbol_segment() -> ForexResult<()> {
    let client = YahooClient::new(YAHOO_CHART_API.to_string(), Interval::OneDay)?;
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();

    let url = client.url("EURINR=X", start, end)?;
    assert_eq!(url.path(), "/v8/finance/chart/EURINR=X");
    assert!(url.query().unwrap().contains("interval=1d"));

    let url = client.url("A/B", start, end)?;
    assert_eq!(url.path(), "/v8/finance/chart/A%2FB");
    Ok(())
}
