use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use log::*;
use serde::{Deserialize, Serialize};
use time_series::{PricePoint, PriceSeries};
use crate::errors::{ForexError, ForexResult};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChartResponse {
    pub chart: ChartBody,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChartBody {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChartError {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChartResult {
    pub meta: ChartMeta,
    /// Absent when the range holds no bars.
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: ChartIndicators,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub symbol: String,
    /// IANA zone of the exchange, e.g. `Europe/London`.
    #[serde(default)]
    pub exchange_timezone_name: Option<String>,
    /// Seconds east of UTC at request time. Only used when the zone name is unknown.
    #[serde(default)]
    pub gmtoffset: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChartIndicators {
    #[serde(default)]
    pub quote: Vec<QuoteBlock>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QuoteBlock {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

impl ChartResponse {
    /// Converts the response into daily closes.
    /// An API error such as an unknown symbol is logged and becomes an empty series.
    pub fn price_series(self) -> ForexResult<PriceSeries> {
        if let Some(error) = self.chart.error {
            warn!("🟡 Yahoo chart error {}: {}", error.code, error.description);
            return Ok(PriceSeries::empty());
        }
        let result = match self.chart.result.and_then(|r| r.into_iter().next()) {
            Some(result) => result,
            None => return Ok(PriceSeries::empty()),
        };
        result.price_series()
    }
}

impl ChartResult {
    pub fn price_series(&self) -> ForexResult<PriceSeries> {
        let closes = match self.indicators.quote.first() {
            Some(quote) => &quote.close,
            None => return Ok(PriceSeries::empty()),
        };
        let mut points = Vec::with_capacity(self.timestamp.len());
        for (ts, close) in self.timestamp.iter().zip(closes.iter()) {
            // null closes are bars without trades
            let close = match close {
                Some(close) => *close,
                None => continue,
            };
            points.push(PricePoint::new(self.bar_date(*ts)?, close));
        }
        debug!("{}: {} bars, {} with a close", self.meta.symbol, self.timestamp.len(), points.len());
        Ok(PriceSeries::new(points))
    }

    /// Calendar date of a bar in the exchange's own time zone.
    pub fn bar_date(&self, ts: i64) -> ForexResult<NaiveDate> {
        let utc = DateTime::from_timestamp(ts, 0)
            .ok_or_else(|| ForexError::Custom(format!("Bar timestamp out of range: {}", ts)))?;
        let zone = self
            .meta
            .exchange_timezone_name
            .as_deref()
            .and_then(|name| name.parse::<Tz>().ok());
        match zone {
            Some(zone) => Ok(utc.with_timezone(&zone).date_naive()),
            None => {
                let shifted = DateTime::from_timestamp(ts + self.meta.gmtoffset, 0)
                    .ok_or_else(|| ForexError::Custom(format!("Bar timestamp out of range: {}", ts)))?;
                Ok(shifted.date_naive())
            }
        }
    }
}


// ==========================================================================================
//                                 Yahoo Model Tests
// ==========================================================================================

#[test]
fn chart_response_dates_bars_in_exchange_time() -> ForexResult<()> {
    // EURINR=X bars are stamped 23:00 UTC of the previous day during British summer time
    let json = r#"{
      "chart": {
        "result": [{
          "meta": {
            "currency": "INR",
            "symbol": "EURINR=X",
            "exchangeTimezoneName": "Europe/London",
            "gmtoffset": 3600
          },
          "timestamp": [1685919600, 1686006000, 1686092400],
          "indicators": {
            "quote": [{
              "open": [88.1, 88.4, null],
              "close": [88.25, null, 88.71]
            }],
            "adjclose": [{ "adjclose": [88.25, null, 88.71] }]
          }
        }],
        "error": null
      }
    }"#;
    let response: ChartResponse = serde_json::from_str(json)?;
    let series = response.price_series()?;
    assert_eq!(series.closes(), vec![88.25, 88.71]);
    assert_eq!(series.first().unwrap().date, NaiveDate::from_ymd_opt(2023, 6, 5).unwrap());
    assert_eq!(series.last().unwrap().date, NaiveDate::from_ymd_opt(2023, 6, 7).unwrap());
    Ok(())
}

#[test]
fn bar_dates_follow_the_exchange_zone_not_the_request_offset() -> ForexResult<()> {
    // requested in winter: gmtoffset is 0, yet the June bar is stamped 23:00 UTC (00:00 BST)
    let json = r#"{
      "chart": {
        "result": [{
          "meta": { "symbol": "EURINR=X", "exchangeTimezoneName": "Europe/London", "gmtoffset": 0 },
          "timestamp": [1672531200, 1685919600],
          "indicators": { "quote": [{ "close": [88.7, 89.9] }] }
        }],
        "error": null
      }
    }"#;
    let response: ChartResponse = serde_json::from_str(json)?;
    let series = response.price_series()?;
    assert_eq!(series.first().unwrap().date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
    assert_eq!(series.last().unwrap().date, NaiveDate::from_ymd_opt(2023, 6, 5).unwrap());
    // the end date stays exclusive once the padded range is trimmed
    let jan_1 = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    let jun_5 = NaiveDate::from_ymd_opt(2023, 6, 5).unwrap();
    assert_eq!(series.within(jan_1, jun_5).closes(), vec![88.7]);
    Ok(())
}

#[test]
fn unknown_zone_falls_back_to_gmtoffset() -> ForexResult<()> {
    let json = r#"{
      "chart": {
        "result": [{
          "meta": { "symbol": "EURINR=X", "gmtoffset": 3600 },
          "timestamp": [1685919600],
          "indicators": { "quote": [{ "close": [89.9] }] }
        }],
        "error": null
      }
    }"#;
    let response: ChartResponse = serde_json::from_str(json)?;
    let series = response.price_series()?;
    assert_eq!(series.last().unwrap().date, NaiveDate::from_ymd_opt(2023, 6, 5).unwrap());
    Ok(())
}

#[test]
fn chart_error_is_empty_series() -> ForexResult<()> {
    let json = r#"{
      "chart": {
        "result": null,
        "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
      }
    }"#;
    let response: ChartResponse = serde_json::from_str(json)?;
    assert!(response.price_series()?.is_empty());
    Ok(())
}

#[test]
fn range_without_bars_is_empty_series() -> ForexResult<()> {
    let json = r#"{
      "chart": {
        "result": [{
          "meta": { "symbol": "EURINR=X", "gmtoffset": 0 },
          "indicators": { "quote": [{}] }
        }],
        "error": null
      }
    }"#;
    let response: ChartResponse = serde_json::from_str(json)?;
    assert!(response.price_series()?.is_empty());
    Ok(())
}
