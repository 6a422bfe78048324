use chrono::NaiveDate;
use log::*;
use std::collections::{HashMap, VecDeque};
use crate::{PriceFeed, PriceSeries};

/// Parameters that identify one fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchKey {
  pub ticker: String,
  pub start: NaiveDate,
  pub end: NaiveDate,
}

impl FetchKey {
  pub fn new(ticker: &str, start: NaiveDate, end: NaiveDate) -> Self {
    Self {
      ticker: ticker.to_string(),
      start,
      end,
    }
  }
}

/// Read-through memoization of a [`PriceFeed`].
/// Identical requests are served from memory for the lifetime of the cache.
/// Failed fetches are not cached, so the next identical request tries again.
pub struct CachedFeed<F> {
  feed: F,
  map: HashMap<FetchKey, PriceSeries>,
  /// Insertion order, oldest at the back.
  order: VecDeque<FetchKey>,
  /// `None` is unbounded.
  pub capacity: Option<usize>,
  pub hits: usize,
  pub misses: usize,
}

impl<F: PriceFeed> CachedFeed<F> {
  pub fn new(feed: F) -> Self {
    Self::with_capacity(feed, None)
  }

  pub fn with_capacity(feed: F, capacity: Option<usize>) -> Self {
    Self {
      feed,
      map: HashMap::new(),
      order: VecDeque::new(),
      capacity,
      hits: 0,
      misses: 0,
    }
  }

  pub fn fetch(&mut self, key: &FetchKey) -> anyhow::Result<PriceSeries> {
    if let Some(series) = self.map.get(key) {
      self.hits += 1;
      debug!("Cache hit for {:?} ({} hits, {} misses)", key, self.hits, self.misses);
      return Ok(series.clone());
    }
    self.misses += 1;
    debug!("Cache miss for {:?} ({} hits, {} misses)", key, self.hits, self.misses);

    let series = self.feed.fetch(&key.ticker, key.start, key.end)?;
    self.insert(key.clone(), series.clone());
    Ok(series)
  }

  fn insert(&mut self, key: FetchKey, series: PriceSeries) {
    if let Some(capacity) = self.capacity {
      if capacity == 0 {
        return;
      }
      if self.order.len() == capacity {
        if let Some(oldest) = self.order.pop_back() {
          self.map.remove(&oldest);
        }
      }
    }
    self.order.push_front(key.clone());
    self.map.insert(key, series);
  }

  pub fn contains(&self, key: &FetchKey) -> bool {
    self.map.contains_key(key)
  }

  pub fn len(&self) -> usize {
    self.map.len()
  }

  pub fn is_empty(&self) -> bool {
    self.map.is_empty()
  }

  pub fn feed(&self) -> &F {
    &self.feed
  }
}


// ==========================================================================================
//                                 CachedFeed Tests
// ==========================================================================================

#[cfg(test)]
struct CountingFeed {
  calls: std::cell::Cell<usize>,
  fail: bool,
}

#[cfg(test)]
impl PriceFeed for CountingFeed {
  fn fetch(&self, ticker: &str, start: NaiveDate, _end: NaiveDate) -> anyhow::Result<PriceSeries> {
    self.calls.set(self.calls.get() + 1);
    if self.fail {
      return Err(anyhow::anyhow!("connection refused"));
    }
    if ticker == "UNKNOWN" {
      return Ok(PriceSeries::empty());
    }
    Ok(PriceSeries::new(vec![crate::PricePoint::new(start, 1.0)]))
  }
}

#[cfg(test)]
fn counting_feed(fail: bool) -> CountingFeed {
  CountingFeed {
    calls: std::cell::Cell::new(0),
    fail,
  }
}

#[test]
fn identical_requests_fetch_once() -> anyhow::Result<()> {
  let mut cache = CachedFeed::new(counting_feed(false));
  let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
  let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
  let key = FetchKey::new("EURINR=X", start, end);

  let a = cache.fetch(&key)?;
  let b = cache.fetch(&key)?;
  assert_eq!(a, b);
  assert_eq!(cache.feed().calls.get(), 1);
  assert_eq!((cache.hits, cache.misses), (1, 1));

  // any differing parameter is a new fetch
  cache.fetch(&FetchKey::new("USDINR=X", start, end))?;
  cache.fetch(&FetchKey::new("EURINR=X", start, end.pred_opt().unwrap()))?;
  assert_eq!(cache.feed().calls.get(), 3);
  assert_eq!(cache.len(), 3);
  Ok(())
}

#[test]
fn empty_results_are_cached() -> anyhow::Result<()> {
  let mut cache = CachedFeed::new(counting_feed(false));
  let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
  let key = FetchKey::new("UNKNOWN", start, start);
  assert!(cache.fetch(&key)?.is_empty());
  assert!(cache.fetch(&key)?.is_empty());
  assert_eq!(cache.feed().calls.get(), 1);
  Ok(())
}

#[test]
fn failures_are_not_cached() {
  let mut cache = CachedFeed::new(counting_feed(true));
  let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
  let key = FetchKey::new("EURINR=X", start, start);
  assert!(cache.fetch(&key).is_err());
  assert!(cache.fetch(&key).is_err());
  assert_eq!(cache.feed().calls.get(), 2);
  assert!(!cache.contains(&key));
}

#[test]
fn capacity_evicts_oldest() -> anyhow::Result<()> {
  let mut cache = CachedFeed::with_capacity(counting_feed(false), Some(2));
  let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
  let keys: Vec<FetchKey> = ["A", "B", "C"].iter().map(|t| FetchKey::new(t, start, start)).collect();
  for key in keys.iter() {
    cache.fetch(key)?;
  }
  assert_eq!(cache.len(), 2);
  assert!(!cache.contains(&keys[0]));
  assert!(cache.contains(&keys[1]));
  assert!(cache.contains(&keys[2]));
  Ok(())
}
