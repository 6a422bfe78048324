use serde::{Serialize, Deserialize};

/// A plottable point: x is UNIX milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Data {
  pub x: i64,
  pub y: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset(pub Vec<Data>);

impl Dataset {
  pub fn new(data: Vec<Data>) -> Self {
    Self(data)
  }

  pub fn data(&self) -> &Vec<Data> {
    &self.0
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn min_x(&self) -> i64 {
    self.0.iter().map(|d| d.x).min().unwrap_or(i64::MAX)
  }

  pub fn max_x(&self) -> i64 {
    self.0.iter().map(|d| d.x).max().unwrap_or(i64::MIN)
  }

  pub fn min_y(&self) -> f64 {
    self.0.iter().map(|d| d.y).fold(f64::INFINITY, |a, b| a.min(b))
  }

  pub fn max_y(&self) -> f64 {
    self.0.iter().map(|d| d.y).fold(f64::NEG_INFINITY, |a, b| a.max(b))
  }
}
