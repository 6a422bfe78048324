use chrono::DateTime;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::full_palette::*;
use plotters::style::{BLACK, WHITE};
use std::path::Path;
use crate::{Dataset, IndicatorSeries, CCI_OVERBOUGHT, CCI_OVERSOLD};

/// A line to draw on a chart region.
pub struct Line {
  pub label: String,
  pub data: Dataset,
  pub color: RGBAColor,
}

impl Line {
  pub fn new(label: &str, data: Dataset, color: RGBColor) -> Self {
    Self {
      label: label.to_string(),
      data,
      color: RGBAColor::from(color),
    }
  }
}

pub struct Plot;

impl Plot {
  /// Two stacked regions: close price with the N-day SMA and Bollinger Bands,
  /// then CCI with the +100/-100 reference lines.
  pub fn indicators(series: &IndicatorSeries, out_file: &Path, ticker: &str) -> anyhow::Result<()> {
    if series.is_empty() {
      return Err(anyhow::anyhow!("Nothing to plot for {}", ticker));
    }

    let root = BitMapBackend::new(out_file, (2048, 1024)).into_drawing_area();
    root.fill(&WHITE).map_err(
      |e| anyhow::anyhow!("Failed to fill drawing area with white: {}", e)
    )?;
    let (upper, lower) = root.split_vertically(512);

    let sma_label = format!("{}-Day SMA", series.sma_window);
    Self::region(
      &upper,
      &format!("{} Price and Bollinger Bands", ticker),
      "Price",
      vec![
        Line::new("Close Price", series.column(|r| Some(r.close)), BLUE_600),
        Line::new(&sma_label, series.column(|r| r.sma_n), ORANGE_600),
        Line::new("Bollinger Upper Band", series.column(|r| r.upper_band), RED_800),
        Line::new("Bollinger Lower Band", series.column(|r| r.lower_band), GREEN_800),
      ],
    )?;

    let cci = series.column(|r| r.cci);
    let (min_x, max_x) = match series.rows.first().zip(series.rows.last()) {
      Some((first, last)) => (crate::date_to_unix_ms(first.date), crate::date_to_unix_ms(last.date)),
      None => (0, 0),
    };
    let reference = |y: f64| Dataset::new(vec![crate::Data { x: min_x, y }, crate::Data { x: max_x, y }]);
    Self::region(
      &lower,
      &format!("{} Commodity Channel Index (CCI)", ticker),
      "CCI",
      vec![
        Line::new("CCI", cci, PURPLE_600),
        Line::new("+100", reference(CCI_OVERBOUGHT), RED_800),
        Line::new("-100", reference(CCI_OVERSOLD), GREEN_800),
      ],
    )?;

    root.present().map_err(
      |e| anyhow::anyhow!("Failed to present root: {}", e)
    )?;

    Ok(())
  }

  fn region(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    title: &str,
    y_label: &str,
    lines: Vec<Line>,
  ) -> anyhow::Result<()> {
    let mut min_x = i64::MAX;
    let mut max_x = i64::MIN;
    let mut min_y = f64::MAX;
    let mut max_y = f64::MIN;
    for line in lines.iter().filter(|l| !l.data.is_empty()) {
      min_x = min_x.min(line.data.min_x());
      max_x = max_x.max(line.data.max_x());
      min_y = min_y.min(line.data.min_y());
      max_y = max_y.max(line.data.max_y());
    }
    if min_x > max_x {
      // every line is missing, e.g. CCI of a short series
      min_x = 0;
      max_x = 1;
      min_y = -1.0;
      max_y = 1.0;
    }
    if min_x == max_x {
      max_x += 1;
    }
    if min_y == max_y {
      min_y -= 1.0;
      max_y += 1.0;
    }

    let mut chart = ChartBuilder::on(area)
      .margin_top(20)
      .margin_bottom(20)
      .margin_left(30)
      .margin_right(30)
      .set_all_label_area_size(100)
      .caption(
        title,
        ("sans-serif", 36.0).into_font(),
      )
      .build_cartesian_2d(min_x..max_x, min_y..max_y).map_err(
      |e| anyhow::anyhow!("Failed to build cartesian 2d: {}", e)
    )?;
    chart
      .configure_mesh()
      .light_line_style(WHITE)
      .label_style(("sans-serif", 24, &BLACK).into_text_style(area))
      .x_label_formatter(&|x: &i64| {
        DateTime::from_timestamp_millis(*x)
          .map(|dt| dt.date_naive().to_string())
          .unwrap_or_default()
      })
      .x_desc("Date")
      .y_desc(y_label)
      .draw().map_err(
      |e| anyhow::anyhow!("Failed to draw mesh: {}", e)
    )?;

    for line in lines.into_iter() {
      let color = line.color;
      chart.draw_series(
        LineSeries::new(
          line.data.0.iter().map(|data| (data.x, data.y)),
          ShapeStyle {
            color,
            filled: true,
            stroke_width: 2,
          },
        ),
      ).map_err(
        |e| anyhow::anyhow!("Failed to draw series: {}", e)
      )?
        .label(line.label)
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    chart
      .configure_series_labels()
      .background_style(&WHITE.mix(0.8))
      .border_style(&BLACK)
      .draw().map_err(
      |e| anyhow::anyhow!("Failed to draw legend: {}", e)
    )?;

    Ok(())
  }
}


// ==========================================================================================
//                                 Plot Tests
// ==========================================================================================

#[test]
fn plot_short_and_long_series() -> anyhow::Result<()> {
  use crate::{PricePoint, PriceSeries};
  let start = chrono::NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
  // 1 row: single x value, no SMA or CCI. 3 rows: no CCI. 30 rows: every line drawn
  for len in [1, 3, 30] {
    let prices: PriceSeries = (0..len)
      .map(|i| PricePoint::new(start + chrono::Duration::days(i), 88.0 + (i % 4) as f64 * 0.3))
      .collect();
    let series = IndicatorSeries::compute(&prices, 7)?;
    let out_file = std::env::temp_dir().join(format!("time_series_plot_{}.png", len));
    Plot::indicators(&series, &out_file, "EURINR=X")?;
    assert!(out_file.exists());
    std::fs::remove_file(&out_file)?;
  }
  Ok(())
}

#[test]
fn plot_rejects_empty_series() {
  let series = IndicatorSeries {
    sma_window: 7,
    rows: vec![],
  };
  let out_file = std::env::temp_dir().join("time_series_plot_empty.png");
  assert!(Plot::indicators(&series, &out_file, "EURINR=X").is_err());
}
