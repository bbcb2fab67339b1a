//! Stacked area geometry for the visitors chart.
//!
//! Everything is laid out in a fixed `WIDTH` x `HEIGHT` SVG viewport and
//! scaled by the browser. Layers stack in declaration order, so the last
//! declared category sits on top and is painted last.

use chrono::NaiveDate;

use crate::domain::{DailyVisitors, DeviceType};

pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 250;

const PAD_TOP: f64 = 8.0;
const PAD_X: f64 = 12.0;
const AXIS_HEIGHT: f64 = 28.0;

/// Minimum horizontal space between two tick labels
const MIN_TICK_GAP: f64 = 32.0;
/// Rough rendered width of an "Oct 19" label
const TICK_LABEL_WIDTH: f64 = 40.0;

const GRID_LINES: usize = 4;

/// A charted category and its presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartSeries {
    pub device: DeviceType,
    pub key: &'static str,
    pub label: &'static str,
    pub color: &'static str,
}

/// Declaration order; stacking goes bottom to top
pub const SERIES: [ChartSeries; 2] = [
    ChartSeries {
        device: DeviceType::Mobile,
        key: "mobile",
        label: "Mobile",
        color: "var(--chart-2)",
    },
    ChartSeries {
        device: DeviceType::Desktop,
        key: "desktop",
        label: "Desktop",
        color: "var(--chart-1)",
    },
];

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub key: &'static str,
    pub color: &'static str,
    /// Closed area between this layer's top edge and the one below
    pub area: String,
    /// Top edge only
    pub stroke: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub x: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TooltipEntry {
    pub label: &'static str,
    pub color: &'static str,
    pub value: String,
}

/// Hover column for one day, positioned in percent of the chart width
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub left_pct: String,
    pub width_pct: String,
    /// Flip the box to the left of the cursor on the right half
    pub flip: bool,
    pub label: String,
    pub entries: Vec<TooltipEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendItem {
    pub label: &'static str,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AreaChart {
    pub width: u32,
    pub height: u32,
    pub baseline: String,
    pub grid: Vec<String>,
    pub layers: Vec<Layer>,
    pub ticks: Vec<Tick>,
    pub tooltips: Vec<Tooltip>,
    pub legend: Vec<LegendItem>,
}

impl AreaChart {
    /// Lay out `series`; `None` when there is nothing to draw
    pub fn build(series: &[DailyVisitors]) -> Option<Self> {
        if series.is_empty() {
            return None;
        }

        let plot_width = f64::from(WIDTH) - 2.0 * PAD_X;
        let bottom = f64::from(HEIGHT) - AXIS_HEIGHT;
        let plot_height = bottom - PAD_TOP;

        let max_total = series.iter().map(DailyVisitors::total).max().unwrap_or(0).max(1) as f64;
        let step = if series.len() > 1 {
            plot_width / (series.len() - 1) as f64
        } else {
            0.0
        };
        let x_at = |i: usize| {
            if series.len() > 1 {
                PAD_X + step * i as f64
            } else {
                PAD_X + plot_width / 2.0
            }
        };
        let y_at = |value: i64| bottom - (value as f64 / max_total) * plot_height;

        let mut layers = Vec::with_capacity(SERIES.len());
        let mut below = vec![0i64; series.len()];
        for series_def in SERIES.iter() {
            let top: Vec<i64> = series
                .iter()
                .zip(&below)
                .map(|(day, base)| base.saturating_add(day.count(series_def.device)))
                .collect();

            let upper: Vec<(f64, f64)> = top
                .iter()
                .enumerate()
                .map(|(i, v)| (x_at(i), y_at(*v)))
                .collect();
            let lower: Vec<(f64, f64)> = below
                .iter()
                .enumerate()
                .rev()
                .map(|(i, v)| (x_at(i), y_at(*v)))
                .collect();

            let stroke = polyline(&upper);
            let area = format!("{} {} Z", stroke, polyline(&lower).replacen('M', "L", 1));

            layers.push(Layer {
                key: series_def.key,
                color: series_def.color,
                area,
                stroke,
            });
            below = top;
        }

        let ticks = thin_ticks(series.iter().enumerate().map(|(i, d)| (x_at(i), d.date)));

        let column = 100.0 / series.len() as f64;
        let tooltips = series
            .iter()
            .enumerate()
            .map(|(i, day)| {
                let center = x_at(i) / f64::from(WIDTH) * 100.0;
                Tooltip {
                    left_pct: fmt_coord((center - column / 2.0).max(0.0)),
                    width_pct: fmt_coord(column),
                    flip: center > 50.0,
                    label: tooltip_label(day.date),
                    entries: SERIES
                        .iter()
                        .rev()
                        .map(|series_def| TooltipEntry {
                            label: series_def.label,
                            color: series_def.color,
                            value: crate::dashboard::intcomma(day.count(series_def.device)),
                        })
                        .collect(),
                }
            })
            .collect();

        let grid = (0..GRID_LINES)
            .map(|i| fmt_coord(PAD_TOP + plot_height * i as f64 / GRID_LINES as f64))
            .collect();

        Some(Self {
            width: WIDTH,
            height: HEIGHT,
            baseline: fmt_coord(bottom),
            grid,
            layers,
            ticks,
            tooltips,
            legend: legend(),
        })
    }

    /// Tick labels sit just under the plot
    pub fn tick_y(&self) -> String {
        fmt_coord(f64::from(self.height) - AXIS_HEIGHT / 2.0 + 4.0)
    }
}

pub fn legend() -> Vec<LegendItem> {
    SERIES
        .iter()
        .map(|series_def| LegendItem {
            label: series_def.label,
            color: series_def.color,
        })
        .collect()
}

/// "Oct 19"
pub fn tick_label(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

/// "Mon, Oct 19"
pub fn tooltip_label(date: NaiveDate) -> String {
    date.format("%a, %b %-d").to_string()
}

fn thin_ticks(points: impl Iterator<Item = (f64, NaiveDate)>) -> Vec<Tick> {
    let mut ticks = Vec::new();
    let mut last_x: Option<f64> = None;

    for (x, date) in points {
        if let Some(prev) = last_x {
            if x - prev < TICK_LABEL_WIDTH + MIN_TICK_GAP {
                continue;
            }
        }
        ticks.push(Tick {
            x: fmt_coord(x),
            label: tick_label(date),
        });
        last_x = Some(x);
    }
    ticks
}

fn polyline(points: &[(f64, f64)]) -> String {
    let mut path = String::new();
    for (i, (x, y)) in points.iter().enumerate() {
        if i > 0 {
            path.push(' ');
        }
        path.push(if i == 0 { 'M' } else { 'L' });
        path.push_str(&fmt_coord(*x));
        path.push(',');
        path.push_str(&fmt_coord(*y));
    }
    path
}

fn fmt_coord(v: f64) -> String {
    format!("{:.1}", v)
}
