//! Time-series chart laid out as SVG path data.
//!
//! Temperature and humidity share the time axis but each series is scaled
//! to its own value range, labelled on the left and right edges.

use chrono::{DateTime, Utc};
use std::fmt::Write;
use std::time::Duration;
use thermolog_core::Reading;

/// Chart width in SVG user units.
pub const CHART_WIDTH: u32 = 800;
/// Chart height in SVG user units.
pub const CHART_HEIGHT: u32 = 320;

const PAD_LEFT: f64 = 56.0;
const PAD_RIGHT: f64 = 56.0;
const PAD_TOP: f64 = 16.0;
const PAD_BOTTOM: f64 = 32.0;

/// One plotted line.
#[derive(Debug, Clone)]
pub struct Series {
    pub name: &'static str,
    pub unit: &'static str,
    pub color: &'static str,
    /// SVG path data; a new subpath starts after each gap in sampling.
    pub path: String,
    pub min_label: String,
    pub max_label: String,
    pub latest_label: String,
}

/// Fully laid out chart, ready for the template.
#[derive(Debug, Clone)]
pub struct Chart {
    pub width: u32,
    pub height: u32,
    pub plot_left: f64,
    pub plot_right: f64,
    pub plot_top: f64,
    pub plot_bottom: f64,
    pub temperature: Series,
    pub humidity: Series,
    pub start_label: String,
    pub end_label: String,
    pub point_count: usize,
}

impl Chart {
    /// Lays out readings (in time order) on a fixed-size chart.
    ///
    /// Consecutive readings more than `max_gap` apart are not joined.
    pub fn build(readings: &[Reading], max_gap: Duration) -> Self {
        let plot_left = PAD_LEFT;
        let plot_right = f64::from(CHART_WIDTH) - PAD_RIGHT;
        let plot_top = PAD_TOP;
        let plot_bottom = f64::from(CHART_HEIGHT) - PAD_BOTTOM;

        let x_axis = TimeAxis::new(readings, plot_left, plot_right);
        let max_gap = chrono::Duration::from_std(max_gap).unwrap_or(chrono::Duration::MAX);

        let mut temperature = Series::build(
            "Temperature",
            "°C",
            "#d9534f",
            readings,
            |r| r.temperature,
            &x_axis,
            (plot_top, plot_bottom),
            max_gap,
        );
        let mut humidity = Series::build(
            "Humidity",
            "%",
            "#428bca",
            readings,
            |r| r.humidity,
            &x_axis,
            (plot_top, plot_bottom),
            max_gap,
        );
        if readings.is_empty() {
            temperature.clear_labels();
            humidity.clear_labels();
        }

        Self {
            width: CHART_WIDTH,
            height: CHART_HEIGHT,
            plot_left,
            plot_right,
            plot_top,
            plot_bottom,
            temperature,
            humidity,
            start_label: readings.first().map(time_label).unwrap_or_default(),
            end_label: readings.last().map(time_label).unwrap_or_default(),
            point_count: readings.len(),
        }
    }

    /// Returns true if there is nothing to plot.
    pub fn is_empty(&self) -> bool {
        self.point_count == 0
    }
}

impl Series {
    #[allow(clippy::too_many_arguments)]
    fn build(
        name: &'static str,
        unit: &'static str,
        color: &'static str,
        readings: &[Reading],
        value: impl Fn(&Reading) -> f64,
        x_axis: &TimeAxis,
        (top, bottom): (f64, f64),
        max_gap: chrono::Duration,
    ) -> Self {
        let (min, max) = value_range(readings.iter().map(&value));
        let scale_y = |v: f64| top + (max - v) / (max - min) * (bottom - top);

        let mut path = String::new();
        let mut previous: Option<DateTime<Utc>> = None;
        for reading in readings {
            let command = match previous {
                Some(prev) if reading.timestamp - prev <= max_gap => 'L',
                _ => 'M',
            };
            if !path.is_empty() {
                path.push(' ');
            }
            let _ = write!(
                path,
                "{}{:.1},{:.1}",
                command,
                x_axis.scale(reading.timestamp),
                scale_y(value(reading))
            );
            previous = Some(reading.timestamp);
        }

        Self {
            name,
            unit,
            color,
            path,
            min_label: format!("{:.1}{}", min, unit),
            max_label: format!("{:.1}{}", max, unit),
            latest_label: readings
                .last()
                .map(|r| format!("{:.1}{}", value(r), unit))
                .unwrap_or_default(),
        }
    }

    fn clear_labels(&mut self) {
        self.min_label.clear();
        self.max_label.clear();
        self.latest_label.clear();
    }
}

/// Maps timestamps onto the horizontal plot range.
struct TimeAxis {
    start: Option<DateTime<Utc>>,
    span_secs: f64,
    left: f64,
    right: f64,
}

impl TimeAxis {
    fn new(readings: &[Reading], left: f64, right: f64) -> Self {
        let start = readings.first().map(|r| r.timestamp);
        let span_secs = match (readings.first(), readings.last()) {
            (Some(first), Some(last)) => {
                (last.timestamp - first.timestamp).num_milliseconds() as f64 / 1000.0
            }
            _ => 0.0,
        };
        Self {
            start,
            span_secs,
            left,
            right,
        }
    }

    fn scale(&self, timestamp: DateTime<Utc>) -> f64 {
        match self.start {
            Some(start) if self.span_secs > 0.0 => {
                let offset = (timestamp - start).num_milliseconds() as f64 / 1000.0;
                self.left + offset / self.span_secs * (self.right - self.left)
            }
            _ => (self.left + self.right) / 2.0,
        }
    }
}

/// Returns the (min, max) of the values, widened so the range is never empty.
fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        (0.0, 1.0)
    } else if max - min < f64::EPSILON {
        (min - 1.0, max + 1.0)
    } else {
        (min, max)
    }
}

fn time_label(reading: &Reading) -> String {
    reading.timestamp.format("%Y-%m-%d %H:%M UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const GAP: Duration = Duration::from_secs(120);

    fn reading(secs: i64, temperature: f64, humidity: f64) -> Reading {
        Reading {
            timestamp: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
            temperature,
            humidity,
        }
    }

    #[test]
    fn test_empty_chart() {
        let chart = Chart::build(&[], GAP);
        assert!(chart.is_empty());
        assert!(chart.temperature.path.is_empty());
        assert!(chart.humidity.path.is_empty());
        assert!(chart.temperature.latest_label.is_empty());
        assert!(chart.start_label.is_empty());
    }

    #[test]
    fn test_single_point_is_centered() {
        let chart = Chart::build(&[reading(0, 21.5, 47.2)], GAP);
        assert_eq!(chart.point_count, 1);
        assert_eq!(chart.temperature.path, "M400.0,152.0");
        assert_eq!(chart.temperature.latest_label, "21.5°C");
        assert_eq!(chart.humidity.min_label, "46.2%");
        assert_eq!(chart.humidity.max_label, "48.2%");
    }

    #[test]
    fn test_points_span_plot_area() {
        let chart = Chart::build(&[reading(0, 20.0, 40.0), reading(60, 30.0, 60.0)], GAP);
        assert_eq!(chart.temperature.path, "M56.0,288.0 L744.0,16.0");
        assert_eq!(chart.humidity.path, "M56.0,288.0 L744.0,16.0");
        assert_eq!(chart.temperature.min_label, "20.0°C");
        assert_eq!(chart.temperature.max_label, "30.0°C");
    }

    #[test]
    fn test_gap_starts_new_subpath() {
        let readings = [
            reading(0, 20.0, 40.0),
            reading(60, 21.0, 41.0),
            reading(600, 22.0, 42.0),
            reading(660, 23.0, 43.0),
        ];
        let chart = Chart::build(&readings, GAP);
        let commands: Vec<char> = chart
            .temperature
            .path
            .split(' ')
            .filter_map(|segment| segment.chars().next())
            .collect();
        assert_eq!(commands, vec!['M', 'L', 'M', 'L']);
    }

    #[test]
    fn test_value_range() {
        assert_eq!(value_range([].into_iter()), (0.0, 1.0));
        assert_eq!(value_range([5.0].into_iter()), (4.0, 6.0));
        assert_eq!(value_range([3.0, 1.0, 2.0].into_iter()), (1.0, 3.0));
    }
}
