//! Chart series derived from aggregated buckets.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::protocol::ChartPoint;

const BYTES_PER_MIB: f64 = 1_048_576.0;

/// Parallel series ready for plotting, oldest bucket first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    /// Bucket end time
    pub labels: Vec<DateTime<Utc>>,
    pub requests_per_sec: Vec<f64>,
    pub connects_per_sec: Vec<f64>,
    pub avg_latency_micros: Vec<f64>,
    pub memory_mib: Vec<f64>,
}

impl ChartSeries {
    /// Compute every series from the buckets as the server sent them, then
    /// reverse all of them together.
    pub fn from_points(points: &[ChartPoint]) -> Self {
        let mut series = Self::default();

        for point in points.iter().rev() {
            let seconds = point.end.saturating_sub(point.start) as f64 / 1000.0;

            series.labels.push(label(point.end));
            series.requests_per_sec.push(rate(point.requests, seconds));
            series.connects_per_sec.push(rate(point.connects, seconds));
            series.avg_latency_micros.push(if point.requests == 0 {
                0.0
            } else {
                point.latency_sum as f64 / point.requests as f64
            });
            series.memory_mib.push(point.memory_bytes as f64 / BYTES_PER_MIB);
        }

        series
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

fn rate(count: u64, seconds: f64) -> f64 {
    if seconds > 0.0 {
        count as f64 / seconds
    } else {
        0.0
    }
}

fn label(millis: u64) -> DateTime<Utc> {
    i64::try_from(millis)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or_default()
}
