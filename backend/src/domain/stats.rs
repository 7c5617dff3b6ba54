//! Distance and speed aggregates over a rider's trips.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

use chrono::{FixedOffset, NaiveDate};
use tracing::warn;

use crate::domain::{Meters, Trip, TripId};

const SECONDS_PER_HOUR: f64 = 3600.0;
const KILOMETERS_PER_MILE: f64 = 1.60934;

fn kilometers(meters: Meters) -> f64 {
    meters as f64 / 1000.0
}

fn speed_kmh(meters: Meters, elapsed: Duration) -> Option<f64> {
    let hours = elapsed.as_secs_f64() / SECONDS_PER_HOUR;
    (hours > 0.0).then(|| kilometers(meters) / hours)
}

/// Totals for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailySummary {
    /// Local calendar day.
    pub date: NaiveDate,
    /// Distance ridden that day.
    pub distance: Meters,
    /// Sum of the per-trip speeds that day, in km/h.
    pub speed_total: f64,
}

/// Aggregated riding statistics.
///
/// Days are calendar dates of each trip's start time in the offset passed to
/// [`TripStats::compute`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TripStats {
    /// Distance over every resolved trip.
    pub total: Meters,
    /// Riding time over every resolved trip.
    pub total_time: Duration,
    /// Distance per day.
    pub daily_distance: BTreeMap<NaiveDate, Meters>,
    /// Sum of per-trip speeds per day, in km/h.
    pub daily_speed_total: BTreeMap<NaiveDate, f64>,
    /// Total distance over total time, in km/h. Zero when no time elapsed.
    pub average_speed_kmh: f64,
}

impl TripStats {
    /// Aggregate `trips` using the resolved `distances`.
    ///
    /// Trips without a resolved distance are skipped.
    pub fn compute(trips: &[Trip], distances: &HashMap<TripId, Meters>, offset: FixedOffset) -> Self {
        let mut stats = Self::default();
        for trip in trips {
            let Some(&distance) = distances.get(&trip.id) else {
                warn!(trip = %trip, "no distance resolved for trip; skipping");
                continue;
            };

            let day = trip.started_at.with_timezone(&offset).date_naive();
            let elapsed = trip.duration();
            *stats.daily_distance.entry(day).or_default() += distance;
            let daily_speed = stats.daily_speed_total.entry(day).or_default();
            if let Some(speed) = speed_kmh(distance, elapsed) {
                *daily_speed += speed;
            }

            stats.total += distance;
            stats.total_time += elapsed;
        }
        stats.average_speed_kmh = speed_kmh(stats.total, stats.total_time).unwrap_or(0.0);
        stats
    }

    /// Total distance in kilometers.
    pub fn total_km(&self) -> f64 {
        kilometers(self.total)
    }

    /// Total distance in statute miles.
    pub fn total_mi(&self) -> f64 {
        self.total_km() / KILOMETERS_PER_MILE
    }

    /// Average speed in miles per hour.
    pub fn average_speed_mph(&self) -> f64 {
        self.average_speed_kmh / KILOMETERS_PER_MILE
    }

    /// One summary per day from `from` to `to` inclusive, zero-filled.
    pub fn daily_series(&self, from: NaiveDate, to: NaiveDate) -> Vec<DailySummary> {
        from.iter_days()
            .take_while(|date| *date <= to)
            .map(|date| DailySummary {
                date,
                distance: self.daily_distance.get(&date).copied().unwrap_or(0),
                speed_total: self.daily_speed_total.get(&date).copied().unwrap_or(0.0),
            })
            .collect()
    }
}

impl fmt::Display for TripStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total:")?;
        writeln!(f, "  {:.1} km ({:.1} mi)", self.total_km(), self.total_mi())?;
        writeln!(
            f,
            "  {:.1} km/h ({:.1} mph) average",
            self.average_speed_kmh,
            self.average_speed_mph()
        )?;
        write!(f, "Details:")?;
        for (date, distance) in self.daily_distance.iter().rev() {
            write!(f, "\n  {} {:.1} km", date.format("%m/%d/%Y"), kilometers(*distance))?;
        }
        Ok(())
    }
}
