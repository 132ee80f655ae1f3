//! Reading analysis.
//!
//! Pure functions deriving time series and summaries from a station's readings.
//! Every reading slice is assumed to be sorted in ascending chronological order.
//! None of these functions read the clock: windows are computed by the caller.

use crate::error::{AnalysisError, AnalysisResult};
use crate::model::{Field, Reading, Station};
use crate::stats::{Point, TimeSeries, compute_min_max, median};
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone};
use serde::Serialize;
use std::{collections::HashMap, fmt};

/// Transform applied to a field value while projecting readings into a time series.
pub type Transform = fn(i64) -> f64;

/// Convert a timestamp to milliseconds since the Unix epoch.
///
/// The calendar fields are interpreted as UTC. Sub-second precision is dropped.
pub fn epoch_millis(timestamp: &NaiveDateTime) -> i64 {
    timestamp.and_utc().timestamp() * 1000
}

/// Convert a zoned timestamp to milliseconds since the Unix epoch, reading its
/// wall-clock fields as UTC and ignoring its offset.
pub fn epoch_millis_wall_clock<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> i64 {
    epoch_millis(&timestamp.naive_local())
}

pub fn identity(val: i64) -> f64 {
    val as f64
}

/// Scale a value by 1/1000 (W to kW, Wh to kWh, VA to kVA).
pub fn kilo(val: i64) -> f64 {
    val as f64 / 1000.0
}

/// Convert readings into one time series per requested field, in the order requested.
///
/// Each series holds one point per reading.
pub fn timeseries(readings: &[Reading], fields: &[&str]) -> AnalysisResult<Vec<TimeSeries>> {
    timeseries_with(readings, fields, &HashMap::new())
}

/// Like [`timeseries`], but values of the fields present in `transforms` are
/// mapped through the associated function instead of converted as they are.
pub fn timeseries_with(
    readings: &[Reading],
    fields: &[&str],
    transforms: &HashMap<Field, Transform>,
) -> AnalysisResult<Vec<TimeSeries>> {
    let fields = fields
        .iter()
        .map(|name| name.parse::<Field>())
        .collect::<AnalysisResult<Vec<_>>>()?;

    let series = fields
        .into_iter()
        .map(|field| {
            let transform = transforms.get(&field).copied().unwrap_or(identity);
            project(readings, field, transform)
        })
        .collect();
    Ok(series)
}

fn project(readings: &[Reading], field: Field, transform: Transform) -> TimeSeries {
    readings
        .iter()
        .map(|reading| {
            Point(
                epoch_millis(&reading.timestamp),
                transform(reading.value(field)),
            )
        })
        .collect()
}

/// Create a time series of energy consumption in watt-hours per hour.
///
/// The anchor starts at the first reading; a point is emitted by the first reading
/// at least one hour past the anchor, which then becomes the new anchor. Buckets
/// therefore drift with the readings instead of following clock hours.
pub fn energy_timeseries(readings: &[Reading]) -> TimeSeries {
    let period = Duration::hours(1);
    let mut series = TimeSeries::new();

    let Some(mut current) = readings.first() else {
        return series;
    };
    for reading in readings {
        if reading.timestamp - current.timestamp >= period {
            series.push(Point(
                epoch_millis(&reading.timestamp),
                (reading.watt_hours - current.watt_hours) as f64,
            ));
            current = reading;
        }
    }
    series
}

/// Compute the median watts over all given readings.
pub fn median_watts(readings: &[Reading]) -> AnalysisResult<f64> {
    if readings.is_empty() {
        return Err(AnalysisError::EmptyInput("median_watts"));
    }
    median(&project(readings, Field::Watts, identity))
}

/// Compute the total kWh used over all given readings.
///
/// First and last readings are taken by position. A counter reset between them
/// yields a negative total.
pub fn total_kwh(readings: &[Reading]) -> AnalysisResult<f64> {
    match (readings.first(), readings.last()) {
        (Some(first), Some(last)) => Ok((last.watt_hours - first.watt_hours) as f64 / 1000.0),
        _ => Err(AnalysisError::EmptyInput("total_kwh")),
    }
}

/// Power usage summary of a single station.
#[derive(Debug, PartialEq, Serialize)]
pub struct UsageSummary {
    /// Median daily consumption extrapolated from hourly deltas, if any hour was observed.
    pub median_kwh_day: Option<f64>,
    pub kwh_tot: f64,
    pub w_max: i64,
    pub w_min: i64,
}

pub fn usage_summary(readings: &[Reading]) -> AnalysisResult<UsageSummary> {
    let kwh_tot = total_kwh(readings)?;
    let (w_min, w_max) = compute_min_max(readings.iter().map(|reading| reading.watts))
        .ok_or(AnalysisError::EmptyInput("usage_summary"))?;

    let energy_series = energy_timeseries(readings);
    let median_kwh_day = if energy_series.is_empty() {
        None
    } else {
        Some(median(&energy_series)? * 24.0 / 1000.0)
    };

    Ok(UsageSummary {
        median_kwh_day,
        kwh_tot,
        w_max,
        w_min,
    })
}

/// Leaderboard row.
#[derive(Debug, PartialEq, Serialize)]
pub struct LeaderEntry {
    pub station_id: String,
    pub station_name: String,
    pub total_kwh: f64,
}

/// Rank stations by increasing energy usage over their readings.
///
/// Usage is the spread of the `watt_hours` counter. Stations without readings are left out.
pub fn rank_stations<'a, I>(windows: I) -> Vec<LeaderEntry>
where
    I: IntoIterator<Item = (&'a Station, &'a [Reading])>,
{
    let mut leaders: Vec<_> = windows
        .into_iter()
        .filter_map(|(station, readings)| {
            let (min, max) = compute_min_max(readings.iter().map(|reading| reading.watt_hours))?;
            Some(LeaderEntry {
                station_id: station.id.clone(),
                station_name: station.name.clone(),
                total_kwh: (max - min) as f64 / 1000.0,
            })
        })
        .collect();
    leaders.sort_by(|a, b| a.total_kwh.total_cmp(&b.total_kwh));
    leaders
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub enum StatusLevel {
    Ok,
    Warn,
    Error,
}

impl StatusLevel {
    /// HTTP status code reported to health checkers.
    pub fn code(self) -> u16 {
        match self {
            StatusLevel::Ok => 200,
            StatusLevel::Warn => 306,
            StatusLevel::Error => 500,
        }
    }
}

/// Health report built from per-station reading counts over a recent window.
#[derive(Debug, PartialEq)]
pub struct StatusReport {
    pub level: StatusLevel,
    pub timeout: Duration,
    pub counts: Vec<(String, usize)>,
}

/// Classify station reading counts gathered over the last `timeout`.
///
/// No station reporting (which includes having no stations at all) is an error;
/// some stations not reporting is a warning.
pub fn station_status(counts: Vec<(String, usize)>, timeout: Duration) -> StatusReport {
    let zero_count = counts.iter().filter(|(_, count)| *count == 0).count();
    let level = if zero_count == counts.len() {
        StatusLevel::Error
    } else if zero_count > 0 {
        StatusLevel::Warn
    } else {
        StatusLevel::Ok
    };
    StatusReport {
        level,
        timeout,
        counts,
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let minutes = self.timeout.num_minutes();
        match self.level {
            StatusLevel::Ok => write!(f, "OK")?,
            StatusLevel::Warn => write!(
                f,
                "WARN: at least one station has not reported data in the past {minutes} minutes"
            )?,
            StatusLevel::Error => write!(
                f,
                "ERROR: no stations have reported data in the past {minutes} minutes"
            )?,
        }
        write!(f, "\n\nStation reading counts in past {minutes} minutes\n")?;
        let lines: Vec<_> = self
            .counts
            .iter()
            .map(|(name, count)| format!("{name}\t\t{count}"))
            .collect();
        write!(f, "{}", lines.join("\n"))
    }
}
