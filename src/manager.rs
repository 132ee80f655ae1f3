use crate::analysis::{
    self, LeaderEntry, Transform, epoch_millis_wall_clock, kilo, rank_stations, station_status,
    timeseries, timeseries_with, usage_summary,
};
use crate::config::Config;
use crate::model::{Field, Reading};
use crate::period::parse_period;
use crate::stats::TimeSeries;
use crate::store::Store;
use anyhow::{Context, Result, bail};
use chrono::{Duration, Local, NaiveDateTime};
use serde::Serialize;
use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
};

/// Timestamp format accepted on the command line.
pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Chart series in the shape expected by flot.
#[derive(Debug, Serialize)]
pub struct ChartSeries {
    pub data: TimeSeries,
    pub label: String,
}

pub struct Manager {
    data_dir: PathBuf,
    cfg: Config,
    store: Store,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(data_dir.join("config.toml")).context("failed to construct cfg")?;
        log::debug!("{cfg:#?}");

        let store = Store::new(&data_dir);

        Ok(Self {
            data_dir,
            cfg,
            store,
        })
    }

    /// Current time: the configured `now` if any, the local wall-clock time otherwise.
    pub fn now(&self) -> NaiveDateTime {
        match self.cfg.now {
            Some(now) => now,
            None => {
                let now = Local::now();
                log::debug!("now is {now} ({} ms)", epoch_millis_wall_clock(&now));
                now.naive_local()
            }
        }
    }

    pub fn record_reading(&self, station_id: &str, reading: Reading) -> Result<()> {
        let station = self
            .cfg
            .station(station_id)
            .context("cannot record data for non-existent station")?;

        self.store
            .append(&station.id, &reading)
            .with_context(|| format!("failed to record reading in {:?}", self.data_dir))?;

        log::info!(
            "recorded {}::{}kWh@{}",
            station.name,
            reading.watt_hours / 1000,
            reading.timestamp.format(ISO_FORMAT)
        );
        Ok(())
    }

    /// Produce one chart series per station and field over `[end - period, end]`.
    pub fn chart_series(
        &self,
        station_ids: &[&str],
        fields: &[&str],
        period: &str,
        end: Option<NaiveDateTime>,
        scale_kilo: bool,
    ) -> Result<Vec<ChartSeries>> {
        let end = end.unwrap_or_else(|| self.now());
        let start = window_start(end, parse_period(period)?)?;

        let transforms: HashMap<Field, Transform> =
            [Field::Watts, Field::WattHours, Field::VoltAmps]
                .into_iter()
                .map(|field| (field, kilo as Transform))
                .collect();

        let mut chart = Vec::with_capacity(station_ids.len() * fields.len());
        for &station_id in station_ids {
            let station = self.cfg.station(station_id)?;
            let readings = self.store.get_readings(station_id, start, end)?;
            let series = if scale_kilo {
                timeseries_with(&readings, fields, &transforms)?
            } else {
                timeseries(&readings, fields)?
            };
            for (field, data) in fields.iter().zip(series) {
                chart.push(ChartSeries {
                    data,
                    label: format!("{field} - {}", station.name),
                });
            }
        }
        Ok(chart)
    }

    /// Summarize the station's usage over the configured usage period.
    ///
    /// Returns `None` when the station has no readings in that period.
    pub fn summarize_usage(
        &self,
        station_id: &str,
        end: Option<NaiveDateTime>,
    ) -> Result<Option<serde_json::Value>> {
        let station = self.cfg.station(station_id)?;
        let end = end.unwrap_or_else(|| self.now());
        let start = window_start(end, self.cfg.usage_period()?)?;

        let readings = self.store.get_readings(station_id, start, end)?;
        if readings.is_empty() {
            log::warn!("no readings of {} in [{start}, {end}]", station.name);
            return Ok(None);
        }

        let summary = usage_summary(&readings)?;
        if summary.median_kwh_day.is_none() {
            log::warn!("no full hour of readings of {}", station.name);
        }
        Ok(Some(serde_json::json!({
            "station": station,
            "start": start.format(ISO_FORMAT).to_string(),
            "end": end.format(ISO_FORMAT).to_string(),
            "median_watts": analysis::median_watts(&readings)?,
            "summary": summary,
        })))
    }

    /// Rank stations by increasing energy usage for each leader period and for all time.
    pub fn rank_leaders(
        &self,
        end: Option<NaiveDateTime>,
    ) -> Result<BTreeMap<String, Vec<LeaderEntry>>> {
        let end = end.unwrap_or_else(|| self.now());
        let mut leaders = BTreeMap::new();

        for period in &self.cfg.leader_periods {
            let start = window_start(end, parse_period(period)?)?;
            let windows = self.load_windows(Some((start, end)))?;
            let ranking = rank_stations(
                self.cfg
                    .stations
                    .iter()
                    .zip(windows.iter().map(Vec::as_slice)),
            );
            leaders.insert(period.clone(), ranking);
        }

        let windows = self.load_windows(None)?;
        let ranking = rank_stations(
            self.cfg
                .stations
                .iter()
                .zip(windows.iter().map(Vec::as_slice)),
        );
        leaders.insert("overall".to_string(), ranking);

        Ok(leaders)
    }

    /// Check that stations have reported recently.
    ///
    /// Returns the report text, failing if no station has reported.
    pub fn check_status(&self) -> Result<String> {
        let end = self.now();
        let timeout = self.cfg.status_timeout();
        let start = window_start(end, timeout)?;

        let mut counts = Vec::with_capacity(self.cfg.stations.len());
        for station in &self.cfg.stations {
            let readings = self.store.get_readings(&station.id, start, end)?;
            counts.push((station.name.clone(), readings.len()));
        }

        let report = station_status(counts, timeout);
        log::info!("status {:?} ({})", report.level, report.level.code());
        match report.level {
            analysis::StatusLevel::Error => bail!("{report}"),
            analysis::StatusLevel::Warn => log::warn!("{report}"),
            analysis::StatusLevel::Ok => {}
        }
        Ok(report.to_string())
    }

    fn load_windows(
        &self,
        window: Option<(NaiveDateTime, NaiveDateTime)>,
    ) -> Result<Vec<Vec<Reading>>> {
        self.cfg
            .stations
            .iter()
            .map(|station| match window {
                Some((start, end)) => self.store.get_readings(&station.id, start, end),
                None => self.store.load_all(&station.id),
            })
            .collect()
    }
}

fn window_start(end: NaiveDateTime, period: Duration) -> Result<NaiveDateTime> {
    end.checked_sub_signed(period)
        .with_context(|| format!("period {period} before {end} is out of range"))
}
