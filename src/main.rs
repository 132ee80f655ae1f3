mod analysis;
mod config;
mod error;
mod manager;
mod model;
mod period;
mod stats;
mod store;

use crate::manager::{ISO_FORMAT, Manager};
use crate::model::Reading;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    #[arg(long)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Record a reading provided by a power monitoring station.
    Record {
        #[arg(long)]
        station: String,

        /// Reading time (defaults to now).
        #[arg(long, value_parser = parse_timestamp)]
        timestamp: Option<NaiveDateTime>,

        #[command(flatten)]
        values: ReadingValues,
    },

    /// Print chart series of power variables for one or more stations as JSON.
    Series {
        /// Pipe-delimited station ids.
        #[arg(long)]
        stations: String,

        /// Pipe-delimited reading fields (watts, amps, ...).
        #[arg(long)]
        fields: String,

        /// Period of the form nX, with X one of m, h, d.
        #[arg(long)]
        period: String,

        #[arg(long, value_parser = parse_timestamp)]
        end: Option<NaiveDateTime>,

        /// Scale watts, watt hours and volt amps by 1/1000.
        #[arg(long)]
        kilo: bool,
    },

    /// Print a summary of power usage for a station as JSON.
    Usage {
        #[arg(long)]
        station: String,

        #[arg(long, value_parser = parse_timestamp)]
        end: Option<NaiveDateTime>,
    },

    /// Print stations sorted by increasing power usage as JSON.
    Leaders {
        #[arg(long, value_parser = parse_timestamp)]
        end: Option<NaiveDateTime>,
    },

    /// Print a health report of recently reporting stations.
    Status,
}

#[derive(Debug, Args)]
struct ReadingValues {
    #[arg(long = "w")]
    watts: i64,
    #[arg(long = "v")]
    volts: i64,
    #[arg(long = "a")]
    amps: i64,
    #[arg(long = "wh")]
    watt_hours: i64,
    #[arg(long = "pf")]
    power_factor: i64,
    #[arg(long = "frq")]
    frequency: i64,
    #[arg(long = "va")]
    volt_amps: i64,
    #[arg(long = "rnc")]
    relay_status: i64,
    #[arg(long = "pcy")]
    power_cycle: i64,
}

impl ReadingValues {
    fn into_reading(self, timestamp: NaiveDateTime) -> Reading {
        Reading {
            timestamp,
            watts: self.watts,
            volts: self.volts,
            amps: self.amps,
            watt_hours: self.watt_hours,
            power_factor: self.power_factor,
            frequency: self.frequency,
            volt_amps: self.volt_amps,
            relay_status: self.relay_status,
            power_cycle: self.power_cycle,
        }
    }
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, ISO_FORMAT)
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::debug!("{args:#?}");

    let mgr = Manager::new(args.data_dir).context("failed to construct mgr")?;

    match args.command {
        Command::Record {
            station,
            timestamp,
            values,
        } => {
            let timestamp = timestamp.unwrap_or_else(|| mgr.now());
            mgr.record_reading(&station, values.into_reading(timestamp))?;
        }
        Command::Series {
            stations,
            fields,
            period,
            end,
            kilo,
        } => {
            let stations: Vec<_> = stations.split('|').collect();
            let fields: Vec<_> = fields.split('|').collect();
            let chart = mgr
                .chart_series(&stations, &fields, &period, end, kilo)
                .context("failed to produce chart series")?;
            println!("{}", serde_json::to_string(&chart)?);
        }
        Command::Usage { station, end } => {
            match mgr
                .summarize_usage(&station, end)
                .context("failed to summarize usage")?
            {
                Some(summary) => println!("{}", serde_json::to_string_pretty(&summary)?),
                None => println!("no data for station {station}"),
            }
        }
        Command::Leaders { end } => {
            let leaders = mgr.rank_leaders(end).context("failed to rank leaders")?;
            println!("{}", serde_json::to_string_pretty(&leaders)?);
        }
        Command::Status => {
            let report = mgr.check_status().context("failed status check")?;
            println!("{report}");
        }
    }

    Ok(())
}
