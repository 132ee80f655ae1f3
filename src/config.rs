use crate::model::Station;
use crate::period::parse_period;
use anyhow::{Context, Result, bail};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Monitoring configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Known monitoring stations.
    #[serde(default)]
    pub stations: Vec<Station>,

    /// Minutes within which every station is expected to report.
    #[serde(default = "default_status_timeout")]
    pub status_timeout: i64,

    /// Period covered by the usage summary.
    #[serde(default = "default_usage_period")]
    pub usage_period: String,

    /// Periods ranked on the leaderboard, in addition to all time.
    #[serde(default = "default_leader_periods")]
    pub leader_periods: Vec<String>,

    /// Fixed current time, used instead of the system clock when set.
    pub now: Option<NaiveDateTime>,
}

fn default_status_timeout() -> i64 {
    30
}

fn default_usage_period() -> String {
    "7d".to_string()
}

fn default_leader_periods() -> Vec<String> {
    vec!["24h".to_string(), "7d".to_string(), "30d".to_string()]
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML-encoded and contain a serialized [`Config`].
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents = fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    /// Look up a configured station by id.
    pub fn station(&self, station_id: &str) -> Result<&Station> {
        self.stations
            .iter()
            .find(|station| station.id == station_id)
            .with_context(|| format!("station {station_id} does not exist"))
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::minutes(self.status_timeout)
    }

    pub fn usage_period(&self) -> Result<Duration> {
        Ok(parse_period(&self.usage_period)?)
    }

    fn validate(&self) -> Result<()> {
        check_stations(&self.stations).context("invalid stations")?;

        check_num(self.status_timeout, 1..=1440).context("invalid status timeout")?;

        parse_period(&self.usage_period).context("invalid usage period")?;
        for period in &self.leader_periods {
            parse_period(period).context("invalid leader period")?;
        }

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

fn check_stations(stations: &[Station]) -> Result<()> {
    let mut ids = HashSet::new();
    for station in stations {
        let id = &station.id;
        // Ids become file names.
        if id.is_empty() || id.len() > 20 {
            bail!("station id must have 1 to 20 characters, but is {id:?}");
        }
        if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            bail!("station id must be alphanumeric, but is {id:?}");
        }
        if !ids.insert(id) {
            bail!("station id {id:?} is not unique");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(contents: &str) -> Result<Config> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn defaults() {
        let config = parse("").unwrap();
        assert!(config.stations.is_empty());
        assert_eq!(config.status_timeout(), Duration::minutes(30));
        assert_eq!(config.usage_period().unwrap(), Duration::days(7));
        assert_eq!(config.leader_periods, ["24h", "7d", "30d"]);
        assert_eq!(config.now, None);
    }

    #[test]
    fn full_config() {
        let config = parse(
            r#"
status_timeout = 15
usage_period = "2d"
leader_periods = ["1h"]
now = "2012-01-01T14:00:00"

[[stations]]
id = "12345"
name = "test"
description = "basement meter"

[[stations]]
id = "abc"
name = "garage"
"#,
        )
        .unwrap();
        assert_eq!(config.stations.len(), 2);
        assert_eq!(config.station("abc").unwrap().name, "garage");
        assert!(config.station("nope").is_err());
        assert_eq!(config.usage_period().unwrap(), Duration::days(2));
        assert_eq!(
            config.now.map(|now| now.to_string()),
            Some("2012-01-01 14:00:00".to_string())
        );
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(parse("status_timeout = 0").is_err());
        assert!(parse("usage_period = \"7w\"").is_err());
        assert!(parse("leader_periods = [\"24h\", \"x\"]").is_err());
        assert!(parse("[[stations]]\nid = \"../x\"\nname = \"x\"").is_err());
        assert!(parse("[[stations]]\nid = \"\"\nname = \"x\"").is_err());
        assert!(
            parse("[[stations]]\nid = \"a\"\nname = \"x\"\n[[stations]]\nid = \"a\"\nname = \"y\"")
                .is_err()
        );
        assert!(parse("unknown = 1").is_err());
    }
}
