//! Power monitoring data types.

use crate::error::AnalysisError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Power monitoring station descriptor.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub doc_url: Option<String>,
}

/// Power consumption reading provided by a monitoring station.
///
/// `watt_hours` is a running counter, so it never decreases unless the
/// station was reset.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: NaiveDateTime,
    pub watts: i64,
    pub volts: i64,
    pub amps: i64,
    pub watt_hours: i64,
    pub power_factor: i64,
    pub frequency: i64,
    pub volt_amps: i64,
    pub relay_status: i64,
    pub power_cycle: i64,
}

impl Reading {
    /// Get the value of a numeric field.
    pub fn value(&self, field: Field) -> i64 {
        match field {
            Field::Watts => self.watts,
            Field::Volts => self.volts,
            Field::Amps => self.amps,
            Field::WattHours => self.watt_hours,
            Field::PowerFactor => self.power_factor,
            Field::Frequency => self.frequency,
            Field::VoltAmps => self.volt_amps,
            Field::RelayStatus => self.relay_status,
            Field::PowerCycle => self.power_cycle,
        }
    }
}

/// Numeric field of a [`Reading`].
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Field {
    Watts,
    Volts,
    Amps,
    WattHours,
    PowerFactor,
    Frequency,
    VoltAmps,
    RelayStatus,
    PowerCycle,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::Watts,
        Field::Volts,
        Field::Amps,
        Field::WattHours,
        Field::PowerFactor,
        Field::Frequency,
        Field::VoltAmps,
        Field::RelayStatus,
        Field::PowerCycle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::Watts => "watts",
            Field::Volts => "volts",
            Field::Amps => "amps",
            Field::WattHours => "watt_hours",
            Field::PowerFactor => "power_factor",
            Field::Frequency => "frequency",
            Field::VoltAmps => "volt_amps",
            Field::RelayStatus => "relay_status",
            Field::PowerCycle => "power_cycle",
        }
    }
}

impl FromStr for Field {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| AnalysisError::InvalidField(s.to_string()))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_round_trip() {
        for field in Field::ALL {
            assert_eq!(field.name().parse::<Field>(), Ok(field));
        }
    }

    #[test]
    fn unknown_field_is_rejected() {
        assert_eq!(
            "bogus_field".parse::<Field>(),
            Err(AnalysisError::InvalidField("bogus_field".to_string()))
        );
        assert!("timestamp".parse::<Field>().is_err());
        assert!("Watts".parse::<Field>().is_err());
    }
}
