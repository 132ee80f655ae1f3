use crate::model::Reading;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rmp_serde::{decode, encode};
use std::{
    fs::{self, OpenOptions},
    io::{BufWriter, Cursor, Write},
    path::{Path, PathBuf},
};

/// Append-only reading storage.
///
/// Each station's readings live in their own MessagePack file, one encoded
/// reading after another.
pub struct Store {
    data_dir: PathBuf,
}

impl Store {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    /// Append a reading to the station's file, creating it if needed.
    pub fn append(&self, station_id: &str, reading: &Reading) -> Result<()> {
        let file = self.readings_file(station_id);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file)
            .with_context(|| format!("failed to open {file:?}"))?;
        let mut writer = BufWriter::new(file);

        encode::write(&mut writer, reading).context("failed to serialize reading")?;
        writer.flush().context("failed to flush writer stream")?;

        Ok(())
    }

    /// Load every reading recorded for the station, in file order.
    pub fn load_all(&self, station_id: &str) -> Result<Vec<Reading>> {
        let file = self.readings_file(station_id);
        if !file.exists() {
            log::debug!("no readings file {file:?}");
            return Ok(Vec::new());
        }
        let bytes = fs::read(&file).with_context(|| format!("failed to read {file:?}"))?;

        let len = bytes.len() as u64;
        let mut reader = Cursor::new(bytes);
        let mut readings = Vec::new();
        while reader.position() < len {
            let reading = decode::from_read(&mut reader)
                .with_context(|| format!("failed to deserialize reading {}", readings.len()))?;
            readings.push(reading);
        }
        Ok(readings)
    }

    /// Get the station's readings in the time interval `[start, end]`, in ascending
    /// chronological order.
    pub fn get_readings(
        &self,
        station_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Reading>> {
        let mut readings = self.load_all(station_id)?;
        readings.retain(|reading| start <= reading.timestamp && reading.timestamp <= end);
        readings.sort_by_key(|reading| reading.timestamp);
        log::debug!(
            "read {} readings of {station_id} in [{start}, {end}]",
            readings.len()
        );
        Ok(readings)
    }

    fn readings_file(&self, station_id: &str) -> PathBuf {
        self.data_dir.join(format!("readings-{station_id}.msgpack"))
    }
}
