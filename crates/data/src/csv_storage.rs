use anyhow::{Context, Result};
use binopt_core::WagerRecord;
use chrono::{DateTime, Utc};
use csv::Writer;
use std::fs::File;
use std::path::Path;

pub struct CsvStorage;

impl CsvStorage {
    /// Writes wager records to a CSV file for inspection in external tools.
    ///
    /// Format: timestamp,close_timestamp,name,symbol,group,direction,result,duration,winrate
    ///
    /// # Errors
    /// Returns error if file cannot be created or writing fails
    pub fn write_records(path: impl AsRef<Path>, records: &[WagerRecord]) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
        let mut writer = Writer::from_writer(file);

        writer.write_record([
            "timestamp",
            "close_timestamp",
            "name",
            "symbol",
            "group",
            "direction",
            "result",
            "duration",
            "winrate",
        ])?;

        // Stable sort keeps same-second wagers in journal order
        let mut sorted = records.to_vec();
        sorted.sort_by_key(WagerRecord::timestamp);

        for record in sorted {
            writer.write_record(&[
                rfc3339(record.timestamp()),
                rfc3339(record.close_timestamp()),
                record.name().to_string(),
                record.symbol().to_string(),
                record.group().to_string(),
                record.direction().as_i8().to_string(),
                record.result().as_i8().to_string(),
                record.duration().to_string(),
                record.win_rate_hint().to_string(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }
}

fn rfc3339(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map_or_else(|| timestamp.to_string(), |dt| dt.to_rfc3339())
}
