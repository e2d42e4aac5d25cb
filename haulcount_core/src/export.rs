//! CSV export of the load ledger.
//!
//! Pure formatting over ledger iteration; no engine logic lives here.

use std::io::{self, Write};

use chrono::{Local, SecondsFormat};

use crate::ledger::LoadLedger;

/// Format the human-readable local-time column.
const LOCAL_TIME_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

/// Write the full ledger as CSV, oldest record first.
///
/// Columns: ISO-8601 UTC timestamp, local-time timestamp, vehicle id.
pub fn write_csv<W: Write>(ledger: &LoadLedger, out: &mut W) -> io::Result<()> {
    writeln!(out, "timestamp_iso,timestamp_local,vehicle_id")?;
    for record in ledger.iter() {
        let local = record.timestamp.with_timezone(&Local);
        writeln!(
            out,
            "{},{},{}",
            record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            local.format(LOCAL_TIME_FORMAT),
            csv_field(&record.vehicle_id),
        )?;
    }
    Ok(())
}

/// Quote a field when it would break the row format.
fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LoadRecord;
    use chrono::{TimeZone, Utc};

    fn ledger_with(ids: &[&str]) -> LoadLedger {
        let mut ledger = LoadLedger::new(100);
        for (i, id) in ids.iter().enumerate() {
            ledger.append(LoadRecord {
                vehicle_id: id.to_string(),
                timestamp: Utc.timestamp_opt(1_700_000_000 + i as i64, 0).unwrap(),
            });
        }
        ledger
    }

    #[test]
    fn one_row_per_record_plus_header() {
        let ledger = ledger_with(&["V1", "V2"]);
        let mut out = Vec::new();
        write_csv(&ledger, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "timestamp_iso,timestamp_local,vehicle_id");
        // Oldest first, ISO-8601 UTC in the first column
        assert!(lines[1].starts_with("2023-11-14T22:13:20.000Z,"));
        assert!(lines[1].ends_with(",V1"));
        assert!(lines[2].ends_with(",V2"));
    }

    #[test]
    fn awkward_ids_are_quoted() {
        let ledger = ledger_with(&["truck,7"]);
        let mut out = Vec::new();
        write_csv(&ledger, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().nth(1).unwrap().ends_with(",\"truck,7\""));
    }

    #[test]
    fn empty_ledger_writes_only_the_header() {
        let ledger = LoadLedger::new(10);
        let mut out = Vec::new();
        write_csv(&ledger, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }
}
