use std::{collections::HashMap, path::Path, sync::Arc};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::{CsvRecord, RawActivity};

/// Reads a Garmin Connect CSV export. The header row names the columns, the rest of the rows
/// become one [RawActivity::GarminCsv] each. Broken rows are logged and skipped so a single bad
/// line doesn't cost the whole file.
pub async fn read_csv_export(path: &Path) -> Result<Vec<RawActivity>> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {path:?}"))?;
    let file: Arc<str> = path.to_string_lossy().into();
    parse_csv_export(file, &bytes)
}

pub fn parse_csv_export(file: Arc<str>, bytes: &[u8]) -> Result<Vec<RawActivity>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .with_context(|| format!("Missing header row in {file}"))?
        .iter()
        .map(|header| header.trim_start_matches('\u{feff}').to_string())
        .collect::<Vec<_>>();

    let mut rows = vec![];
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping unreadable row in {file}: {e}");
                continue;
            }
        };
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let fields = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect::<HashMap<_, _>>();
        rows.push(RawActivity::GarminCsv(CsvRecord {
            file: file.clone(),
            line,
            fields,
        }));
    }

    debug!("Read {} rows from {file}", rows.len());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::parse_csv_export;
    use crate::ingest::RawActivity;

    #[test]
    fn rows_are_keyed_by_header() -> Result<()> {
        let csv = "\u{feff}Activity Type,Date,Distance,Time\n\
                   Running,2024-06-01 07:00:00,10.00,00:50:00\n\
                   Running,2024-06-02 07:00:00,\"5,20\",00:26:00\n";
        let rows = parse_csv_export("export.csv".into(), csv.as_bytes())?;
        assert_eq!(rows.len(), 2);

        let RawActivity::GarminCsv(second) = &rows[1] else {
            panic!("Expected a csv row");
        };
        assert_eq!(second.fields["Activity Type"], "Running");
        assert_eq!(second.fields["Distance"], "5,20");
        assert_eq!(second.line, 3);
        Ok(())
    }

    #[test]
    fn short_rows_only_carry_present_columns() -> Result<()> {
        let csv = "Date,Distance,Time\n2024-06-01,10\n";
        let rows = parse_csv_export("export.csv".into(), csv.as_bytes())?;
        let RawActivity::GarminCsv(row) = &rows[0] else {
            panic!("Expected a csv row");
        };
        assert_eq!(row.fields.len(), 2);
        assert!(!row.fields.contains_key("Time"));
        Ok(())
    }

    #[test]
    fn empty_file_has_no_rows() -> Result<()> {
        let rows = parse_csv_export("export.csv".into(), b"")?;
        assert!(rows.is_empty());
        Ok(())
    }
}
