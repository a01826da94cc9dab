//! Reading and writing the comparisons CSV file.
//!
//! Layout: a fixed header row `Address,Old coords,New coords` followed by
//! one row per [`ComparisonRecord`]. Coordinate columns hold
//! `"{longitude} {latitude}"`. The format is unversioned; the reader only
//! relies on column 1 (address) and column 3 (new coordinates).

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use geofix_database_models::NodeCoordinateUpdate;

use crate::{ComparisonFileError, ComparisonRecord, CoordinatePair};

/// Default file name, relative to the working directory.
pub const DEFAULT_FILE_NAME: &str = "comparisons.csv";

/// Header row of the comparisons file.
pub const HEADER: [&str; 3] = ["Address", "Old coords", "New coords"];

/// Creates (or truncates) `path` and writes the header plus every record.
///
/// # Errors
///
/// Returns [`ComparisonFileError`] if the file cannot be created or
/// written.
pub fn write_comparisons(
    path: &Path,
    records: &[ComparisonRecord],
) -> Result<(), ComparisonFileError> {
    let file = File::create(path)?;
    write_comparisons_to(file, records)?;
    log::info!("Wrote {} comparisons to {}", records.len(), path.display());
    Ok(())
}

/// Writes the header plus every record to `writer`.
///
/// # Errors
///
/// Returns [`ComparisonFileError`] if writing fails.
pub fn write_comparisons_to<W: Write>(
    writer: W,
    records: &[ComparisonRecord],
) -> Result<(), ComparisonFileError> {
    let mut csv = csv::Writer::from_writer(writer);

    csv.write_record(HEADER)?;
    for record in records {
        csv.write_record([
            record.address.clone(),
            record.old.to_string(),
            record.new.to_string(),
        ])?;
    }
    csv.flush()?;

    Ok(())
}

/// Reads the updates to apply from the file at `path`.
///
/// # Errors
///
/// Returns [`ComparisonFileError`] if the file cannot be opened or any data
/// row is malformed.
pub fn read_updates(path: &Path) -> Result<Vec<NodeCoordinateUpdate>, ComparisonFileError> {
    let file = File::open(path)?;
    let updates = read_updates_from(file)?;
    log::info!("Read {} updates from {}", updates.len(), path.display());
    Ok(updates)
}

/// Reads updates from `reader`.
///
/// The first row is skipped as the header. Blank lines are ignored. Every
/// other row must have exactly three columns, and its third column must
/// split on a single space into longitude and latitude; the first row that
/// does not aborts the read.
///
/// # Errors
///
/// Returns [`ComparisonFileError::MalformedRow`] for a row with the wrong
/// shape, or [`ComparisonFileError::Csv`] if the input is not valid CSV.
pub fn read_updates_from<R: Read>(
    reader: R,
) -> Result<Vec<NodeCoordinateUpdate>, ComparisonFileError> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv.headers()?;
    if headers.iter().ne(HEADER) {
        log::warn!("Unexpected comparisons header: {headers:?}");
    }

    let mut updates = Vec::new();
    for result in csv.records() {
        let row = result?;
        let line = row.position().map_or(0, csv::Position::line);

        if row.len() == 1 && row[0].is_empty() {
            continue;
        }

        if row.len() != HEADER.len() {
            return Err(ComparisonFileError::MalformedRow {
                line,
                message: format!("expected {} columns, found {}", HEADER.len(), row.len()),
            });
        }

        let new_coords = &row[2];
        let pair = CoordinatePair::parse(new_coords).ok_or_else(|| {
            ComparisonFileError::MalformedRow {
                line,
                message: format!("cannot split '{new_coords}' into longitude and latitude"),
            }
        })?;

        log::debug!("{} {}", pair.longitude, pair.latitude);

        updates.push(NodeCoordinateUpdate {
            address: row[0].to_string(),
            longitude: pair.longitude,
            latitude: pair.latitude,
        });
    }

    Ok(updates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(address: &str, old: (&str, &str), new: (&str, &str)) -> ComparisonRecord {
        ComparisonRecord {
            address: address.to_string(),
            old: CoordinatePair::new(old.0, old.1),
            new: CoordinatePair::new(new.0, new.1),
        }
    }

    fn written(records: &[ComparisonRecord]) -> String {
        let mut buf = Vec::new();
        write_comparisons_to(&mut buf, records).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn writes_header_and_space_joined_pairs() {
        let text = written(&[record("42 Main St", ("-121.9", "37.1"), ("-121.9", "37.2"))]);
        assert_eq!(
            text,
            "Address,Old coords,New coords\n42 Main St,-121.9 37.1,-121.9 37.2\n"
        );
    }

    #[test]
    fn empty_list_writes_only_header() {
        assert_eq!(written(&[]), "Address,Old coords,New coords\n");
    }

    #[test]
    fn addresses_with_commas_are_quoted() {
        let text = written(&[record("1 Oak St, Unit 2", ("1", "2"), ("3", "4"))]);
        assert!(text.contains("\"1 Oak St, Unit 2\",1 2,3 4"));
    }

    #[test]
    fn reader_recovers_written_coordinates() {
        let records = [
            record("42 Main St", ("-121.9", "37.1"), ("-121.9", "37.2")),
            record("7 Elm Ave, Suite 3", ("", ""), ("-121.712345", "37.934567")),
        ];
        let text = written(&records);

        let updates = read_updates_from(text.as_bytes()).unwrap();

        assert_eq!(
            updates,
            vec![
                NodeCoordinateUpdate {
                    address: "42 Main St".to_string(),
                    longitude: "-121.9".to_string(),
                    latitude: "37.2".to_string(),
                },
                NodeCoordinateUpdate {
                    address: "7 Elm Ave, Suite 3".to_string(),
                    longitude: "-121.712345".to_string(),
                    latitude: "37.934567".to_string(),
                },
            ]
        );
    }

    #[test]
    fn skips_header_and_blank_lines() {
        let text = "Address,Old coords,New coords\n\n42 Main St,-121.9 37.1,-121.9 37.2\n\n";
        let updates = read_updates_from(text.as_bytes()).unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].address, "42 Main St");
    }

    #[test]
    fn header_only_file_has_no_updates() {
        let updates = read_updates_from("Address,Old coords,New coords\n".as_bytes()).unwrap();
        assert!(updates.is_empty());
    }

    #[test]
    fn wrong_column_count_is_malformed() {
        let text = "Address,Old coords,New coords\n42 Main St,-121.9 37.2\n";
        let err = read_updates_from(text.as_bytes()).unwrap_err();
        assert!(matches!(err, ComparisonFileError::MalformedRow { line: 2, .. }));
    }

    #[test]
    fn row_of_empty_fields_is_malformed() {
        let text = "Address,Old coords,New coords\n,,\n42 Main St,-121.9 37.1,-121.9 37.2\n";
        let err = read_updates_from(text.as_bytes()).unwrap_err();
        assert!(matches!(err, ComparisonFileError::MalformedRow { line: 2, .. }));
    }

    #[test]
    fn unsplittable_coordinates_are_malformed() {
        let text = "Address,Old coords,New coords\n\
                    42 Main St,-121.9 37.1,-121.9 37.2\n\
                    7 Elm Ave,1 2,-121.9\n";
        let err = read_updates_from(text.as_bytes()).unwrap_err();
        assert!(matches!(err, ComparisonFileError::MalformedRow { line: 3, .. }));
    }
}
