//! Writes a row set to a comma-separated file

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::Serialize;

use crate::db::{Row, Schema};
use crate::error::SerializeError;

/// What ended up on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    pub path: PathBuf,
    pub rows: usize,
    pub columns: usize,
    pub bytes: u64,
}

/// Checks every row against the header before anything is written.
fn build_records(schema: &Schema, rows: &[Row]) -> Result<Vec<Vec<String>>, SerializeError> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            if let Some(extra) = row.columns().find(|c| !schema.contains(c)) {
                return Err(SerializeError::UnexpectedColumn {
                    row: index,
                    column: extra.to_string(),
                });
            }
            Ok(schema
                .columns()
                .iter()
                .map(|column| row.get(column).map(|v| v.to_field()).unwrap_or_default())
                .collect())
        })
        .collect()
}

/// Writes `rows` to `path` with a header taken from the first row.
///
/// An empty row set is rejected without touching `path`. Existing files are
/// overwritten; a failed write may leave a partial file behind.
pub fn write_delimited(rows: &[Row], path: &Path) -> Result<WriteSummary, SerializeError> {
    let Some(schema) = Schema::infer(rows) else {
        tracing::warn!("No data to save");
        return Err(SerializeError::EmptyInput);
    };

    let records = build_records(&schema, rows)?;

    let io_err = |source: std::io::Error| SerializeError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_err)?;
    let mut writer = WriterBuilder::new()
        .delimiter(b',')
        .quote(b'"')
        .double_quote(true)
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::CRLF)
        .from_writer(BufWriter::new(file));

    writer.write_record(schema.columns())?;
    for record in &records {
        writer.write_record(record)?;
    }
    writer.flush().map_err(io_err)?;
    drop(writer);

    let bytes = std::fs::metadata(path).map_err(io_err)?.len();

    tracing::info!("Data successfully saved to {}", path.display());

    Ok(WriteSummary {
        path: path.to_path_buf(),
        rows: records.len(),
        columns: schema.len(),
        bytes,
    })
}

/// Reads an export back as `(header, records)`.
#[cfg(test)]
pub fn read_delimited(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>), SerializeError> {
    use csv::{ReaderBuilder, StringRecord};

    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let records = reader
        .records()
        .map(|r| r.map(|record: StringRecord| record.iter().map(str::to_string).collect()))
        .collect::<Result<Vec<Vec<String>>, csv::Error>>()?;

    Ok((header, records))
}
