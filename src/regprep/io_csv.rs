// Primitives for reading CSV tables.

use log::{debug, info};
use snafu::prelude::*;
use std::fs;

use register_normalizer::builder::TableBuilder;
use register_normalizer::{NormalizeError, RawTable};

use crate::regprep::{io_common::simplify_file_name, *};

/// Reads a register exported as a CSV file.
///
/// The reader is lenient: rows may have more or fewer cells than the header,
/// and bytes that are not valid UTF-8 are replaced.
pub fn read_csv_table(path: &str) -> BRegResult<RawTable> {
    let bytes = fs::read(path).context(OpeningInputSnafu { path })?;
    let text = String::from_utf8_lossy(&bytes);
    let text = text.trim_start_matches('\u{feff}');

    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut records = rdr.into_records();

    let header = records
        .next()
        .context(EmptyInputSnafu { path })?
        .context(CsvLineParseSnafu { lineno: 1_usize })?;
    debug!("read_csv_table: header: {:?}", header);
    let mut builder = TableBuilder::from_schema(header.iter().map(|s| s.to_string()).collect());

    for (idx, line_r) in records.enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        builder.add_row(line.iter().map(|s| Some(s.to_string())).collect());
    }
    info!(
        "read_csv_table: {} row(s) read from {}",
        builder.num_rows(),
        simplify_file_name(path)
    );
    Ok(builder.build())
}

/// Reads a table pasted by a user.
///
/// Unlike files, pasted tables must be well formed, with at least one row of data.
pub fn read_pasted_table(text: &str) -> Result<RawTable, NormalizeError> {
    let unparsable = |reason: String| NormalizeError::UnparsableInput { reason };
    let text = text.trim_start_matches('\u{feff}');
    if text.trim().is_empty() {
        return Err(unparsable("the pasted text is empty".to_string()));
    }

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(text.as_bytes());
    let header = rdr.headers().map_err(|e| unparsable(e.to_string()))?;
    let mut builder = TableBuilder::from_schema(header.iter().map(|s| s.to_string()).collect());

    for line_r in rdr.records() {
        let line = line_r.map_err(|e| unparsable(e.to_string()))?;
        builder.add_row(line.iter().map(|s| Some(s.to_string())).collect());
    }
    if builder.num_rows() == 0 {
        return Err(unparsable("no row under the header".to_string()));
    }
    Ok(builder.build())
}
