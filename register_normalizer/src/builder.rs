pub use crate::config::*;

/// A builder for register tables.
///
/// The readers of the command line tool use it to accumulate rows; it is also
/// the simplest way to feed a table to the normalizer from code.
///
/// ```
/// use register_normalizer::builder::TableBuilder;
/// use register_normalizer::{run_normalization, NormalizeSettings, RegisterInput};
/// # use register_normalizer::NormalizeError;
///
/// let table = TableBuilder::new(&["Elector Number", "Elector Markers", "Name", "Postcode", "Address 1"])
///     .row(&["BA-12", "G", "Jane Doe", "AB1 2CD", "4 High Street"])
///     .build();
///
/// let res = run_normalization(RegisterInput::Table(table), &NormalizeSettings::DEFAULT_SETTINGS)?;
/// assert_eq!(res.records[0].polling_district, "BA");
///
/// # Ok::<(), NormalizeError>(())
/// ```
pub struct TableBuilder {
    pub(crate) _schema: Vec<String>,
    pub(crate) _rows: Vec<Vec<Option<String>>>,
}

impl TableBuilder {
    pub fn new(schema: &[&str]) -> TableBuilder {
        TableBuilder::from_schema(schema.iter().map(|s| s.to_string()).collect())
    }

    pub fn from_schema(schema: Vec<String>) -> TableBuilder {
        TableBuilder {
            _schema: schema,
            _rows: Vec::new(),
        }
    }

    /// Adds a row of text cells. Every cell is present, even when empty.
    pub fn row(mut self, cells: &[&str]) -> TableBuilder {
        self.add_row(cells.iter().map(|c| Some(c.to_string())).collect());
        self
    }

    /// Adds a row in which some cells may be missing.
    pub fn add_row(&mut self, cells: Vec<Option<String>>) {
        self._rows.push(cells);
    }

    pub fn num_rows(&self) -> usize {
        self._rows.len()
    }

    pub fn build(self) -> RawTable {
        RawTable {
            schema: self._schema,
            rows: self._rows,
        }
    }
}
