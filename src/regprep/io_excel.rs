use calamine::{open_workbook_auto, DataType, Range, Reader};
use chrono::{Duration, NaiveDate};
use log::{debug, info, warn};
use snafu::prelude::*;

use register_normalizer::builder::TableBuilder;
use register_normalizer::RawTable;

use crate::regprep::*;

/// Reads a register from an Excel workbook: the named worksheet, or else the first one.
pub fn read_excel_table(path: &str, worksheet_name_o: Option<&str>) -> BRegResult<RawTable> {
    let wrange = get_range(path, worksheet_name_o)?;
    let table = range_to_table(&wrange)?;
    info!(
        "read_excel_table: {} row(s) read from {}",
        table.rows.len(),
        path
    );
    Ok(table)
}

fn get_range(path: &str, worksheet_name_o: Option<&str>) -> BRegResult<Range<DataType>> {
    debug!(
        "get_range: path: {:?} worksheet: {:?}",
        path, worksheet_name_o
    );
    let mut workbook = open_workbook_auto(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(worksheet_name)
            .context(MissingWorksheetSnafu {
                path,
                name: worksheet_name,
            })?
            .context(OpeningExcelSnafu { path })?;
        return Ok(wrange);
    }

    let all_worksheets = workbook.worksheets();
    match all_worksheets.as_slice() {
        [] => Err(Box::new(RegprepError::EmptyExcel {
            path: path.to_string(),
        })),
        [(worksheet_name, wrange)] => {
            debug!("get_range: using worksheet {:?}", worksheet_name);
            Ok(wrange.clone())
        }
        [(worksheet_name, wrange), ..] => {
            warn!(
                "{} has {} worksheets, reading the first one ({:?}). Use --excel-worksheet-name to pick another one.",
                path,
                all_worksheets.len(),
                worksheet_name
            );
            Ok(wrange.clone())
        }
    }
}

/// Turns a worksheet into a table. The first row is the header.
pub fn range_to_table(wrange: &Range<DataType>) -> BRegResult<RawTable> {
    let mut iter = wrange.rows();
    let header = match iter.next() {
        Some(row) => row,
        None => return Err(Box::new(RegprepError::EmptyExcel { path: String::new() })),
    };
    let schema: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            cell_text(cell, 1).map(|o| o.unwrap_or_else(|| format!("Column{}", idx + 1)))
        })
        .collect::<BRegResult<Vec<String>>>()?;
    debug!("range_to_table: header: {:?}", schema);

    let mut builder = TableBuilder::from_schema(schema);
    for (idx, row) in iter.enumerate() {
        let lineno = (idx + 2) as u64;
        let cells = row
            .iter()
            .map(|cell| cell_text(cell, lineno))
            .collect::<BRegResult<Vec<Option<String>>>>()?;
        builder.add_row(cells);
    }
    Ok(builder.build())
}

/// The text of a cell, as a spreadsheet user would see it.
///
/// Whole numbers have no decimal part and dates are written `DD/MM/YYYY`.
fn cell_text(cell: &DataType, lineno: u64) -> BRegResult<Option<String>> {
    let wrong_type = || {
        Box::new(RegprepError::ExcelWrongCellType {
            lineno,
            content: format!("{:?}", cell),
        })
    };
    match cell {
        DataType::Empty => Ok(None),
        DataType::String(s) => Ok(Some(s.clone())),
        DataType::Int(i) => Ok(Some(i.to_string())),
        DataType::Float(f) => Ok(Some(f.to_string())),
        DataType::Bool(b) => Ok(Some(b.to_string())),
        DataType::DateTime(serial) => excel_date(*serial).map(Some).ok_or_else(wrong_type),
        _ => Err(wrong_type()),
    }
}

// Excel counts days from 1899-12-30 (this absorbs the 1900 leap year bug).
fn excel_date(serial: f64) -> Option<String> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch
        .checked_add_signed(Duration::try_days(serial.trunc() as i64)?)
        .map(|d| d.format("%d/%m/%Y").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells() {
        assert_eq!(cell_text(&DataType::Empty, 2).unwrap(), None);
        assert_eq!(
            cell_text(&DataType::Float(12.0), 2).unwrap(),
            Some("12".to_string())
        );
        assert_eq!(
            cell_text(&DataType::Float(1.5), 2).unwrap(),
            Some("1.5".to_string())
        );
        assert_eq!(
            cell_text(&DataType::Int(42), 2).unwrap(),
            Some("42".to_string())
        );
        assert_eq!(
            cell_text(&DataType::DateTime(46174.0), 2).unwrap(),
            Some("01/06/2026".to_string())
        );
        assert!(cell_text(&DataType::Error(calamine::CellErrorType::Div0), 2).is_err());
        assert!(matches!(
            cell_text(&DataType::DateTime(1e20), 2).map_err(|e| *e),
            Err(RegprepError::ExcelWrongCellType { lineno: 2, .. })
        ));
        assert!(cell_text(&DataType::DateTime(f64::NAN), 2).is_err());
    }

    #[test]
    fn worksheet_to_table() {
        let mut wrange: Range<DataType> = Range::new((0, 0), (2, 2));
        wrange.set_value((0, 0), DataType::String("Elector Number".to_string()));
        wrange.set_value((0, 1), DataType::String("Name".to_string()));
        wrange.set_value((1, 0), DataType::String("BA-1".to_string()));
        wrange.set_value((1, 1), DataType::String("Jane Doe".to_string()));
        wrange.set_value((1, 2), DataType::Float(3.0));
        wrange.set_value((2, 0), DataType::String("BA-2".to_string()));

        let table = range_to_table(&wrange).unwrap();
        assert_eq!(table.schema, vec!["Elector Number", "Name", "Column3"]);
        assert_eq!(
            table.rows,
            vec![
                vec![
                    Some("BA-1".to_string()),
                    Some("Jane Doe".to_string()),
                    Some("3".to_string())
                ],
                vec![Some("BA-2".to_string()), None, None],
            ]
        );
    }
}
