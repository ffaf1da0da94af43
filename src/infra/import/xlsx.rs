use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::domain::entities::grid::{CellValue, Grid};
use crate::error::LoadError;
use crate::infra::import::drawings::scan_non_cell_objects;
use crate::usecase::ports::loader::{LoadedWorkbook, TabularLoader};

/// Loads xlsx, xlsm, xlsb, xls and ods workbooks through calamine.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxLoader;

impl TabularLoader for XlsxLoader {
    fn load(&self, bytes: &[u8]) -> Result<LoadedWorkbook, LoadError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|err| LoadError::InvalidFormat(err.to_string()))?;
        let sheet_names = workbook.sheet_names();
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(LoadError::EmptyWorkbook)?
            .map_err(|err| LoadError::InvalidFormat(err.to_string()))?;
        let grid = range_to_grid(&range);
        debug!(
            sheets = sheet_names.len(),
            rows = grid.row_count(),
            columns = grid.column_count(),
            "loaded workbook"
        );

        Ok(LoadedWorkbook {
            grid,
            sheet_count: sheet_names.len(),
            sheet_names,
            non_cell_objects: scan_non_cell_objects(bytes),
        })
    }
}

pub fn cell_to_value(cell: &Data) -> CellValue {
    match cell {
        Data::String(v) if v.is_empty() => CellValue::Empty,
        Data::String(v) => CellValue::Text(v.clone()),
        Data::Float(v) => CellValue::Number(*v),
        Data::Int(v) => CellValue::Number(*v as f64),
        Data::Bool(v) => CellValue::Bool(*v),
        Data::DateTime(v) => v
            .as_datetime()
            .map_or(CellValue::Number(v.as_f64()), CellValue::DateTime),
        Data::DateTimeIso(v) => parse_iso_datetime(v)
            .map_or_else(|| CellValue::Text(v.clone()), CellValue::DateTime),
        Data::DurationIso(v) => CellValue::Text(v.clone()),
        Data::Error(v) => CellValue::Error(format!("{v:?}")),
        Data::Empty => CellValue::Empty,
    }
}

/// calamine trims leading empty rows and columns off a range; pad them
/// back so indices are sheet coordinates.
fn range_to_grid(range: &Range<Data>) -> Grid {
    let (row_offset, col_offset) = range
        .start()
        .map_or((0, 0), |(row, col)| (row as usize, col as usize));

    let mut rows = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![CellValue::Empty; col_offset];
        cells.extend(row.iter().map(cell_to_value));
        rows.push(cells);
    }
    Grid::new(rows)
}

fn parse_iso_datetime(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use calamine::{ExcelDateTime, ExcelDateTimeType};

    use super::*;

    fn date_cell(serial: f64, is_1904: bool) -> Data {
        Data::DateTime(ExcelDateTime::new(
            serial,
            ExcelDateTimeType::DateTime,
            is_1904,
        ))
    }

    fn datetime(y: i32, m: u32, d: u32, h: u32) -> CellValue {
        CellValue::DateTime(
            NaiveDate::from_ymd_opt(y, m, d)
                .and_then(|date| date.and_hms_opt(h, 0, 0))
                .expect("valid date"),
        )
    }

    #[test]
    fn serial_dates_convert_to_calendar_dates() {
        assert_eq!(
            cell_to_value(&date_cell(45_292.5, false)),
            datetime(2024, 1, 1, 12)
        );
    }

    #[test]
    fn dates_in_1904_workbooks_use_the_1904_epoch() {
        assert_eq!(cell_to_value(&date_cell(0.0, true)), datetime(1904, 1, 1, 0));
        assert_eq!(
            cell_to_value(&date_cell(43_830.5, true)),
            datetime(2024, 1, 1, 12)
        );
    }

    #[test]
    fn empty_strings_become_empty_cells() {
        assert_eq!(cell_to_value(&Data::String(String::new())), CellValue::Empty);
        assert_eq!(cell_to_value(&Data::Int(7)), CellValue::Number(7.0));
        assert_eq!(
            cell_to_value(&Data::DateTimeIso("2024-03-05".to_string())),
            CellValue::DateTime(
                NaiveDate::from_ymd_opt(2024, 3, 5)
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .expect("valid date")
            )
        );
    }

    #[test]
    fn garbage_bytes_are_invalid_format() {
        let result = XlsxLoader.load(b"definitely not a workbook");

        assert!(
            matches!(result, Err(LoadError::InvalidFormat(_))),
            "should reject non-spreadsheet bytes: {result:?}"
        );
    }
}
