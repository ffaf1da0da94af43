use csv::ReaderBuilder;

use crate::domain::entities::grid::{CellValue, Grid};
use crate::error::LoadError;
use crate::usecase::ports::loader::{LoadedWorkbook, TabularLoader};

pub const CSV_SHEET_NAME: &str = "Sheet1";

/// Reads a form exported as csv. The file is one sheet with no header row
/// and rows may differ in length.
#[derive(Debug, Clone, Copy)]
pub struct CsvLoader {
    delimiter: u8,
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvLoader {
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

impl TabularLoader for CsvLoader {
    fn load(&self, bytes: &[u8]) -> Result<LoadedWorkbook, LoadError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(bytes);

        let mut rows = Vec::new();
        for record in reader.records() {
            let record =
                record.map_err(|err| LoadError::InvalidFormat(err.to_string()))?;
            rows.push(record.iter().map(field_to_value).collect());
        }

        Ok(LoadedWorkbook {
            grid: Grid::new(rows),
            sheet_count: 1,
            sheet_names: vec![CSV_SHEET_NAME.to_string()],
            non_cell_objects: Vec::new(),
        })
    }
}

fn field_to_value(field: &str) -> CellValue {
    if field.is_empty() {
        return CellValue::Empty;
    }
    match field.trim().parse::<f64>() {
        Ok(number) if number.is_finite() => CellValue::Number(number),
        _ => CellValue::Text(field.to_string()),
    }
}
