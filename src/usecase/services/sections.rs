use tracing::debug;

use crate::domain::entities::grid::{CellValue, Grid};
use crate::domain::entities::template::SectionIndex;

const SECTION_COLUMN: usize = 0;
const LABEL_COLUMN: usize = 1;

/// Header name if `cell` opens a section: a text cell with no lowercase
/// letters. Digits and punctuation do not disqualify a header.
pub fn section_header(cell: &CellValue) -> Option<&str> {
    let text = cell.as_text()?.trim();
    if text.is_empty() || text != text.to_uppercase() {
        return None;
    }
    Some(text)
}

/// Splits the sheet into sections by scanning the first column.
///
/// A section runs from its header row up to the next header row. The last
/// section runs to the last row with a label in either of the first two
/// columns, so trailing fields beneath the final header are kept.
pub fn index_sections(grid: &Grid) -> SectionIndex {
    let mut index = SectionIndex::default();
    let mut current: Option<String> = None;

    for row in 0..grid.row_count() {
        let Some(name) = section_header(grid.cell(row, SECTION_COLUMN)) else {
            continue;
        };
        if let Some(previous) = current.as_deref() {
            index.close(previous, row);
        }
        index.open(name, row);
        current = Some(name.to_string());
    }

    if let Some(last) = current.as_deref() {
        let last_row = [SECTION_COLUMN, LABEL_COLUMN]
            .into_iter()
            .filter_map(|column| grid.last_populated_row(column))
            .max()
            .unwrap_or(0);
        let start = index.get(last).map_or(0, |section| section.start);
        index.close(last, (last_row + 1).max(start + 1));
    }

    debug!(sections = index.len(), "indexed form sections");
    index
}
