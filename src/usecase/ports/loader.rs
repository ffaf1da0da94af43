use crate::domain::entities::grid::Grid;
use crate::error::LoadError;

pub const NO_NON_CELL_OBJECTS: &str = "No non-cell objects detected.";

/// Everything the extraction needs from one workbook file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedWorkbook {
    /// The first sheet.
    pub grid: Grid,
    pub sheet_count: usize,
    pub sheet_names: Vec<String>,
    /// One human-readable line per floating image or chart, any sheet.
    pub non_cell_objects: Vec<String>,
}

impl LoadedWorkbook {
    pub fn non_cell_objects_summary(&self) -> String {
        if self.non_cell_objects.is_empty() {
            return NO_NON_CELL_OBJECTS.to_string();
        }
        self.non_cell_objects.join("\n")
    }
}

pub trait TabularLoader: Send + Sync {
    fn load(&self, bytes: &[u8]) -> Result<LoadedWorkbook, LoadError>;
}
