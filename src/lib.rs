//! Structured records from spreadsheet takeover forms.
//!
//! A takeover form keeps its layout in the first two columns: uppercase
//! section headers in column 0 and field labels in column 1. Every further
//! column is one filled-in station. A reference form yields a
//! [`TemplateMap`]; [`reconcile`] re-locates that layout inside a target
//! file by label, and [`pivot_and_group`] turns each data column into a
//! station record grouped by the form's global data.

pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod usecase;


pub use config::{default_config_path, ExtractionConfig};
pub use domain::entities::grid::{CellValue, Grid};
pub use domain::entities::record::{FieldValues, GroupedRecord, PersonBlock, StationRecord};
pub use domain::entities::report::{Advisory, QualityReport};
pub use domain::entities::template::{ReconciledMap, RowRef, Section, SectionIndex, TemplateMap};
pub use error::{ConfigError, LoadError};
pub use infra::import::csv::CsvLoader;
pub use infra::import::xlsx::XlsxLoader;
pub use usecase::ports::loader::{LoadedWorkbook, TabularLoader};
pub use usecase::services::extract_service::{ExtractService, Extraction};
pub use usecase::services::pivot::{pivot_and_group, sparse_columns};
pub use usecase::services::reconcile::reconcile;
pub use usecase::services::sections::index_sections;
pub use usecase::services::template::{build_template, build_template_with_sections};
