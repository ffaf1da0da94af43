use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::ExtractionConfig;
use crate::domain::entities::record::GroupedRecord;
use crate::domain::entities::report::QualityReport;
use crate::domain::entities::template::{ReconciledMap, TemplateMap};
use crate::usecase::ports::loader::{LoadedWorkbook, TabularLoader};
use crate::usecase::services::pivot::{pivot_and_group, sparse_columns};
use crate::usecase::services::reconcile::reconcile;
use crate::usecase::services::template::build_template;

/// Result of extracting one filled-in form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub records: Vec<GroupedRecord>,
    pub reconciled: ReconciledMap,
    /// Reconciliation findings plus sparse column warnings.
    pub report: QualityReport,
    pub non_cell_objects: Vec<String>,
}

impl Extraction {
    pub fn station_count(&self) -> usize {
        self.records.iter().map(|record| record.stations.len()).sum()
    }
}

pub struct ExtractService {
    loader: Arc<dyn TabularLoader>,
    config: ExtractionConfig,
}

impl ExtractService {
    pub fn new(loader: Arc<dyn TabularLoader>, config: ExtractionConfig) -> Self {
        Self { loader, config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn load(&self, bytes: &[u8]) -> Result<LoadedWorkbook> {
        self.loader.load(bytes).context("failed to load workbook")
    }

    /// Builds the form layout from the first sheet of a reference workbook.
    pub fn build_template_from_bytes(&self, reference: &[u8]) -> Result<TemplateMap> {
        let workbook = self
            .loader
            .load(reference)
            .context("failed to load reference workbook")?;
        if workbook.sheet_count > 1 {
            warn!(
                sheets = workbook.sheet_count,
                "too many worksheets, only the first one is used as template"
            );
        }
        Ok(build_template(&workbook.grid, &self.config))
    }

    pub fn extract(&self, reference: &[u8], target: &[u8]) -> Result<Extraction> {
        let template = self.build_template_from_bytes(reference)?;
        self.extract_with_template(&template, target)
    }

    /// Extracts a target workbook against an already built template, so one
    /// reference can serve many files.
    pub fn extract_with_template(&self, template: &TemplateMap, target: &[u8]) -> Result<Extraction> {
        let workbook = self
            .loader
            .load(target)
            .context("failed to load target workbook")?;
        if !workbook.non_cell_objects.is_empty() {
            info!(
                objects = workbook.non_cell_objects.len(),
                "workbook contains non-cell objects"
            );
        }

        let reconciled = reconcile(template, &workbook.grid);
        let records = pivot_and_group(&reconciled, &workbook.grid);

        let mut report = reconciled.report.clone();
        report.extend(sparse_columns(
            &reconciled,
            &workbook.grid,
            self.config.sparse_column_threshold,
        ));

        Ok(Extraction {
            records,
            reconciled,
            report,
            non_cell_objects: workbook.non_cell_objects,
        })
    }
}
