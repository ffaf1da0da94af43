use std::fmt;

use serde::Serialize;

/// Non-fatal data quality finding. None of these stop an extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    /// A template label no longer appears in the target's label column.
    FieldNotFound { block: String, field: String },
    /// The target has fewer rows than the reference form.
    ShapeMismatch {
        template_rows: usize,
        target_rows: usize,
    },
    /// The target extends below the reference form.
    RowsBelowForm { count: usize },
    /// A data column with too few populated fields.
    SparseColumn { column: usize, populated: usize },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::FieldNotFound { block, field } => {
                write!(f, "Field '{field}' of '{block}' not found in file.")
            }
            Advisory::ShapeMismatch {
                template_rows,
                target_rows,
            } => write!(
                f,
                "Too little rows. Bad form. Expected {template_rows}, found {target_rows}."
            ),
            Advisory::RowsBelowForm { count } => write!(
                f,
                "Rows below the form. Number of rows outside the form: {count}"
            ),
            Advisory::SparseColumn { column, populated } => write!(
                f,
                "Column {column} has too little data ({populated} populated fields)."
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QualityReport {
    pub advisories: Vec<Advisory>,
}

impl QualityReport {
    pub fn push(&mut self, advisory: Advisory) {
        self.advisories.push(advisory);
    }

    pub fn extend(&mut self, advisories: impl IntoIterator<Item = Advisory>) {
        self.advisories.extend(advisories);
    }

    pub fn is_clean(&self) -> bool {
        self.advisories.is_empty()
    }

    /// `(block, field)` pairs that resolved to no row.
    pub fn not_found_fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.advisories.iter().filter_map(|advisory| match advisory {
            Advisory::FieldNotFound { block, field } => Some((block.as_str(), field.as_str())),
            _ => None,
        })
    }

    pub fn sparse_columns(&self) -> impl Iterator<Item = usize> + '_ {
        self.advisories.iter().filter_map(|advisory| match advisory {
            Advisory::SparseColumn { column, .. } => Some(*column),
            _ => None,
        })
    }

    pub fn lines(&self) -> Vec<String> {
        self.advisories.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for QualityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.advisories.is_empty() {
            return write!(f, "No data quality issues detected.");
        }
        write!(f, "{}", self.lines().join("\n"))
    }
}
