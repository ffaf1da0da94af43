use tracing::warn;

use crate::domain::entities::grid::Grid;
use crate::domain::entities::report::{Advisory, QualityReport};
use crate::domain::entities::template::{FieldRows, ReconciledMap, RowRef, TemplateMap};

const LABEL_COLUMN: usize = 1;

/// Re-resolves every row of `template` against `target` by label.
///
/// A field keeps its template row when the target still carries the same
/// label there, otherwise it moves to the first row with that label, or
/// becomes [`RowRef::NotFound`].
pub fn reconcile(template: &TemplateMap, target: &Grid) -> ReconciledMap {
    let mut report = QualityReport::default();
    if let Some(advisory) = check_shape(template.source_rows, target) {
        warn!("{advisory}");
        report.push(advisory);
    }

    let structure = TemplateMap {
        global_data: relocate(&template.global_data, target),
        contact_person: template
            .contact_person
            .as_ref()
            .map(|fields| relocate(fields, target)),
        responsible_person: template
            .responsible_person
            .as_ref()
            .map(|fields| relocate(fields, target)),
        stations: template
            .stations
            .iter()
            .map(|(name, fields)| (name, relocate(fields, target)))
            .collect(),
        source_rows: target.row_count(),
    };

    for (block, fields) in structure.blocks() {
        for (field, row) in fields.iter() {
            if row.is_found() {
                continue;
            }
            warn!(%block, field, "template field not found in file");
            report.push(Advisory::FieldNotFound {
                block: block.to_string(),
                field: field.to_string(),
            });
        }
    }

    ReconciledMap { structure, report }
}

fn relocate(fields: &FieldRows, target: &Grid) -> FieldRows {
    fields
        .iter()
        .map(|(label, expected)| (label, resolve_row(label, *expected, target)))
        .collect()
}

pub fn resolve_row(label: &str, expected: RowRef, target: &Grid) -> RowRef {
    let has_label = |row: usize| target.label(row, LABEL_COLUMN).as_deref() == Some(label);

    if let Some(row) = expected.index().filter(|&row| has_label(row)) {
        return RowRef::At(row);
    }
    (0..target.row_count())
        .find(|&row| has_label(row))
        .map_or(RowRef::NotFound, RowRef::At)
}

/// Compares the row extent of the reference form with the target.
pub fn check_shape(template_rows: usize, target: &Grid) -> Option<Advisory> {
    let target_rows = target.row_count();
    if target_rows < template_rows {
        Some(Advisory::ShapeMismatch {
            template_rows,
            target_rows,
        })
    } else if target_rows > template_rows {
        Some(Advisory::RowsBelowForm {
            count: target_rows - template_rows,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfig;
    use crate::domain::entities::grid::CellValue;
    use crate::usecase::services::template::build_template;

    fn grid(rows: &[&[&str]]) -> Grid {
        Grid::new(
            rows.iter()
                .map(|row| row.iter().map(|cell| CellValue::from(*cell)).collect())
                .collect(),
        )
    }

    fn reference() -> Grid {
        grid(&[
            &["TAKEOVER", ""],
            &["", "Name"],
            &["STATION A", ""],
            &["", "Power"],
        ])
    }

    #[test]
    fn identical_target_keeps_template_rows() {
        let template = build_template(&reference(), &ExtractionConfig::default());

        let reconciled = reconcile(&template, &reference());

        assert_eq!(reconciled.structure.stations, template.stations);
        assert!(reconciled.report.is_clean(), "{:?}", reconciled.report);
    }

    #[test]
    fn inserted_row_shifts_following_fields() {
        let template = build_template(&reference(), &ExtractionConfig::default());
        let target = grid(&[
            &["TAKEOVER", ""],
            &["", "Uwagi"],
            &["", "Name"],
            &["STATION A", ""],
            &["", "Power"],
        ]);

        let reconciled = reconcile(&template, &target);
        let stations = &reconciled.structure.stations;

        assert_eq!(
            stations.get("TAKEOVER").and_then(|f| f.get("Name")),
            Some(&RowRef::At(2))
        );
        assert_eq!(
            stations.get("STATION A").and_then(|f| f.get("Power")),
            Some(&RowRef::At(4))
        );
        assert_eq!(
            reconciled.report.advisories,
            vec![Advisory::RowsBelowForm { count: 1 }]
        );
    }

    #[test]
    fn missing_label_is_reported_not_fatal() {
        let template = build_template(&reference(), &ExtractionConfig::default());
        let target = grid(&[&["TAKEOVER", ""], &["", "Name"], &["STATION A", ""]]);

        let reconciled = reconcile(&template, &target);

        assert_eq!(
            reconciled
                .structure
                .stations
                .get("STATION A")
                .and_then(|f| f.get("Power")),
            Some(&RowRef::NotFound)
        );
        let missing: Vec<_> = reconciled.report.not_found_fields().collect();
        assert_eq!(missing, vec![("STATION A", "Power")]);
        assert!(reconciled.report.advisories.contains(&Advisory::ShapeMismatch {
            template_rows: 4,
            target_rows: 3,
        }));
    }

    #[test]
    fn resolve_row_matches_trimmed_labels() {
        let target = grid(&[&["", "  Power "], &["", "Name"]]);

        assert_eq!(resolve_row("Power", RowRef::At(0), &target), RowRef::At(0));
        assert_eq!(resolve_row("Name", RowRef::At(7), &target), RowRef::At(1));
        assert_eq!(resolve_row("Typ", RowRef::At(0), &target), RowRef::NotFound);
    }
}
