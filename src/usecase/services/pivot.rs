use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::domain::entities::grid::{CellValue, Grid};
use crate::domain::entities::record::{FieldValues, GroupedRecord, StationRecord};
use crate::domain::entities::report::Advisory;
use crate::domain::entities::template::{FieldRows, ReconciledMap};

/// First column holding per-station data; columns before it are labels.
pub const FIRST_DATA_COLUMN: usize = 2;

/// Turns every data column of `target` into a station record and groups
/// the stations by their global data.
///
/// Groups appear in the order their global data was first seen. Every data
/// column contributes exactly one station.
pub fn pivot_and_group(reconciled: &ReconciledMap, target: &Grid) -> Vec<GroupedRecord> {
    let structure = &reconciled.structure;
    let mut groups: Vec<GroupedRecord> = Vec::new();

    for column in FIRST_DATA_COLUMN..target.column_count() {
        let global_data = read_block(&structure.global_data, target, column);
        let position = match groups
            .iter()
            .position(|group| group.global_data == global_data)
        {
            Some(position) => position,
            None => {
                groups.push(GroupedRecord::new(global_data));
                groups.len() - 1
            }
        };
        let group = &mut groups[position];

        if let Some(fields) = &structure.contact_person {
            group.contact_person.merge(read_block(fields, target, column));
        }
        if let Some(fields) = &structure.responsible_person {
            group
                .responsible_person
                .merge(read_block(fields, target, column));
        }
        group.stations.push(read_station(reconciled, target, column));
    }

    debug!(
        columns = target.column_count().saturating_sub(FIRST_DATA_COLUMN),
        groups = groups.len(),
        "pivoted data columns"
    );
    groups
}

fn read_block(fields: &FieldRows, grid: &Grid, column: usize) -> FieldValues {
    fields
        .iter()
        .map(|(label, row)| {
            let value = row
                .index()
                .map_or(CellValue::Empty, |row| grid.cell(row, column).clone());
            (label, value)
        })
        .collect()
}

fn read_station(reconciled: &ReconciledMap, grid: &Grid, column: usize) -> StationRecord {
    reconciled
        .structure
        .stations
        .iter()
        .map(|(section, fields)| (section, read_block(fields, grid, column)))
        .collect()
}

/// Data columns with at most `threshold` populated fields. Purely
/// diagnostic: [`pivot_and_group`] never drops a column.
pub fn sparse_columns(reconciled: &ReconciledMap, target: &Grid, threshold: usize) -> Vec<Advisory> {
    let rows: BTreeSet<usize> = reconciled
        .structure
        .blocks()
        .flat_map(|(_, fields)| fields.values().filter_map(|row| row.index()))
        .collect();

    (FIRST_DATA_COLUMN..target.column_count())
        .filter_map(|column| {
            let populated = rows
                .iter()
                .filter(|&&row| !target.cell(row, column).is_empty())
                .count();
            (populated <= threshold).then(|| {
                info!(column, populated, "column has too little data");
                Advisory::SparseColumn { column, populated }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfig;
    use crate::domain::entities::record::PersonBlock;
    use crate::usecase::services::reconcile::reconcile;
    use crate::usecase::services::template::build_template;

    fn grid(rows: &[&[&str]]) -> Grid {
        Grid::new(
            rows.iter()
                .map(|row| row.iter().map(|cell| CellValue::from(*cell)).collect())
                .collect(),
        )
    }

    fn config() -> ExtractionConfig {
        ExtractionConfig {
            takeover_divider_names: vec!["STACJA".into()],
            contact_person_names: vec!["KONTAKT".into()],
            ..ExtractionConfig::default()
        }
    }

    fn form(rows: &[&[&str]]) -> (ReconciledMap, Grid) {
        let sheet = grid(rows);
        let template = build_template(&sheet, &config());
        (reconcile(&template, &sheet), sheet)
    }

    fn text(value: &str) -> CellValue {
        CellValue::from(value)
    }

    #[test]
    fn identical_global_data_shares_one_group_in_column_order() {
        let (reconciled, sheet) = form(&[
            &["x", "Gmina", "Kraków", "Kraków"],
            &["STACJA", "", "", ""],
            &["", "Moc", "22", "50"],
        ]);

        let groups = pivot_and_group(&reconciled, &sheet);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].global_data.get("Gmina"), Some(&text("Kraków")));
        let powers: Vec<_> = groups[0]
            .stations
            .iter()
            .map(|station| station.get("STACJA").and_then(|f| f.get("Moc")).cloned())
            .collect();
        assert_eq!(powers, vec![Some(text("22")), Some(text("50"))]);
    }

    #[test]
    fn differing_global_field_splits_groups_by_first_appearance() {
        let (reconciled, sheet) = form(&[
            &["x", "Gmina", "Kraków", "Gdańsk", "Kraków"],
            &["STACJA", "", "", "", ""],
            &["", "Moc", "22", "50", "11"],
        ]);

        let groups = pivot_and_group(&reconciled, &sheet);

        let towns: Vec<_> = groups
            .iter()
            .map(|g| g.global_data.get("Gmina").cloned())
            .collect();
        assert_eq!(towns, vec![Some(text("Kraków")), Some(text("Gdańsk"))]);
        assert_eq!(groups[0].stations.len(), 2);
        assert_eq!(groups[1].stations.len(), 1);
        let total: usize = groups.iter().map(|g| g.stations.len()).sum();
        assert_eq!(total, 3, "every data column yields one station");
    }

    #[test]
    fn contact_person_collapses_to_varies_within_group() {
        let (reconciled, sheet) = form(&[
            &["x", "Gmina", "Kraków", "Kraków", "Gdańsk"],
            &["STACJA", "", "", "", ""],
            &["", "Moc", "22", "50", "11"],
            &["KONTAKT", "Imię", "Jan", "Anna", "Ewa"],
        ]);

        let groups = pivot_and_group(&reconciled, &sheet);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].contact_person, PersonBlock::Varies);
        assert_eq!(
            groups[1]
                .contact_person
                .value()
                .and_then(|values| values.get("Imię")),
            Some(&text("Ewa"))
        );
        assert_eq!(groups[0].responsible_person, PersonBlock::Unset);
    }

    #[test]
    fn not_found_rows_read_as_empty() {
        let reference = grid(&[
            &["x", "Gmina", "", ""],
            &["STACJA", "", "", ""],
            &["", "Moc", "", ""],
            &["", "Typ", "", ""],
        ]);
        let template = build_template(&reference, &config());
        let target = grid(&[
            &["x", "Gmina", "Kraków", "Kraków"],
            &["STACJA", "", "", ""],
            &["", "Moc", "22", "50"],
        ]);
        let reconciled = reconcile(&template, &target);

        let groups = pivot_and_group(&reconciled, &target);

        let station = &groups[0].stations[0];
        assert_eq!(
            station.get("STACJA").and_then(|f| f.get("Typ")),
            Some(&CellValue::Empty)
        );
    }

    #[test]
    fn sparse_columns_are_reported_not_dropped() {
        let (reconciled, sheet) = form(&[
            &["x", "Gmina", "Kraków", ""],
            &["STACJA", "", "", ""],
            &["", "Moc", "22", ""],
            &["", "Typ", "AC", ""],
            &["", "Złącze", "Type 2", "CCS"],
        ]);

        let sparse = sparse_columns(&reconciled, &sheet, 3);
        let groups = pivot_and_group(&reconciled, &sheet);

        assert_eq!(sparse, vec![Advisory::SparseColumn { column: 3, populated: 1 }]);
        let total: usize = groups.iter().map(|g| g.stations.len()).sum();
        assert_eq!(total, 2);
    }
}
