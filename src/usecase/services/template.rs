use tracing::{debug, info};

use crate::config::ExtractionConfig;
use crate::domain::entities::grid::Grid;
use crate::domain::entities::template::{FieldRows, RowRef, SectionIndex, TemplateMap};
use crate::usecase::services::sections::index_sections;

const VALUE_COLUMN: usize = 0;
const LABEL_COLUMN: usize = 1;

pub fn build_template(grid: &Grid, config: &ExtractionConfig) -> TemplateMap {
    let sections = index_sections(grid);
    build_template_with_sections(grid, &sections, config)
}

/// Derives the field layout of a reference form from its sections.
///
/// Missing divider, contact or responsible sections leave that part of the
/// map empty. Every section, including the ones consumed as person blocks,
/// also becomes a station entry.
pub fn build_template_with_sections(
    grid: &Grid,
    sections: &SectionIndex,
    config: &ExtractionConfig,
) -> TemplateMap {
    let mut template = TemplateMap {
        source_rows: grid.row_count(),
        ..TemplateMap::default()
    };

    match sections.find_first(&config.takeover_divider_names) {
        Some(divider) => {
            template.global_data = paired_fields(grid, 0..divider.start);
        }
        None => info!("no takeover divider section found, global data left empty"),
    }

    template.contact_person = sections
        .find_first(&config.contact_person_names)
        .map(|section| paired_fields(grid, section.rows()));
    template.responsible_person = sections
        .find_first(&config.responsible_person_names)
        .map(|section| paired_fields(grid, section.rows()));

    for section in sections.iter() {
        let fields = section
            .rows()
            .filter_map(|row| grid.label(row, LABEL_COLUMN).map(|label| (label, RowRef::At(row))))
            .collect();
        template.stations.insert(section.name.as_str(), fields);
    }

    debug!(
        global_fields = template.global_data.len(),
        stations = template.stations.len(),
        fields = template.field_count(),
        "built template"
    );
    template
}

/// Rows in `rows` that carry both a value and a label.
fn paired_fields(grid: &Grid, rows: std::ops::Range<usize>) -> FieldRows {
    rows.filter(|&row| !grid.cell(row, VALUE_COLUMN).is_empty())
        .filter_map(|row| grid.label(row, LABEL_COLUMN).map(|label| (label, RowRef::At(row))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::grid::CellValue;

    fn grid(rows: &[&[&str]]) -> Grid {
        Grid::new(
            rows.iter()
                .map(|row| row.iter().map(|cell| CellValue::from(*cell)).collect())
                .collect(),
        )
    }

    fn config() -> ExtractionConfig {
        ExtractionConfig {
            takeover_divider_names: vec!["STACJA ŁADOWANIA - DANE".into(), "STACJA".into()],
            contact_person_names: vec!["OSOBA DO KONTAKTU".into()],
            responsible_person_names: vec!["OSOBA ODPOWIEDZIALNA".into()],
            ..ExtractionConfig::default()
        }
    }

    fn reference() -> Grid {
        grid(&[
            &["x", "Gmina"],
            &["x", "Operator"],
            &["", "Bez wartości"],
            &["OSOBA DO KONTAKTU", "Imię"],
            &["x", "Telefon"],
            &["OSOBA ODPOWIEDZIALNA", ""],
            &["x", "E-mail"],
            &["STACJA", ""],
            &["", "Moc"],
            &["", "Złącze"],
        ])
    }

    #[test]
    fn global_data_reads_rows_above_divider_with_value_and_label() {
        let template = build_template(&reference(), &config());

        assert_eq!(template.global_data.get("Gmina"), Some(&RowRef::At(0)));
        assert_eq!(template.global_data.get("Operator"), Some(&RowRef::At(1)));
        assert_eq!(template.global_data.get("E-mail"), Some(&RowRef::At(6)));
        assert!(!template.global_data.contains_key("Bez wartości"));
        assert!(!template.global_data.contains_key("Moc"));
    }

    #[test]
    fn person_blocks_use_first_matching_section() {
        let template = build_template(&reference(), &config());

        let contact = template.contact_person.expect("should find contact block");
        assert_eq!(contact.get("Imię"), Some(&RowRef::At(3)));
        assert_eq!(contact.get("Telefon"), Some(&RowRef::At(4)));
        let responsible = template
            .responsible_person
            .expect("should find responsible block");
        assert_eq!(responsible.keys().collect::<Vec<_>>(), vec!["E-mail"]);
    }

    #[test]
    fn every_section_becomes_a_station_entry() {
        let template = build_template(&reference(), &config());

        assert_eq!(
            template.stations.keys().collect::<Vec<_>>(),
            vec!["OSOBA DO KONTAKTU", "OSOBA ODPOWIEDZIALNA", "STACJA"]
        );
        let station = template.stations.get("STACJA").expect("should have STACJA");
        assert_eq!(station.get("Moc"), Some(&RowRef::At(8)));
        assert_eq!(station.get("Złącze"), Some(&RowRef::At(9)));
        assert_eq!(template.source_rows, 10);
    }

    #[test]
    fn unmatched_name_lists_leave_parts_empty() {
        let template = build_template(&reference(), &ExtractionConfig::default());

        assert!(template.global_data.is_empty());
        assert_eq!(template.contact_person, None);
        assert_eq!(template.responsible_person, None);
        assert_eq!(template.stations.len(), 3);
    }
}
