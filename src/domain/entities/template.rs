use serde::{Serialize, Serializer};

use crate::domain::entities::fields::FieldMap;
use crate::domain::entities::report::QualityReport;

/// Row range owned by a section header. `start` is the header row and
/// `end` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub name: String,
    pub start: usize,
    pub end: usize,
}

impl Section {
    pub fn rows(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

/// Sections in the order they were first opened. A recurring name
/// replaces the earlier entry in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectionIndex {
    sections: Vec<Section>,
}

impl SectionIndex {
    pub fn open(&mut self, name: &str, start: usize) {
        let section = Section {
            name: name.to_string(),
            start,
            end: start,
        };
        match self.sections.iter_mut().find(|s| s.name == name) {
            Some(existing) => *existing = section,
            None => self.sections.push(section),
        }
    }

    pub fn close(&mut self, name: &str, end: usize) {
        if let Some(section) = self.sections.iter_mut().find(|s| s.name == name) {
            section.end = end;
        }
    }

    pub fn get(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// First section named in `candidates`, in candidate order.
    pub fn find_first(&self, candidates: &[String]) -> Option<&Section> {
        candidates
            .iter()
            .find_map(|candidate| self.get(candidate))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Location of a field's row in a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRef {
    At(usize),
    NotFound,
}

impl RowRef {
    pub fn index(self) -> Option<usize> {
        match self {
            RowRef::At(row) => Some(row),
            RowRef::NotFound => None,
        }
    }

    pub fn is_found(self) -> bool {
        matches!(self, RowRef::At(_))
    }
}

impl Serialize for RowRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RowRef::At(row) => serializer.serialize_u64(*row as u64),
            RowRef::NotFound => serializer.serialize_none(),
        }
    }
}

pub type FieldRows = FieldMap<RowRef>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block<'a> {
    GlobalData,
    ContactPerson,
    ResponsiblePerson,
    Station(&'a str),
}

impl std::fmt::Display for Block<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Block::GlobalData => write!(f, "global_data"),
            Block::ContactPerson => write!(f, "contact_person"),
            Block::ResponsiblePerson => write!(f, "responsible_person"),
            Block::Station(name) => write!(f, "{name}"),
        }
    }
}

/// Field-to-row layout of a takeover form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TemplateMap {
    pub global_data: FieldRows,
    pub contact_person: Option<FieldRows>,
    pub responsible_person: Option<FieldRows>,
    pub stations: FieldMap<FieldRows>,
    /// Row count of the sheet the layout was read from.
    #[serde(skip)]
    pub source_rows: usize,
}

impl TemplateMap {
    /// Every field block with the block it belongs to, in a stable order.
    pub fn blocks(&self) -> impl Iterator<Item = (Block<'_>, &FieldRows)> {
        std::iter::once((Block::GlobalData, &self.global_data))
            .chain(
                self.contact_person
                    .iter()
                    .map(|fields| (Block::ContactPerson, fields)),
            )
            .chain(
                self.responsible_person
                    .iter()
                    .map(|fields| (Block::ResponsiblePerson, fields)),
            )
            .chain(
                self.stations
                    .iter()
                    .map(|(name, fields)| (Block::Station(name), fields)),
            )
    }

    pub fn field_count(&self) -> usize {
        self.blocks().map(|(_, fields)| fields.len()).sum()
    }
}

/// A template layout re-resolved against one target sheet, together with
/// the data quality findings of that resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconciledMap {
    pub structure: TemplateMap,
    pub report: QualityReport,
}
