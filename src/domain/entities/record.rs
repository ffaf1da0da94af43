use serde::ser::{Serialize, Serializer};

use crate::domain::entities::fields::FieldMap;
use crate::domain::entities::grid::CellValue;

pub type FieldValues = FieldMap<CellValue>;

/// Section name to that section's field values, for one data column.
pub type StationRecord = FieldMap<FieldValues>;

pub const VARIES_MARKER: &str = "varies";

/// Person block of a grouped record. Moves `Unset -> Value -> Varies` and
/// never back.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PersonBlock {
    #[default]
    Unset,
    Value(FieldValues),
    Varies,
}

impl PersonBlock {
    pub fn merge(&mut self, current: FieldValues) {
        match self {
            PersonBlock::Unset => *self = PersonBlock::Value(current),
            PersonBlock::Value(existing) if *existing != current => *self = PersonBlock::Varies,
            PersonBlock::Value(_) | PersonBlock::Varies => {}
        }
    }

    pub fn value(&self) -> Option<&FieldValues> {
        match self {
            PersonBlock::Value(values) => Some(values),
            PersonBlock::Unset | PersonBlock::Varies => None,
        }
    }

    pub fn is_varies(&self) -> bool {
        matches!(self, PersonBlock::Varies)
    }
}

impl Serialize for PersonBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PersonBlock::Unset => serializer.serialize_none(),
            PersonBlock::Value(values) => values.serialize(serializer),
            PersonBlock::Varies => serializer.serialize_str(VARIES_MARKER),
        }
    }
}

/// Data columns sharing identical global data, one station per column.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct GroupedRecord {
    pub global_data: FieldValues,
    pub contact_person: PersonBlock,
    pub responsible_person: PersonBlock,
    pub stations: Vec<StationRecord>,
}

impl GroupedRecord {
    pub fn new(global_data: FieldValues) -> Self {
        Self {
            global_data,
            ..Self::default()
        }
    }
}
