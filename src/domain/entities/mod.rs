pub mod fields;
pub mod grid;
pub mod record;
pub mod report;
pub mod template;
