pub mod csv;
pub mod drawings;
pub mod xlsx;
