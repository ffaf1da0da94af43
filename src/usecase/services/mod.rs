pub mod extract_service;
pub mod pivot;
pub mod reconcile;
pub mod sections;
pub mod template;
