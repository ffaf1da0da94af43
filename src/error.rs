use thiserror::Error;

/// Failure to turn a byte stream into a grid. The only fatal condition in
/// the extraction pipeline.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("not a valid spreadsheet container: {0}")]
    InvalidFormat(String),
    #[error("workbook has no worksheets")]
    EmptyWorkbook,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unable to resolve config directory")]
    NoConfigDir,
}
