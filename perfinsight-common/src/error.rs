use thiserror::Error;

/// Main error type for PerfInsight
#[derive(Error, Debug)]
pub enum InsightError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error(
        "Data quality error: {dropped} of {total} rows could not be parsed (allowed drop ratio {:.0}%)",
        .max_drop_ratio * 100.0
    )]
    DataQuality {
        dropped: usize,
        total: usize,
        max_drop_ratio: f64,
    },

    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    #[error("Incomparable analyses: {0}")]
    Incomparable(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Coarse classification of an [`InsightError`], used by boundary layers
/// to pick a message style or a process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Schema,
    DataQuality,
    EmptyDataset,
    Incomparable,
    Render,
    Config,
    Io,
    Serialization,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Schema => "schema",
            ErrorKind::DataQuality => "data_quality",
            ErrorKind::EmptyDataset => "empty_dataset",
            ErrorKind::Incomparable => "incomparable",
            ErrorKind::Render => "render",
            ErrorKind::Config => "config",
            ErrorKind::Io => "io",
            ErrorKind::Serialization => "serialization",
        }
    }

    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Config => 2,
            ErrorKind::Schema | ErrorKind::DataQuality | ErrorKind::EmptyDataset => 3,
            ErrorKind::Incomparable => 4,
            ErrorKind::Render => 5,
            ErrorKind::Io | ErrorKind::Serialization => 1,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl InsightError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InsightError::Schema(_) => ErrorKind::Schema,
            InsightError::DataQuality { .. } => ErrorKind::DataQuality,
            InsightError::EmptyDataset(_) => ErrorKind::EmptyDataset,
            InsightError::Incomparable(_) => ErrorKind::Incomparable,
            InsightError::Render(_) => ErrorKind::Render,
            InsightError::Config(_) => ErrorKind::Config,
            InsightError::Io(_) => ErrorKind::Io,
            InsightError::Serialization(_) => ErrorKind::Serialization,
        }
    }
}

impl From<serde_json::Error> for InsightError {
    fn from(err: serde_json::Error) -> Self {
        InsightError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for InsightError {
    fn from(err: toml::de::Error) -> Self {
        InsightError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for InsightError {
    fn from(err: toml::ser::Error) -> Self {
        InsightError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, InsightError>;
