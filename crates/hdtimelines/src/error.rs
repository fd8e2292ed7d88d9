use thiserror::Error;

pub type Result<T> = std::result::Result<T, TimelineError>;

#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid CSV Header: {0}")]
    CsvHeader(String),

    #[error("Invalid date at row {row}, column '{column}': {value}")]
    DateParse {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Invalid date range: earliest {earliest} is after latest {latest}")]
    InvalidRange { earliest: i64, latest: i64 },

    #[error("No events have been placed yet")]
    EmptyExtent,

    #[error("Unknown topic id: {0}")]
    UnknownTopic(u32),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(String),
}

impl From<toml::de::Error> for TimelineError {
    fn from(err: toml::de::Error) -> Self {
        TimelineError::Config(format!("TOML parse error: {}", err))
    }
}

impl From<serde_json::Error> for TimelineError {
    fn from(err: serde_json::Error) -> Self {
        TimelineError::Json(err.to_string())
    }
}

impl TimelineError {
    /// Date parse error without row context; callers fill in the row.
    pub(crate) fn bad_date(value: &str) -> Self {
        TimelineError::DateParse {
            row: 0,
            column: String::new(),
            value: value.to_string(),
        }
    }

    pub(crate) fn at(self, row: usize, column: &str) -> Self {
        match self {
            TimelineError::DateParse { value, .. } => TimelineError::DateParse {
                row,
                column: column.to_string(),
                value,
            },
            other => other,
        }
    }
}
