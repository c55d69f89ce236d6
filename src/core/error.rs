use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloneError {
    #[error("Invalid snapshot signature")]
    BadSignature,

    #[error("Truncated {section} section: declared {declared} bytes, {available} available")]
    TruncatedSection {
        section: &'static str,
        declared: usize,
        available: usize,
    },

    #[error("Invalid JSON in {section} section: {message}")]
    InvalidSectionJson {
        section: &'static str,
        message: String,
    },

    #[error("Collection schema '{0}' not found")]
    MissingCollectionSchema(String),

    #[error("Root record missing: {0}")]
    MissingRootRecord(String),

    #[error("Duplicate source id '{id}' in collection '{collection}'")]
    DuplicateSourceId { collection: String, id: String },

    #[error("Record '{id}' not found in collection '{collection}'")]
    RecordNotFound { collection: String, id: String },

    #[error("Upload '{upload}' has no file at '{key}'")]
    MissingUploadFile { upload: String, key: String },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Transaction aborted: {0}")]
    TransactionAborted(#[source] Box<CloneError>),

    #[error("Unsupported bundle version {0}")]
    UnsupportedBundleVersion(u32),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl CloneError {
    /// Wraps `self` as the cause of an aborted transaction.
    pub fn aborted(self) -> Self {
        match self {
            already @ CloneError::TransactionAborted(_) => already,
            other => CloneError::TransactionAborted(Box::new(other)),
        }
    }

    /// The underlying failure for an aborted transaction, `self` otherwise.
    pub fn root_cause(&self) -> &CloneError {
        match self {
            CloneError::TransactionAborted(cause) => cause.root_cause(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, CloneError>;

impl From<serde_json::Error> for CloneError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<std::io::Error> for CloneError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<reqwest::Error> for CloneError {
    fn from(err: reqwest::Error) -> Self {
        Self::Fetch(err.to_string())
    }
}
