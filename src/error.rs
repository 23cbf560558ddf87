use chrono::NaiveDate;
use thiserror::Error;

/// Failures raised by the series/join core.
///
/// Duplicate keys and `MalformedDate` abort a load; `IndexOutOfRange` is
/// recoverable (the caller clamps and retries).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("duplicate record for state {state} on {date}")]
    DuplicateRecord { date: NaiveDate, state: String },

    #[error("duplicate geometry for state {state}")]
    DuplicateGeometry { state: String },

    #[error("malformed date '{token}' (expected YYYYMMDD or YYYY-MM-DD)")]
    MalformedDate { token: String },

    #[error("date index {index} out of range (valid: 0..{len})")]
    IndexOutOfRange { index: i64, len: usize },
}

impl CoreError {
    /// True for the load-time integrity failures (duplicate keys).
    pub fn is_data_integrity(&self) -> bool {
        matches!(
            self,
            CoreError::DuplicateRecord { .. } | CoreError::DuplicateGeometry { .. }
        )
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        let exit_code = match err {
            CoreError::IndexOutOfRange { .. } => 4,
            _ => 3,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
