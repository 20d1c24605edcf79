use std::error::Error;
use std::fmt;

use crate::error::WsgError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreErrorCode {
    Io,
    Parse,
    UnsupportedOperation,
    InvalidEdit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreError {
    pub code: CoreErrorCode,
    pub message: String,
}

impl CoreError {
    pub fn new(code: CoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Wrap a codec error, picking the code from its kind.
    pub(crate) fn from_codec(context: &str, err: WsgError) -> Self {
        let code = match err {
            WsgError::Io(_) | WsgError::Container(_) => CoreErrorCode::Io,
            WsgError::Unsupported(_) => CoreErrorCode::UnsupportedOperation,
            WsgError::Format { .. } | WsgError::Truncated { .. } | WsgError::Section { .. } => {
                CoreErrorCode::Parse
            }
        };
        Self::new(code, format!("{context}: {err}"))
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl Error for CoreError {}
