use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WsgError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("format error at offset 0x{offset:X}: {message}")]
    Format { offset: u64, message: String },

    #[error("truncated at offset 0x{offset:X}: need {needed} bytes, {available} available")]
    Truncated {
        offset: u64,
        needed: u64,
        available: u64,
    },

    /// A DLC sub-list that auto-repair could have discarded.
    #[error("unreadable DLC section 0x{id:08X}: {source}")]
    Section {
        id: u32,
        #[source]
        source: Box<WsgError>,
    },

    #[error("container error: {0}")]
    Container(String),

    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl WsgError {
    pub fn format(offset: u64, message: impl Into<String>) -> Self {
        Self::Format {
            offset,
            message: message.into(),
        }
    }

    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format { .. })
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Truncated { .. })
    }
}

pub type Result<T> = std::result::Result<T, WsgError>;
