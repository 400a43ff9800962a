//! Protocol-level errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("buffer too short: need {needed} more bytes, have {remaining}")]
    BufferTooShort { needed: usize, remaining: usize },

    #[error("VarInt encoding error: {0}")]
    VarInt(#[from] crate::types::VarIntError),

    #[error("unknown inventory source type: {0}")]
    UnknownSourceType(u32),

    #[error("too many inventory actions in one transaction: {0}")]
    TooManyActions(u32),

    #[error("{field} of {value} does not fit (max {max})")]
    OutOfRange {
        field: &'static str,
        value: usize,
        max: usize,
    },

    #[error("invalid data: {0}")]
    InvalidData(String),
}
