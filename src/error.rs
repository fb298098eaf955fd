// ─── Error ──────────────────────────────────────────────────────────────────
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CarbonError>;

#[derive(Debug, Error)]
pub enum CarbonError {
    #[error("illegal argument: {0}")]
    IllegalArgument(String),
    #[error("out of bounds: {0}")]
    OutOfBounds(String),
    #[error("read out of bounds: {0}")]
    ReadOutOfBounds(String),
    #[error("write protected: memfile is not opened for writing")]
    WriteProtect,
    #[error("memory state error: {0}")]
    MemoryState(String),
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("corrupted document: {0}")]
    Corrupted(String),
    #[error("unknown marker {marker:#04x} in {context}")]
    MarkerMapping { marker: u8, context: &'static str },
    #[error("illegal state: {0}")]
    IllegalState(&'static str),
    #[error("internal error: {0}")]
    Internal(String),
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("saved position stack overflow")]
    StackOverflow,
    #[error("saved position stack underflow")]
    StackUnderflow,
    #[error("reallocation to {0} bytes failed")]
    Realloc(usize),
    #[error("invalid dot path: {0}")]
    DotPath(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CBOR error: {0}")]
    Cbor(String),
}

/// Fieldless view of [`CarbonError`], for callers that branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    IllegalArgument,
    OutOfBounds,
    ReadOutOfBounds,
    WriteProtect,
    MemoryState,
    TypeMismatch,
    Corrupted,
    MarkerMapping,
    IllegalState,
    Internal,
    NotImplemented,
    StackOverflow,
    StackUnderflow,
    Realloc,
    DotPath,
    Json,
    Cbor,
}

impl CarbonError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CarbonError::IllegalArgument(_) => ErrorKind::IllegalArgument,
            CarbonError::OutOfBounds(_) => ErrorKind::OutOfBounds,
            CarbonError::ReadOutOfBounds(_) => ErrorKind::ReadOutOfBounds,
            CarbonError::WriteProtect => ErrorKind::WriteProtect,
            CarbonError::MemoryState(_) => ErrorKind::MemoryState,
            CarbonError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            CarbonError::Corrupted(_) => ErrorKind::Corrupted,
            CarbonError::MarkerMapping { .. } => ErrorKind::MarkerMapping,
            CarbonError::IllegalState(_) => ErrorKind::IllegalState,
            CarbonError::Internal(_) => ErrorKind::Internal,
            CarbonError::NotImplemented(_) => ErrorKind::NotImplemented,
            CarbonError::StackOverflow => ErrorKind::StackOverflow,
            CarbonError::StackUnderflow => ErrorKind::StackUnderflow,
            CarbonError::Realloc(_) => ErrorKind::Realloc,
            CarbonError::DotPath(_) => ErrorKind::DotPath,
            CarbonError::Json(_) => ErrorKind::Json,
            CarbonError::Cbor(_) => ErrorKind::Cbor,
        }
    }
}
