//! Error types for context construction and context operations.
//!
//! Native failures surface as ALC error codes; [`AlcErrorCode`] translates them
//! and [`ContextError`] carries them alongside the operation that failed.

use std::fmt;

use thiserror::Error;

use crate::system::alc;

/// Translated ALC error code as reported by the driver's error query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlcErrorCode {
    NoError,
    InvalidDevice,
    InvalidContext,
    InvalidEnum,
    InvalidValue,
    OutOfMemory,
    Unknown(i32),
}

impl AlcErrorCode {
    pub fn is_error(self) -> bool {
        self != AlcErrorCode::NoError
    }

    pub fn as_raw(self) -> i32 {
        match self {
            AlcErrorCode::NoError => alc::ALC_NO_ERROR,
            AlcErrorCode::InvalidDevice => alc::ALC_INVALID_DEVICE,
            AlcErrorCode::InvalidContext => alc::ALC_INVALID_CONTEXT,
            AlcErrorCode::InvalidEnum => alc::ALC_INVALID_ENUM,
            AlcErrorCode::InvalidValue => alc::ALC_INVALID_VALUE,
            AlcErrorCode::OutOfMemory => alc::ALC_OUT_OF_MEMORY,
            AlcErrorCode::Unknown(code) => code,
        }
    }
}

impl From<i32> for AlcErrorCode {
    fn from(code: i32) -> Self {
        match code {
            alc::ALC_NO_ERROR => AlcErrorCode::NoError,
            alc::ALC_INVALID_DEVICE => AlcErrorCode::InvalidDevice,
            alc::ALC_INVALID_CONTEXT => AlcErrorCode::InvalidContext,
            alc::ALC_INVALID_ENUM => AlcErrorCode::InvalidEnum,
            alc::ALC_INVALID_VALUE => AlcErrorCode::InvalidValue,
            alc::ALC_OUT_OF_MEMORY => AlcErrorCode::OutOfMemory,
            other => AlcErrorCode::Unknown(other),
        }
    }
}

impl fmt::Display for AlcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlcErrorCode::NoError => write!(f, "NoError"),
            AlcErrorCode::InvalidDevice => write!(f, "InvalidDevice"),
            AlcErrorCode::InvalidContext => write!(f, "InvalidContext"),
            AlcErrorCode::InvalidEnum => write!(f, "InvalidEnum"),
            AlcErrorCode::InvalidValue => write!(f, "InvalidValue"),
            AlcErrorCode::OutOfMemory => write!(f, "OutOfMemory"),
            AlcErrorCode::Unknown(code) => write!(f, "Unknown({:#x})", code),
        }
    }
}

/// The context operation during which a native error was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    MakeCurrent,
    Process,
    Suspend,
    CheckErrors,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::MakeCurrent => write!(f, "make-current"),
            Operation::Process => write!(f, "process"),
            Operation::Suspend => write!(f, "suspend"),
            Operation::CheckErrors => write!(f, "error check"),
        }
    }
}

/// Coarse classification of [`ContextError`], convenient for matching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    DriverAbsent,
    Unsupported,
    DeviceUnavailable,
    ContextCreationFailed,
    ContextOperationFailed,
    UseAfterDispose,
}

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("invalid argument `{name}` = {value}: {reason}")]
    InvalidArgument {
        name: &'static str,
        value: i32,
        reason: &'static str,
    },

    #[error("native audio library not found: {0}")]
    DriverAbsent(String),

    #[error("not supported: {0}")]
    Unsupported(String),

    #[error("audio device '{requested}' does not exist or is tied up by another application")]
    DeviceUnavailable { requested: String },

    #[error(
        "the audio context could not be created on '{device}' with attributes [{attributes}]: ALC {code} error"
    )]
    ContextCreationFailed {
        device: String,
        attributes: String,
        code: AlcErrorCode,
    },

    #[error("ALC {code} error detected during {operation} of {target}")]
    ContextOperationFailed {
        operation: Operation,
        target: String,
        code: AlcErrorCode,
    },

    #[error("{0} has been disposed")]
    UseAfterDispose(String),
}

impl ContextError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ContextError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            ContextError::DriverAbsent(_) => ErrorKind::DriverAbsent,
            ContextError::Unsupported(_) => ErrorKind::Unsupported,
            ContextError::DeviceUnavailable { .. } => ErrorKind::DeviceUnavailable,
            ContextError::ContextCreationFailed { .. } => ErrorKind::ContextCreationFailed,
            ContextError::ContextOperationFailed { .. } => ErrorKind::ContextOperationFailed,
            ContextError::UseAfterDispose(_) => ErrorKind::UseAfterDispose,
        }
    }

    /// The driver error code carried by native failures
    pub fn alc_code(&self) -> Option<AlcErrorCode> {
        match self {
            ContextError::ContextCreationFailed { code, .. }
            | ContextError::ContextOperationFailed { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ContextError>;
