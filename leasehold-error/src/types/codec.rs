use std::any::Any;

use crate::{ErrorExt, StatusCode};

/// Ошибки кодека payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    Encode { reason: String },
    Decode { reason: String },
}

impl std::fmt::Display for CodecError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::Encode { reason } => write!(f, "payload encode failed: {reason}"),
            Self::Decode { reason } => write!(f, "payload decode failed: {reason}"),
        }
    }
}

impl std::error::Error for CodecError {}

impl ErrorExt for CodecError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Encode { .. } => StatusCode::EncodingError,
            Self::Decode { .. } => StatusCode::DecodingError,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
