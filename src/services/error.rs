//! Errors raised by the service layer.
//!
//! Each variant corresponds to one HTTP outcome; the mapping lives in
//! `api::error`.

use thiserror::Error;

use crate::db::DbError;
use crate::pdf::PdfError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{message}")]
    Validation {
        message: String,
        details: Option<String>,
    },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Storage error: {0}")]
    Store(#[from] DbError),

    #[error("PDF generation failed: {0}")]
    Pdf(#[from] PdfError),
}

impl ServiceError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ServiceError::Validation {
            message: message.into(),
            details: None,
        }
    }

    pub fn invalid_with(message: impl Into<String>, details: impl Into<String>) -> Self {
        ServiceError::Validation {
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Whether the failure is the server's fault rather than the caller's.
    pub fn is_internal(&self) -> bool {
        matches!(self, ServiceError::Store(_) | ServiceError::Pdf(_))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
