//! Crate-level error type

use crate::aws::AwsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XaPolicyError {
    #[error(transparent)]
    Aws(#[from] AwsError),
    #[error("Invalid invocation event: {0}")]
    InvalidEvent(String),
    #[error("Registry error: {0}")]
    Registry(String),
}

impl XaPolicyError {
    pub fn invalid_event(msg: impl Into<String>) -> Self {
        Self::InvalidEvent(msg.into())
    }

    pub fn registry(msg: impl Into<String>) -> Self {
        Self::Registry(msg.into())
    }
}

pub type XaPolicyResult<T> = Result<T, XaPolicyError>;
