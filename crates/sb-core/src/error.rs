use std::fmt::Display;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{code}: {message}")]
pub struct BuildError {
    pub code: String,
    pub message: String,
    pub passage: Option<String>,
}

impl BuildError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            passage: None,
        }
    }

    pub fn for_passage(
        code: impl Into<String>,
        message: impl Into<String>,
        passage: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            passage: Some(passage.into()),
        }
    }

    /// Wraps a foreign error under a stable code.
    pub fn map(code: &'static str, error: impl Display) -> Self {
        Self::new(code, error.to_string())
    }
}
