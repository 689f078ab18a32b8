use serde::Serialize;

use crate::error::ParseError;

const UNKNOWN_ERROR: &str = "Unknown error";

/// Result of a single parse attempt.
///
/// Data-shaped problems (malformed text, no parser for a source) are carried
/// here as [`ParseOutcome::Failure`] instead of being returned as errors, so
/// a caller working through many reports can keep going past a bad one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ParseOutcome<T> {
    Success { data: T },
    Failure { message: String },
}

impl<T> ParseOutcome<T> {
    pub fn success(data: T) -> Self {
        ParseOutcome::Success { data }
    }

    /// A blank message is replaced with `"Unknown error"`.
    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            message
        };
        ParseOutcome::Failure { message }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ParseOutcome::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ParseOutcome::Success { data } => Some(data),
            ParseOutcome::Failure { .. } => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            ParseOutcome::Success { data } => Some(data),
            ParseOutcome::Failure { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ParseOutcome::Success { .. } => None,
            ParseOutcome::Failure { message } => Some(message),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ParseOutcome<U> {
        match self {
            ParseOutcome::Success { data } => ParseOutcome::Success { data: f(data) },
            ParseOutcome::Failure { message } => ParseOutcome::Failure { message },
        }
    }

    pub fn unwrap_or(self, default: T) -> T {
        self.into_data().unwrap_or(default)
    }

    pub fn into_result(self) -> Result<T, ParseError> {
        match self {
            ParseOutcome::Success { data } => Ok(data),
            ParseOutcome::Failure { message } => Err(ParseError { message }),
        }
    }
}

impl<T> From<ParseOutcome<T>> for Result<T, ParseError> {
    fn from(outcome: ParseOutcome<T>) -> Self {
        outcome.into_result()
    }
}
