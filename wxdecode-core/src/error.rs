use thiserror::Error;

/// Misuse of the parser registration API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// A failed parse, as surfaced by [`crate::ParseOutcome::into_result`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
}
