use thiserror::Error;

/// Errors that can occur while reading an FDL document.
///
/// These never escape [`crate::deserialize`]: the public entry point catches
/// them and degrades to an empty flow plus a human-readable message, so the
/// caller keeps its previous state.
#[derive(Error, Debug, Clone)]
pub enum ParseError {
    #[error("Failed to parse FDL document: {0}")]
    Syntax(String),

    #[error("FDL document root is not a mapping")]
    NotAMapping,

    #[error("FDL document is missing a 'flow' section")]
    MissingFlow,
}

impl From<serde_yaml::Error> for ParseError {
    fn from(err: serde_yaml::Error) -> Self {
        ParseError::Syntax(err.to_string())
    }
}

/// Errors that can occur while rendering a flow into FDL text.
#[derive(Error, Debug, Clone)]
pub enum SerializeError {
    #[error("Failed to render FDL document: {0}")]
    Emit(String),
}

impl From<serde_yaml::Error> for SerializeError {
    fn from(err: serde_yaml::Error) -> Self {
        SerializeError::Emit(err.to_string())
    }
}
