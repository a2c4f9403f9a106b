//! MCP server error types.

use crate::protocol::JsonRpcError;
use crate::schema::{SchemaError, ValidationError};
use thiserror::Error;

/// Server errors.
///
/// Registration mistakes surface as configuration errors while the server is
/// being assembled; everything else is reported per request.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("tool already registered: {0}")]
    DuplicateTool(String),

    #[error("resource already registered: {0}")]
    DuplicateResource(String),

    #[error("tool {tool} references unregistered resource {uri}")]
    UnknownResource { tool: String, uri: String },

    #[error("tool {tool} has an unusable argument schema: {source}")]
    InvalidSchema {
        tool: String,
        #[source]
        source: SchemaError,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    #[error("failed to read resource {uri}: {source}")]
    ResourceRead {
        uri: String,
        #[source]
        source: std::io::Error,
    },

    #[error("tool call failed: {0}")]
    ToolCallFailed(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("method not found: {0}")]
    MethodNotFound(String),

    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error was raised while registering tools or resources.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::DuplicateTool(_)
                | Error::DuplicateResource(_)
                | Error::UnknownResource { .. }
                | Error::InvalidSchema { .. }
        )
    }

    /// Whether this error rejected a call's arguments.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

impl From<&Error> for JsonRpcError {
    fn from(error: &Error) -> Self {
        let code = match error {
            Error::Validation(_) | Error::ToolNotFound(_) => JsonRpcError::INVALID_PARAMS,
            Error::ResourceNotFound(_) => JsonRpcError::RESOURCE_NOT_FOUND,
            Error::InvalidRequest(_) => JsonRpcError::INVALID_REQUEST,
            Error::MethodNotFound(_) => JsonRpcError::METHOD_NOT_FOUND,
            _ => JsonRpcError::INTERNAL_ERROR,
        };
        let data = match error {
            Error::Validation(validation) => serde_json::to_value(&validation.fields).ok(),
            Error::ResourceNotFound(uri) => Some(serde_json::json!({ "uri": uri })),
            _ => None,
        };
        JsonRpcError {
            code,
            message: error.to_string(),
            data,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
