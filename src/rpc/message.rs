//! RPC request and response message types.
//!
//! Defines the message format consumed from other execution contexts
//! (popup pages, tooling) and the responses sent back.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::RequestId;

// ============================================================================
// RpcRequest
// ============================================================================

/// A method invocation from another execution context.
///
/// # Format
///
/// ```json
/// {
///   "id": "uuid",
///   "method": "listCaptures",
///   "params": [7]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Unique identifier for request/response correlation.
    pub id: RequestId,

    /// Exported operation name.
    pub method: String,

    /// Positional arguments.
    #[serde(default)]
    pub params: Vec<Value>,
}

impl RpcRequest {
    /// Creates a request with an auto-generated ID.
    #[inline]
    #[must_use]
    pub fn new(method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            id: RequestId::generate(),
            method: method.into(),
            params,
        }
    }
}

// ============================================================================
// RpcResponse
// ============================================================================

/// A response to an [`RpcRequest`].
///
/// # Format
///
/// Success:
/// ```json
/// {
///   "id": "uuid",
///   "type": "success",
///   "result": [ ... ]
/// }
/// ```
///
/// Error:
/// ```json
/// {
///   "id": "uuid",
///   "type": "error",
///   "error": "unknown method",
///   "message": "Unknown method: bogus"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Matches the request `id`.
    pub id: RequestId,

    /// Response type.
    #[serde(rename = "type")]
    pub response_type: ResponseType,

    /// Result data (if success).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Error code (if error).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Error message (if error).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RpcResponse {
    /// Creates a success response.
    #[inline]
    #[must_use]
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            id,
            response_type: ResponseType::Success,
            result: Some(result),
            error: None,
            message: None,
        }
    }

    /// Creates an error response from a crate error.
    #[inline]
    #[must_use]
    pub fn failure(id: RequestId, error: &Error) -> Self {
        Self {
            id,
            response_type: ResponseType::Error,
            result: None,
            error: Some(error.code().to_string()),
            message: Some(error.to_string()),
        }
    }

    /// Returns `true` if this is a success response.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.response_type == ResponseType::Success
    }

    /// Returns `true` if this is an error response.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.response_type == ResponseType::Error
    }

    /// Extracts the result value, or a protocol error if this is an error
    /// response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParams`] carrying the remote error message.
    pub fn into_result(self) -> Result<Value> {
        match self.response_type {
            ResponseType::Success => Ok(self.result.unwrap_or(Value::Null)),
            ResponseType::Error => {
                let code = self.error.unwrap_or_else(|| "unknown error".to_string());
                let message = self.message.unwrap_or_else(|| code.clone());
                Err(Error::invalid_params(message))
            }
        }
    }
}

// ============================================================================
// ResponseType
// ============================================================================

/// Response type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Successful response.
    Success,
    /// Error response.
    Error,
}

// ============================================================================
// Tests
// ============================================================================
