//! Payme error taxonomy.
//!
//! The closed set of error conditions this service reports to Payme, each
//! carrying its Paycom protocol code. Every error maps deterministically onto
//! a JSON-RPC error object; unknown internal failures degrade to
//! `Internal` so the provider retries instead of receiving a stack trace.

use thiserror::Error;

use super::rpc::RpcError;

/// Errors reported to Payme as JSON-RPC error objects.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaymeError {
    /// Basic credential check failed; reported before dispatch.
    #[error("Invalid authorization")]
    InvalidAuthorization,

    /// JSON-RPC `method` is not one of the six merchant API methods.
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// `params` did not deserialize for a known method.
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// `account.order_id` missing, or no such order exists.
    #[error("Invalid account")]
    InvalidAccount,

    /// Webhook amount does not match the order price in minor units.
    #[error("Invalid amount")]
    InvalidAmount,

    /// No transaction stored under the supplied id.
    #[error("Transaction not found")]
    TransactionNotFound,

    /// The transaction exists but its state forbids the requested operation.
    #[error("Unable to perform operation")]
    UnableToPerform,

    /// Unclassified internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PaymeError {
    /// Paycom protocol code for this error.
    pub fn code(&self) -> i32 {
        match self {
            PaymeError::InvalidAuthorization => -32504,
            PaymeError::MethodNotFound(_) => -32601,
            PaymeError::InvalidParams(_) => -32602,
            PaymeError::InvalidAccount => -31050,
            PaymeError::InvalidAmount => -31001,
            PaymeError::TransactionNotFound => -31003,
            PaymeError::UnableToPerform => -31008,
            PaymeError::Internal(_) => -32400,
        }
    }

    /// Convert into the wire error object.
    pub fn to_rpc_error(&self) -> RpcError {
        RpcError {
            code: self.code(),
            message: self.to_string(),
            data: None,
        }
    }
}
