//! Click webhook error codes.
//!
//! Click expects every webhook reply to be HTTP 200 with a numeric `error`
//! field; negative codes tell the provider to retry or abort. The enum is the
//! closed set of codes this service emits, mapped deterministically onto the
//! wire envelope.

use thiserror::Error;

/// Errors reported to Click in webhook response envelopes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClickError {
    /// Signature recomputation did not match `sign_string`.
    #[error("SIGN CHECK FAILED!")]
    SignCheckFailed,

    /// Webhook amount does not match the order price.
    #[error("Incorrect parameter amount")]
    InvalidAmount,

    /// The `action` value does not match the endpoint.
    #[error("Action not found")]
    ActionNotFound,

    /// Order was already paid.
    #[error("Already paid")]
    AlreadyPaid,

    /// No order exists for `merchant_trans_id`.
    #[error("User does not exist")]
    UserNotFound,

    /// Referenced transaction does not exist.
    #[error("Transaction does not exist")]
    TransactionNotFound,

    /// Malformed request from the provider.
    #[error("Error in request from click")]
    BadRequest,

    /// Unclassified internal failure, degraded per the webhook contract.
    #[error("Unknown error")]
    UnknownError,
}

impl ClickError {
    /// Numeric wire code for the `error` response field.
    pub fn code(&self) -> i32 {
        match self {
            ClickError::SignCheckFailed => -1,
            ClickError::InvalidAmount => -2,
            ClickError::ActionNotFound => -3,
            ClickError::AlreadyPaid => -4,
            ClickError::UserNotFound => -5,
            ClickError::TransactionNotFound => -6,
            ClickError::BadRequest => -8,
            ClickError::UnknownError => -9,
        }
    }
}
