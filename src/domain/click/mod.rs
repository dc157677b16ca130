//! Click provider protocol: signature scheme and error codes.

mod errors;
mod signature;

pub use errors::ClickError;
pub use signature::{ClickSignaturePayload, ClickSignatureVerifier};

/// Click webhook action selector: 0 = prepare, 1 = complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickAction {
    Prepare,
    Complete,
}

impl ClickAction {
    /// Wire value of this action.
    pub fn code(&self) -> i32 {
        match self {
            ClickAction::Prepare => 0,
            ClickAction::Complete => 1,
        }
    }
}
