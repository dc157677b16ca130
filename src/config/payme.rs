//! Payme (Paycom) merchant configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Payme merchant configuration.
///
/// The secret key is the password half of the `Paycom:<secret>` Basic
/// credential Payme sends with every JSON-RPC call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymeConfig {
    /// Payme merchant id (checkout URL parameter)
    pub merchant_id: String,

    /// Shared secret key for Basic-auth verification
    pub secret_key: String,
}

impl PaymeConfig {
    /// Validate Payme configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.merchant_id.is_empty() {
            return Err(ValidationError::MissingRequired("PAYME_MERCHANT_ID"));
        }
        if self.secret_key.is_empty() {
            return Err(ValidationError::MissingRequired("PAYME_SECRET_KEY"));
        }
        Ok(())
    }
}
