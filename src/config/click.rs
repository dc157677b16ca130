//! Click merchant configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Click merchant configuration.
///
/// `service_id` and `secret_key` are issued in the Click merchant cabinet and
/// participate in webhook signature verification; `merchant_id` only appears
/// in generated checkout URLs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClickConfig {
    /// Click service id (numeric, part of the signed string)
    pub service_id: i64,

    /// Click merchant id (checkout URL parameter)
    pub merchant_id: String,

    /// Shared secret key for webhook signatures
    pub secret_key: String,
}

impl ClickConfig {
    /// Validate Click configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.service_id <= 0 {
            return Err(ValidationError::InvalidClickServiceId);
        }
        if self.merchant_id.is_empty() {
            return Err(ValidationError::MissingRequired("CLICK_MERCHANT_ID"));
        }
        if self.secret_key.is_empty() {
            return Err(ValidationError::MissingRequired("CLICK_SECRET_KEY"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ClickConfig {
        ClickConfig {
            service_id: 12345,
            merchant_id: "m-777".to_string(),
            secret_key: "click-secret".to_string(),
        }
    }

    #[test]
    fn test_validation_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validation_missing_secret() {
        let config = ClickConfig {
            secret_key: String::new(),
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_missing_merchant_id() {
        let config = ClickConfig {
            merchant_id: String::new(),
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_service_id() {
        let config = ClickConfig {
            service_id: 0,
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }
}
