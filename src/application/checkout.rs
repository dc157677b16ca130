//! Checkout URL generation.
//!
//! Builds the provider-hosted payment page URLs the frontend redirects
//! students to. Amounts come in as minor units (tiyin) everywhere in this
//! crate; each provider's URL format dictates its own representation.

use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::config::{ClickConfig, PaymeConfig};

const CLICK_PAY_URL: &str = "https://my.click.uz/services/pay";
const PAYME_CHECKOUT_URL: &str = "https://checkout.paycom.uz";

/// Errors from building checkout URLs.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Query string serialization failed.
    #[error("Failed to encode checkout query: {0}")]
    Encoding(String),
}

#[derive(Serialize)]
struct ClickPayQuery<'a> {
    service_id: i64,
    merchant_id: &'a str,
    amount: String,
    transaction_param: &'a str,
    return_url: &'a str,
}

/// Builder for provider checkout URLs.
pub struct PaymentLinks {
    click: ClickConfig,
    payme: PaymeConfig,
    return_url: String,
}

impl PaymentLinks {
    pub fn new(click: ClickConfig, payme: PaymeConfig, return_url: impl Into<String>) -> Self {
        Self {
            click,
            payme,
            return_url: return_url.into(),
        }
    }

    /// Click pay URL: plain query parameters, amount in sum with two
    /// decimal places.
    pub fn click_pay_url(&self, order_id: &str, amount_minor: i64) -> Result<String, LinkError> {
        let query = serde_urlencoded::to_string(ClickPayQuery {
            service_id: self.click.service_id,
            merchant_id: &self.click.merchant_id,
            amount: format_sum(amount_minor),
            transaction_param: order_id,
            return_url: &self.return_url,
        })
        .map_err(|err| LinkError::Encoding(err.to_string()))?;

        Ok(format!("{}?{}", CLICK_PAY_URL, query))
    }

    /// Payme checkout URL: base64-encoded JSON parameter object appended to
    /// the checkout host, amount in minor units.
    pub fn payme_checkout_url(&self, order_id: &str, amount_minor: i64) -> String {
        let params = json!({
            "m": self.payme.merchant_id,
            "ac": { "order_id": order_id },
            "a": amount_minor,
            "c": self.return_url,
        })
        .to_string();

        format!(
            "{}/{}",
            PAYME_CHECKOUT_URL,
            general_purpose::STANDARD.encode(params)
        )
    }
}

/// Format minor units (tiyin) as a sum amount with two decimals.
fn format_sum(amount_minor: i64) -> String {
    format!("{}.{:02}", amount_minor / 100, (amount_minor % 100).abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links() -> PaymentLinks {
        PaymentLinks::new(
            ClickConfig {
                service_id: 12345,
                merchant_id: "click-merchant".to_string(),
                secret_key: "secret".to_string(),
            },
            PaymeConfig {
                merchant_id: "payme-merchant".to_string(),
                secret_key: "secret".to_string(),
            },
            "https://talabahub.uz/payments/done",
        )
    }

    #[test]
    fn click_url_carries_all_query_params() {
        let url = links().click_pay_url("order-42", 500_000).unwrap();

        assert!(url.starts_with("https://my.click.uz/services/pay?"));
        assert!(url.contains("service_id=12345"));
        assert!(url.contains("merchant_id=click-merchant"));
        assert!(url.contains("amount=5000.00"));
        assert!(url.contains("transaction_param=order-42"));
        // return_url is percent-encoded by the query serializer
        assert!(url.contains("return_url=https%3A%2F%2Ftalabahub.uz%2Fpayments%2Fdone"));
    }

    #[test]
    fn click_amount_keeps_fractional_sum() {
        let url = links().click_pay_url("order-42", 123_456).unwrap();
        assert!(url.contains("amount=1234.56"));
    }

    #[test]
    fn payme_url_is_base64_of_the_param_object() {
        let url = links().payme_checkout_url("order-42", 500_000);
        let encoded = url.strip_prefix("https://checkout.paycom.uz/").unwrap();

        let decoded = general_purpose::STANDARD.decode(encoded).unwrap();
        let params: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(params["m"], "payme-merchant");
        assert_eq!(params["ac"]["order_id"], "order-42");
        assert_eq!(params["a"], 500_000);
        assert_eq!(params["c"], "https://talabahub.uz/payments/done");
    }
}
