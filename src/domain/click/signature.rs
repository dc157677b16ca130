//! Click webhook signature verification.
//!
//! Click signs every webhook call with a lowercase-hex MD5 digest over the
//! request fields concatenated in a provider-mandated order. The scheme is
//! dictated by Click's merchant API and must be reproduced byte-for-byte.

use md5::{Digest, Md5};
use subtle::ConstantTimeEq;

/// The fields participating in a Click signature, in signing order.
///
/// `amount` and `sign_time` are kept as the exact strings Click sent:
/// re-formatting either (for example normalizing `"1000.00"`) would change
/// the signed byte sequence and break verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickSignaturePayload<'a> {
    pub click_trans_id: i64,
    pub service_id: i64,
    pub merchant_trans_id: &'a str,
    /// Present only on the complete call; signed as the empty string on prepare.
    pub merchant_prepare_id: Option<i64>,
    pub amount: &'a str,
    pub action: i32,
    pub sign_time: &'a str,
}

/// Verifier for Click webhook signatures.
pub struct ClickSignatureVerifier {
    /// The shared secret from the Click merchant cabinet.
    secret: String,
}

impl ClickSignatureVerifier {
    /// Creates a new verifier with the given secret key.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verifies a caller-supplied `sign_string` against the payload.
    ///
    /// Comparison is constant-time over the hex strings.
    pub fn verify(&self, payload: &ClickSignaturePayload<'_>, sign_string: &str) -> bool {
        let expected = self.compute(payload);
        constant_time_compare(expected.as_bytes(), sign_string.as_bytes())
    }

    /// Computes the expected signature for the payload.
    ///
    /// Concatenation order is fixed by the provider:
    /// `click_trans_id + service_id + secret_key + merchant_trans_id +
    /// merchant_prepare_id + amount + action + sign_time`.
    pub fn compute(&self, payload: &ClickSignaturePayload<'_>) -> String {
        let prepare_id = payload
            .merchant_prepare_id
            .map(|id| id.to_string())
            .unwrap_or_default();

        let signed = format!(
            "{}{}{}{}{}{}{}{}",
            payload.click_trans_id,
            payload.service_id,
            self.secret,
            payload.merchant_trans_id,
            prepare_id,
            payload.amount,
            payload.action,
            payload.sign_time,
        );

        let mut hasher = Md5::new();
        hasher.update(signed.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Performs constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
