//! Payme webhook authentication.
//!
//! Payme authenticates every JSON-RPC call with HTTP Basic credentials: the
//! `Authorization` header must base64-decode to exactly `Paycom:<secret>`.
//! Rejection happens before method dispatch and is reported as a JSON-RPC
//! error object, never as an HTTP error status.

use base64::{engine::general_purpose, Engine as _};
use subtle::ConstantTimeEq;

use super::errors::PaymeError;

/// The fixed username half of Payme's Basic credential.
const PAYCOM_LOGIN: &str = "Paycom";

/// Verifies the `Authorization` header value against the configured secret.
///
/// # Verification Steps
///
/// 1. Header must be present
/// 2. Scheme must be `Basic `
/// 3. Payload must be valid base64 decoding to UTF-8 `login:password`
/// 4. Login must be `Paycom`, password must equal the secret
///
/// The password comparison is constant-time.
///
/// # Errors
///
/// Returns `PaymeError::InvalidAuthorization` on any deviation.
pub fn verify_basic_auth(header: Option<&str>, secret: &str) -> Result<(), PaymeError> {
    let header = header.ok_or(PaymeError::InvalidAuthorization)?;

    let encoded = header
        .strip_prefix("Basic ")
        .ok_or(PaymeError::InvalidAuthorization)?;

    let decoded = general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|_| PaymeError::InvalidAuthorization)?;
    let decoded = String::from_utf8(decoded).map_err(|_| PaymeError::InvalidAuthorization)?;

    let (login, password) = decoded
        .split_once(':')
        .ok_or(PaymeError::InvalidAuthorization)?;

    if login != PAYCOM_LOGIN {
        return Err(PaymeError::InvalidAuthorization);
    }

    let matches: bool = password.as_bytes().ct_eq(secret.as_bytes()).into();
    if password.len() != secret.len() || !matches {
        return Err(PaymeError::InvalidAuthorization);
    }

    Ok(())
}
