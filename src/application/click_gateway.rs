//! Click gateway - prepare/complete webhook handling.
//!
//! Click's merchant API is stateless on our side: each call carries the full
//! parameter set and an MD5 signature, and every reply is an HTTP 200
//! envelope whose `error` field carries the outcome. Handlers therefore never
//! return an error to the transport layer; anything unclassifiable degrades
//! to the provider's generic code.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, warn};

use crate::config::ClickConfig;
use crate::domain::click::{ClickAction, ClickError, ClickSignaturePayload, ClickSignatureVerifier};
use crate::ports::{Order, OrderService};

/// Parameters of a Click prepare call, as received on the wire.
///
/// `amount` and `sign_time` stay raw strings: they participate in the
/// signature byte-for-byte as Click formatted them.
#[derive(Debug, Clone)]
pub struct ClickPrepareRequest {
    pub click_trans_id: i64,
    pub service_id: i64,
    pub merchant_trans_id: String,
    pub amount: String,
    pub action: i32,
    pub error: i32,
    pub sign_time: String,
    pub sign_string: String,
}

/// Parameters of a Click complete call.
#[derive(Debug, Clone)]
pub struct ClickCompleteRequest {
    pub click_trans_id: i64,
    pub service_id: i64,
    pub click_paydoc_id: i64,
    pub merchant_trans_id: String,
    pub merchant_prepare_id: i64,
    pub amount: String,
    pub action: i32,
    pub error: i32,
    pub sign_time: String,
    pub sign_string: String,
}

/// Response envelope for both Click endpoints.
///
/// `merchant_prepare_id` appears on prepare replies, `merchant_confirm_id` on
/// complete replies; the one not in play is omitted from the JSON body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClickReply {
    pub click_trans_id: i64,
    pub merchant_trans_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_prepare_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_confirm_id: Option<i64>,
    pub error: i32,
    pub error_note: String,
}

/// Gateway handling Click prepare/complete webhooks.
pub struct ClickGateway {
    orders: Arc<dyn OrderService>,
    verifier: ClickSignatureVerifier,
    service_id: i64,
}

impl ClickGateway {
    pub fn new(orders: Arc<dyn OrderService>, config: ClickConfig) -> Self {
        Self {
            orders,
            verifier: ClickSignatureVerifier::new(config.secret_key),
            service_id: config.service_id,
        }
    }

    /// Handle a prepare call. Always yields a reply envelope.
    pub async fn prepare(&self, request: ClickPrepareRequest) -> ClickReply {
        match self.try_prepare(&request).await {
            Ok(prepare_id) => {
                debug!(
                    click_trans_id = request.click_trans_id,
                    order = %request.merchant_trans_id,
                    prepare_id,
                    "click prepare accepted"
                );
                ClickReply {
                    click_trans_id: request.click_trans_id,
                    merchant_trans_id: request.merchant_trans_id,
                    merchant_prepare_id: Some(prepare_id),
                    merchant_confirm_id: None,
                    error: 0,
                    error_note: "Success".to_string(),
                }
            }
            Err(err) => {
                warn!(
                    click_trans_id = request.click_trans_id,
                    order = %request.merchant_trans_id,
                    code = err.code(),
                    %err,
                    "click prepare rejected"
                );
                ClickReply {
                    click_trans_id: request.click_trans_id,
                    merchant_trans_id: request.merchant_trans_id,
                    merchant_prepare_id: Some(0),
                    merchant_confirm_id: None,
                    error: err.code(),
                    error_note: err.to_string(),
                }
            }
        }
    }

    /// Handle a complete call. Always yields a reply envelope.
    pub async fn complete(&self, request: ClickCompleteRequest) -> ClickReply {
        match self.try_complete(&request).await {
            Ok(confirm_id) => {
                debug!(
                    click_trans_id = request.click_trans_id,
                    order = %request.merchant_trans_id,
                    confirm_id,
                    "click complete accepted"
                );
                ClickReply {
                    click_trans_id: request.click_trans_id,
                    merchant_trans_id: request.merchant_trans_id,
                    merchant_prepare_id: None,
                    merchant_confirm_id: Some(confirm_id),
                    error: 0,
                    error_note: "Success".to_string(),
                }
            }
            Err(err) => {
                warn!(
                    click_trans_id = request.click_trans_id,
                    order = %request.merchant_trans_id,
                    code = err.code(),
                    %err,
                    "click complete rejected"
                );
                ClickReply {
                    click_trans_id: request.click_trans_id,
                    merchant_trans_id: request.merchant_trans_id,
                    merchant_prepare_id: None,
                    merchant_confirm_id: Some(0),
                    error: err.code(),
                    error_note: err.to_string(),
                }
            }
        }
    }

    async fn try_prepare(&self, request: &ClickPrepareRequest) -> Result<i64, ClickError> {
        let payload = ClickSignaturePayload {
            click_trans_id: request.click_trans_id,
            service_id: request.service_id,
            merchant_trans_id: &request.merchant_trans_id,
            merchant_prepare_id: None,
            amount: &request.amount,
            action: request.action,
            sign_time: &request.sign_time,
        };
        if !self.verifier.verify(&payload, &request.sign_string) {
            return Err(ClickError::SignCheckFailed);
        }
        if request.action != ClickAction::Prepare.code() {
            return Err(ClickError::ActionNotFound);
        }
        if request.service_id != self.service_id {
            return Err(ClickError::BadRequest);
        }

        let order = self.resolve_order(&request.merchant_trans_id).await?;
        if !order.payable {
            return Err(ClickError::AlreadyPaid);
        }
        check_amount(&request.amount, order.amount)?;

        // The prepare id only needs to be an i64 Click can echo back; server
        // time gives a unique-enough monotonic value without extra state.
        Ok(now_millis())
    }

    async fn try_complete(&self, request: &ClickCompleteRequest) -> Result<i64, ClickError> {
        let payload = ClickSignaturePayload {
            click_trans_id: request.click_trans_id,
            service_id: request.service_id,
            merchant_trans_id: &request.merchant_trans_id,
            merchant_prepare_id: Some(request.merchant_prepare_id),
            amount: &request.amount,
            action: request.action,
            sign_time: &request.sign_time,
        };
        if !self.verifier.verify(&payload, &request.sign_string) {
            return Err(ClickError::SignCheckFailed);
        }
        if request.action != ClickAction::Complete.code() {
            return Err(ClickError::ActionNotFound);
        }
        if request.service_id != self.service_id {
            return Err(ClickError::BadRequest);
        }
        // Click reports its own upstream failure in `error`; there is nothing
        // to confirm on our side.
        if request.error < 0 {
            return Err(ClickError::TransactionNotFound);
        }

        let order = self.resolve_order(&request.merchant_trans_id).await?;
        if !order.payable {
            return Err(ClickError::AlreadyPaid);
        }
        check_amount(&request.amount, order.amount)?;

        let provider_ref = request.click_paydoc_id.to_string();
        self.orders
            .mark_paid(&order.id, &provider_ref)
            .await
            .map_err(|err| {
                error!(order = %order.id, %err, "mark_paid failed");
                ClickError::UnknownError
            })?;
        self.orders.grant_access(&order.id).await.map_err(|err| {
            error!(order = %order.id, %err, "grant_access failed");
            ClickError::UnknownError
        })?;

        Ok(now_millis())
    }

    async fn resolve_order(&self, merchant_trans_id: &str) -> Result<Order, ClickError> {
        self.orders
            .find_order(merchant_trans_id)
            .await
            .map_err(|err| {
                error!(order = merchant_trans_id, %err, "order lookup failed");
                ClickError::UnknownError
            })?
            .ok_or(ClickError::UserNotFound)
    }
}

/// Compare the wire amount (sum, decimal string) against the order price in
/// minor units (tiyin).
fn check_amount(wire_amount: &str, order_amount: i64) -> Result<(), ClickError> {
    let minor = parse_sum_to_tiyin(wire_amount).ok_or(ClickError::BadRequest)?;
    if minor != order_amount {
        return Err(ClickError::InvalidAmount);
    }
    Ok(())
}

/// Parse a decimal sum string ("5000", "5000.0", "5000.00") into tiyin using
/// integer arithmetic only. At most two fractional digits, no sign.
fn parse_sum_to_tiyin(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let (whole, frac) = raw.split_once('.').unwrap_or((raw, ""));
    if whole.is_empty() || frac.len() > 2 {
        return None;
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let whole: i64 = whole.parse().ok()?;
    let mut frac_tiyin: i64 = if frac.is_empty() { 0 } else { frac.parse().ok()? };
    if frac.len() == 1 {
        frac_tiyin *= 10;
    }
    whole.checked_mul(100)?.checked_add(frac_tiyin)
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
