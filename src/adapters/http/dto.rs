//! Wire DTOs for the payment webhook endpoints.
//!
//! Click posts `application/x-www-form-urlencoded` bodies; numeric fields
//! arrive as strings and are parsed by serde. `amount` and `sign_time` are
//! deliberately NOT parsed into numeric/time types: both are signed
//! byte-for-byte as Click formatted them, so the DTOs keep the raw strings.

use serde::Deserialize;

use crate::application::{ClickCompleteRequest, ClickPrepareRequest};

/// Form body of `POST /payment/click/prepare`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClickPrepareDto {
    pub click_trans_id: i64,
    pub service_id: i64,
    pub merchant_trans_id: String,
    pub amount: String,
    pub action: i32,
    #[serde(default)]
    pub error: i32,
    #[serde(default)]
    pub error_note: String,
    pub sign_time: String,
    pub sign_string: String,
}

impl From<ClickPrepareDto> for ClickPrepareRequest {
    fn from(dto: ClickPrepareDto) -> Self {
        ClickPrepareRequest {
            click_trans_id: dto.click_trans_id,
            service_id: dto.service_id,
            merchant_trans_id: dto.merchant_trans_id,
            amount: dto.amount,
            action: dto.action,
            error: dto.error,
            sign_time: dto.sign_time,
            sign_string: dto.sign_string,
        }
    }
}

/// Form body of `POST /payment/click/complete`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClickCompleteDto {
    pub click_trans_id: i64,
    pub service_id: i64,
    pub click_paydoc_id: i64,
    pub merchant_trans_id: String,
    pub merchant_prepare_id: i64,
    pub amount: String,
    pub action: i32,
    #[serde(default)]
    pub error: i32,
    #[serde(default)]
    pub error_note: String,
    pub sign_time: String,
    pub sign_string: String,
}

impl From<ClickCompleteDto> for ClickCompleteRequest {
    fn from(dto: ClickCompleteDto) -> Self {
        ClickCompleteRequest {
            click_trans_id: dto.click_trans_id,
            service_id: dto.service_id,
            click_paydoc_id: dto.click_paydoc_id,
            merchant_trans_id: dto.merchant_trans_id,
            merchant_prepare_id: dto.merchant_prepare_id,
            amount: dto.amount,
            action: dto.action,
            error: dto.error,
            sign_time: dto.sign_time,
            sign_string: dto.sign_string,
        }
    }
}
