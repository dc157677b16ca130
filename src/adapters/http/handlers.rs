//! HTTP handlers for the payment webhook endpoints.
//!
//! Provider contracts dictate the unusual error handling here: both Click
//! and Payme require HTTP 200 on every reply, with the outcome carried in the
//! body envelope. Extraction failures therefore cannot fall through to axum's
//! default rejections; handlers take `Result` extractors and map rejections
//! into provider envelopes themselves.

use axum::body::Bytes;
use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::{Form, Json};
use serde_json::{json, Value};
use tracing::warn;

use crate::application::ClickReply;
use crate::domain::click::ClickError;
use crate::domain::payme::{RpcError, RpcResponse};

use super::dto::{ClickCompleteDto, ClickPrepareDto};
use super::routes::PaymentAppState;

pub async fn click_prepare(
    State(state): State<PaymentAppState>,
    form: Result<Form<ClickPrepareDto>, FormRejection>,
) -> Json<ClickReply> {
    let Form(dto) = match form {
        Ok(form) => form,
        Err(rejection) => {
            warn!(%rejection, "malformed click prepare body");
            return Json(bad_request_reply());
        }
    };
    Json(state.click.prepare(dto.into()).await)
}

pub async fn click_complete(
    State(state): State<PaymentAppState>,
    form: Result<Form<ClickCompleteDto>, FormRejection>,
) -> Json<ClickReply> {
    let Form(dto) = match form {
        Ok(form) => form,
        Err(rejection) => {
            warn!(%rejection, "malformed click complete body");
            return Json(bad_request_reply());
        }
    };
    Json(state.click.complete(dto.into()).await)
}

pub async fn payme(
    State(state): State<PaymentAppState>,
    headers: HeaderMap,
    // Raw bytes, not `String`: a non-UTF-8 body must still get a JSON-RPC
    // parse-error envelope instead of axum's 400 rejection.
    body: Bytes,
) -> Json<RpcResponse> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match serde_json::from_slice(&body) {
        Ok(request) => Json(state.payme.handle(authorization, request).await),
        Err(err) => {
            warn!(%err, "unparseable payme body");
            Json(RpcResponse::error(
                Value::Null,
                RpcError {
                    code: -32700,
                    message: "Parse error".to_string(),
                    data: None,
                },
            ))
        }
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Envelope for a body that never made it into a DTO: there are no request
/// ids to echo, so zero values go back with the bad-request code.
fn bad_request_reply() -> ClickReply {
    let err = ClickError::BadRequest;
    ClickReply {
        click_trans_id: 0,
        merchant_trans_id: String::new(),
        merchant_prepare_id: None,
        merchant_confirm_id: None,
        error: err.code(),
        error_note: err.to_string(),
    }
}
