//! JSON-RPC 2.0 envelope types for the Payme merchant API.
//!
//! Payme speaks plain JSON-RPC over a single POST endpoint. The response
//! envelope always echoes the caller's `id` and carries either `result` or
//! `error`, never both.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inbound JSON-RPC request.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    /// Caller-supplied request id, echoed back verbatim. Payme sends
    /// integers, but the JSON-RPC spec permits strings and null.
    #[serde(default)]
    pub id: Value,

    /// Method name selecting the handler.
    pub method: String,

    /// Method parameters, deserialized per method.
    #[serde(default)]
    pub params: Value,
}

/// Outbound JSON-RPC response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,

    /// Echo of the request id.
    pub id: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    /// Build a success envelope.
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Build an error envelope.
    pub fn error(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// JSON-RPC error object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RpcError {
    /// Paycom protocol error code.
    pub code: i32,

    /// Human-readable message.
    pub message: String,

    /// Optional detail, e.g. the offending account field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_deserializes_payme_shape() {
        let raw = json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": "CheckPerformTransaction",
            "params": {"amount": 500000, "account": {"order_id": "o1"}}
        });
        let req: RpcRequest = serde_json::from_value(raw).unwrap();
        assert_eq!(req.id, json!(7));
        assert_eq!(req.method, "CheckPerformTransaction");
        assert_eq!(req.params["account"]["order_id"], "o1");
    }

    #[test]
    fn request_tolerates_missing_id_and_params() {
        let req: RpcRequest =
            serde_json::from_value(json!({"method": "GetStatement"})).unwrap();
        assert!(req.id.is_null());
        assert!(req.params.is_null());
    }

    #[test]
    fn success_envelope_omits_error() {
        let resp = RpcResponse::success(json!(1), json!({"allow": true}));
        let raw = serde_json::to_value(&resp).unwrap();
        assert_eq!(raw["jsonrpc"], "2.0");
        assert_eq!(raw["id"], 1);
        assert_eq!(raw["result"]["allow"], true);
        assert!(raw.get("error").is_none());
    }

    #[test]
    fn error_envelope_omits_result() {
        let resp = RpcResponse::error(
            json!("abc"),
            RpcError {
                code: -31003,
                message: "Transaction not found".into(),
                data: None,
            },
        );
        let raw = serde_json::to_value(&resp).unwrap();
        assert_eq!(raw["id"], "abc");
        assert_eq!(raw["error"]["code"], -31003);
        assert!(raw.get("result").is_none());
    }
}
