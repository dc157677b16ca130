//! Payme (Paycom) provider protocol: Basic-auth scheme, JSON-RPC envelope
//! types, and the Paycom error code taxonomy.

mod auth;
mod errors;
mod rpc;

pub use auth::verify_basic_auth;
pub use errors::PaymeError;
pub use rpc::{RpcError, RpcRequest, RpcResponse};
