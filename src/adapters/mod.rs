//! Adapters: HTTP surface, storage and orchestrator implementations.

pub mod http;
pub mod order;
pub mod store;
