//! Order service adapters.

mod stub;

pub use stub::StubOrderService;
