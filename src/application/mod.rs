//! Application layer: provider gateways and checkout link generation.

mod checkout;
mod click_gateway;
mod payme_gateway;

pub use checkout::{LinkError, PaymentLinks};
pub use click_gateway::{ClickCompleteRequest, ClickGateway, ClickPrepareRequest, ClickReply};
pub use payme_gateway::PaymeGateway;
