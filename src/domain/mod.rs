//! Domain layer: provider protocols and the payment transaction model.

pub mod click;
pub mod payme;
pub mod transaction;
