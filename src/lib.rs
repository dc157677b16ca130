//! TalabaHub Payments - Click and Payme gateway service
//!
//! This crate implements the payment-gateway core of the TalabaHub student
//! services platform: webhook adapters for the Click and Payme providers,
//! signature verification, the payment transaction store, and checkout URL
//! generation.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
