//! Billing Gateway - Client library for a payment and subscription API
//!
//! Provides typed product and subscription operations against the provider's
//! REST API, and a verified, typed pipeline for the webhooks it sends back.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
