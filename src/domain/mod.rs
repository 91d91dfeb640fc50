//! Domain layer: pure logic with no I/O.
//!
//! # Module Organization
//!
//! - `casing` - Key-case conversion between wire and internal formats
//! - `webhook` - Webhook verification, typed events and handler dispatch

pub mod casing;
pub mod webhook;
