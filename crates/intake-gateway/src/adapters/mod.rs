//! Adapters for the intake gateway.
//!
//! Infrastructure implementations of the outbound ports.

pub mod alloy;

pub use alloy::AlloyClient;
