//! Infrastructure layer - External service integrations
//!
//! This layer contains:
//! - Alloy-based wallet provider access and detection
//! - Contract artifact loading and the faucet contract binding
//! - Tokio runtime bridge for async operations

pub mod artifact;
pub mod ethereum;
pub mod runtime;
