//! Testing utilities and mock implementations
//!
//! Mock transport and sink implementations so the session can be exercised
//! without a broker on the network.

pub mod mocks;

pub use mocks::*;
