//! Shared utilities.
//!
//! Common utilities used across the crate including fingerprinting and test helpers.

pub mod hash;

#[cfg(test)]
pub mod testutil;
