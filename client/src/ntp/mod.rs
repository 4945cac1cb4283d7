//! Independent network time.
//!
//! The verifier must not trust the local clock alone: a host that controls
//! its own clock could replay an old signed response forever. This module
//! provides the second opinion, a throwaway SNTP exchange per query.

mod client;
mod error;

pub(crate) use client::NtpClient;
pub use error::NtpError;
