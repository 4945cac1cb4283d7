//! Time-oracle errors.

use {std::io, thiserror::Error};

/// Failures of a single NTP exchange, one kind per step. These usually reach
/// the caller wrapped in [`crate::Error::Ntp`] as part of a failed freshness
/// check.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NtpError {
    #[error("failed to create a UDP socket for the NTP exchange: {0}")]
    FailedToBuildConnection(#[source] io::Error),
    #[error("failed to resolve NTP server hostname '{hostname}'")]
    FailedToResolveHostname { hostname: String },
    #[error("failed to send the NTP request packet: {0}")]
    FailedToSendPacket(#[source] io::Error),
    #[error("failed to receive an NTP response packet: {0}")]
    FailedToReceivePacket(#[source] io::Error),
}
