//! Client error taxonomy.
//!
//! Every failure the SDK can produce is a variant of [`Error`]. The variants
//! are grouped by cause: configuration, platform, transport, authorization
//! policy, envelope parsing, and trust. Trust-class errors
//! ([`Error::HwidMismatch`], [`Error::OldResponse`],
//! [`Error::InvalidSignature`]) are never recovered from internally; the
//! response that produced them is discarded.

use {crate::ntp::NtpError, thiserror::Error};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    // === Configuration ===
    #[error("app id must be a 36-character UUID string, got {0} characters")]
    InvalidAppId(usize),
    #[error("client key must be 124 base64 characters, got {0}")]
    InvalidClientKey(usize),
    #[error("failed to decode client key from base64")]
    FailedToDecodePublicKey,
    #[error("failed to decode session key from base64")]
    FailedToDecodeSessionKey,

    // === Platform ===
    #[error("failed to read a stable hardware identifier for this machine")]
    FailedToGetHwid,
    #[error("failed to open the system browser")]
    FailedToOpenBrowser,

    // === Transport ===
    #[error("request to the authorization server failed: {0}")]
    RequestFailed(#[source] reqwest::Error),
    #[error("authorization server returned an unexpected status {0}")]
    ServerError(u16),
    #[error("the server rejected the request as malformed")]
    BadRequest,
    #[error("rate limited by the server")]
    RateLimited,
    #[error("app id is not known to the server")]
    AppNotFound,
    #[error("app was paused by the developer")]
    AppPaused,

    // === Authorization policy ===
    #[error("this machine is not authorized to use the application")]
    Unauthorized,
    /// Hook for a binary-hash allow-list check at initialization. The current
    /// server contract never reports it, so nothing in this crate produces
    /// the variant.
    #[error("binary hash is not on the allow list")]
    HashUnauthorized,

    // === Envelope parsing ===
    #[error("failed to parse response body as JSON")]
    FailedToParseBody(#[source] serde_json::Error),
    #[error("response body has no `data` string field")]
    FailedToGetData,
    #[error("response body has no `signature` string field")]
    FailedToGetSignature,
    #[error("failed to decode `data` field from base64")]
    FailedToDecodeData(#[source] base64::DecodeError),
    #[error("failed to decode `signature` field from base64")]
    FailedToDecodeSignature(#[source] base64::DecodeError),
    #[error("failed to parse decoded payload")]
    FailedToParseData,
    #[error("payload has no `timestamp` field")]
    FailedToGetTimestamp,
    #[error("payload `timestamp` is not an unsigned integer")]
    FailedToParseTimestamp,

    // === Trust ===
    #[error("payload hwid does not match this machine")]
    HwidMismatch,
    #[error("response is outside the freshness window")]
    OldResponse,
    #[error("signature is not authentic")]
    InvalidSignature,

    /// Time-oracle failure during the freshness check.
    #[error(transparent)]
    Ntp(#[from] NtpError),

    // === Fallback ===
    #[error("an unexpected error occurred")]
    UnexpectedError,
}
