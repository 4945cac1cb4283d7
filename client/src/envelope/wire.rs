//! Envelope and payload wire handling.
//!
//! Every server reply body is a two-field JSON envelope: `data` (base64 of a
//! payload JSON object) and `signature` (base64 of a raw `r || s` ECDSA
//! signature over the exact decoded payload bytes). Field extraction happens
//! at [`serde_json::Value`] level rather than through a derived struct
//! because the error taxonomy distinguishes *which* field was missing or
//! mistyped.

use {
    crate::{error::Error, user::Subscription},
    base64::{
        engine::general_purpose::{STANDARD, URL_SAFE},
        Engine as _,
    },
    serde::Deserialize,
    serde_json::Value,
};

/// Decode base64 accepting both the standard and URL-safe alphabets.
///
/// Decoding is strict: canonical padding is required, trailing garbage is
/// rejected, and the alphabets are tried in turn rather than mixed.
pub(crate) fn decode_base64(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(input).or_else(|_| URL_SAFE.decode(input))
}

/// An envelope with both fields base64-decoded, signature still unchecked.
pub(crate) struct RawEnvelope {
    /// Exact payload bytes the signature was computed over.
    pub data: Vec<u8>,
    /// Raw `r || s` signature bytes.
    pub signature: Vec<u8>,
}

/// Interpret a response body as a signed envelope and decode both fields.
pub(crate) fn parse_envelope(body: &[u8]) -> Result<RawEnvelope, Error> {
    let json: Value = serde_json::from_slice(body).map_err(Error::FailedToParseBody)?;

    let data_b64 = json
        .get("data")
        .and_then(Value::as_str)
        .ok_or(Error::FailedToGetData)?;
    let signature_b64 = json
        .get("signature")
        .and_then(Value::as_str)
        .ok_or(Error::FailedToGetSignature)?;

    let signature = decode_base64(signature_b64).map_err(Error::FailedToDecodeSignature)?;
    let data = decode_base64(data_b64).map_err(Error::FailedToDecodeData)?;

    Ok(RawEnvelope { data, signature })
}

/// The decoded payload: the fields the verifier checks plus the full object.
pub(crate) struct Payload {
    pub hwid: String,
    pub timestamp: u64,
    pub json: Value,
}

/// Parse the decoded `data` bytes and pull out the verifier's fields.
pub(crate) fn parse_payload(data: &[u8]) -> Result<Payload, Error> {
    let json: Value = serde_json::from_slice(data).map_err(|_| Error::FailedToParseData)?;

    let hwid = json
        .get("hwid")
        .and_then(Value::as_str)
        .ok_or(Error::FailedToParseData)?
        .to_owned();

    let timestamp = json
        .get("timestamp")
        .ok_or(Error::FailedToGetTimestamp)?
        .as_u64()
        .ok_or(Error::FailedToParseTimestamp)?;

    Ok(Payload {
        hwid,
        timestamp,
        json,
    })
}

/// Inner payload of a successful `/initialize` reply.
#[derive(Debug, Deserialize)]
pub(crate) struct InitializePayload {
    pub dashboard_hostname: String,
}

/// Inner payload of a successful `/authenticate` reply.
#[derive(Debug, Deserialize)]
pub(crate) struct UserPayload {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    pub subscription: Subscription,
    pub session: String,
    /// Base64 of the per-session public key that verifies heartbeats.
    pub session_key: String,
}
