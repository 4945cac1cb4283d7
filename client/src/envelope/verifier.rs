//! The signed-response verification pipeline.
//!
//! This is the trust boundary of the SDK: no server reply reaches a caller
//! unless it passes every step here, in order — envelope decoding, payload
//! extraction, hardware binding, freshness against an independent time
//! source, and ECDSA verification. A failure at any step discards the
//! response; later steps never run.
//!
//! The pipeline is parameterized on the verification key rather than owning
//! one: initialize/authenticate replies verify under the app key, heartbeat
//! replies under the user's session key.

use {
    super::wire::{parse_envelope, parse_payload},
    crate::{
        error::Error,
        ntp::{NtpClient, NtpError},
    },
    log::debug,
    p256::{
        ecdsa::{signature::Verifier as _, Signature, VerifyingKey},
        pkcs8::DecodePublicKey as _,
    },
    serde_json::Value,
    std::time::{SystemTime, UNIX_EPOCH},
};

/// Bounds both tolerated clock skew and tolerated payload age, in seconds.
pub(crate) const FRESHNESS_WINDOW_SECS: u64 = 30;

/// Byte length of a P-256 field element.
const FIELD_SIZE: usize = 32;

/// Independent network time source, queried afresh for every verification.
pub(crate) trait NetworkTime {
    fn unix_seconds(&self) -> Result<u64, NtpError>;
}

impl NetworkTime for NtpClient {
    fn unix_seconds(&self) -> Result<u64, NtpError> {
        self.request_time()
    }
}

/// Local wall-clock seam, replaceable in tests.
pub(crate) trait WallClock {
    fn unix_seconds(&self) -> u64;
}

/// Wall-clock time from [`SystemTime`].
pub(crate) struct SystemClock;

impl WallClock for SystemClock {
    fn unix_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_secs())
            .unwrap_or(0)
    }
}

/// Run the full pipeline over a response body.
///
/// `key_der` is the SubjectPublicKeyInfo DER encoding of the P-256 key the
/// reply must verify under; `hwid` is the locally-read machine identifier.
/// On success the inner `data` object is returned, or the whole payload when
/// the reply carries none.
pub(crate) fn verify_envelope(
    key_der: &[u8],
    hwid: &str,
    body: &[u8],
    net: &dyn NetworkTime,
    clock: &dyn WallClock,
) -> Result<Value, Error> {
    let envelope = parse_envelope(body)?;
    let payload = parse_payload(&envelope.data)?;

    // Hardware binding precedes the signature check in the pipeline order.
    if payload.hwid.as_bytes() != hwid.as_bytes() {
        debug!("payload hwid {:?} does not match local {hwid:?}", payload.hwid);
        return Err(Error::HwidMismatch);
    }

    // Freshness requires both clocks to agree AND the payload to postdate
    // the window measured on the system clock. The oracle is queried afresh
    // for every verification; samples are never reused.
    let net_time = net.unix_seconds()?;
    let sys_time = clock.unix_seconds();

    if net_time.abs_diff(sys_time) > FRESHNESS_WINDOW_SECS
        || payload.timestamp < sys_time.saturating_sub(FRESHNESS_WINDOW_SECS)
    {
        debug!(
            "stale response: payload at {}, system at {sys_time}, network at {net_time}",
            payload.timestamp
        );
        return Err(Error::OldResponse);
    }

    // The signature covers the exact decoded `data` bytes, never a
    // re-serialization of the parsed payload.
    if !verify_signature(key_der, &envelope.data, &envelope.signature) {
        return Err(Error::InvalidSignature);
    }

    Ok(match payload.json.get("data") {
        Some(inner) if !inner.is_null() => inner.clone(),
        _ => payload.json,
    })
}

/// ECDSA-P256/SHA-256 over `data` with a raw `r || s` wire signature.
///
/// Any decoding failure — key or signature — is reported as an inauthentic
/// signature; the distinction is not observable by an attacker.
fn verify_signature(key_der: &[u8], data: &[u8], signature: &[u8]) -> bool {
    let Ok(key) = VerifyingKey::from_public_key_der(key_der) else {
        return false;
    };

    let Some(signature) = signature_from_raw(signature) else {
        return false;
    };

    key.verify(data, &signature).is_ok()
}

/// Recompose a raw `r || s` concatenation into an ECDSA signature.
///
/// Each half is the big-endian unsigned encoding of one signature component,
/// normally zero-padded to the 32-byte field size. Shorter halves are
/// tolerated and left-padded; longer halves must be zero-prefixed.
fn signature_from_raw(raw: &[u8]) -> Option<Signature> {
    if raw.is_empty() || raw.len() % 2 != 0 {
        return None;
    }

    let (r, s) = raw.split_at(raw.len() / 2);
    Signature::from_scalars(pad_to_field(r)?, pad_to_field(s)?).ok()
}

fn pad_to_field(half: &[u8]) -> Option<[u8; FIELD_SIZE]> {
    let mut half = half;
    while half.len() > FIELD_SIZE && half[0] == 0 {
        half = &half[1..];
    }

    if half.len() > FIELD_SIZE {
        return None;
    }

    let mut bytes = [0u8; FIELD_SIZE];
    bytes[FIELD_SIZE - half.len()..].copy_from_slice(half);
    Some(bytes)
}
