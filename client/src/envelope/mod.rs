//! Signed-envelope verification.
//!
//! Every reply from the authorization service is a `{data, signature}`
//! envelope: `data` is base64 of a payload JSON object carrying `hwid`, a
//! signing `timestamp`, and an optional endpoint-specific `data` sub-object;
//! `signature` is base64 of a raw `r || s` ECDSA-P256 signature over the
//! exact decoded payload bytes.
//!
//! # Module layout
//! - [`wire`]: envelope/payload field extraction, base64 handling, and the
//!   typed initialize/authenticate payloads.
//! - [`verifier`]: the pipeline — decode, bind to the machine identifier,
//!   check freshness against an independent network clock, verify the
//!   signature, and only then surface the payload.
//!
//! # What is actually signed?
//! The exact bytes obtained by base64-decoding the `data` field. The
//! verifier never re-serializes the parsed payload before verification: a
//! round-trip through a JSON library is not guaranteed to be byte-stable.
//!
//! # Why two clocks?
//! A host that controls its own clock could replay an old signed response
//! indefinitely, and a network-position attacker can forge UDP time replies.
//! The freshness check therefore requires the NTP sample and the local clock
//! to agree within the window *and* the payload to be recent on the local
//! clock; faking either clock alone is insufficient.

pub(crate) mod verifier;
pub(crate) mod wire;
