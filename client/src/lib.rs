//! Client SDK for the TSAR hardware-bound licensing API.
//!
//! An application embeds this crate with its app id and public key, proves
//! to the authorization service that the local machine is entitled to run,
//! and keeps the entitlement live with a heartbeat:
//!
//! 1. [`Client::create`] calls `/initialize` — a `Client` exists only if the
//!    app is known and not paused.
//! 2. [`Client::authenticate`] calls `/authenticate` and yields a [`User`]
//!    with their subscription, session token, and session key. While the
//!    machine is unbound the call returns [`Error::Unauthorized`] and can
//!    open the dashboard's binding page in the user's browser.
//! 3. [`User::heartbeat`], polled every 10–30 seconds, keeps the session
//!    alive; revocation and subscription expiry surface as heartbeat
//!    failures.
//!
//! Every server reply travels through a single verification pipeline (the
//! `envelope` module): ECDSA-P256 signature over the exact payload
//! bytes, hardware binding against the locally-read machine id, and a
//! freshness check that compares an NTP sample with the local clock so that
//! neither clock alone can be tampered into accepting a replay. Two keys,
//! one pipeline: initialize/authenticate verify under the app key, heartbeat
//! under the user's session key.
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), tsar_client::Error> {
//! use {std::{thread, time::Duration}, tsar_client::Client};
//!
//! let client = Client::create(
//!     "f911842b-5b3d-4c59-b5d1-4adb8f71557b",
//!     "MFkwEwYHKoZIzj0CAQYIKoZIzj0DAQcDQgAEvJrwPvdeDUcV8Qr02tzgFrp+8qfCV/vG1HcQJYYV8u5vYUfGABMAYT0qOQltXEX9DTcB2fzLfwQnl7yiAaNruQ==",
//! )?;
//!
//! let user = client.authenticate(true)?;
//! println!("welcome {}", user.name().unwrap_or("anon"));
//!
//! while user.heartbeat().is_ok() {
//!     thread::sleep(Duration::from_secs(10));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Blocking and thread safety
//!
//! The SDK is single-threaded and blocking: every call runs to completion on
//! the calling thread, and the only suspension points are the HTTPS request
//! and the NTP exchange. A `Client` or `User` is not safe for concurrent
//! use — wrap it in your own synchronization if you share one. Distinct
//! `Client` instances are fully independent.

mod client;
mod envelope;
mod error;
mod ntp;
mod system;
mod transport;
mod user;

pub use {
    client::{Client, ClientOptions, DEFAULT_API_BASE, DEFAULT_NTP_HOST},
    error::Error,
    ntp::NtpError,
    user::{Subscription, User},
};

/// The stable machine identifier this SDK binds sessions to.
///
/// Exposed so applications can show it to users before authentication (the
/// dashboard binding flow is keyed on it).
pub fn hwid() -> Result<String, Error> {
    system::hwid()
}
