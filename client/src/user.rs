//! User and subscription records.

use {
    crate::{
        envelope::{
            verifier::{verify_envelope, SystemClock},
            wire::UserPayload,
        },
        error::Error,
        ntp::NtpClient,
        system,
        transport::Transport,
    },
    serde::Deserialize,
};

/// A subscription attached to a user record.
#[derive(Clone, Debug, Deserialize)]
pub struct Subscription {
    /// Subscription identifier.
    pub id: String,
    /// Unix timestamp the subscription expires at; `None` means open-ended.
    #[serde(default)]
    pub expires: Option<u64>,
    /// Tier assigned by the app's purchase flow.
    #[serde(default)]
    pub tier: u32,
}

/// An authenticated user bound to this machine.
///
/// Produced only by [`crate::Client::authenticate`] from a verified reply,
/// so holding a `User` is proof that the machine was entitled at that
/// moment. Call [`User::heartbeat`] periodically (every 10–30 seconds) to
/// keep the entitlement live; the first failed heartbeat ends the session.
///
/// Heartbeat replies verify under the per-session key delivered at
/// authentication, not under the app key.
#[derive(Debug)]
pub struct User {
    id: String,
    name: Option<String>,
    avatar: Option<String>,
    subscription: Subscription,
    session: String,
    session_key_der: Vec<u8>,
    hwid: String,
    transport: Transport,
    ntp: NtpClient,
}

impl User {
    pub(crate) fn new(
        payload: UserPayload,
        session_key_der: Vec<u8>,
        hwid: String,
        transport: Transport,
        ntp: NtpClient,
    ) -> Self {
        Self {
            id: payload.id,
            name: payload.name,
            avatar: payload.avatar,
            subscription: payload.subscription,
            session: payload.session,
            session_key_der,
            hwid,
            transport,
            ntp,
        }
    }

    /// User identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name, if the user has one set.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Avatar URL, if the user has one set.
    pub fn avatar(&self) -> Option<&str> {
        self.avatar.as_deref()
    }

    /// The subscription this session runs under.
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    /// Prove to the server that the session is still alive and entitled.
    ///
    /// The reply is pushed through the same verification pipeline as every
    /// other response, keyed by the session key. A successful heartbeat
    /// changes nothing locally; any failure should be treated as the end of
    /// the session. Polling faster than every 10 seconds will get the
    /// session rate limited.
    pub fn heartbeat(&self) -> Result<(), Error> {
        let body = self.transport.get(&format!(
            "heartbeat?session={}&hwid={}",
            self.session, self.hwid
        ))?;

        let hwid = system::hwid()?;
        verify_envelope(&self.session_key_der, &hwid, &body, &self.ntp, &SystemClock)?;

        Ok(())
    }
}
