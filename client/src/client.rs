//! Client construction and the authentication flow.

use {
    crate::{
        envelope::{
            verifier::{verify_envelope, SystemClock},
            wire::{decode_base64, InitializePayload, UserPayload},
        },
        error::Error,
        ntp::NtpClient,
        system,
        transport::Transport,
        user::User,
    },
    log::debug,
};

/// Canonical UUID string length of an app id.
const APP_ID_LEN: usize = 36;

/// Base64 length of a SubjectPublicKeyInfo-encoded P-256 public key.
const CLIENT_KEY_B64_LEN: usize = 124;

/// Default base URL of the authorization service.
pub const DEFAULT_API_BASE: &str = "https://tsar.dev/api/client";

/// Default NTP server consulted by the freshness check.
pub const DEFAULT_NTP_HOST: &str = "time.cloudflare.com";

/// Configuration knobs for [`Client::with_options`].
///
/// The defaults talk to the production service; tests and self-hosted
/// deployments override `api_base`.
#[derive(Clone, Debug)]
pub struct ClientOptions {
    /// Base URL the three endpoints are resolved against.
    pub api_base: String,
    /// NTP server used as the independent time source.
    pub ntp_host: String,
    pub ntp_port: u16,
    /// When set, replaces the dashboard hostname the initialize reply
    /// carries. Unauthenticated users are redirected to this host.
    pub dashboard_hostname: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_owned(),
            ntp_host: DEFAULT_NTP_HOST.to_owned(),
            ntp_port: 123,
            dashboard_hostname: None,
        }
    }
}

/// A handle to an initialized app session.
///
/// A `Client` exists only if `/initialize` returned a verified reply: its
/// construction proves the app id is known to the service and the app is not
/// paused. It holds the app public key for verifying initialize/authenticate
/// replies; per-session heartbeat keys live on the [`User`].
#[derive(Debug)]
pub struct Client {
    app_id: String,
    public_key_der: Vec<u8>,
    hwid: String,
    dashboard_hostname: String,
    transport: Transport,
    ntp: NtpClient,
}

impl Client {
    /// Create a client against the production service.
    ///
    /// `app_id` is the app's UUID; `client_key` is the app's public key as
    /// 124 base64 characters. Both are validated before any network traffic
    /// happens.
    pub fn create(app_id: &str, client_key: &str) -> Result<Self, Error> {
        Self::with_options(app_id, client_key, ClientOptions::default())
    }

    /// Create a client with explicit configuration.
    pub fn with_options(
        app_id: &str,
        client_key: &str,
        options: ClientOptions,
    ) -> Result<Self, Error> {
        if app_id.len() != APP_ID_LEN {
            return Err(Error::InvalidAppId(app_id.len()));
        }

        if client_key.len() != CLIENT_KEY_B64_LEN {
            return Err(Error::InvalidClientKey(client_key.len()));
        }

        let public_key_der =
            decode_base64(client_key).map_err(|_| Error::FailedToDecodePublicKey)?;
        let hwid = system::hwid()?;
        let transport = Transport::new(options.api_base)?;
        let ntp = NtpClient::new(options.ntp_host, options.ntp_port);

        let body = transport.get(&format!("initialize?app_id={app_id}&hwid={hwid}"))?;
        let payload = verify_envelope(&public_key_der, &hwid, &body, &ntp, &SystemClock)?;

        let dashboard_hostname = match options.dashboard_hostname {
            Some(hostname) => hostname,
            None => {
                let init: InitializePayload =
                    serde_json::from_value(payload).map_err(|_| Error::FailedToParseData)?;
                init.dashboard_hostname
            }
        };

        debug!("initialized app {app_id}, dashboard at {dashboard_hostname}");

        Ok(Self {
            app_id: app_id.to_owned(),
            public_key_der,
            hwid,
            dashboard_hostname,
            transport,
            ntp,
        })
    }

    /// Ask the service whether this machine is entitled to a user session.
    ///
    /// On success the verified reply carries the user record, the session
    /// token, and the session public key that subsequent heartbeats verify
    /// under.
    ///
    /// When the machine is not yet bound to a user the server answers 401;
    /// with `open_browser_on_unauth` set this opens the dashboard's binding
    /// page (`https://{dashboard}/auth/{hwid}`) before surfacing
    /// [`Error::Unauthorized`]. Callers typically re-poll with the flag off
    /// until the user finishes the browser flow.
    pub fn authenticate(&self, open_browser_on_unauth: bool) -> Result<User, Error> {
        let result = self.transport.get(&format!(
            "authenticate?app_id={}&hwid={}",
            self.app_id, self.hwid
        ));

        let body = match result {
            Ok(body) => body,
            Err(Error::Unauthorized) => {
                if open_browser_on_unauth {
                    system::open_browser(&self.auth_url())?;
                }
                return Err(Error::Unauthorized);
            }
            Err(err) => return Err(err),
        };

        // The identifier is re-read for the verification itself: the check
        // must bind against the machine as it is now, not as it was at
        // client creation.
        let hwid = system::hwid()?;
        let payload = verify_envelope(&self.public_key_der, &hwid, &body, &self.ntp, &SystemClock)?;
        let user: UserPayload =
            serde_json::from_value(payload).map_err(|_| Error::FailedToParseData)?;
        let session_key_der =
            decode_base64(&user.session_key).map_err(|_| Error::FailedToDecodeSessionKey)?;

        Ok(User::new(
            user,
            session_key_der,
            self.hwid.clone(),
            self.transport.clone(),
            self.ntp.clone(),
        ))
    }

    /// The app id this client was created with.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// The machine identifier this session is bound to.
    pub fn hwid(&self) -> &str {
        &self.hwid
    }

    /// Hostname of the user-facing dashboard learned at initialization.
    pub fn dashboard_hostname(&self) -> &str {
        &self.dashboard_hostname
    }

    /// The URL an unauthenticated user binds their machine at.
    pub fn auth_url(&self) -> String {
        format!("https://{}/auth/{}", self.dashboard_hostname, self.hwid)
    }
}
