//! A minimal SNTP client.
//!
//! Each [`NtpClient::request_time`] call is one complete request/response
//! exchange on a fresh UDP socket. Nothing is cached between calls: the
//! verifier depends on every freshness check seeing a live network sample.

use {
    super::error::NtpError,
    log::debug,
    std::{
        io,
        net::{SocketAddr, ToSocketAddrs, UdpSocket},
        time::Duration,
    },
};

/// Seconds between the NTP epoch (1900-01-01) and the Unix epoch (1970-01-01).
const NTP_UNIX_EPOCH_DELTA: u64 = 2_208_988_800;

/// On-wire size of an NTP packet without extensions.
const PACKET_SIZE: usize = 48;

/// Leap-indicator/version/mode byte of a client request: LI=0, VN=4, mode=3.
const CLIENT_LI_VN_MODE: u8 = 0x23;

/// Byte offset of the transmit-timestamp seconds field in the reply.
const TRANSMIT_TS_OFFSET: usize = 40;

/// Socket-level bound on a single exchange.
const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub(crate) struct NtpClient {
    hostname: String,
    port: u16,
}

impl NtpClient {
    pub(crate) fn new(hostname: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            port,
        }
    }

    /// Current Unix time in seconds according to the configured server.
    ///
    /// Performs the full exchange: resolve the hostname to its first IPv4
    /// address, send a 48-byte client packet, read the transmit-timestamp
    /// seconds out of the reply, and rebase it from the NTP epoch to the
    /// Unix epoch. The socket lives only for the duration of the call.
    /// No retries: the verifier decides whether a failure is fatal.
    pub(crate) fn request_time(&self) -> Result<u64, NtpError> {
        let addr = self.resolve()?;

        let socket =
            UdpSocket::bind(("0.0.0.0", 0)).map_err(NtpError::FailedToBuildConnection)?;
        socket
            .set_read_timeout(Some(EXCHANGE_TIMEOUT))
            .map_err(NtpError::FailedToBuildConnection)?;
        socket
            .set_write_timeout(Some(EXCHANGE_TIMEOUT))
            .map_err(NtpError::FailedToBuildConnection)?;
        socket
            .connect(addr)
            .map_err(NtpError::FailedToBuildConnection)?;

        let mut packet = [0u8; PACKET_SIZE];
        packet[0] = CLIENT_LI_VN_MODE;

        socket.send(&packet).map_err(NtpError::FailedToSendPacket)?;

        let mut reply = [0u8; PACKET_SIZE];
        let len = socket
            .recv(&mut reply)
            .map_err(NtpError::FailedToReceivePacket)?;

        if len < TRANSMIT_TS_OFFSET + 4 {
            return Err(NtpError::FailedToReceivePacket(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("short NTP reply of {len} bytes"),
            )));
        }

        let seconds = u32::from_be_bytes([
            reply[TRANSMIT_TS_OFFSET],
            reply[TRANSMIT_TS_OFFSET + 1],
            reply[TRANSMIT_TS_OFFSET + 2],
            reply[TRANSMIT_TS_OFFSET + 3],
        ]);

        let unix_seconds = u64::from(seconds).saturating_sub(NTP_UNIX_EPOCH_DELTA);
        debug!("NTP time from {}: {unix_seconds}", self.hostname);

        Ok(unix_seconds)
    }

    /// First IPv4 address of the configured server.
    fn resolve(&self) -> Result<SocketAddr, NtpError> {
        let resolve_failure = || NtpError::FailedToResolveHostname {
            hostname: self.hostname.clone(),
        };

        (self.hostname.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|_| resolve_failure())?
            .find(SocketAddr::is_ipv4)
            .ok_or_else(resolve_failure)
    }
}
