//! Connection establishment: TCP connect and the login handshake.

use crate::error::{Error, Result};
use crate::protocol::buffer::latin1_encode;
use crate::protocol::constants::*;
use crate::protocol::framer::CommandStream;
use crate::protocol::messages::LoginMessage;
use std::fmt;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;
use tracing::{debug, info};

/// Connection parameters.
#[derive(Debug, Clone)]
pub struct ConnectParams {
    /// DNS name or address of the AS/400 server.
    pub host: String,
    /// Port number.
    pub port: u16,
    /// Timeout for DNS resolution and each TCP connect attempt (default: 20 seconds).
    pub connect_timeout: Duration,
    /// Per-read timeout on replies. `None` waits forever.
    pub read_timeout: Option<Duration>,
    /// Base URL of the license service. `None` skips license validation.
    pub license_server: Option<String>,
    /// Send usage statistics to the license service.
    pub report_usage: bool,
}

impl ConnectParams {
    /// Create new connection parameters.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: Duration::from_secs(20),
            read_timeout: None,
            license_server: Some(DEFAULT_LICENSE_SERVER.to_string()),
            report_usage: false,
        }
    }

    /// Set the connection timeout.
    ///
    /// # Example
    ///
    /// ```
    /// use peasys_rs::ConnectParams;
    /// use std::time::Duration;
    ///
    /// let params = ConnectParams::new("as400.example.com", 8000)
    ///     .with_connect_timeout(Duration::from_secs(5));
    /// ```
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the per-read timeout on replies.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Use another license service.
    pub fn with_license_server(mut self, base_url: impl Into<String>) -> Self {
        self.license_server = Some(base_url.into());
        self
    }

    /// Skip license validation and usage reporting.
    pub fn without_license_server(mut self) -> Self {
        self.license_server = None;
        self
    }

    /// Enable or disable usage reporting.
    pub fn with_usage_reporting(mut self, enabled: bool) -> Self {
        self.report_usage = enabled;
        self
    }

    /// Parse an address like "host:port".
    pub fn parse(conn_str: &str) -> Result<Self> {
        let (host, port) = conn_str
            .rsplit_once(':')
            .ok_or_else(|| Error::InvalidConnectString {
                message: "Expected format: host:port".to_string(),
            })?;
        if host.is_empty() {
            return Err(Error::InvalidConnectString {
                message: "Host cannot be empty".to_string(),
            });
        }
        let port = port.parse::<u16>().map_err(|_| Error::InvalidConnectString {
            message: format!("Invalid port: {}", port),
        })?;
        Ok(Self::new(host, port))
    }

    /// Reject an empty host or a zero port.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() || self.port == 0 {
            return Err(Error::credentials(
                "Fields of the client instance cannot be empty.",
            ));
        }
        Ok(())
    }
}

/// Login credentials and license key.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub license_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .field("license_key", &self.license_key)
            .finish()
    }
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        license_key: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            license_key: license_key.into(),
        }
    }

    /// Check the fields before any I/O.
    ///
    /// All fields must be non-empty. Username and password must fit the
    /// 10-character login fields and be encodable in ISO-8859-1.
    pub fn validate(&self) -> Result<()> {
        if self.username.is_empty() || self.password.is_empty() || self.license_key.is_empty() {
            return Err(Error::credentials(
                "Fields of the client instance cannot be empty.",
            ));
        }
        if self.username.chars().count() > CREDENTIAL_FIELD_WIDTH
            || self.password.chars().count() > CREDENTIAL_FIELD_WIDTH
        {
            return Err(Error::credentials(
                "Username and Password cannot be more 10 characters long.",
            ));
        }
        if latin1_encode(&self.username).is_err() || latin1_encode(&self.password).is_err() {
            return Err(Error::credentials(
                "Username and Password must be ISO-8859-1 text.",
            ));
        }
        Ok(())
    }
}

/// Outcome of the login handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    ProfileRejected,
    InvalidCredentials,
    InvalidSerialOrModel,
    Expired,
    /// Any other status byte, kept raw.
    Unknown(u8),
}

impl ConnectionState {
    /// Map the handshake status byte, an ASCII digit.
    pub fn from_status(byte: u8) -> Self {
        match (byte as char).to_digit(10).map(|d| d as u8) {
            Some(STATUS_CONNECTED) => ConnectionState::Connected,
            Some(STATUS_PROFILE_REJECTED) => ConnectionState::ProfileRejected,
            Some(STATUS_INVALID_CREDENTIALS) => ConnectionState::InvalidCredentials,
            Some(STATUS_INVALID_SERIAL_OR_MODEL) => ConnectionState::InvalidSerialOrModel,
            Some(STATUS_EXPIRED) => ConnectionState::Expired,
            _ => ConnectionState::Unknown(byte),
        }
    }

    /// Human-readable status.
    pub fn message(&self) -> &'static str {
        match self {
            ConnectionState::Connected => "Connected",
            ConnectionState::ProfileRejected => "Unable to set profile",
            ConnectionState::InvalidCredentials => "Invalid credential",
            ConnectionState::InvalidSerialOrModel => "Invalid serial number/model",
            ConnectionState::Expired => "Product expired",
            ConnectionState::Unknown(_) => {
                "Exception during connection process, contact us for more informations"
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        *self == ConnectionState::Connected
    }

    /// `Ok` if connected, otherwise the matching error.
    pub fn into_result(self) -> Result<Self> {
        match self {
            ConnectionState::Connected => Ok(self),
            ConnectionState::ProfileRejected => Err(Error::credentials("Unable to set profile")),
            ConnectionState::InvalidCredentials => Err(Error::credentials(
                "Invalid username or password, check again",
            )),
            ConnectionState::InvalidSerialOrModel => Err(Error::credentials(
                "Invalid serial number/model, check again",
            )),
            ConnectionState::Expired => Err(Error::connection("Products expired")),
            ConnectionState::Unknown(byte) => Err(Error::connection(format!(
                "{} (status byte {:#04x})",
                self.message(),
                byte
            ))),
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Resolve the host and open a TCP stream, bounded by the connect timeout.
pub async fn open_stream(params: &ConnectParams) -> Result<TcpStream> {
    let addr_str = format!("{}:{}", params.host, params.port);
    let addrs = timeout(params.connect_timeout, lookup_host(&addr_str))
        .await
        .map_err(|_| Error::ConnectionTimeout {
            host: params.host.clone(),
            port: params.port,
            timeout: params.connect_timeout,
        })?
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound
                || e.to_string().contains("could not resolve")
                || e.to_string().contains("Name or service not known")
                || e.to_string().contains("nodename nor servname provided")
            {
                Error::DnsResolutionFailed {
                    hostname: params.host.clone(),
                    message: e.to_string(),
                }
            } else {
                Error::Io(e)
            }
        })?;

    let mut last_error = None;
    for addr in addrs {
        match timeout(params.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(tcp_stream)) => {
                tcp_stream.set_nodelay(true)?;
                debug!(%addr, "tcp connected");
                return Ok(tcp_stream);
            }
            Ok(Err(e)) => {
                debug!(%addr, error = %e, "tcp connect failed");
                last_error = Some(Error::Io(e));
            }
            Err(_) => {
                return Err(Error::ConnectionTimeout {
                    host: params.host.clone(),
                    port: params.port,
                    timeout: params.connect_timeout,
                });
            }
        }
    }

    Err(last_error.unwrap_or_else(|| Error::DnsResolutionFailed {
        hostname: params.host.clone(),
        message: "No addresses returned".to_string(),
    }))
}

/// Send the login block and read the one-byte status.
///
/// Returns the raw state; call [`ConnectionState::into_result`] to turn a
/// refusal into an error.
pub async fn login<S>(stream: &mut CommandStream<S>, creds: &Credentials) -> Result<ConnectionState>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let msg = LoginMessage {
        username: &creds.username,
        password: &creds.password,
    };
    stream.send_message(&msg).await?;
    let status = stream.read_u8().await?;
    let state = ConnectionState::from_status(status);
    info!(username = %creds.username, state = %state, "login handshake complete");
    Ok(state)
}
