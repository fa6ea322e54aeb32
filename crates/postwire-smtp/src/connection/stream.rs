//! Low-level SMTP stream handling.

use crate::config::Config;
use crate::error::{Error, Result};
use rustls::pki_types::ServerName;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::{
    TlsConnector,
    rustls::{ClientConfig, RootCertStore},
};

/// Byte transport under the SMTP protocol.
///
/// Implementations perform no retries; every failure is returned to the
/// caller.
pub trait Transport: Send {
    /// Reads up to `buf.len()` bytes.
    ///
    /// Returns fewer bytes than requested when less is available, and `0` at
    /// end of stream.
    fn read_chunk(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<usize>> + Send;

    /// Writes and flushes the whole buffer.
    fn write_all(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Upgrades the connection to TLS in place (STARTTLS).
    fn upgrade_to_tls(&mut self, hostname: &str) -> impl Future<Output = Result<()>> + Send;

    /// Returns true if the connection is encrypted.
    fn is_tls(&self) -> bool;

    /// Releases the connection. Safe to call any number of times.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Transports that can dial a server themselves.
pub trait Connect: Transport + Sized {
    /// Opens a connection as described by `config`.
    fn open(config: &Config) -> impl Future<Output = Result<Self>> + Send;
}

/// SMTP stream (plain or TLS) over any async byte stream.
pub enum SmtpStream<S = TcpStream> {
    /// Unencrypted connection.
    Plain(S),
    /// TLS-encrypted connection.
    Tls(Box<tokio_rustls::client::TlsStream<S>>),
    /// Released; every I/O call fails with [`Error::NotConnected`].
    Closed,
}

impl<S> fmt::Debug for SmtpStream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(_) => f.write_str("SmtpStream::Plain"),
            Self::Tls(_) => f.write_str("SmtpStream::Tls"),
            Self::Closed => f.write_str("SmtpStream::Closed"),
        }
    }
}

impl<S> SmtpStream<S> {
    /// Wraps an unencrypted stream.
    pub const fn plain(stream: S) -> Self {
        Self::Plain(stream)
    }

    /// Returns true once the stream has been closed.
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl<S> Transport for SmtpStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = match self {
            Self::Plain(stream) => stream.read(buf).await?,
            Self::Tls(stream) => stream.read(buf).await?,
            Self::Closed => return Err(Error::NotConnected),
        };
        Ok(n)
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Self::Plain(stream) => {
                stream.write_all(data).await?;
                stream.flush().await?;
            }
            Self::Tls(stream) => {
                stream.write_all(data).await?;
                stream.flush().await?;
            }
            Self::Closed => return Err(Error::NotConnected),
        }
        Ok(())
    }

    async fn upgrade_to_tls(&mut self, hostname: &str) -> Result<()> {
        match self {
            Self::Plain(_) => {}
            Self::Tls(_) => return Err(Error::Protocol("Already using TLS".into())),
            Self::Closed => return Err(Error::NotConnected),
        }

        let server_name = server_name(hostname)?;
        let Self::Plain(stream) = std::mem::replace(self, Self::Closed) else {
            return Err(Error::NotConnected);
        };

        let tls_stream = create_tls_connector()
            .connect(server_name, stream)
            .await
            .map_err(Error::Tls)?;
        *self = Self::Tls(Box::new(tls_stream));
        Ok(())
    }

    fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }

    async fn close(&mut self) {
        match std::mem::replace(self, Self::Closed) {
            Self::Plain(mut stream) => {
                let _ = stream.shutdown().await;
            }
            Self::Tls(mut stream) => {
                let _ = stream.shutdown().await;
            }
            Self::Closed => {}
        }
    }
}

impl Connect for SmtpStream<TcpStream> {
    async fn open(config: &Config) -> Result<Self> {
        if config.tls {
            connect_tls(&config.host, config.port).await
        } else {
            connect(&config.host, config.port).await
        }
    }
}

/// Connects to an SMTP server over plain TCP.
///
/// # Errors
///
/// Returns an error if the connection fails.
pub async fn connect(hostname: &str, port: u16) -> Result<SmtpStream> {
    let addr = format!("{hostname}:{port}");
    match TcpStream::connect(&addr).await {
        Ok(stream) => Ok(SmtpStream::Plain(stream)),
        Err(source) => Err(Error::Connect { addr, source }),
    }
}

/// Connects to an SMTP server over TLS (implicit TLS on port 465).
///
/// # Errors
///
/// Returns an error if the connection or TLS handshake fails.
pub async fn connect_tls(hostname: &str, port: u16) -> Result<SmtpStream> {
    let mut stream = connect(hostname, port).await?;
    stream.upgrade_to_tls(hostname).await?;
    Ok(stream)
}

fn server_name(hostname: &str) -> Result<ServerName<'static>> {
    ServerName::try_from(hostname.to_string())
        .map_err(|_| Error::InvalidHostname(hostname.to_string()))
}

/// Creates a TLS connector with the Mozilla root certificates.
fn create_tls_connector() -> TlsConnector {
    let root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}
