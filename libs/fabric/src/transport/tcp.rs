use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::error::{Error, Result};
use crate::transport::{Exchange, Handler, Transport, MAX_FRAME_LEN};

/// TCP transport with length-prefix framing
///
/// Messages are sent with a 4-byte big-endian length prefix
pub struct TcpTransport {
    stream: TcpStream,
    send_timeout: Option<Duration>,
    receive_timeout: Option<Duration>,
}

impl TcpTransport {
    /// Connect to a remote `host:port` with no timeouts
    pub async fn connect(addr: impl Into<String>) -> Result<Self> {
        Self::builder().address(addr).connect().await
    }

    /// Create a builder for configuring the transport
    pub fn builder() -> TcpTransportBuilder {
        TcpTransportBuilder::new()
    }

    /// Create from an existing TcpStream
    pub fn from_stream(stream: TcpStream) -> Self {
        Self {
            stream,
            send_timeout: None,
            receive_timeout: None,
        }
    }
}

fn eof_as_closed(e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::ConnectionClosed
    } else {
        e.into()
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let len = u32::try_from(bytes.len())
            .ok()
            .filter(|len| *len as usize <= MAX_FRAME_LEN)
            .ok_or_else(|| {
                Error::InvalidFrame(format!("Message too large: {} bytes", bytes.len()))
            })?;

        let timeout = self.send_timeout;
        let send_op = async {
            self.stream.write_u32(len).await?;
            self.stream.write_all(bytes).await?;
            self.stream.flush().await?;
            Ok::<(), Error>(())
        };

        match timeout {
            Some(timeout) => tokio::time::timeout(timeout, send_op)
                .await
                .map_err(|_| Error::Timeout("Send"))?,
            None => send_op.await,
        }
    }

    async fn receive(&mut self) -> Result<Vec<u8>> {
        let timeout = self.receive_timeout;
        let receive_op = async {
            let len = self.stream.read_u32().await.map_err(eof_as_closed)? as usize;

            if len > MAX_FRAME_LEN {
                return Err(Error::InvalidFrame(format!(
                    "Message too large: {} bytes",
                    len
                )));
            }

            let mut buf = vec![0u8; len];
            self.stream
                .read_exact(&mut buf)
                .await
                .map_err(eof_as_closed)?;

            Ok::<Vec<u8>, Error>(buf)
        };

        match timeout {
            Some(timeout) => tokio::time::timeout(timeout, receive_op)
                .await
                .map_err(|_| Error::Timeout("Receive"))?,
            None => receive_op.await,
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

/// TCP listener for accepting incoming connections
pub struct TcpTransportListener {
    listener: TcpListener,
}

impl TcpTransportListener {
    /// Bind to a local address
    pub async fn bind(addr: impl Into<String>) -> Result<Self> {
        let listener = TcpListener::bind(addr.into()).await?;
        Ok(Self { listener })
    }

    /// Accept an incoming connection
    pub async fn accept(&self) -> Result<(TcpTransport, SocketAddr)> {
        let (stream, addr) = self.listener.accept().await?;
        Ok((TcpTransport::from_stream(stream), addr))
    }

    /// Get the local address this listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(Into::into)
    }
}

/// Builder for configuring TCP transport
#[derive(Debug, Clone, Default)]
pub struct TcpTransportBuilder {
    address: Option<String>,
    connect_timeout: Option<Duration>,
    send_timeout: Option<Duration>,
    receive_timeout: Option<Duration>,
}

impl TcpTransportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `host:port` to connect to
    pub fn address(mut self, addr: impl Into<String>) -> Self {
        self.address = Some(addr.into());
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = Some(timeout);
        self
    }

    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = Some(timeout);
        self
    }

    /// Connect with the configured settings
    pub async fn connect(&self) -> Result<TcpTransport> {
        let addr = self
            .address
            .as_deref()
            .ok_or_else(|| Error::Custom("Address not set".to_string()))?;

        let connect_op = TcpStream::connect(addr);

        let stream = match self.connect_timeout {
            Some(timeout) => tokio::time::timeout(timeout, connect_op)
                .await
                .map_err(|_| Error::Timeout("Connect"))??,
            None => connect_op.await?,
        };

        Ok(TcpTransport {
            stream,
            send_timeout: self.send_timeout,
            receive_timeout: self.receive_timeout,
        })
    }
}

/// Framed TCP exchange opening a fresh connection per call
#[derive(Debug, Clone)]
pub struct TcpExchange {
    builder: TcpTransportBuilder,
}

impl TcpExchange {
    pub fn new(addr: impl Into<String>) -> Self {
        Self::from_builder(TcpTransport::builder().address(addr))
    }

    /// Use `builder`'s address and timeouts for every call
    pub fn from_builder(builder: TcpTransportBuilder) -> Self {
        Self { builder }
    }
}

#[async_trait::async_trait]
impl Exchange for TcpExchange {
    async fn exchange(&self, payload: Vec<u8>) -> Result<Vec<u8>> {
        let mut transport = self.builder.connect().await?;
        transport.send(&payload).await?;
        let reply = transport.receive().await?;
        if let Err(e) = transport.close().await {
            tracing::debug!("closing tcp exchange: {e}");
        }
        Ok(reply)
    }
}

/// Serves a [`Handler`] over framed TCP, one task per connection
pub struct TcpServer {
    listener: TcpTransportListener,
}

impl TcpServer {
    pub async fn bind(addr: impl Into<String>) -> Result<Self> {
        let listener = TcpTransportListener::bind(addr).await?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until the process exits or accepting fails
    pub async fn serve<H: Handler>(self, handler: Arc<H>) -> Result<()> {
        self.serve_with_shutdown(handler, std::future::pending())
            .await
    }

    /// Serve until `shutdown` resolves
    ///
    /// Connections already accepted keep running until their peer hangs up.
    pub async fn serve_with_shutdown<H, F>(self, handler: Arc<H>, shutdown: F) -> Result<()>
    where
        H: Handler,
        F: Future<Output = ()> + Send,
    {
        tracing::info!("TCP server listening on {}", self.local_addr()?);
        tokio::pin!(shutdown);

        loop {
            let (transport, peer) = tokio::select! {
                accepted = self.listener.accept() => accepted?,
                _ = &mut shutdown => {
                    tracing::info!("TCP server shutting down");
                    return Ok(());
                }
            };

            let handler = handler.clone();
            tokio::spawn(async move {
                if let Err(e) = serve_connection(transport, handler).await {
                    tracing::error!(%peer, "Error serving connection: {}", e);
                }
            });
        }
    }
}

async fn serve_connection<H: Handler>(mut transport: TcpTransport, handler: Arc<H>) -> Result<()> {
    loop {
        let request = match transport.receive().await {
            Ok(request) => request,
            Err(Error::ConnectionClosed) => return Ok(()),
            Err(e) => return Err(e),
        };

        let handler = handler.clone();
        let reply = tokio::task::spawn_blocking(move || handler.handle(&request))
            .await
            .map_err(|e| Error::Custom(format!("handler task failed: {e}")))?;

        transport.send(&reply).await?;
    }
}
