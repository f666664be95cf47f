use crate::error::Result;

pub mod http;
pub mod tcp;

pub use self::http::{HttpExchange, HttpExchangeBuilder, HttpServer};
/// Largest request or reply payload accepted from a peer, on any transport
pub const MAX_FRAME_LEN: usize = 100 * 1024 * 1024;

pub use self::tcp::{
    TcpExchange, TcpServer, TcpTransport, TcpTransportBuilder, TcpTransportListener,
};

/// Transport trait for sending and receiving raw bytes
///
/// Each transport instance represents a single connection.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send bytes over the transport
    async fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// Receive bytes from the transport
    async fn receive(&mut self) -> Result<Vec<u8>>;

    /// Close the transport connection
    async fn close(&mut self) -> Result<()>;
}

/// Consumer side of a call: one request payload out, one reply payload back
///
/// Implementations own connection handling; a caller only sees the reply
/// bytes or a transport failure.
#[async_trait::async_trait]
pub trait Exchange: Send + Sync {
    async fn exchange(&self, payload: Vec<u8>) -> Result<Vec<u8>>;
}

#[async_trait::async_trait]
impl<E: Exchange + ?Sized> Exchange for std::sync::Arc<E> {
    async fn exchange(&self, payload: Vec<u8>) -> Result<Vec<u8>> {
        (**self).exchange(payload).await
    }
}

/// Provider side of a call: turns one request payload into one reply payload
///
/// Called from the blocking pool, so implementations may run user code that
/// blocks. A handler must always produce a reply.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: &[u8]) -> Vec<u8>;
}
