//! Courier Fabric - Codec and transport layer
//!
//! Provides the codecs a deployment can select (bincode, JSON) and the
//! byte-exchange transports (HTTP, length-prefixed TCP) that carry encoded
//! envelopes between a consumer and a provider.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use courier_fabric::transport::{Exchange, Handler, HttpExchange, HttpServer};
//!
//! struct Echo;
//!
//! impl Handler for Echo {
//!     fn handle(&self, request: &[u8]) -> Vec<u8> {
//!         request.to_vec()
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let server = HttpServer::bind("127.0.0.1:0").await?;
//! let addr = server.local_addr()?;
//! tokio::spawn(server.serve(Arc::new(Echo)));
//!
//! let exchange = HttpExchange::new(addr.to_string())?;
//! let reply = exchange.exchange(b"ping".to_vec()).await?;
//! assert_eq!(reply, b"ping");
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod error;
pub mod transport;

// Re-exports for convenience
pub use codec::{Codec, Serializer};
pub use error::{Error, Result};
pub use transport::{Exchange, Handler};
