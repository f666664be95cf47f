//! HTTP transport
//!
//! One `POST` per call: the request payload is the body, the reply payload
//! is the response body. The server answers `405` to anything but `POST`
//! and `413` to bodies over [`MAX_FRAME_LEN`]. The client treats any non-2xx
//! status as a transport failure.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioIo};
use tokio::net::TcpListener;

use crate::error::{Error, Result};
use crate::transport::{Exchange, Handler, MAX_FRAME_LEN};

const OCTET_STREAM: &str = "application/octet-stream";

/// HTTP client side of a call
pub struct HttpExchange {
    client: Client<HttpConnector, Full<Bytes>>,
    uri: Uri,
    timeout: Option<Duration>,
}

impl HttpExchange {
    /// Exchange with `host:port` (or a full `http://` URL), no timeout
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        Self::builder().address(addr).build()
    }

    pub fn builder() -> HttpExchangeBuilder {
        HttpExchangeBuilder::default()
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }
}

#[async_trait::async_trait]
impl Exchange for HttpExchange {
    async fn exchange(&self, payload: Vec<u8>) -> Result<Vec<u8>> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(self.uri.clone())
            .header(CONTENT_TYPE, OCTET_STREAM)
            .body(Full::new(Bytes::from(payload)))
            .map_err(|e| Error::Http(format!("failed to build request: {e}")))?;

        let exchange_op = async {
            let response = self
                .client
                .request(request)
                .await
                .map_err(|e| Error::Http(format!("request to {} failed: {e}", self.uri)))?;

            let status = response.status();
            if !status.is_success() {
                return Err(Error::Http(format!("unexpected status {status}")));
            }

            let body = Limited::new(response.into_body(), MAX_FRAME_LEN)
                .collect()
                .await
                .map_err(|e| {
                    if e.is::<LengthLimitError>() {
                        Error::InvalidFrame(format!("Message too large: over {MAX_FRAME_LEN} bytes"))
                    } else {
                        Error::Http(format!("failed to read response body: {e}"))
                    }
                })?
                .to_bytes();

            Ok::<Vec<u8>, Error>(body.to_vec())
        };

        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, exchange_op)
                .await
                .map_err(|_| Error::Timeout("Request"))?,
            None => exchange_op.await,
        }
    }
}

/// Builder for configuring an [`HttpExchange`]
#[derive(Debug, Clone, Default)]
pub struct HttpExchangeBuilder {
    address: Option<String>,
    timeout: Option<Duration>,
}

impl HttpExchangeBuilder {
    pub fn address(mut self, addr: impl Into<String>) -> Self {
        self.address = Some(addr.into());
        self
    }

    /// Bound the whole request, from connect to the last body byte
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<HttpExchange> {
        let address = self
            .address
            .ok_or_else(|| Error::Custom("Address not set".to_string()))?;

        let url = if address.starts_with("http://") {
            address
        } else {
            format!("http://{address}/")
        };
        let uri = url
            .parse::<Uri>()
            .map_err(|e| Error::Http(format!("invalid url {url}: {e}")))?;

        Ok(HttpExchange {
            client: Client::builder(TokioExecutor::new()).build_http(),
            uri,
            timeout: self.timeout,
        })
    }
}

/// Serves a [`Handler`] over HTTP/1.1, one task per connection
pub struct HttpServer {
    listener: TcpListener,
}

impl HttpServer {
    pub async fn bind(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Http(format!("Failed to bind to {addr}: {e}")))?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(Into::into)
    }

    /// Serve until the process exits or accepting fails
    pub async fn serve<H: Handler>(self, handler: Arc<H>) -> Result<()> {
        self.serve_with_shutdown(handler, std::future::pending())
            .await
    }

    /// Serve until `shutdown` resolves
    pub async fn serve_with_shutdown<H, F>(self, handler: Arc<H>, shutdown: F) -> Result<()>
    where
        H: Handler,
        F: Future<Output = ()> + Send,
    {
        tracing::info!("HTTP server listening on {}", self.local_addr()?);
        tokio::pin!(shutdown);

        loop {
            let (stream, _) = tokio::select! {
                accepted = self.listener.accept() => accepted?,
                _ = &mut shutdown => {
                    tracing::info!("HTTP server shutting down");
                    return Ok(());
                }
            };

            let io = TokioIo::new(stream);
            let handler = handler.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let handler = handler.clone();
                    async move { handle_request(handler, req).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    tracing::error!("Error serving connection: {}", err);
                }
            });
        }
    }
}

async fn handle_request<H: Handler>(
    handler: Arc<H>,
    req: Request<Incoming>,
) -> std::result::Result<Response<Full<Bytes>>, Infallible> {
    if req.method() != Method::POST {
        return Ok(reply(StatusCode::METHOD_NOT_ALLOWED, Bytes::new()));
    }

    let body = match Limited::new(req.into_body(), MAX_FRAME_LEN).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => {
            tracing::warn!("Rejecting request body over {} bytes", MAX_FRAME_LEN);
            return Ok(reply(StatusCode::PAYLOAD_TOO_LARGE, Bytes::new()));
        }
        Err(e) => {
            tracing::warn!("Failed to read request body: {}", e);
            return Ok(reply(StatusCode::BAD_REQUEST, Bytes::new()));
        }
    };

    match tokio::task::spawn_blocking(move || handler.handle(&body)).await {
        Ok(payload) => Ok(reply(StatusCode::OK, Bytes::from(payload))),
        Err(e) => {
            tracing::error!("Handler task failed: {}", e);
            Ok(reply(StatusCode::INTERNAL_SERVER_ERROR, Bytes::new()))
        }
    }
}

fn reply(status: StatusCode, body: Bytes) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(OCTET_STREAM));
    response
}
