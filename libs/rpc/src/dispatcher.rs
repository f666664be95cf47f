//! Provider side of a call
//!
//! The dispatcher turns one encoded [`Request`] into one encoded
//! [`Response`]. It always answers: undecodable requests, unknown services
//! and methods, failing or panicking methods all come back as
//! `Response::failure`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use courier_fabric::{Codec, Exchange, Handler, Serializer};

use crate::envelope::{Failure, Request, Response};
use crate::registry::ServiceRegistry;
use crate::types::Value;

pub struct Dispatcher {
    registry: Arc<ServiceRegistry>,
    serializer: Serializer,
}

impl Dispatcher {
    pub fn new(registry: Arc<ServiceRegistry>, serializer: Serializer) -> Self {
        Self {
            registry,
            serializer,
        }
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    pub fn serializer(&self) -> Serializer {
        self.serializer
    }

    /// Run a decoded request against the registry
    pub fn dispatch(&self, request: &Request) -> Response {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.invoke(request)))
            .unwrap_or_else(|payload| Err(Failure::remote_invocation(panic_message(payload))));

        match outcome {
            Ok(data) => {
                tracing::debug!(call = %request.describe(), "dispatched");
                Response::success(data)
            }
            Err(failure) => {
                tracing::warn!(call = %request.describe(), %failure, "call failed");
                Response::failure(failure)
            }
        }
    }

    fn invoke(&self, request: &Request) -> Result<Option<Value>, Failure> {
        let instance = self.registry.resolve(&request.service_name)?;
        request.validate()?;
        instance.invoke(
            &self.serializer,
            &request.method_name,
            &request.parameter_types,
            &request.args,
        )
    }

    /// Decode, dispatch and encode one call
    pub fn handle_bytes(&self, bytes: &[u8]) -> Vec<u8> {
        let response = match self.serializer.decode::<Request>(bytes) {
            Ok(request) => self.dispatch(&request),
            Err(e) => {
                tracing::warn!("undecodable request: {}", e);
                Response::failure(Failure::serialization(format!("malformed request: {e}")))
            }
        };
        self.encode_response(&response)
    }

    fn encode_response(&self, response: &Response) -> Vec<u8> {
        match self.serializer.encode(response) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("failed to encode response: {}", e);
                let fallback =
                    Response::failure(Failure::serialization(format!("failed to encode response: {e}")));
                self.serializer.encode(&fallback).unwrap_or_default()
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("method panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("method panicked: {msg}")
    } else {
        "method panicked".to_string()
    }
}

impl Handler for Dispatcher {
    fn handle(&self, request: &[u8]) -> Vec<u8> {
        self.handle_bytes(request)
    }
}

/// In-process loopback: a proxy can call a dispatcher directly
#[async_trait::async_trait]
impl Exchange for Dispatcher {
    async fn exchange(&self, payload: Vec<u8>) -> courier_fabric::Result<Vec<u8>> {
        Ok(self.handle_bytes(&payload))
    }
}
