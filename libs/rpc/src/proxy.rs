//! Consumer side of a call

use std::any::Any;
use std::sync::Arc;

use courier_core::{Error, Result};
use courier_fabric::{Codec, Exchange, Serializer};

use crate::envelope::{Request, Response};
use crate::types::{RpcType, Value};

/// Argument lists a proxy can send: tuples of up to six [`RpcType`]s
pub trait IntoArgs {
    fn into_args<C: Codec>(self, codec: &C) -> Result<Vec<Value>>;
}

macro_rules! impl_into_args {
    ($($ty:ident $var:ident),*) => {
        impl<$($ty: RpcType,)*> IntoArgs for ($($ty,)*) {
            #[allow(unused_variables)]
            fn into_args<C: Codec>(self, codec: &C) -> Result<Vec<Value>> {
                let ($($var,)*) = self;
                Ok(vec![$(Value::encode(codec, &$var)?),*])
            }
        }
    };
}

impl_into_args!();
impl_into_args!(A1 a1);
impl_into_args!(A1 a1, A2 a2);
impl_into_args!(A1 a1, A2 a2, A3 a3);
impl_into_args!(A1 a1, A2 a2, A3 a3, A4 a4);
impl_into_args!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5);
impl_into_args!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6);

/// Calls the methods of one remote service
///
/// Typed clients wrap a proxy and expose the service's methods:
///
/// ```no_run
/// use courier_core::Result;
/// use courier_rpc::ServiceProxy;
///
/// struct GreeterClient {
///     proxy: ServiceProxy,
/// }
///
/// impl GreeterClient {
///     async fn greet(&self, name: String) -> Result<String> {
///         self.proxy.call("greet", (name,)).await
///     }
/// }
/// ```
#[derive(Clone)]
pub struct ServiceProxy {
    service_name: String,
    serializer: Serializer,
    exchange: Arc<dyn Exchange>,
}

impl ServiceProxy {
    pub fn new(
        service_name: impl Into<String>,
        serializer: Serializer,
        exchange: Arc<dyn Exchange>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            serializer,
            exchange,
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Call `method` with `args` and decode the result as `R`
    ///
    /// A failure captured by the provider is returned as the matching
    /// [`Error`] variant; an exchange that never produced a reply is
    /// [`Error::Transport`].
    pub async fn call<A, R>(&self, method: &str, args: A) -> Result<R>
    where
        A: IntoArgs,
        R: RpcType,
    {
        let args = args.into_args(&self.serializer)?;
        let request = Request::new(self.service_name.clone(), method, args);
        let response = self.send(&request).await?;
        self.unwrap_response(&request, response)
    }

    /// Encode `request`, exchange it and decode the reply
    pub async fn send(&self, request: &Request) -> Result<Response> {
        let payload = self.serializer.encode(request)?;

        let reply = self.exchange.exchange(payload).await.map_err(|e| {
            tracing::warn!(call = %request.describe(), "exchange failed: {}", e);
            Error::Transport(e.to_string())
        })?;

        Ok(self.serializer.decode(&reply)?)
    }

    fn unwrap_response<R: RpcType>(&self, request: &Request, response: Response) -> Result<R> {
        match response.into_result()? {
            Some(value) => value.decode(&self.serializer),
            None => unit().ok_or_else(|| {
                Error::Serialization(format!("{} returned no data", request.describe()))
            }),
        }
    }
}

/// `Some(())` when `R` is `()`
fn unit<R: 'static>() -> Option<R> {
    let unit: Box<dyn Any> = Box::new(());
    unit.downcast::<R>().ok().map(|value| *value)
}
