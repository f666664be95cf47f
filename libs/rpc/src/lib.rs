//! Courier RPC - Remote procedure calls over the courier fabric
//!
//! A provider registers service implementations in a [`ServiceRegistry`]
//! and serves them through a [`Dispatcher`]. A consumer calls them through a
//! [`ServiceProxy`], which sends a [`Request`] envelope over any
//! [`Exchange`](courier_fabric::Exchange) and unwraps the [`Response`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use courier_fabric::Serializer;
//! use courier_rpc::{Dispatcher, MethodTable, Service, ServiceProxy, ServiceRegistry};
//!
//! #[derive(Default)]
//! struct Greeter;
//!
//! impl Greeter {
//!     fn greet(&self, name: String) -> Result<String, String> {
//!         Ok(format!("Hello, {name}!"))
//!     }
//! }
//!
//! impl Service for Greeter {
//!     fn methods(table: &mut MethodTable<Self>) {
//!         table.method("greet", Greeter::greet);
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> courier_core::Result<()> {
//! let registry = Arc::new(ServiceRegistry::new());
//! registry.register_default::<Greeter>("Greeter");
//!
//! // The dispatcher is itself an exchange, which is handy in tests
//! let dispatcher = Arc::new(Dispatcher::new(registry, Serializer::default()));
//! let proxy = ServiceProxy::new("Greeter", Serializer::default(), dispatcher);
//!
//! let greeting: String = proxy.call("greet", ("Mom".to_string(),)).await?;
//! assert_eq!(greeting, "Hello, Mom!");
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod dispatcher;
pub mod envelope;
pub mod method;
pub mod proxy;
pub mod registry;
pub mod types;

pub use application::{Provider, RpcApplication};
pub use dispatcher::Dispatcher;
pub use envelope::{Failure, FailureKind, Request, Response};
pub use method::{Method, MethodKey, MethodTable, Service};
pub use proxy::{IntoArgs, ServiceProxy};
pub use registry::{ServiceBinding, ServiceInstance, ServiceRegistry};
pub use types::{RpcType, Signature, TypeDescriptor, Value};
