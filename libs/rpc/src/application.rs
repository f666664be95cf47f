//! Process bootstrap for providers and consumers

use std::future::Future;
use std::sync::Arc;

use courier_core::{Result, RpcConfig, TransportKind};
use courier_fabric::transport::{HttpExchange, HttpServer, TcpExchange, TcpServer, TcpTransport};
use courier_fabric::{Exchange, Serializer};

use crate::dispatcher::Dispatcher;
use crate::method::Service;
use crate::proxy::ServiceProxy;
use crate::registry::ServiceRegistry;

/// Consumer-side entry point built from one [`RpcConfig`]
pub struct RpcApplication {
    config: RpcConfig,
    serializer: Serializer,
}

impl RpcApplication {
    pub fn new(config: RpcConfig) -> Self {
        let serializer = Serializer::from_kind(config.serializer);
        Self { config, serializer }
    }

    /// Load configuration (see [`RpcConfig::load`]) and build the application
    pub fn init(environment: Option<&str>) -> Result<Self> {
        let config = RpcConfig::load(environment)?;
        tracing::info!(
            name = %config.name,
            version = %config.version,
            serializer = %config.serializer,
            transport = %config.transport,
            "rpc application initialized"
        );
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    pub fn serializer(&self) -> Serializer {
        self.serializer
    }

    /// Exchange targeting the configured provider
    pub fn exchange(&self) -> Result<Arc<dyn Exchange>> {
        let address = self.config.server_address();
        let timeout = self.config.timeout();

        let exchange: Arc<dyn Exchange> = match self.config.transport {
            TransportKind::Http => {
                let mut builder = HttpExchange::builder().address(address);
                if let Some(timeout) = timeout {
                    builder = builder.timeout(timeout);
                }
                Arc::new(builder.build()?)
            }
            TransportKind::Tcp => {
                let mut builder = TcpTransport::builder().address(address);
                if let Some(timeout) = timeout {
                    builder = builder
                        .connect_timeout(timeout)
                        .send_timeout(timeout)
                        .receive_timeout(timeout);
                }
                Arc::new(TcpExchange::from_builder(builder))
            }
        };
        Ok(exchange)
    }

    pub fn proxy(&self, service_name: impl Into<String>) -> Result<ServiceProxy> {
        Ok(ServiceProxy::new(
            service_name,
            self.serializer,
            self.exchange()?,
        ))
    }

    pub fn provider(&self) -> Provider {
        Provider::new(self.config.clone())
    }
}

/// Provider-side bundle: registry, dispatcher and the listening transport
pub struct Provider {
    config: RpcConfig,
    dispatcher: Arc<Dispatcher>,
}

impl Provider {
    pub fn new(config: RpcConfig) -> Self {
        let registry = Arc::new(ServiceRegistry::new());
        let dispatcher = Arc::new(Dispatcher::new(
            registry,
            Serializer::from_kind(config.serializer),
        ));
        Self { config, dispatcher }
    }

    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    pub fn registry(&self) -> &ServiceRegistry {
        self.dispatcher.registry()
    }

    pub fn register<S, F>(&self, service_name: impl Into<String>, factory: F) -> &Self
    where
        S: Service,
        F: Fn() -> S + Send + Sync + 'static,
    {
        self.registry().register(service_name, factory);
        self
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        self.dispatcher.clone()
    }

    /// Listen on the configured host and port until the process exits
    pub async fn serve(self) -> Result<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let address = self.config.server_address();
        tracing::info!(
            services = ?self.registry().service_names(),
            transport = %self.config.transport,
            "starting provider on {}",
            address
        );

        match self.config.transport {
            TransportKind::Http => {
                HttpServer::bind(address)
                    .await?
                    .serve_with_shutdown(self.dispatcher, shutdown)
                    .await?
            }
            TransportKind::Tcp => {
                TcpServer::bind(address)
                    .await?
                    .serve_with_shutdown(self.dispatcher, shutdown)
                    .await?
            }
        }
        Ok(())
    }
}
