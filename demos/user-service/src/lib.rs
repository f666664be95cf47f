//! A user lookup service served and called over courier

use async_trait::async_trait;
use courier_core::{Error, Result, RpcConfig};
use courier_rpc::{MethodTable, RpcApplication, Service, ServiceProxy};
use serde::{Deserialize, Serialize};

/// Name the provider binds [`UserServiceImpl`] under
pub const USER_SERVICE: &str = "UserService";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// The user lookup contract, implemented by the provider-side service and by
/// the consumer-side client alike
#[async_trait]
pub trait UserService: Send + Sync {
    async fn get_user(&self, user: User) -> Result<User>;
}

#[derive(Debug, Default)]
pub struct UserServiceImpl;

impl UserServiceImpl {
    /// Method table entry behind `getUser`
    fn lookup(&self, user: User) -> std::result::Result<User, String> {
        tracing::info!(name = %user.name, "getUser");
        Ok(user)
    }
}

#[async_trait]
impl UserService for UserServiceImpl {
    async fn get_user(&self, user: User) -> Result<User> {
        self.lookup(user).map_err(Error::RemoteInvocation)
    }
}

impl Service for UserServiceImpl {
    fn methods(table: &mut MethodTable<Self>) {
        table.method("getUser", UserServiceImpl::lookup);
    }
}

/// Consumer-side [`UserService`] that forwards every call to the provider
#[derive(Clone)]
pub struct UserServiceClient {
    proxy: ServiceProxy,
}

impl UserServiceClient {
    pub fn new(proxy: ServiceProxy) -> Self {
        Self { proxy }
    }

    pub fn connect(app: &RpcApplication) -> Result<Self> {
        Ok(Self::new(app.proxy(USER_SERVICE)?))
    }
}

#[async_trait]
impl UserService for UserServiceClient {
    async fn get_user(&self, user: User) -> Result<User> {
        self.proxy.call("getUser", (user,)).await
    }
}

/// Install the fmt subscriber; `RUST_LOG` wins over the configured level
pub fn init_tracing(config: &RpcConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}
