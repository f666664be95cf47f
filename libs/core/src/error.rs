use thiserror::Error;

/// Failures a caller of the RPC layer can observe
///
/// The first five variants form the call taxonomy: the first three are
/// dispatch failures raised by the framework, `Transport` is local to the
/// consumer, and `RemoteInvocation` is the callee's own failure.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Remote invocation failed: {0}")]
    RemoteInvocation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
