use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("{0} timeout exceeded")]
    Timeout(&'static str),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("{0}")]
    Custom(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for courier_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Codec(msg) => courier_core::Error::Serialization(msg),
            other => courier_core::Error::Transport(other.to_string()),
        }
    }
}
