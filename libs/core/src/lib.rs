//! Courier Core - Shared error taxonomy and configuration
//!
//! Every courier crate reports failures through [`Error`], and every process
//! (provider or consumer) reads its settings from an [`RpcConfig`].

pub mod config;
pub mod error;

pub use config::{RpcConfig, SerializerKind, TransportKind};
pub use error::{Error, Result};
