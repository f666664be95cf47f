//! Request and response envelopes exchanged for every call

use std::fmt;

use courier_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::types::{Signature, TypeDescriptor, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub service_name: String,
    pub method_name: String,
    pub parameter_types: Vec<TypeDescriptor>,
    pub args: Vec<Value>,
}

impl Request {
    /// Build a request whose parameter types are the tags of `args`
    pub fn new(service_name: impl Into<String>, method_name: impl Into<String>, args: Vec<Value>) -> Self {
        let parameter_types = args.iter().map(|arg| arg.type_tag().clone()).collect();
        Self {
            service_name: service_name.into(),
            method_name: method_name.into(),
            parameter_types,
            args,
        }
    }

    /// Check that every argument matches its declared parameter type
    pub fn validate(&self) -> Result<()> {
        if self.args.len() != self.parameter_types.len() {
            return Err(Error::Serialization(format!(
                "{} arguments for {} parameters",
                self.args.len(),
                self.parameter_types.len()
            )));
        }

        for (i, (arg, ty)) in self.args.iter().zip(&self.parameter_types).enumerate() {
            if arg.type_tag() != ty {
                return Err(Error::Serialization(format!(
                    "argument {i} holds {} but parameter is {ty}",
                    arg.type_tag()
                )));
            }
        }
        Ok(())
    }

    /// `service.method(A, B)`, for logs and error messages
    pub fn describe(&self) -> String {
        format!(
            "{}.{}{}",
            self.service_name,
            self.method_name,
            Signature(&self.parameter_types)
        )
    }
}

/// Classification of a failed call carried back to the consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    ServiceNotFound,
    MethodNotFound,
    Serialization,
    RemoteInvocation,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ServiceNotFound => "service not found",
            Self::MethodNotFound => "method not found",
            Self::Serialization => "serialization",
            Self::RemoteInvocation => "remote invocation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn service_not_found(message: impl Into<String>) -> Self {
        Self::new(FailureKind::ServiceNotFound, message)
    }

    pub fn method_not_found(message: impl Into<String>) -> Self {
        Self::new(FailureKind::MethodNotFound, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Serialization, message)
    }

    pub fn remote_invocation(message: impl Into<String>) -> Self {
        Self::new(FailureKind::RemoteInvocation, message)
    }

    /// Re-raise on the consumer as the matching error variant
    pub fn into_error(self) -> Error {
        match self.kind {
            FailureKind::ServiceNotFound => Error::ServiceNotFound(self.message),
            FailureKind::MethodNotFound => Error::MethodNotFound(self.message),
            FailureKind::Serialization => Error::Serialization(self.message),
            FailureKind::RemoteInvocation => Error::RemoteInvocation(self.message),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Framework errors raised while handling a call are never the callee's
/// failure, so the ones without a failure kind of their own are reported as
/// `Serialization`
impl From<Error> for Failure {
    fn from(err: Error) -> Self {
        match err {
            Error::ServiceNotFound(msg) => Self::service_not_found(msg),
            Error::MethodNotFound(msg) => Self::method_not_found(msg),
            Error::Serialization(msg) => Self::serialization(msg),
            Error::RemoteInvocation(msg) => Self::remote_invocation(msg),
            other @ (Error::Transport(_) | Error::Io(_) | Error::Config(_)) => {
                Self::serialization(other.to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub data: Option<Value>,
    pub data_type: Option<TypeDescriptor>,
    pub message: String,
    pub failure: Option<Failure>,
}

impl Response {
    /// Successful call; `None` stands for a `()` return
    pub fn success(data: Option<Value>) -> Self {
        let data_type = data.as_ref().map(|value| value.type_tag().clone());
        Self {
            data,
            data_type,
            message: "ok".to_string(),
            failure: None,
        }
    }

    pub fn failure(failure: Failure) -> Self {
        Self {
            data: None,
            data_type: None,
            message: failure.message.clone(),
            failure: Some(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn into_result(self) -> Result<Option<Value>> {
        match self.failure {
            Some(failure) => Err(failure.into_error()),
            None => Ok(self.data),
        }
    }
}
