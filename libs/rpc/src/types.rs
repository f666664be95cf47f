use std::any::type_name;
use std::borrow::Cow;
use std::fmt;

use courier_core::{Error, Result};
use courier_fabric::Codec;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Name of a Rust type as it appears on the wire
///
/// Provider and consumer are built from the same type definitions, so the
/// names produced by [`TypeDescriptor::of`] agree on both ends.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeDescriptor(Cow<'static, str>);

impl TypeDescriptor {
    pub fn of<T: ?Sized>() -> Self {
        Self(Cow::Borrowed(type_name::<T>()))
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Formats a parameter list as `(A, B)`
pub struct Signature<'a>(pub &'a [TypeDescriptor]);

impl fmt::Display for Signature<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, ty) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(ty.as_str())?;
        }
        f.write_str(")")
    }
}

/// Types that can cross the wire as arguments or return values
pub trait RpcType: Serialize + DeserializeOwned + Send + 'static {}

impl<T> RpcType for T where T: Serialize + DeserializeOwned + Send + 'static {}

/// A value tagged with its concrete type
///
/// The payload is the value encoded with the deployment's codec. Decoding
/// checks the tag, so a value can be carried under a broad declared type and
/// still come back as the concrete type it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    type_tag: TypeDescriptor,
    payload: Vec<u8>,
}

impl Value {
    pub fn encode<T: RpcType, C: Codec>(codec: &C, value: &T) -> Result<Self> {
        Ok(Self {
            type_tag: TypeDescriptor::of::<T>(),
            payload: codec.encode(value)?,
        })
    }

    /// Decode the payload as `T`, failing if the tag names another type
    pub fn decode<T: RpcType, C: Codec>(&self, codec: &C) -> Result<T> {
        if !self.is::<T>() {
            return Err(Error::Serialization(format!(
                "type mismatch: value holds {}, requested {}",
                self.type_tag,
                type_name::<T>()
            )));
        }
        Ok(codec.decode(&self.payload)?)
    }

    pub fn is<T: ?Sized>(&self) -> bool {
        self.type_tag.as_str() == type_name::<T>()
    }

    pub fn type_tag(&self) -> &TypeDescriptor {
        &self.type_tag
    }
}
