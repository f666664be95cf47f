//! Method tables: the dispatch entries of a service
//!
//! A service lists its callable methods once, when it is registered. Each
//! entry is keyed by method name and parameter signature, so overloads with
//! the same name but different parameter types are distinct entries.
//!
//! ```
//! use courier_rpc::{MethodTable, Service};
//!
//! struct Calculator;
//!
//! impl Calculator {
//!     fn add(&self, a: i64, b: i64) -> Result<i64, String> {
//!         Ok(a + b)
//!     }
//!
//!     fn div(&self, a: i64, b: i64) -> Result<i64, String> {
//!         a.checked_div(b).ok_or_else(|| "division by zero".to_string())
//!     }
//! }
//!
//! impl Service for Calculator {
//!     fn methods(table: &mut MethodTable<Self>) {
//!         table.method("add", Calculator::add).method("div", Calculator::div);
//!     }
//! }
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use courier_fabric::Serializer;

use crate::envelope::Failure;
use crate::types::{RpcType, Signature, TypeDescriptor, Value};

/// An implementation that can be bound in a [`ServiceRegistry`](crate::ServiceRegistry)
pub trait Service: Send + Sync + 'static {
    /// Add every remotely callable method to `table`
    fn methods(table: &mut MethodTable<Self>)
    where
        Self: Sized;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodKey {
    pub name: String,
    pub parameter_types: Vec<TypeDescriptor>,
}

impl MethodKey {
    pub fn new(name: impl Into<String>, parameter_types: Vec<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            parameter_types,
        }
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, Signature(&self.parameter_types))
    }
}

/// A Rust function callable as a method of service `S`
///
/// Implemented for `Fn(&S, A1, .., An) -> Result<R, E>` with up to six
/// arguments. `Marker` only disambiguates the arities.
pub trait Method<S, Marker>: Send + Sync + 'static {
    fn parameter_types() -> Vec<TypeDescriptor>;

    /// Decode `args`, call the function on `service`, encode the return value
    ///
    /// A `()` return encodes to `None`.
    fn invoke(&self, service: &S, codec: &Serializer, args: &[Value]) -> Result<Option<Value>, Failure>;
}

fn decode_arg<T: RpcType>(arg: Option<&Value>, codec: &Serializer) -> Result<T, Failure> {
    let arg = arg.ok_or_else(|| Failure::serialization("missing argument"))?;
    arg.decode(codec).map_err(Failure::from)
}

fn encode_return<R: RpcType>(output: &R, codec: &Serializer) -> Result<Option<Value>, Failure> {
    if TypeId::of::<R>() == TypeId::of::<()>() {
        return Ok(None);
    }
    Value::encode(codec, output).map(Some).map_err(Failure::from)
}

macro_rules! impl_method {
    ($($ty:ident $var:ident),*) => {
        impl<S, F, R, E, $($ty,)*> Method<S, fn($($ty,)*) -> Result<R, E>> for F
        where
            S: 'static,
            F: Fn(&S, $($ty),*) -> Result<R, E> + Send + Sync + 'static,
            R: RpcType,
            E: fmt::Display,
            $($ty: RpcType,)*
        {
            fn parameter_types() -> Vec<TypeDescriptor> {
                vec![$(TypeDescriptor::of::<$ty>()),*]
            }

            #[allow(unused_mut, unused_variables)]
            fn invoke(&self, service: &S, codec: &Serializer, args: &[Value]) -> Result<Option<Value>, Failure> {
                let mut args = args.iter();
                $(let $var: $ty = decode_arg(args.next(), codec)?;)*
                if args.next().is_some() {
                    return Err(Failure::serialization("too many arguments"));
                }

                let output = (self)(service, $($var),*)
                    .map_err(|e| Failure::remote_invocation(e.to_string()))?;
                encode_return(&output, codec)
            }
        }
    };
}

impl_method!();
impl_method!(A1 a1);
impl_method!(A1 a1, A2 a2);
impl_method!(A1 a1, A2 a2, A3 a3);
impl_method!(A1 a1, A2 a2, A3 a3, A4 a4);
impl_method!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5);
impl_method!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6);

pub(crate) type ErasedMethod = Arc<
    dyn Fn(&(dyn Any + Send + Sync), &Serializer, &[Value]) -> Result<Option<Value>, Failure>
        + Send
        + Sync,
>;

/// Dispatch entries of service `S`, built once at registration
pub struct MethodTable<S> {
    entries: HashMap<MethodKey, ErasedMethod>,
    _service: std::marker::PhantomData<fn(&S)>,
}

impl<S: Service> MethodTable<S> {
    pub(crate) fn build() -> Self {
        let mut table = Self {
            entries: HashMap::new(),
            _service: std::marker::PhantomData,
        };
        S::methods(&mut table);
        table
    }

    /// Register `method` under `name`; a later entry with the same name and
    /// signature replaces the earlier one
    pub fn method<M, F>(&mut self, name: impl Into<String>, method: F) -> &mut Self
    where
        M: 'static,
        F: Method<S, M>,
    {
        let key = MethodKey::new(name, <F as Method<S, M>>::parameter_types());
        let entry: ErasedMethod = Arc::new(
            move |instance: &(dyn Any + Send + Sync),
                  codec: &Serializer,
                  args: &[Value]|
                  -> Result<Option<Value>, Failure> {
                let service = instance.downcast_ref::<S>().ok_or_else(|| {
                    Failure::remote_invocation(format!(
                        "instance is not a {}",
                        std::any::type_name::<S>()
                    ))
                })?;
                <F as Method<S, M>>::invoke(&method, service, codec, args)
            },
        );
        self.entries.insert(key, entry);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn into_entries(self) -> HashMap<MethodKey, ErasedMethod> {
        self.entries
    }
}
