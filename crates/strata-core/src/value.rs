//! Dynamic values carried through a dispatch
//!
//! Arguments, results and auxiliary state all travel as [`Value`]. Plain data
//! is a `serde_json::Value`; callbacks and composed objects are carried by
//! reference so the terminal-callback convention works across layers.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::errors::Result;
use crate::object::Extensible;

type CallbackFn = dyn Fn(Vec<Value>) -> Result<Value> + Send + Sync;

/// Shareable callable passed as an argument (e.g. a `cb(err, result)` slot)
#[derive(Clone)]
pub struct Callback(Arc<CallbackFn>);

impl Callback {
    /// Wrap a closure
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke the callback
    pub fn invoke(&self, args: Vec<Value>) -> Result<Value> {
        (self.0)(args)
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Arc::as_ptr(&self.0))
    }
}

/// A value flowing through the chain
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value (missing argument, unset state, dropped call)
    #[default]
    Undefined,
    /// Plain data
    Data(serde_json::Value),
    /// Callable argument
    Callback(Callback),
    /// Composed object passed by reference
    Object(Extensible),
    /// Arbitrary host value passed by reference
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Value {
    /// JSON `null`, the conventional "no error" in `cb(err, result)`
    pub fn null() -> Self {
        Self::Data(serde_json::Value::Null)
    }

    /// Wrap an arbitrary host value
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Self::Opaque(Arc::new(value))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// `Undefined` or JSON `null`
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Data(serde_json::Value::Null))
    }

    pub fn as_data(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Data(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_data().and_then(serde_json::Value::as_i64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_data().and_then(serde_json::Value::as_f64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_data().and_then(serde_json::Value::as_bool)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_data().and_then(serde_json::Value::as_str)
    }

    pub fn as_callback(&self) -> Option<&Callback> {
        match self {
            Self::Callback(callback) => Some(callback),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Extensible> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Borrow an opaque value as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Opaque(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("Undefined"),
            Self::Data(data) => write!(f, "Data({data})"),
            Self::Callback(callback) => callback.fmt(f),
            Self::Object(object) => write!(f, "Object({})", object.id()),
            Self::Opaque(value) => write!(f, "Opaque({:p})", Arc::as_ptr(value)),
        }
    }
}

/// Data compares structurally; callbacks, objects and opaque values compare
/// by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) => true,
            (Self::Data(a), Self::Data(b)) => a == b,
            (Self::Callback(a), Self::Callback(b)) => a.ptr_eq(b),
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            (Self::Opaque(a), Self::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(data: serde_json::Value) -> Self {
        Self::Data(data)
    }
}

macro_rules! impl_from_data {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::Data(serde_json::Value::from(value))
                }
            }
        )*
    };
}

impl_from_data!(bool, i32, i64, u32, u64, f64, &str, String);

impl From<()> for Value {
    fn from((): ()) -> Self {
        Self::Undefined
    }
}

impl From<Callback> for Value {
    fn from(callback: Callback) -> Self {
        Self::Callback(callback)
    }
}

impl From<Extensible> for Value {
    fn from(object: Extensible) -> Self {
        Self::Object(object)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Undefined, Into::into)
    }
}

/// Build a `Vec<Value>` argument list
///
/// ```
/// use strata_core::{args, Value};
///
/// let list = args![2, "two", ()];
/// assert_eq!(list[0], Value::from(2));
/// assert!(list[2].is_undefined());
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($value)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_compares_structurally() {
        assert_eq!(Value::from(5), Value::from(serde_json::json!(5)));
        assert_ne!(Value::from(5), Value::from("5"));
        assert_ne!(Value::null(), Value::Undefined);
    }

    #[test]
    fn callbacks_compare_by_identity() {
        let a = Callback::new(|_| Ok(Value::Undefined));
        let b = Callback::new(|_| Ok(Value::Undefined));
        assert_eq!(Value::from(a.clone()), Value::from(a.clone()));
        assert_ne!(Value::from(a), Value::from(b));
    }

    #[test]
    fn nullish_values() {
        assert!(Value::Undefined.is_nullish());
        assert!(Value::null().is_nullish());
        assert!(!Value::from(0).is_nullish());
        assert!(Value::from(None::<i64>).is_undefined());
    }

    #[test]
    fn opaque_downcast() {
        let value = Value::opaque(vec![1u8, 2, 3]);
        assert_eq!(value.downcast_ref::<Vec<u8>>(), Some(&vec![1u8, 2, 3]));
        assert!(value.downcast_ref::<String>().is_none());
    }
}
