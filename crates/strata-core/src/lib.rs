//! Strata Core - Layered Method Composition
//!
//! Builds objects whose methods are assembled at runtime from an ordered
//! stack of independently authored layers. Each layer can intercept,
//! transform, short-circuit or delegate to the layer beneath it.
//!
//! # Architecture
//!
//! - **Registry** (`registry`, `descriptor`): method name → current
//!   descriptor generation (parameter names + metadata)
//! - **Chain** (`chain`): singly linked stack of layers, each capturing the
//!   generation of every method it implements at install time
//! - **Dispatch** (`dispatch`): walks the chain top to bottom, skips layers
//!   without an implementation, adapts arguments between generations and
//!   threads the auxiliary state through `next`
//! - **Duplication** (`duplicate`): independent forks and delegated
//!   instances
//! - **Callables** (`callable`): objects invoked as functions via `$call`
//!
//! # Example
//!
//! ```
//! use strata_core::{args, Callback, Extensible, Implementation, Value};
//!
//! let object = Extensible::new();
//! object.define_method("add", "a, b, cb", None)?;
//! object.use_layer(Implementation::labeled("sum").method("add", |call| {
//!     let sum = call.arg(0).as_i64().unwrap_or(0) + call.arg(1).as_i64().unwrap_or(0);
//!     match call.arg(2).as_callback() {
//!         Some(cb) => cb.invoke(args![Value::null(), sum]),
//!         None => Ok(Value::Undefined),
//!     }
//! }));
//! object.use_layer(Implementation::labeled("double").method("add", |call| {
//!     let doubled = call.arg(0).as_i64().unwrap_or(0) * 2;
//!     call.next(vec![Value::from(doubled), call.arg(1).clone(), call.arg(2).clone()])
//! }));
//!
//! let done = Callback::new(|args| Ok(args[1].clone()));
//! let result = object.invoke("add", args![2, 3, done])?;
//! assert_eq!(result, Value::from(7));
//! # Ok::<(), strata_core::StrataError>(())
//! ```
//!
//! The engine is synchronous and provides no locking around layer state;
//! mutation of the registry or chain takes effect for every dispatch issued
//! after it returns.

#![allow(missing_docs)]
#![forbid(unsafe_code)]

pub mod callable;
pub mod chain;
pub mod config;
pub mod descriptor;
pub mod dispatch;
pub mod duplicate;
pub mod errors;
pub mod object;
pub mod registry;
pub mod value;

pub use chain::{Implementation, LayerRef, MethodFn};
pub use config::DispatchConfig;
pub use descriptor::{
    validate_method_name, ArgList, Metadata, MethodDescriptor, CALL_METHOD, CONSTRUCTOR_METHOD,
    STATE_KEY,
};
pub use dispatch::{EntryPoint, Invocation};
pub use duplicate::{instance_of, ForkOptions};
pub use errors::{Result, StrataError};
pub use object::{create_extensible, Extensible, ObjectId};
pub use value::{Callback, Value};
