//! The composed object
//!
//! An [`Extensible`] is a cheap, clonable handle: clones share one object.
//! Its registry and chain are each either owned or linked to the object it
//! was duplicated from (see [`crate::duplicate`]).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::chain::ChainLink;
use crate::config::DispatchConfig;
use crate::registry::RegistryLink;
use crate::value::Value;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique object identifier, used for logging and `Debug` output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ObjectId(u64);

impl ObjectId {
    fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj#{}", self.0)
    }
}

pub(crate) struct ObjectInner {
    pub(crate) id: ObjectId,
    pub(crate) registry: RwLock<RegistryLink>,
    pub(crate) chain: RwLock<ChainLink>,
    pub(crate) config: DispatchConfig,
    pub(crate) state_default: RwLock<Value>,
    pub(crate) callable: bool,
    /// Object this one delegates to (instance or delegated fork)
    pub(crate) origin: Option<Extensible>,
}

/// An object whose methods are assembled from a stack of layers
///
/// Equality is identity: two handles are equal when they refer to the same
/// object.
#[derive(Clone)]
pub struct Extensible {
    pub(crate) inner: Arc<ObjectInner>,
}

impl Extensible {
    /// Empty object (no methods, no layers) with the default configuration
    pub fn new() -> Self {
        Self::with_config(DispatchConfig::default())
    }

    /// Empty object with an explicit dispatch configuration
    pub fn with_config(config: DispatchConfig) -> Self {
        let object = Self::from_parts(
            RegistryLink::default(),
            ChainLink::default(),
            config,
            Value::Undefined,
            false,
            None,
        );
        tracing::debug!(object = %object.id(), strict = config.strict, "Created extensible object");
        object
    }

    pub(crate) fn from_parts(
        registry: RegistryLink,
        chain: ChainLink,
        config: DispatchConfig,
        state_default: Value,
        callable: bool,
        origin: Option<Extensible>,
    ) -> Self {
        Self {
            inner: Arc::new(ObjectInner {
                id: ObjectId::next(),
                registry: RwLock::new(registry),
                chain: RwLock::new(chain),
                config,
                state_default: RwLock::new(state_default),
                callable,
                origin,
            }),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.inner.id
    }

    pub fn config(&self) -> DispatchConfig {
        self.inner.config
    }

    /// Whether exhausted chains raise errors for this object
    pub fn is_strict(&self) -> bool {
        self.inner.config.strict
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Auxiliary state every top-level invocation starts with
    pub fn state_default(&self) -> Value {
        self.inner.state_default.read().clone()
    }

    /// Replace the auxiliary state default. Dispatches already running keep
    /// the value they started with.
    pub fn set_state_default(&self, state: impl Into<Value>) {
        *self.inner.state_default.write() = state.into();
    }
}

impl Default for Extensible {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Extensible {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Extensible {}

impl fmt::Debug for Extensible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensible")
            .field("id", &self.inner.id)
            .field("callable", &self.inner.callable)
            .field("layers", &self.layer_count())
            .field("origin", &self.inner.origin.as_ref().map(Extensible::id))
            .finish()
    }
}

/// Create an empty object with the default configuration
pub fn create_extensible() -> Extensible {
    Extensible::new()
}
