//! Dispatch through the layer chain
//!
//! An invocation walks top to bottom, skipping layers that do not implement
//! the method, and calls the first one that does with an [`Invocation`]. The
//! invocation's `next` continues the walk below that layer. Arguments are
//! sliced once per hop to the arity of the generation the callee captured
//! at install time.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::chain::{LayerNode, LayerRef};
use crate::descriptor::MethodDescriptor;
use crate::errors::{Result, StrataError};
use crate::object::Extensible;
use crate::value::Value;

static UNDEFINED: Value = Value::Undefined;

/// What one layer sees when its method body runs
pub struct Invocation {
    method: Arc<str>,
    receiver: Extensible,
    self_object: Option<Extensible>,
    args: Vec<Value>,
    state: Value,
    layer: LayerRef,
}

impl Invocation {
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Positional arguments, shaped by this layer's captured generation
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Argument at `index`, `Undefined` when out of range
    pub fn arg(&self, index: usize) -> &Value {
        self.args.get(index).unwrap_or(&UNDEFINED)
    }

    /// Argument by parameter name in this layer's generation. A repeated
    /// name resolves to its first slot.
    pub fn named(&self, name: &str) -> &Value {
        self.generation()
            .and_then(|generation| generation.args().position(name))
            .map_or(&UNDEFINED, |index| self.arg(index))
    }

    pub fn into_args(self) -> Vec<Value> {
        self.args
    }

    /// The object the method was invoked on
    pub fn receiver(&self) -> &Extensible {
        &self.receiver
    }

    /// The invoked object when dispatched through [`Extensible::call`]
    pub fn self_object(&self) -> Option<&Extensible> {
        self.self_object.as_ref()
    }

    /// Auxiliary state, present only when this layer's generation declares a
    /// state parameter
    pub fn state(&self) -> Option<&Value> {
        self.generation()
            .filter(|generation| generation.state_param().is_some())
            .map(|_| &self.state)
    }

    /// Handle to the executing layer (implementation + layer beneath)
    pub fn layer(&self) -> &LayerRef {
        &self.layer
    }

    /// Generation this layer captured for the method
    pub fn generation(&self) -> Option<&Arc<MethodDescriptor>> {
        self.layer.generation(&self.method)
    }

    /// Continue the walk below this layer, forwarding the current state.
    ///
    /// `args` follow this layer's generation; they are adapted to the
    /// generation of the next implementing layer.
    pub fn next(&self, args: Vec<Value>) -> Result<Value> {
        self.next_with_state(args, self.state.clone())
    }

    /// Continue the walk with a replacement auxiliary state
    pub fn next_with_state(&self, args: Vec<Value>, state: impl Into<Value>) -> Result<Value> {
        let walk = Walk {
            method: Arc::clone(&self.method),
            receiver: self.receiver.clone(),
            self_object: self.self_object.clone(),
            state: state.into(),
        };
        walk.run(self.layer.0.next.clone(), self.generation().cloned(), args)
    }
}

/// One dispatch in flight
pub(crate) struct Walk {
    pub(crate) method: Arc<str>,
    pub(crate) receiver: Extensible,
    pub(crate) self_object: Option<Extensible>,
    pub(crate) state: Value,
}

impl Walk {
    /// Call the first layer at or below `start` implementing the method
    pub(crate) fn run(
        self,
        start: Option<Arc<LayerNode>>,
        from: Option<Arc<MethodDescriptor>>,
        args: Vec<Value>,
    ) -> Result<Value> {
        let trace_walk = self.receiver.config().trace_walk;
        let Some(node) = find_implementing(start, &self.method, |skipped| {
            if trace_walk {
                trace!(
                    object = %self.receiver.id(),
                    method = %self.method,
                    depth = skipped.depth,
                    "Skipping layer without implementation"
                );
            }
        }) else {
            return self.exhausted();
        };

        let Some(body) = node.implementation.get(&self.method).cloned() else {
            return self.exhausted();
        };
        let to = node.generation(&self.method).cloned();
        let args = adapt_args(args, from.as_ref(), to.as_ref());
        if trace_walk {
            trace!(
                object = %self.receiver.id(),
                method = %self.method,
                depth = node.depth,
                generation = ?to.as_ref().map(|generation| generation.generation()),
                "Dispatching to layer"
            );
        }

        body(Invocation {
            method: self.method,
            receiver: self.receiver,
            self_object: self.self_object,
            args,
            state: self.state,
            layer: LayerRef(node),
        })
    }

    fn exhausted(self) -> Result<Value> {
        if self.receiver.is_strict() {
            return Err(StrataError::method_not_implemented(&*self.method));
        }
        debug!(
            object = %self.receiver.id(),
            method = %self.method,
            "Chain exhausted; dropping call"
        );
        Ok(Value::Undefined)
    }
}

pub(crate) fn find_implementing(
    start: Option<Arc<LayerNode>>,
    method: &str,
    mut on_skip: impl FnMut(&LayerNode),
) -> Option<Arc<LayerNode>> {
    let mut cursor = start;
    while let Some(node) = cursor {
        if node.implementation.defines(method) {
            return Some(node);
        }
        on_skip(&node);
        cursor = node.next.clone();
    }
    None
}

/// Reshape `values` from generation `from` to generation `to`.
///
/// Only the leading `to.arity()` values are forwarded, padded with
/// `Undefined` when short. Folding a dropped or reordered parameter is the
/// calling layer's job. An unknown `to` passes values through unchanged.
pub(crate) fn adapt_args(
    values: Vec<Value>,
    from: Option<&Arc<MethodDescriptor>>,
    to: Option<&Arc<MethodDescriptor>>,
) -> Vec<Value> {
    let Some(to) = to else {
        return values;
    };
    if from.is_some_and(|from| !Arc::ptr_eq(from, to)) {
        trace!(
            method = to.name(),
            from = ?from.map(|from| from.generation()),
            to = to.generation(),
            "Slicing arguments across generations"
        );
    }
    fit_arity(values, to.arity())
}

fn fit_arity(mut values: Vec<Value>, arity: usize) -> Vec<Value> {
    values.resize(arity, Value::Undefined);
    values
}

/// Bound entry point for one method of one object
#[derive(Debug, Clone)]
pub struct EntryPoint {
    object: Extensible,
    method: Arc<str>,
}

impl EntryPoint {
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn object(&self) -> &Extensible {
        &self.object
    }

    /// Current descriptor (the entry point's calling convention)
    pub fn descriptor(&self) -> Option<Arc<MethodDescriptor>> {
        self.object.method_descriptor(&self.method)
    }

    pub fn call(&self, args: Vec<Value>) -> Result<Value> {
        self.object.invoke(&self.method, args)
    }

    pub fn call_with_state(&self, args: Vec<Value>, state: impl Into<Value>) -> Result<Value> {
        self.object.invoke_with_state(&self.method, args, state)
    }
}

impl Extensible {
    /// Invoke `method` with the object's default auxiliary state.
    ///
    /// `args` follow the current descriptor and are truncated or padded to
    /// its arity.
    pub fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        self.invoke_with_state(method, args, self.state_default())
    }

    /// Invoke `method` seeding the auxiliary state for this call only
    pub fn invoke_with_state(
        &self,
        method: &str,
        args: Vec<Value>,
        state: impl Into<Value>,
    ) -> Result<Value> {
        let descriptor = self
            .method_descriptor(method)
            .ok_or_else(|| StrataError::undefined_method(method))?;
        self.dispatch(method, Some(descriptor), args, state.into(), None)
    }

    /// Bound entry point for `method`
    pub fn entry_point(&self, method: &str) -> Result<EntryPoint> {
        if !self.has_method(method) {
            return Err(StrataError::undefined_method(method));
        }
        Ok(EntryPoint {
            object: self.clone(),
            method: Arc::from(method),
        })
    }

    pub(crate) fn dispatch(
        &self,
        method: &str,
        current: Option<Arc<MethodDescriptor>>,
        args: Vec<Value>,
        state: Value,
        self_object: Option<Extensible>,
    ) -> Result<Value> {
        let Some(top) = self.top_node() else {
            if self.is_strict() {
                return Err(StrataError::no_layers(method));
            }
            debug!(object = %self.id(), method, "No layers installed; dropping call");
            return Ok(Value::Undefined);
        };

        let args = match &current {
            Some(descriptor) => fit_arity(args, descriptor.arity()),
            None => args,
        };
        let walk = Walk {
            method: Arc::from(method),
            receiver: self.clone(),
            self_object,
            state,
        };
        walk.run(Some(top), current, args)
    }
}

impl LayerRef {
    /// Start a walk at this layer, bypassing the layers above it.
    ///
    /// `args` follow the receiver's current descriptor for `method`.
    pub fn invoke(&self, receiver: &Extensible, method: &str, args: Vec<Value>) -> Result<Value> {
        let current = receiver.method_descriptor(method);
        let args = match &current {
            Some(descriptor) => fit_arity(args, descriptor.arity()),
            None => args,
        };
        let walk = Walk {
            method: Arc::from(method),
            receiver: receiver.clone(),
            self_object: None,
            state: receiver.state_default(),
        };
        walk.run(Some(Arc::clone(&self.0)), current, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Metadata;

    fn descriptor(args: &str) -> Arc<MethodDescriptor> {
        Arc::new(MethodDescriptor::new("m".into(), args.into(), Metadata::new(), 0))
    }

    #[test]
    fn same_generation_fits_arity() {
        let generation = descriptor("a, b");
        let adapted = adapt_args(
            vec![Value::from(1)],
            Some(&generation),
            Some(&generation),
        );
        assert_eq!(adapted, vec![Value::from(1), Value::Undefined]);

        let adapted = adapt_args(
            vec![Value::from(1), Value::from(2), Value::from(3)],
            Some(&generation),
            Some(&generation),
        );
        assert_eq!(adapted, vec![Value::from(1), Value::from(2)]);
    }

    #[test]
    fn newer_generation_forwards_leading_arguments() {
        let newer = descriptor("a, b, cb");
        let older = descriptor("a, cb");
        let adapted = adapt_args(
            vec![Value::from(1), Value::from(2), Value::from("cb")],
            Some(&newer),
            Some(&older),
        );
        assert_eq!(adapted, vec![Value::from(1), Value::from(2)]);
    }

    #[test]
    fn renamed_parameter_keeps_position() {
        let newer = descriptor("input, cb");
        let older = descriptor("a, cb");
        let adapted = adapt_args(
            vec![Value::from(9), Value::from("cb")],
            Some(&newer),
            Some(&older),
        );
        assert_eq!(adapted, vec![Value::from(9), Value::from("cb")]);
    }

    #[test]
    fn added_parameter_pads_with_undefined() {
        let older = descriptor("a, cb");
        let newer = descriptor("a, b, cb");
        let adapted = adapt_args(
            vec![Value::from(1), Value::from("cb")],
            Some(&older),
            Some(&newer),
        );
        assert_eq!(
            adapted,
            vec![Value::from(1), Value::from("cb"), Value::Undefined]
        );
    }

    #[test]
    fn unknown_generation_is_positional() {
        let known = descriptor("a");
        let values = vec![Value::from(1), Value::from(2)];
        assert_eq!(adapt_args(values.clone(), None, None), values);
        assert_eq!(adapt_args(values, None, Some(&known)), vec![Value::from(1)]);
    }
}
