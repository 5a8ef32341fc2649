//! Callable objects
//!
//! A callable object is invoked as a function through the reserved `$call`
//! method. Every `$call` layer receives the invoked object in its self slot
//! ([`Invocation::self_object`](crate::Invocation::self_object)).

use tracing::debug;

use crate::descriptor::CALL_METHOD;
use crate::dispatch::find_implementing;
use crate::errors::{Result, StrataError};
use crate::object::Extensible;
use crate::value::{Callback, Value};

impl Extensible {
    pub fn is_callable(&self) -> bool {
        self.inner.callable
    }

    /// Invoke the object as a function
    pub fn call(&self, args: Vec<Value>) -> Result<Value> {
        self.call_with_state(args, self.state_default())
    }

    /// Invoke the object as a function with an explicit auxiliary state.
    ///
    /// Fails with `CallNotSupported` in strict and lenient mode alike when
    /// the object is not callable or no layer implements `$call`.
    pub fn call_with_state(&self, args: Vec<Value>, state: impl Into<Value>) -> Result<Value> {
        if !self.is_callable() {
            return Err(StrataError::call_not_supported(format!(
                "{} is not callable",
                self.id()
            )));
        }
        if find_implementing(self.top_node(), CALL_METHOD, |_| {}).is_none() {
            debug!(object = %self.id(), "Call without a $call implementation");
            return Err(StrataError::call_not_supported(format!(
                "no layer of {} implements {CALL_METHOD}",
                self.id()
            )));
        }

        let current = self.method_descriptor(CALL_METHOD);
        self.dispatch(CALL_METHOD, current, args, state.into(), Some(self.clone()))
    }

    /// Callback invoking this object, for passing it where a function is
    /// expected
    pub fn to_callback(&self) -> Callback {
        let object = self.clone();
        Callback::new(move |args| object.call(args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use crate::chain::Implementation;
    use crate::config::DispatchConfig;
    use crate::duplicate::ForkOptions;

    #[test]
    fn plain_objects_are_not_callable() {
        let object = Extensible::new();
        let err = object.call(Vec::new()).unwrap_err();
        assert_matches!(err, StrataError::CallNotSupported { .. });
    }

    #[test]
    fn missing_call_fails_even_when_lenient() {
        let object = Extensible::with_config(DispatchConfig::lenient()).fork_callable();
        object.use_layer(Implementation::new().method("other", |_| Ok(Value::Undefined)));
        let err = object.call(Vec::new()).unwrap_err();
        assert_matches!(err, StrataError::CallNotSupported { .. });
    }

    #[test]
    fn self_slot_is_the_invoked_object() {
        let base = Extensible::new();
        base.define_method(CALL_METHOD, "x", None).unwrap();
        base.use_layer(Implementation::new().method(CALL_METHOD, |call| {
            let me = call.self_object().cloned().map(Value::from);
            Ok(me.unwrap_or_default())
        }));

        let callable = base.fork(ForkOptions::callable());
        let result = callable.call(Vec::new()).unwrap();
        assert_eq!(result.as_object(), Some(&callable));
    }

    #[test]
    fn callback_form_dispatches_call() {
        let callable = Extensible::new().fork_callable();
        callable.use_layer(Implementation::new().method(CALL_METHOD, |call| {
            Ok(Value::from(call.arg(0).as_i64().unwrap_or(0) * 10))
        }));
        let callback = callable.to_callback();
        assert_eq!(callback.invoke(vec![Value::from(4)]).unwrap(), Value::from(40));
    }
}
