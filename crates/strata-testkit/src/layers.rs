//! Ready-made layers and objects for dispatch tests

use strata_core::{
    ArgList, DispatchConfig, Extensible, Implementation, Invocation, Metadata, Result, Value,
    STATE_KEY,
};

use crate::log::{CallLog, ValueLog};

/// Strict object with one method defined
pub fn object_with_method(name: &str, args: impl Into<ArgList>) -> Extensible {
    let object = Extensible::with_config(DispatchConfig::strict());
    object.define_method(name, args, None).unwrap();
    object
}

/// Metadata declaring `param` as the auxiliary state parameter
pub fn state_metadata(param: &str) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert(STATE_KEY.to_owned(), param.into());
    metadata
}

/// Layer that logs `"{label}:{method}"` for each listed method and forwards
/// its arguments unchanged
pub fn recording_layer(label: &str, methods: &[&str], log: &CallLog) -> Implementation {
    methods
        .iter()
        .fold(Implementation::labeled(label), |implementation, method| {
            let log = log.clone();
            let entry = format!("{label}:{method}");
            implementation.method(*method, move |call: Invocation| {
                log.push(entry.clone());
                call.next(call.args().to_vec())
            })
        })
}

/// Layer implementing nothing; dispatch must skip it
pub fn empty_layer(label: &str) -> Implementation {
    Implementation::labeled(label)
}

/// Bottom layer for `method(n1, .., nk, cb)`: calls `cb(null, n1 + .. + nk)`
/// and returns the sum
pub fn sum_layer(label: &str, method: &str) -> Implementation {
    Implementation::labeled(label).method(method, |call: Invocation| {
        let Some((callback, numbers)) = call.args().split_last() else {
            return Ok(Value::Undefined);
        };
        let sum: i64 = numbers.iter().filter_map(Value::as_i64).sum();
        if let Some(cb) = callback.as_callback() {
            cb.invoke(vec![Value::null(), Value::from(sum)])?;
        }
        Ok(Value::from(sum))
    })
}

/// Layer recording the state it observes (`Undefined` when its generation
/// declares no state slot) before forwarding
pub fn state_probe_layer(label: &str, method: &str, seen: &ValueLog) -> Implementation {
    let seen = seen.clone();
    Implementation::labeled(label).method(method, move |call: Invocation| {
        seen.push(call.state().cloned().unwrap_or_default());
        call.next(call.args().to_vec())
    })
}

/// Layer replacing the auxiliary state with `state` for everything below it
pub fn state_setting_layer(label: &str, method: &str, state: Value) -> Implementation {
    Implementation::labeled(label).method(method, move |call: Invocation| -> Result<Value> {
        call.next_with_state(call.args().to_vec(), state.clone())
    })
}
