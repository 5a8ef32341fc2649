//! Callbacks that remember how they were invoked

use std::sync::Arc;

use parking_lot::Mutex;
use strata_core::{Callback, Value};

/// A terminal callback (`cb(err, result)`) recording every invocation
#[derive(Debug, Clone)]
pub struct CapturedCallback {
    callback: Callback,
    calls: Arc<Mutex<Vec<Vec<Value>>>>,
}

impl CapturedCallback {
    pub fn new() -> Self {
        let calls: Arc<Mutex<Vec<Vec<Value>>>> = Arc::default();
        let sink = Arc::clone(&calls);
        let callback = Callback::new(move |args| {
            sink.lock().push(args);
            Ok(Value::Undefined)
        });
        Self { callback, calls }
    }

    /// The callback to pass as an argument
    pub fn callback(&self) -> Callback {
        self.callback.clone()
    }

    /// The callback wrapped as a [`Value`]
    pub fn value(&self) -> Value {
        Value::Callback(self.callback.clone())
    }

    pub fn calls(&self) -> Vec<Vec<Value>> {
        self.calls.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Arguments of the most recent invocation
    pub fn last(&self) -> Option<Vec<Value>> {
        self.calls.lock().last().cloned()
    }

    /// `result` of the most recent `cb(err, result)` invocation
    pub fn last_result(&self) -> Option<Value> {
        self.last().and_then(|args| args.get(1).cloned())
    }
}

impl Default for CapturedCallback {
    fn default() -> Self {
        Self::new()
    }
}
