//! Ordered record of layer activity

use std::sync::Arc;

use parking_lot::Mutex;

/// Shared, append-only list of entries such as `"outer:m"`
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    /// Snapshot of every entry in arrival order
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// Shared list of values observed by probe layers
#[derive(Debug, Clone, Default)]
pub struct ValueLog {
    values: Arc<Mutex<Vec<strata_core::Value>>>,
}

impl ValueLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, value: strata_core::Value) {
        self.values.lock().push(value);
    }

    pub fn values(&self) -> Vec<strata_core::Value> {
        self.values.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_entries() {
        let log = CallLog::new();
        let handle = log.clone();
        handle.push("a:m");
        log.push("b:m");
        assert_eq!(log.entries(), vec!["a:m", "b:m"]);
        log.clear();
        assert!(handle.is_empty());
    }
}
