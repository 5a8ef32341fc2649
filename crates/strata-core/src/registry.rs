//! Method registry
//!
//! Maps each method name to its *current* descriptor generation. An object
//! either owns its table or links to the table of the object it was
//! duplicated from:
//!
//! - `Own`: independent table (root objects, independent forks)
//! - `CopyOnWrite`: reads through to the parent until the first definition,
//!   which replaces the link with an owned shallow copy (delegated forks)
//! - `Shared`: reads and writes go to the parent's table, so definitions are
//!   visible to the parent and every other delegate (instances)

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::descriptor::{validate_method_name, ArgList, Metadata, MethodDescriptor};
use crate::errors::Result;
use crate::object::Extensible;

/// Owned name → descriptor table
#[derive(Debug, Clone, Default)]
pub(crate) struct MethodTable {
    methods: HashMap<String, Arc<MethodDescriptor>>,
}

impl MethodTable {
    pub(crate) fn get(&self, name: &str) -> Option<Arc<MethodDescriptor>> {
        self.methods.get(name).cloned()
    }

    /// Store a new generation for `name`, replacing the current one
    pub(crate) fn define(
        &mut self,
        name: &str,
        args: ArgList,
        metadata: Metadata,
    ) -> Arc<MethodDescriptor> {
        let generation = self
            .methods
            .get(name)
            .map_or(0, |previous| previous.generation() + 1);
        let descriptor = Arc::new(MethodDescriptor::new(
            name.to_owned(),
            args,
            metadata,
            generation,
        ));
        self.methods.insert(name.to_owned(), Arc::clone(&descriptor));
        descriptor
    }

    pub(crate) fn descriptors(&self) -> impl Iterator<Item = &Arc<MethodDescriptor>> {
        self.methods.values()
    }

    pub(crate) fn len(&self) -> usize {
        self.methods.len()
    }
}

#[derive(Debug)]
pub(crate) enum RegistryLink {
    Own(MethodTable),
    CopyOnWrite(Extensible),
    Shared(Extensible),
}

impl Default for RegistryLink {
    fn default() -> Self {
        Self::Own(MethodTable::default())
    }
}

impl Extensible {
    /// Declare (or redeclare) a method.
    ///
    /// `args` is a comma separated list or any list of parameter names.
    /// Redefinition is not an error: it creates a new generation that only
    /// layers installed afterwards capture. `metadata` is merged into the
    /// descriptor; the reserved key `"state"` names the auxiliary state
    /// parameter.
    pub fn define_method(
        &self,
        name: &str,
        args: impl Into<ArgList>,
        metadata: Option<Metadata>,
    ) -> Result<Arc<MethodDescriptor>> {
        validate_method_name(name)?;
        let args = args.into();
        let metadata = metadata.unwrap_or_default();

        let mut link = self.inner.registry.write();
        let descriptor = match &mut *link {
            RegistryLink::Own(table) => table.define(name, args, metadata),
            RegistryLink::Shared(parent) => {
                let parent = parent.clone();
                drop(link);
                return parent.define_method(name, args, Some(metadata));
            }
            RegistryLink::CopyOnWrite(parent) => {
                let mut table = parent.snapshot_table();
                debug!(
                    object = %self.id(),
                    parent = %parent.id(),
                    methods = table.len(),
                    "Materialized inherited registry"
                );
                let descriptor = table.define(name, args, metadata);
                *link = RegistryLink::Own(table);
                descriptor
            }
        };

        debug!(
            object = %self.id(),
            method = name,
            generation = descriptor.generation(),
            args = ?descriptor.args().names(),
            "Defined method"
        );
        Ok(descriptor)
    }

    /// Current descriptor generation for `name`
    pub fn method_descriptor(&self, name: &str) -> Option<Arc<MethodDescriptor>> {
        let parent = match &*self.inner.registry.read() {
            RegistryLink::Own(table) => return table.get(name),
            RegistryLink::CopyOnWrite(parent) | RegistryLink::Shared(parent) => parent.clone(),
        };
        parent.method_descriptor(name)
    }

    /// Whether `name` is currently defined
    pub fn has_method(&self, name: &str) -> bool {
        self.method_descriptor(name).is_some()
    }

    /// Visit every current descriptor. Iteration order is unspecified.
    pub fn each_method_descriptor<F>(&self, mut visitor: F)
    where
        F: FnMut(&MethodDescriptor),
    {
        let table = self.snapshot_table();
        for descriptor in table.descriptors() {
            visitor(descriptor);
        }
    }

    /// Names of every currently defined method, sorted
    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .snapshot_table()
            .descriptors()
            .map(|descriptor| descriptor.name().to_owned())
            .collect();
        names.sort();
        names
    }

    /// Shallow copy of the effective table (same descriptor values)
    pub(crate) fn snapshot_table(&self) -> MethodTable {
        let parent = match &*self.inner.registry.read() {
            RegistryLink::Own(table) => return table.clone(),
            RegistryLink::CopyOnWrite(parent) | RegistryLink::Shared(parent) => parent.clone(),
        };
        parent.snapshot_table()
    }
}
