//! Duplication policies
//!
//! - fork: independent copy of registry and chain (new layer nodes, shared
//!   implementations). With `delegate`, the fork instead reads through to
//!   its origin and copies the registry on first definition.
//! - instance: delegated child. Definitions write through to the shared
//!   registry; installing a layer gives the child its own chain top.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chain::{rebuild_chain, ChainLink};
use crate::descriptor::CONSTRUCTOR_METHOD;
use crate::errors::Result;
use crate::object::Extensible;
use crate::registry::RegistryLink;
use crate::value::Value;

/// Options for [`Extensible::fork`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkOptions {
    /// Produce an object invocable through [`Extensible::call`]
    pub callable: bool,
    /// Read through to the origin instead of copying
    pub delegate: bool,
}

impl ForkOptions {
    pub fn callable() -> Self {
        Self {
            callable: true,
            ..Self::default()
        }
    }

    pub fn delegated() -> Self {
        Self {
            delegate: true,
            ..Self::default()
        }
    }

    pub fn with_callable(mut self, callable: bool) -> Self {
        self.callable = callable;
        self
    }
}

impl Extensible {
    /// Duplicate this object according to `options`
    pub fn fork(&self, options: ForkOptions) -> Extensible {
        let (registry, chain, origin) = if options.delegate {
            (
                RegistryLink::CopyOnWrite(self.clone()),
                ChainLink::Inherited(self.clone()),
                Some(self.clone()),
            )
        } else {
            (
                RegistryLink::Own(self.snapshot_table()),
                ChainLink::Own(rebuild_chain(self.top_node().as_ref())),
                None,
            )
        };

        let fork = Extensible::from_parts(
            registry,
            chain,
            self.config(),
            self.state_default(),
            options.callable,
            origin,
        );
        debug!(
            origin = %self.id(),
            fork = %fork.id(),
            callable = options.callable,
            delegate = options.delegate,
            "Forked object"
        );
        fork
    }

    /// Independent callable duplicate
    pub fn fork_callable(&self) -> Extensible {
        self.fork(ForkOptions::callable())
    }

    /// Delegated child. Runs `$constructor` with `args` when the registry
    /// defines it; its failure is returned instead of the child.
    ///
    /// The child keeps this object's callability.
    pub fn instance(&self, args: Vec<Value>) -> Result<Extensible> {
        let child = Extensible::from_parts(
            RegistryLink::Shared(self.clone()),
            ChainLink::Inherited(self.clone()),
            self.config(),
            self.state_default(),
            self.is_callable(),
            Some(self.clone()),
        );
        debug!(parent = %self.id(), instance = %child.id(), "Created instance");

        if child.has_method(CONSTRUCTOR_METHOD) {
            child.invoke(CONSTRUCTOR_METHOD, args)?;
        }
        Ok(child)
    }

    /// Object this one delegates to, if any
    pub fn origin(&self) -> Option<&Extensible> {
        self.inner.origin.as_ref()
    }

    /// True if `self` is `origin` or was derived from it through any number
    /// of instances or delegated forks
    pub fn is_instance_of(&self, origin: &Extensible) -> bool {
        std::iter::successors(Some(self), |object| object.origin()).any(|object| object == origin)
    }
}

/// Free-function form of [`Extensible::is_instance_of`]
pub fn instance_of(candidate: &Extensible, origin: &Extensible) -> bool {
    candidate.is_instance_of(origin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn independent_fork_is_not_an_instance() {
        let object = Extensible::new();
        let fork = object.fork(ForkOptions::default());
        assert!(!fork.is_instance_of(&object));
        assert!(fork.origin().is_none());
        assert!(instance_of(&object, &object));
    }

    #[test]
    fn lineage_is_transitive() {
        let root = Extensible::new();
        let child = root.instance(Vec::new()).unwrap();
        let grandchild = child.fork(ForkOptions::delegated());
        assert!(instance_of(&grandchild, &root));
        assert!(instance_of(&grandchild, &child));
        assert!(!instance_of(&root, &child));
    }

    #[test]
    fn delegated_fork_materializes_registry_on_write() {
        let parent = Extensible::new();
        parent.define_method("shared", "a", None).unwrap();
        let fork = parent.fork(ForkOptions::delegated());

        parent.define_method("late", "", None).unwrap();
        assert!(fork.has_method("late"), "reads through before first write");

        fork.define_method("own", "", None).unwrap();
        parent.define_method("later", "", None).unwrap();
        assert!(fork.has_method("own"));
        assert!(!parent.has_method("own"));
        assert!(!fork.has_method("later"), "owned copy after first write");
    }

    #[test]
    fn instance_definitions_write_through() {
        let parent = Extensible::new();
        let child = parent.instance(Vec::new()).unwrap();
        child.define_method("added", "x", None).unwrap();
        assert!(parent.has_method("added"));
    }
}
