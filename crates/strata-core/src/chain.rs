//! Layer chain
//!
//! A singly linked stack of layer nodes, top = most recently installed. Each
//! node wraps one shared [`Implementation`] and snapshots, for every method
//! the implementation defines, the descriptor generation current at install
//! time.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::descriptor::MethodDescriptor;
use crate::dispatch::Invocation;
use crate::errors::Result;
use crate::object::Extensible;
use crate::value::Value;

/// A method body inside a layer
pub type MethodFn = Arc<dyn Fn(Invocation) -> Result<Value> + Send + Sync>;

/// The methods one layer contributes
///
/// Implementations are shared by reference between every chain position
/// that installs them (forks included). State captured by the closures is
/// therefore shared as well.
#[derive(Default)]
pub struct Implementation {
    label: Option<String>,
    methods: HashMap<String, MethodFn>,
}

impl Implementation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Implementation with a label used in logs and `Debug` output
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            methods: HashMap::new(),
        }
    }

    /// Builder form of [`Implementation::insert`]
    pub fn method<F>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Invocation) -> Result<Value> + Send + Sync + 'static,
    {
        self.insert(name, body);
        self
    }

    /// Add or replace the body for `name`
    pub fn insert<F>(&mut self, name: impl Into<String>, body: F)
    where
        F: Fn(Invocation) -> Result<Value> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(body));
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn defines(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&MethodFn> {
        self.methods.get(name)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.method_names().collect();
        names.sort_unstable();
        f.debug_struct("Implementation")
            .field("label", &self.label)
            .field("methods", &names)
            .finish()
    }
}

pub(crate) struct LayerNode {
    pub(crate) implementation: Arc<Implementation>,
    /// Generation captured per implemented method; `None` when the name was
    /// not registered at install time
    pub(crate) generations: HashMap<String, Option<Arc<MethodDescriptor>>>,
    pub(crate) next: Option<Arc<LayerNode>>,
    /// Position from the bottom (0 = first installed)
    pub(crate) depth: usize,
}

impl LayerNode {
    pub(crate) fn generation(&self, method: &str) -> Option<&Arc<MethodDescriptor>> {
        self.generations.get(method).and_then(Option::as_ref)
    }

    /// This node followed by every node below it
    pub(crate) fn iter(self: &Arc<Self>) -> impl Iterator<Item = Arc<LayerNode>> {
        std::iter::successors(Some(Arc::clone(self)), |node| node.next.clone())
    }
}

/// Handle to one installed layer
///
/// Exposes the layer's implementation and the layer beneath it, so a layer
/// can bypass the pipeline and address a specific position directly.
#[derive(Clone)]
pub struct LayerRef(pub(crate) Arc<LayerNode>);

impl LayerRef {
    pub fn implementation(&self) -> &Arc<Implementation> {
        &self.0.implementation
    }

    /// Layer installed immediately before this one
    pub fn next(&self) -> Option<LayerRef> {
        self.0.next.clone().map(LayerRef)
    }

    /// Position from the bottom of the chain (0 = first installed)
    pub fn depth(&self) -> usize {
        self.0.depth
    }

    pub fn label(&self) -> Option<&str> {
        self.0.implementation.label()
    }

    pub fn implements(&self, method: &str) -> bool {
        self.0.implementation.defines(method)
    }

    /// Descriptor generation this layer captured for `method`
    pub fn generation(&self, method: &str) -> Option<&Arc<MethodDescriptor>> {
        self.0.generation(method)
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for LayerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerRef")
            .field("depth", &self.0.depth)
            .field("implementation", &self.0.implementation)
            .finish()
    }
}

/// Where an object's top layer comes from
#[derive(Debug)]
pub(crate) enum ChainLink {
    Own(Option<Arc<LayerNode>>),
    /// Read-through to the parent's top until a layer is installed locally
    Inherited(Extensible),
}

impl Default for ChainLink {
    fn default() -> Self {
        Self::Own(None)
    }
}

impl fmt::Debug for LayerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerNode")
            .field("depth", &self.depth)
            .field("implementation", &self.implementation)
            .finish_non_exhaustive()
    }
}

/// Copy the chain with new node identities; implementations and captured
/// generations are shared with the source.
pub(crate) fn rebuild_chain(top: Option<&Arc<LayerNode>>) -> Option<Arc<LayerNode>> {
    let nodes: Vec<Arc<LayerNode>> = top.map(|top| top.iter().collect()).unwrap_or_default();
    nodes.iter().rev().fold(None, |next, node| {
        Some(Arc::new(LayerNode {
            implementation: Arc::clone(&node.implementation),
            generations: node.generations.clone(),
            next,
            depth: node.depth,
        }))
    })
}

impl Extensible {
    /// Install `implementation` as the new top layer.
    ///
    /// Every method the implementation defines captures the registry's
    /// current descriptor. Nothing is re-dispatched; the next invocation
    /// starts at the new top.
    pub fn use_layer(&self, implementation: impl Into<Arc<Implementation>>) -> LayerRef {
        let implementation = implementation.into();
        let generations: HashMap<String, Option<Arc<MethodDescriptor>>> = implementation
            .method_names()
            .map(|name| (name.to_owned(), self.method_descriptor(name)))
            .collect();

        let mut link = self.inner.chain.write();
        let next = match &*link {
            ChainLink::Own(top) => top.clone(),
            ChainLink::Inherited(parent) => parent.top_node(),
        };
        let depth = next.as_ref().map_or(0, |node| node.depth + 1);
        let node = Arc::new(LayerNode {
            implementation,
            generations,
            next,
            depth,
        });
        *link = ChainLink::Own(Some(Arc::clone(&node)));
        drop(link);

        debug!(
            object = %self.id(),
            depth,
            label = node.implementation.label().unwrap_or("<anonymous>"),
            methods = node.generations.len(),
            "Installed layer"
        );
        LayerRef(node)
    }

    /// Run `factory` against this object and install what it returns.
    ///
    /// The factory runs synchronously before the install, so it may define
    /// new methods that its own implementation then captures. A factory error
    /// leaves the chain untouched.
    pub fn use_factory<F>(&self, factory: F, options: impl Into<Value>) -> Result<LayerRef>
    where
        F: FnOnce(&Extensible, Value) -> Result<Implementation>,
    {
        let implementation = factory(self, options.into())?;
        Ok(self.use_layer(implementation))
    }

    /// Visit every layer bottom-to-top (first installed first)
    pub fn each_layer<F>(&self, mut visitor: F)
    where
        F: FnMut(&LayerRef),
    {
        for layer in self.layers() {
            visitor(&layer);
        }
    }

    /// Every layer, bottom-to-top
    pub fn layers(&self) -> Vec<LayerRef> {
        let mut layers: Vec<LayerRef> = self
            .top_node()
            .map(|top| top.iter().map(LayerRef).collect())
            .unwrap_or_default();
        layers.reverse();
        layers
    }

    pub fn top_layer(&self) -> Option<LayerRef> {
        self.top_node().map(LayerRef)
    }

    pub fn layer_count(&self) -> usize {
        self.top_node().map_or(0, |top| top.depth + 1)
    }

    pub(crate) fn top_node(&self) -> Option<Arc<LayerNode>> {
        let parent = match &*self.inner.chain.read() {
            ChainLink::Own(top) => return top.clone(),
            ChainLink::Inherited(parent) => parent.clone(),
        };
        parent.top_node()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use crate::errors::StrataError;

    fn noop() -> impl Fn(Invocation) -> Result<Value> + Send + Sync + 'static {
        |_| Ok(Value::Undefined)
    }

    #[test]
    fn layers_visit_bottom_to_top() {
        let object = Extensible::new();
        object.use_layer(Implementation::labeled("l0"));
        object.use_layer(Implementation::labeled("l1"));
        object.use_layer(Implementation::labeled("l2"));

        let mut labels = Vec::new();
        object.each_layer(|layer| labels.push(layer.label().map(str::to_owned)));
        assert_eq!(
            labels,
            vec![Some("l0".into()), Some("l1".into()), Some("l2".into())]
        );
        assert_eq!(object.layer_count(), 3);
        assert_eq!(object.top_layer().map(|layer| layer.depth()), Some(2));
    }

    #[test]
    fn install_captures_current_generation() {
        let object = Extensible::new();
        object.define_method("m", "a, cb", None).unwrap();
        let old = object.use_layer(Implementation::new().method("m", noop()));
        object.define_method("m", "a, b, cb", None).unwrap();
        let new = object.use_layer(Implementation::new().method("m", noop()));

        assert_eq!(old.generation("m").map(|d| d.arity()), Some(2));
        assert_eq!(new.generation("m").map(|d| d.arity()), Some(3));
        assert!(old.generation("other").is_none());
    }

    #[test]
    fn unregistered_methods_capture_nothing() {
        let object = Extensible::new();
        let layer = object.use_layer(Implementation::new().method("later", noop()));
        assert!(layer.implements("later"));
        assert!(layer.generation("later").is_none());
    }

    #[test]
    fn factory_may_define_methods_first() {
        let object = Extensible::new();
        let layer = object
            .use_factory(
                |target, options| {
                    let args = options.as_str().unwrap_or_default().to_owned();
                    target.define_method("fresh", args.as_str(), None)?;
                    Ok(Implementation::new().method("fresh", noop()))
                },
                "x, cb",
            )
            .unwrap();

        assert_eq!(layer.generation("fresh").map(|d| d.arity()), Some(2));
        assert!(object.has_method("fresh"));
    }

    #[test]
    fn failing_factory_leaves_chain_untouched() {
        let object = Extensible::new();
        let result = object.use_factory(|_, _| Err(StrataError::factory("no backend")), ());
        assert_matches!(result, Err(StrataError::Factory { .. }));
        assert_eq!(object.layer_count(), 0);
    }

    #[test]
    fn rebuilt_chain_shares_implementations() {
        let object = Extensible::new();
        object.use_layer(Implementation::labeled("bottom"));
        object.use_layer(Implementation::labeled("top"));
        let top = object.top_node();

        let copy = rebuild_chain(top.as_ref()).unwrap();
        let original = top.unwrap();
        assert!(!Arc::ptr_eq(&copy, &original));
        assert!(Arc::ptr_eq(&copy.implementation, &original.implementation));
        let copied: Vec<usize> = copy.iter().map(|node| node.depth).collect();
        assert_eq!(copied, vec![1, 0]);
    }
}
