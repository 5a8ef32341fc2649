//! Method descriptors
//!
//! A descriptor is one generation of a method's calling convention: its name,
//! ordered parameter names and open metadata. Descriptors are immutable and
//! shared by `Arc`; redefining a method produces a new generation while
//! layers installed earlier keep the one they captured.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value as Json};

use crate::errors::{Result, StrataError};

/// Metadata key naming the auxiliary state parameter of a generation
pub const STATE_KEY: &str = "state";

/// Reserved method dispatched when a callable object is invoked
pub const CALL_METHOD: &str = "$call";

/// Reserved method run once on every delegated child
pub const CONSTRUCTOR_METHOD: &str = "$constructor";

/// Open metadata attached to a descriptor
pub type Metadata = Map<String, Json>;

/// Ordered parameter names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ArgList(Vec<String>);

impl ArgList {
    /// Parse a comma separated list; entries are trimmed and empties dropped.
    ///
    /// Repeated names are kept. Arguments travel by position, so each slot
    /// still receives its value, but [`ArgList::position`] only finds the
    /// first occurrence.
    pub fn parse(list: &str) -> Self {
        Self(
            list.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_owned)
                .collect(),
        )
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|candidate| candidate == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }
}

impl From<&str> for ArgList {
    fn from(list: &str) -> Self {
        Self::parse(list)
    }
}

impl From<String> for ArgList {
    fn from(list: String) -> Self {
        Self::parse(&list)
    }
}

impl From<Vec<String>> for ArgList {
    fn from(names: Vec<String>) -> Self {
        Self(
            names
                .into_iter()
                .map(|name| name.trim().to_owned())
                .filter(|name| !name.is_empty())
                .collect(),
        )
    }
}

impl From<Vec<&str>> for ArgList {
    fn from(names: Vec<&str>) -> Self {
        names.into_iter().map(str::to_owned).collect::<Vec<_>>().into()
    }
}

impl<const N: usize> From<[&str; N]> for ArgList {
    fn from(names: [&str; N]) -> Self {
        Vec::from(names).into()
    }
}

/// One generation of a method's calling convention
///
/// Serializes as the merged object produced by [`MethodDescriptor::to_json`].
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDescriptor {
    name: String,
    args: ArgList,
    generation: u64,
    metadata: Metadata,
}

impl MethodDescriptor {
    pub(crate) fn new(name: String, args: ArgList, metadata: Metadata, generation: u64) -> Self {
        Self {
            name,
            args,
            generation,
            metadata,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &ArgList {
        &self.args
    }

    /// Number of positional parameters
    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// 0 for the first definition of this name, +1 per redefinition
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Name of the auxiliary state parameter, if this generation declares one
    pub fn state_param(&self) -> Option<&str> {
        self.metadata.get(STATE_KEY).and_then(Json::as_str)
    }

    /// Parameter conventionally holding the terminal result callback
    pub fn callback_param(&self) -> Option<&str> {
        self.args.names().last().map(String::as_str)
    }

    /// Merged `{name, args, ...metadata}` object. Metadata never overrides
    /// `name` or `args`.
    pub fn to_json(&self) -> Json {
        let mut merged = self.metadata.clone();
        merged.insert("name".to_owned(), Json::from(self.name.clone()));
        merged.insert(
            "args".to_owned(),
            Json::from(self.args.names().to_vec()),
        );
        Json::Object(merged)
    }
}

impl Serialize for MethodDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Check that `name` is a legal method identifier (`[A-Za-z_$][A-Za-z0-9_$]*`)
pub fn validate_method_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let legal = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    };
    if legal {
        Ok(())
    } else {
        Err(StrataError::invalid_method_name(name))
    }
}
