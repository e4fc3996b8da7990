// Graph mutation interface.
//
// The topology store itself lives in the monitoring platform; this module
// defines the mutation surface the core produces intents against, the URN
// identity scheme that deduplicates nodes across discovery passes, and an
// in-memory implementation for tests and embedders.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable node/edge identity: `urn:<domain>:<type>:<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Urn(String);

impl Urn {
    /// Component identity: `urn:<domain>:<type>:<name>`.
    pub fn component(domain: &str, kind: &str, name: &str) -> Self {
        Self(format!("urn:{domain}:{kind}:{name}"))
    }

    /// Path-qualified identity: `urn:<module>:<category>:/<path>`.
    pub fn object_path(module: &str, category: &str, path: &str) -> Self {
        Self(format!(
            "urn:{module}:{category}:/{}",
            path.trim_start_matches('/')
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A graph node: typed, named, with free-form labels and properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub urn: Urn,
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub labels: BTreeSet<String>,
    #[serde(default)]
    pub properties: serde_json::Map<String, Value>,
}

impl Component {
    pub fn new(urn: Urn, kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            urn,
            kind: kind.into(),
            name: name.into(),
            labels: BTreeSet::new(),
            properties: serde_json::Map::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.insert(label.into());
        self
    }
}

/// Mutation surface of the external topology store.
///
/// Implementations must make `add_component`/`add_relation` idempotent by
/// URN (no-op on exists, never a duplicate, never an error): the provided
/// `ensure_*` methods fold the check-then-create pattern into one call,
/// but a concurrent embedder can still race two resolvers past the
/// existence check.
pub trait TopologyGraph {
    fn component_exists(&self, urn: &Urn) -> bool;
    fn add_component(&mut self, component: Component);
    fn get_component_mut(&mut self, urn: &Urn) -> Option<&mut Component>;
    fn relation_exists(&self, source: &Urn, target: &Urn) -> bool;
    fn add_relation(&mut self, source: &Urn, target: &Urn);

    /// Assert a component, creating it only when absent.
    /// Returns `true` if a node was created.
    fn ensure_component(&mut self, component: Component) -> bool {
        if self.component_exists(&component.urn) {
            return false;
        }
        self.add_component(component);
        true
    }

    /// Assert a directed relation, creating it only when absent.
    /// Returns `true` if an edge was created.
    fn ensure_relation(&mut self, source: &Urn, target: &Urn) -> bool {
        if self.relation_exists(source, target) {
            return false;
        }
        self.add_relation(source, target);
        true
    }
}

/// Insertion-ordered in-memory `TopologyGraph`.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    components: Vec<Component>,
    index: HashMap<Urn, usize>,
    relations: Vec<(Urn, Urn)>,
    relation_set: HashSet<(Urn, Urn)>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn relations(&self) -> &[(Urn, Urn)] {
        &self.relations
    }

    pub fn get_component(&self, urn: &Urn) -> Option<&Component> {
        self.index.get(urn).map(|&i| &self.components[i])
    }
}

impl TopologyGraph for MemoryGraph {
    fn component_exists(&self, urn: &Urn) -> bool {
        self.index.contains_key(urn)
    }

    fn add_component(&mut self, component: Component) {
        if self.index.contains_key(&component.urn) {
            return;
        }
        self.index.insert(component.urn.clone(), self.components.len());
        self.components.push(component);
    }

    fn get_component_mut(&mut self, urn: &Urn) -> Option<&mut Component> {
        self.index.get(urn).map(|&i| &mut self.components[i])
    }

    fn relation_exists(&self, source: &Urn, target: &Urn) -> bool {
        self.relation_set
            .contains(&(source.clone(), target.clone()))
    }

    fn add_relation(&mut self, source: &Urn, target: &Urn) {
        let key = (source.clone(), target.clone());
        if self.relation_set.insert(key) {
            self.relations.push((source.clone(), target.clone()));
        }
    }
}
