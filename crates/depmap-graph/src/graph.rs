//! Node/edge registries with adjacency and hierarchy.
//!
//! Lookups on unknown ids return `None` (or an empty slice) instead of panicking. Removing a node
//! does not cascade to its edges: the edges stay registered (dangling) until the caller removes
//! them, and the layouter drops them when it runs.

use crate::OrderedStringMap;
use rustc_hash::FxBuildHasher;

type HashMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeEntry<E> {
    pub id: String,
    pub source: String,
    pub destination: String,
    pub label: E,
}

impl<E> EdgeEntry<E> {
    pub fn is_self_edge(&self) -> bool {
        self.source == self.destination
    }
}

#[derive(Debug, Clone)]
pub struct Graph<N, E> {
    nodes: OrderedStringMap<N>,
    edges: OrderedStringMap<EdgeEntry<E>>,

    parent: HashMap<String, String>,
    children: HashMap<String, Vec<String>>,

    // One entry per registered edge, so parallel edges show up twice. Self-edges land in both
    // lists of their node.
    successors: HashMap<String, Vec<String>>,
    predecessors: HashMap<String, Vec<String>>,
}

impl<N, E> Default for Graph<N, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N, E> Graph<N, E> {
    pub fn new() -> Self {
        Self {
            nodes: OrderedStringMap::new(),
            edges: OrderedStringMap::new(),
            parent: HashMap::default(),
            children: HashMap::default(),
            successors: HashMap::default(),
            predecessors: HashMap::default(),
        }
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Replaces the label of `id` (or inserts it). Parent and edge linkage are untouched.
    pub fn set_node(&mut self, id: impl Into<String>, label: N) -> &mut Self {
        self.nodes.insert(id, label);
        self
    }

    /// Upsert that keeps an existing label in place so callers can update it field by field.
    pub fn node_entry<F>(&mut self, id: impl Into<String>, make: F) -> &mut N
    where
        F: FnOnce() -> N,
    {
        self.nodes.get_or_insert_with(id, make)
    }

    pub fn node(&self, id: &str) -> Option<&N> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut N> {
        self.nodes.get_mut(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&str, &N)> {
        self.nodes.iter()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = (&str, &mut N)> {
        self.nodes.iter_mut()
    }

    pub fn node_ids(&self) -> Vec<String> {
        self.nodes.keys().map(str::to_string).collect()
    }

    /// Detaches `id` from its parent and drops it from the registry.
    ///
    /// Children keep pointing at the removed id; they become orphans that the layouter skips
    /// until a node with that id is registered again, which gets them back as its children.
    pub fn remove_node(&mut self, id: &str) -> Option<N> {
        let label = self.nodes.remove(id)?;
        if let Some(parent) = self.parent.remove(id) {
            if let Some(siblings) = self.children.get_mut(&parent) {
                siblings.retain(|c| c != id);
            }
        }
        Some(label)
    }

    pub fn retain_nodes<F>(&mut self, mut keep: F) -> Vec<String>
    where
        F: FnMut(&str, &N) -> bool,
    {
        let doomed: Vec<String> = self
            .nodes
            .iter()
            .filter(|(id, n)| !keep(id, n))
            .map(|(id, _)| id.to_string())
            .collect();
        for id in &doomed {
            self.remove_node(id);
        }
        doomed
    }

    /// Attaches `child` under `parent`. Re-attaching to the current parent restores the child
    /// list entry if it went missing.
    pub fn set_parent(&mut self, child: &str, parent: &str) -> &mut Self {
        if let Some(prev) = self.parent.insert(child.to_string(), parent.to_string()) {
            if prev != parent {
                if let Some(ch) = self.children.get_mut(&prev) {
                    ch.retain(|c| c != child);
                }
            }
        }
        let entry = self.children.entry(parent.to_string()).or_default();
        if !entry.iter().any(|c| c == child) {
            entry.push(child.to_string());
        }
        self
    }

    pub fn clear_parent(&mut self, child: &str) -> &mut Self {
        if let Some(prev) = self.parent.remove(child) {
            if let Some(ch) = self.children.get_mut(&prev) {
                ch.retain(|c| c != child);
            }
        }
        self
    }

    pub fn parent(&self, child: &str) -> Option<&str> {
        self.parent.get(child).map(|s| s.as_str())
    }

    /// Children of `parent` in the order they were attached.
    pub fn children(&self, parent: &str) -> &[String] {
        self.children
            .get(parent)
            .map(|v| v.as_slice())
            .unwrap_or_default()
    }

    /// Registered nodes without a parent, in insertion order.
    pub fn root_nodes(&self) -> Vec<&str> {
        self.nodes
            .keys()
            .filter(|id| !self.parent.contains_key(*id))
            .collect()
    }

    pub fn has_edge(&self, id: &str) -> bool {
        self.edges.contains_key(id)
    }

    /// Upserts edge `id`. An existing edge keeps its label; if its endpoints changed it is
    /// relinked in both adjacency lists.
    pub fn edge_entry<F>(
        &mut self,
        id: impl Into<String>,
        source: impl Into<String>,
        destination: impl Into<String>,
        make: F,
    ) -> &mut E
    where
        F: FnOnce() -> E,
    {
        let id = id.into();
        let source = source.into();
        let destination = destination.into();

        let existing = self
            .edges
            .get(&id)
            .map(|e| (e.source.clone(), e.destination.clone()));
        match existing {
            None => self.link(&source, &destination),
            Some((old_source, old_destination))
                if old_source != source || old_destination != destination =>
            {
                self.unlink(&old_source, &old_destination);
                self.link(&source, &destination);
            }
            Some(_) => {}
        }

        let entry = self.edges.get_or_insert_with(id.clone(), || EdgeEntry {
            id,
            source: source.clone(),
            destination: destination.clone(),
            label: make(),
        });
        entry.source = source;
        entry.destination = destination;
        &mut entry.label
    }

    pub fn edge(&self, id: &str) -> Option<&EdgeEntry<E>> {
        self.edges.get(id)
    }

    pub fn edge_mut(&mut self, id: &str) -> Option<&mut EdgeEntry<E>> {
        self.edges.get_mut(id)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> impl Iterator<Item = &EdgeEntry<E>> {
        self.edges.values()
    }

    pub fn edges_mut(&mut self) -> impl Iterator<Item = &mut EdgeEntry<E>> {
        self.edges.values_mut()
    }

    pub fn edge_ids(&self) -> Vec<String> {
        self.edges.keys().map(str::to_string).collect()
    }

    pub fn remove_edge(&mut self, id: &str) -> Option<EdgeEntry<E>> {
        let entry = self.edges.remove(id)?;
        self.unlink(&entry.source, &entry.destination);
        Some(entry)
    }

    pub fn retain_edges<F>(&mut self, mut keep: F) -> Vec<EdgeEntry<E>>
    where
        F: FnMut(&EdgeEntry<E>) -> bool,
    {
        let doomed: Vec<String> = self
            .edges
            .values()
            .filter(|e| !keep(e))
            .map(|e| e.id.clone())
            .collect();
        doomed
            .iter()
            .filter_map(|id| self.remove_edge(id))
            .collect()
    }

    /// Edges leaving `v`, in registry order.
    pub fn out_edges(&self, v: &str) -> Vec<&EdgeEntry<E>> {
        self.edges.values().filter(|e| e.source == v).collect()
    }

    /// Edges entering `v`, in registry order.
    pub fn in_edges(&self, v: &str) -> Vec<&EdgeEntry<E>> {
        self.edges.values().filter(|e| e.destination == v).collect()
    }

    /// The edge running from `edge.destination` back to `edge.source`, if one is registered.
    pub fn reverse_edge(&self, id: &str) -> Option<&EdgeEntry<E>> {
        let e = self.edges.get(id)?;
        self.edges
            .values()
            .find(|r| r.id != e.id && r.source == e.destination && r.destination == e.source)
    }

    pub fn successors(&self, v: &str) -> &[String] {
        self.successors
            .get(v)
            .map(|v| v.as_slice())
            .unwrap_or_default()
    }

    pub fn predecessors(&self, v: &str) -> &[String] {
        self.predecessors
            .get(v)
            .map(|v| v.as_slice())
            .unwrap_or_default()
    }

    /// Union of successors and predecessors, first-seen order, without duplicates.
    pub fn neighbors(&self, v: &str) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for w in self.successors(v).iter().chain(self.predecessors(v)) {
            if !out.iter().any(|x| x == w) {
                out.push(w.as_str());
            }
        }
        out
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.parent.clear();
        self.children.clear();
        self.successors.clear();
        self.predecessors.clear();
    }

    fn link(&mut self, source: &str, destination: &str) {
        self.successors
            .entry(source.to_string())
            .or_default()
            .push(destination.to_string());
        self.predecessors
            .entry(destination.to_string())
            .or_default()
            .push(source.to_string());
    }

    fn unlink(&mut self, source: &str, destination: &str) {
        if let Some(out) = self.successors.get_mut(source) {
            if let Some(pos) = out.iter().position(|w| w == destination) {
                out.remove(pos);
            }
            if out.is_empty() {
                self.successors.remove(source);
            }
        }
        if let Some(inc) = self.predecessors.get_mut(destination) {
            if let Some(pos) = inc.iter().position(|u| u == source) {
                inc.remove(pos);
            }
            if inc.is_empty() {
                self.predecessors.remove(destination);
            }
        }
    }
}
