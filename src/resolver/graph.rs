// src/resolver/graph.rs

//! Dependency graph data structures and algorithms
//!
//! Provides graph construction, deterministic topological ordering, cycle
//! detection and reverse-dependency closure. Nodes are keyed by package id;
//! edges whose endpoints are not both nodes are kept but ignored for ordering.

use crate::error::{Error, Result};
use crate::installed::InstalledSet;
use crate::package::PackageName;
use crate::version::VersionRange;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

/// A dependency edge with its version range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
    pub range: VersionRange,
}

impl DependencyEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>, range: VersionRange) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            range,
        }
    }
}

/// Dependency graph for closure computation and ordering
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Map from package id to its node
    nodes: BTreeMap<String, PackageName>,
    /// Map from package id to its outgoing dependencies
    edges: HashMap<String, Vec<DependencyEdge>>,
    /// Map from package id to packages that depend on it (reverse edges)
    reverse_edges: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph of the installed set from recorded dependencies
    pub fn from_installed(installed: &dyn InstalledSet) -> Result<Self> {
        let mut graph = Self::new();

        for package in installed.get_installed()? {
            let id = package.name.id.clone();
            graph.add_node(package.name);

            for dep in installed.dependencies_of(&id)? {
                graph.add_edge(DependencyEdge::new(id.clone(), dep.id, dep.range));
            }
        }

        Ok(graph)
    }

    /// Add a package node to the graph
    pub fn add_node(&mut self, name: PackageName) {
        self.nodes.insert(name.id.clone(), name);
    }

    /// Add a dependency edge to the graph
    pub fn add_edge(&mut self, edge: DependencyEdge) {
        self.reverse_edges
            .entry(edge.to.clone())
            .or_default()
            .push(edge.from.clone());

        self.edges.entry(edge.from.clone()).or_default().push(edge);
    }

    pub fn get_node(&self, id: &str) -> Option<&PackageName> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node ids in ascending order
    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.nodes.keys()
    }

    /// Outgoing edges of a package
    pub fn get_dependencies(&self, id: &str) -> &[DependencyEdge] {
        self.edges.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Packages that directly depend on this package, sorted and deduplicated
    pub fn get_dependents(&self, id: &str) -> Vec<String> {
        let dependents: BTreeSet<&String> = self
            .reverse_edges
            .get(id)
            .map(|v| v.iter().collect())
            .unwrap_or_default();
        dependents.into_iter().cloned().collect()
    }

    /// Dependencies before dependents; ties broken by ascending id
    pub fn dependencies_first(&self) -> Result<Vec<String>> {
        self.kahn(|id| self.internal_dependencies(id), |id| self.internal_dependents(id))
    }

    /// Dependents before dependencies; ties broken by ascending id
    pub fn dependents_first(&self) -> Result<Vec<String>> {
        self.kahn(|id| self.internal_dependents(id), |id| self.internal_dependencies(id))
    }

    /// Kahn's algorithm with an ordered ready set
    ///
    /// `blockers` lists the nodes that must be emitted before a node,
    /// `unblocks` lists the nodes waiting on it.
    fn kahn<'g, B, U>(&'g self, blockers: B, unblocks: U) -> Result<Vec<String>>
    where
        B: Fn(&str) -> Vec<&'g str>,
        U: Fn(&str) -> Vec<&'g str>,
    {
        let mut pending: HashMap<&str, usize> = HashMap::new();
        let mut ready: BTreeSet<&str> = BTreeSet::new();

        for id in self.nodes.keys() {
            let count = blockers(id).len();
            if count == 0 {
                ready.insert(id);
            }
            pending.insert(id, count);
        }

        let mut result = Vec::with_capacity(self.nodes.len());
        while let Some(id) = ready.pop_first() {
            result.push(id.to_string());

            for waiting in unblocks(id) {
                if let Some(count) = pending.get_mut(waiting) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(waiting);
                    }
                }
            }
        }

        if result.len() != self.nodes.len() {
            let cycle = self.detect_cycle().unwrap_or_else(|| {
                let emitted: HashSet<&str> = result.iter().map(String::as_str).collect();
                self.nodes
                    .keys()
                    .filter(|id| !emitted.contains(id.as_str()))
                    .cloned()
                    .collect()
            });
            return Err(Error::CyclicDependency { cycle });
        }

        Ok(result)
    }

    /// Dependency targets of `id` that are nodes, one entry per edge
    fn internal_dependencies(&self, id: &str) -> Vec<&str> {
        self.get_dependencies(id)
            .iter()
            .filter(|e| self.nodes.contains_key(&e.to))
            .map(|e| e.to.as_str())
            .collect()
    }

    /// Dependents of `id` that are nodes, one entry per edge
    fn internal_dependents(&self, id: &str) -> Vec<&str> {
        self.reverse_edges
            .get(id)
            .map(|v| {
                v.iter()
                    .filter(|from| self.nodes.contains_key(*from))
                    .map(String::as_str)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Detect circular dependencies in the graph
    ///
    /// Returns the cycle as a path that starts and ends on the same id,
    /// or None if no cycle exists.
    pub fn detect_cycle(&self) -> Option<Vec<String>> {
        let mut visited = HashSet::new();
        let mut path = Vec::new();

        for id in self.nodes.keys() {
            if !visited.contains(id.as_str())
                && let Some(cycle) = self.dfs_cycle_detect(id, &mut visited, &mut path)
            {
                return Some(cycle);
            }
        }

        None
    }

    /// DFS helper for cycle detection
    fn dfs_cycle_detect<'g>(
        &'g self,
        id: &'g str,
        visited: &mut HashSet<&'g str>,
        path: &mut Vec<&'g str>,
    ) -> Option<Vec<String>> {
        visited.insert(id);
        path.push(id);

        let mut targets = self.internal_dependencies(id);
        targets.sort_unstable();

        for to in targets {
            if let Some(pos) = path.iter().position(|p| *p == to) {
                let mut cycle: Vec<String> = path[pos..].iter().map(|p| p.to_string()).collect();
                cycle.push(to.to_string());
                return Some(cycle);
            }
            if !visited.contains(to)
                && let Some(cycle) = self.dfs_cycle_detect(to, visited, path)
            {
                return Some(cycle);
            }
        }

        path.pop();
        None
    }

    /// Find all packages that would break if this package is removed
    ///
    /// Transitive closure of reverse dependencies, sorted by id. The package
    /// itself is never included.
    pub fn find_breaking_packages(&self, id: &str) -> Vec<String> {
        let mut breaking = BTreeSet::new();
        let mut queue = VecDeque::new();

        queue.push_back(id.to_string());

        while let Some(current) = queue.pop_front() {
            if let Some(dependents) = self.reverse_edges.get(&current) {
                for dependent in dependents {
                    if dependent != id && breaking.insert(dependent.clone()) {
                        queue.push_back(dependent.clone());
                    }
                }
            }
        }

        breaking.into_iter().collect()
    }

    /// Copy of the graph restricted to `ids`, keeping edges between them
    pub fn subgraph(&self, ids: &BTreeSet<String>) -> Self {
        let mut graph = Self::new();
        for id in ids {
            if let Some(name) = self.nodes.get(id) {
                graph.add_node(name.clone());
            }
        }
        for id in ids {
            for edge in self.get_dependencies(id) {
                if ids.contains(&edge.to) {
                    graph.add_edge(edge.clone());
                }
            }
        }
        graph
    }
}
