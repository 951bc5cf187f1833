//! Dependency graph over first-party modules (§3, §4.3).
//!
//! Nodes are module identities; edges point from an importer to the module
//! it imports. Strongly-connected components of size greater than one (or a
//! self-loop) mark import cycles, which force every module in the component
//! into wrapper mode (§3 invariant (b)).

use crate::types::ModuleId;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

#[derive(Default)]
pub struct DependencyGraph {
    graph: DiGraph<ModuleId, ()>,
    index: HashMap<ModuleId, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_module(&mut self, module: ModuleId) -> NodeIndex {
        if let Some(&idx) = self.index.get(&module) {
            return idx;
        }
        let idx = self.graph.add_node(module.clone());
        self.index.insert(module, idx);
        idx
    }

    pub fn add_dependency(&mut self, from: ModuleId, to: ModuleId) {
        let from_idx = self.add_module(from);
        let to_idx = self.add_module(to);
        self.graph.update_edge(from_idx, to_idx, ());
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleId> {
        self.graph.node_weights()
    }

    pub fn dependencies_of<'a>(&'a self, module: &ModuleId) -> Vec<&'a ModuleId> {
        let Some(&idx) = self.index.get(module) else {
            return Vec::new();
        };
        self.graph
            .neighbors(idx)
            .map(|n| &self.graph[n])
            .collect()
    }

    /// Every module that is a member of a nontrivial strongly-connected
    /// component (participates in an import cycle, directly or transitively).
    pub fn cyclic_modules(&self) -> Vec<ModuleId> {
        let sccs = petgraph::algo::tarjan_scc(&self.graph);
        let mut out = Vec::new();
        for component in sccs {
            let is_cycle = component.len() > 1
                || component
                    .first()
                    .is_some_and(|&idx| self.graph.contains_edge(idx, idx));
            if is_cycle {
                out.extend(component.into_iter().map(|idx| self.graph[idx].clone()));
            }
        }
        out
    }

    /// Topological order of modules, when the graph (after removing cycle
    /// edges conceptually handled by wrapper mode) permits one. Returns the
    /// strongly-connected components in dependency order: dependencies
    /// before dependents, as needed to decide wrapper initialization order
    /// (§4.6).
    pub fn condensation_order(&self) -> Vec<Vec<ModuleId>> {
        let sccs = petgraph::algo::tarjan_scc(&self.graph);
        sccs.into_iter()
            .map(|component| component.into_iter().map(|idx| self.graph[idx].clone()).collect())
            .rev()
            .collect()
    }
}
