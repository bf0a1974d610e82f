//! Dependency graph over deployable units.
//!
//! Nodes are `(region, component, app)` units enumerated from a stack's
//! architecture. An edge `a -> b` means `a` depends on `b`, so `b` has to be
//! scaffolded and deployed first.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tracing::debug;

use tgs_config::{DependencyPattern, ResolveContext, Resolution, StackConfig, UnitId};

use crate::error::{GraphError, GraphResult};

/// A resolved dependency of a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    pub target: UnitId,
    /// Notation the edge was resolved from.
    pub pattern: DependencyPattern,
}

/// Color states for cycle detection using DFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Node has not been visited.
    White,
    /// Node is on the active DFS stack.
    Gray,
    /// Node and everything below it has been visited.
    Black,
}

/// Acyclic dependency graph of a stack with its deployment order.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<UnitId, DependencyPattern>,
    node_map: BTreeMap<UnitId, NodeIndex>,
    order: Vec<UnitId>,
    stages: BTreeMap<UnitId, usize>,
}

impl DependencyGraph {
    /// Build the graph for a stack.
    ///
    /// Targets that are not deployed are left out: the validator reports them
    /// before generation, and read-only consumers such as diagrams tolerate
    /// them. Cycles are always an error.
    pub fn build(stack: &StackConfig) -> GraphResult<Self> {
        let mut graph = DiGraph::new();
        let mut node_map = BTreeMap::new();

        let units: BTreeSet<UnitId> = stack.units().into_iter().collect();
        for unit in &units {
            let index = graph.add_node(unit.clone());
            node_map.insert(unit.clone(), index);
        }

        for unit in &units {
            let Some(component) = stack.component(&unit.component) else {
                debug!("Unit {} has no component definition, no edges added", unit);
                continue;
            };

            for notation in &component.deps {
                let pattern = DependencyPattern::parse(notation).map_err(|source| {
                    GraphError::Notation {
                        component: unit.component.clone(),
                        source,
                    }
                })?;

                let target = match pattern.resolve(&ResolveContext::for_unit(unit)) {
                    Resolution::Target(target) => target,
                    Resolution::Skipped => {
                        debug!("Skipping '{}' for {}: unit has no app", notation, unit);
                        continue;
                    }
                };

                let Some(&to) = node_map.get(&target) else {
                    debug!("Omitting edge {} -> {}: target is not deployed", unit, target);
                    continue;
                };

                let from = node_map[unit];
                if !graph.contains_edge(from, to) {
                    graph.add_edge(from, to, pattern);
                }
            }
        }

        let mut built = Self {
            graph,
            node_map,
            order: Vec::new(),
            stages: BTreeMap::new(),
        };

        built.detect_cycles()?;
        built.order = built.kahn_order()?;
        built.stages = built.compute_stages();

        debug!(
            "Built dependency graph with {} units and {} edges",
            built.node_count(),
            built.edge_count()
        );
        Ok(built)
    }

    /// Detect cycles using DFS with colors, visiting nodes in sorted order.
    fn detect_cycles(&self) -> GraphResult<()> {
        let mut colors: BTreeMap<NodeIndex, Color> = self
            .graph
            .node_indices()
            .map(|index| (index, Color::White))
            .collect();
        let mut path: Vec<NodeIndex> = Vec::new();

        for &node in self.node_map.values() {
            if colors.get(&node) == Some(&Color::White) {
                if let Some(cycle) = self.dfs_visit(node, &mut colors, &mut path) {
                    return Err(GraphError::Cycle {
                        path: cycle.into_iter().map(|i| self.graph[i].clone()).collect(),
                    });
                }
            }
        }

        Ok(())
    }

    /// DFS visit for cycle detection. Returns the cycle, closed on its first node.
    fn dfs_visit(
        &self,
        node: NodeIndex,
        colors: &mut BTreeMap<NodeIndex, Color>,
        path: &mut Vec<NodeIndex>,
    ) -> Option<Vec<NodeIndex>> {
        colors.insert(node, Color::Gray);
        path.push(node);

        for neighbor in self.sorted_neighbors(node, Direction::Outgoing) {
            match colors.get(&neighbor) {
                Some(Color::Gray) => {
                    let start = path.iter().position(|&n| n == neighbor).unwrap_or(0);
                    let mut cycle = path[start..].to_vec();
                    cycle.push(neighbor);
                    return Some(cycle);
                }
                Some(Color::White) => {
                    if let Some(cycle) = self.dfs_visit(neighbor, colors, path) {
                        return Some(cycle);
                    }
                }
                _ => {}
            }
        }

        path.pop();
        colors.insert(node, Color::Black);
        None
    }

    /// Kahn's algorithm with a sorted ready set so ties resolve identically.
    fn kahn_order(&self) -> GraphResult<Vec<UnitId>> {
        let mut remaining: BTreeMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|index| (index, self.graph.neighbors_directed(index, Direction::Outgoing).count()))
            .collect();

        let mut ready: BTreeSet<&UnitId> = remaining
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(&index, _)| &self.graph[index])
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(unit) = ready.pop_first() {
            order.push(unit.clone());
            let index = self.node_map[unit];

            for dependent in self.graph.neighbors_directed(index, Direction::Incoming) {
                if let Some(count) = remaining.get_mut(&dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(&self.graph[dependent]);
                    }
                }
            }
        }

        if order.len() != self.graph.node_count() {
            let placed: BTreeSet<&UnitId> = order.iter().collect();
            let path = self
                .node_map
                .keys()
                .filter(|unit| !placed.contains(unit))
                .cloned()
                .collect();
            return Err(GraphError::Cycle { path });
        }

        Ok(order)
    }

    /// Longest dependency chain ending at each unit.
    fn compute_stages(&self) -> BTreeMap<UnitId, usize> {
        let mut stages: BTreeMap<UnitId, usize> = BTreeMap::new();
        for unit in &self.order {
            let stage = self
                .dependencies_of(unit)
                .iter()
                .filter_map(|dep| stages.get(dep))
                .map(|stage| stage + 1)
                .max()
                .unwrap_or(0);
            stages.insert(unit.clone(), stage);
        }
        stages
    }

    fn sorted_neighbors(&self, node: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        let mut neighbors: Vec<NodeIndex> = self.graph.neighbors_directed(node, direction).collect();
        neighbors.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));
        neighbors.dedup();
        neighbors
    }

    /// Every unit, sorted by region, component, app.
    pub fn units(&self) -> impl Iterator<Item = &UnitId> {
        self.node_map.keys()
    }

    pub fn contains(&self, unit: &UnitId) -> bool {
        self.node_map.contains_key(unit)
    }

    /// Direct dependencies of a unit, sorted.
    pub fn dependencies_of(&self, unit: &UnitId) -> Vec<UnitId> {
        self.dependency_edges_of(unit)
            .into_iter()
            .map(|edge| edge.target)
            .collect()
    }

    /// Direct dependencies with the notation each was resolved from, sorted by target.
    pub fn dependency_edges_of(&self, unit: &UnitId) -> Vec<DependencyEdge> {
        let Some(&index) = self.node_map.get(unit) else {
            return Vec::new();
        };
        let mut edges: Vec<DependencyEdge> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .map(|edge| DependencyEdge {
                target: self.graph[edge.target()].clone(),
                pattern: edge.weight().clone(),
            })
            .collect();
        edges.sort_by(|a, b| a.target.cmp(&b.target));
        edges
    }

    /// Units that directly depend on `unit`, sorted.
    pub fn dependents_of(&self, unit: &UnitId) -> Vec<UnitId> {
        self.node_map
            .get(unit)
            .map(|&index| {
                self.sorted_neighbors(index, Direction::Incoming)
                    .into_iter()
                    .map(|i| self.graph[i].clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Deployment stage of a unit: 0 for units without dependencies.
    pub fn stage_of(&self, unit: &UnitId) -> GraphResult<usize> {
        self.stages
            .get(unit)
            .copied()
            .ok_or_else(|| GraphError::UnknownUnit(unit.clone()))
    }

    /// Units ordered so every dependency precedes its dependents.
    pub fn topological_order(&self) -> &[UnitId] {
        &self.order
    }

    /// Number of stages, i.e. the longest chain plus one.
    pub fn stage_count(&self) -> usize {
        self.stages.values().max().map_or(0, |max| max + 1)
    }

    /// Every `(dependent, dependency)` pair, sorted.
    pub fn edges(&self) -> Vec<(UnitId, UnitId)> {
        self.node_map
            .keys()
            .flat_map(|unit| {
                self.dependencies_of(unit)
                    .into_iter()
                    .map(move |dep| (unit.clone(), dep))
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
