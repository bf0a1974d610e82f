//! Deployment stages for CI pipelines.

use std::collections::{BTreeMap, BTreeSet};

use tgs_config::UnitId;

use crate::graph::DependencyGraph;

/// Units that can be deployed together once every earlier stage finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub index: usize,
    /// Sorted by region, component, app.
    pub units: Vec<UnitId>,
}

impl Stage {
    /// Pipeline stage identifier, e.g. `stage_0`.
    pub fn name(&self) -> String {
        format!("stage_{}", self.index)
    }

    /// Earlier stages holding dependencies of this stage's units, ascending.
    pub fn prerequisites(&self, graph: &DependencyGraph) -> Vec<usize> {
        let indices: BTreeSet<usize> = self
            .units
            .iter()
            .flat_map(|unit| graph.dependencies_of(unit))
            .filter_map(|dep| graph.stage_of(&dep).ok())
            .filter(|&stage| stage < self.index)
            .collect();
        indices.into_iter().collect()
    }
}

/// Group units by stage in increasing order.
pub fn order_for_pipeline(graph: &DependencyGraph) -> Vec<Stage> {
    let mut grouped: BTreeMap<usize, Vec<UnitId>> = BTreeMap::new();
    for unit in graph.units() {
        if let Ok(stage) = graph.stage_of(unit) {
            grouped.entry(stage).or_default().push(unit.clone());
        }
    }

    grouped
        .into_iter()
        .map(|(index, mut units)| {
            units.sort();
            Stage { index, units }
        })
        .collect()
}
