//! Mermaid rendering of a dependency graph.

use std::collections::BTreeMap;
use std::fmt::Write;

use tgs_config::UnitId;

use crate::graph::DependencyGraph;

/// Render the graph as a Mermaid flowchart with one subgraph per region.
///
/// Arrows point from a dependent unit to the unit it depends on.
pub fn render_mermaid(graph: &DependencyGraph) -> String {
    let mut by_region: BTreeMap<&str, Vec<&UnitId>> = BTreeMap::new();
    for unit in graph.units() {
        by_region.entry(unit.region.as_str()).or_default().push(unit);
    }

    let mut out = String::from("flowchart TD\n");
    for (region, units) in &by_region {
        let _ = writeln!(out, "    subgraph {}[\"{}\"]", region_id(region), region);
        for unit in units {
            let _ = writeln!(out, "        {}[\"{}\"]", unit.slug(), node_label(unit));
        }
        out.push_str("    end\n");
    }

    for (dependent, dependency) in graph.edges() {
        let _ = writeln!(out, "    {} --> {}", dependent.slug(), dependency.slug());
    }

    out
}

fn region_id(region: &str) -> String {
    let sanitized: String = region
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("region_{}", sanitized)
}

fn node_label(unit: &UnitId) -> String {
    match unit.app() {
        Some(app) => format!("{}/{}", unit.component, app),
        None => unit.component.clone(),
    }
}
