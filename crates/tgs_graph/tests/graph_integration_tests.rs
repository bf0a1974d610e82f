//! Integration tests for graph building from stack documents.

use tgs_config::{ConfigLoader, StackConfig, UnitId};
use tgs_graph::{order_for_pipeline, render_mermaid, DependencyGraph, GraphError};

const STACK: &str = r#"
stack:
  name: main
  version: 1.0.0
  description: Web platform
components:
  rg:
    source: azurerm_resource_group
    provider: azurerm
    version: 4.14.0
    description: Resource group
  serviceplan:
    source: azurerm_service_plan
    provider: azurerm
    version: 4.14.0
    description: App service plan
    deps:
      - "{region}.rg"
  webapp:
    source: azurerm_linux_web_app
    provider: azurerm
    version: 4.14.0
    description: Web app
    deps:
      - "{region}.rg"
      - "{region}.serviceplan.{app}"
  dns:
    source: azurerm_dns_zone
    provider: azurerm
    version: 4.14.0
    description: Shared DNS zone
    deps:
      - "eastus2.rg"
architecture:
  regions:
    eastus2:
      - component: rg
      - component: dns
    westus:
      - component: rg
      - component: serviceplan
        apps: [api]
      - component: webapp
        apps: [api, web]
"#;

fn stack() -> StackConfig {
    ConfigLoader::decode_stack("main", STACK.as_bytes()).unwrap()
}

#[test]
fn test_app_placeholder_resolves_per_instance() {
    let graph = DependencyGraph::build(&stack()).unwrap();

    let api = UnitId::new("westus", "webapp", Some("api"));
    assert_eq!(
        graph.dependencies_of(&api),
        vec![
            UnitId::new("westus", "rg", None),
            UnitId::new("westus", "serviceplan", Some("api")),
        ]
    );

    // westus.serviceplan.web is not deployed, so the edge is omitted
    let web = UnitId::new("westus", "webapp", Some("web"));
    assert_eq!(graph.dependencies_of(&web), vec![UnitId::new("westus", "rg", None)]);
}

#[test]
fn test_cross_region_literal_dependency() {
    let graph = DependencyGraph::build(&stack()).unwrap();
    let dns = UnitId::new("eastus2", "dns", None);
    let rg = UnitId::new("eastus2", "rg", None);

    assert_eq!(graph.dependencies_of(&dns), vec![rg.clone()]);
    assert_eq!(graph.dependents_of(&rg), vec![dns]);
}

#[test]
fn test_stages_and_order_are_stable() {
    let first = DependencyGraph::build(&stack()).unwrap();
    let second = DependencyGraph::build(&stack()).unwrap();
    assert_eq!(first.topological_order(), second.topological_order());

    let stages = order_for_pipeline(&first);
    let names: Vec<Vec<String>> = stages
        .iter()
        .map(|stage| stage.units.iter().map(ToString::to_string).collect())
        .collect();
    assert_eq!(
        names,
        vec![
            vec!["eastus2.rg".to_string(), "westus.rg".to_string()],
            vec![
                "eastus2.dns".to_string(),
                "westus.serviceplan.api".to_string(),
                "westus.webapp.web".to_string(),
            ],
            vec!["westus.webapp.api".to_string()],
        ]
    );
}

#[test]
fn test_invalid_notation_is_reported_with_component() {
    let mut stack = stack();
    stack
        .components
        .get_mut("dns")
        .unwrap()
        .deps
        .push("{app}.rg".to_string());

    let err = DependencyGraph::build(&stack).unwrap_err();
    assert!(matches!(err, GraphError::Notation { ref component, .. } if component == "dns"));
}

#[test]
fn test_cycle_across_regions() {
    let mut stack = stack();
    stack
        .components
        .get_mut("rg")
        .unwrap()
        .deps
        .push("eastus2.dns".to_string());

    let err = DependencyGraph::build(&stack).unwrap_err();
    let GraphError::Cycle { path } = err else {
        panic!("expected a cycle");
    };
    assert!(path.contains(&UnitId::new("eastus2", "dns", None)));
    assert!(path.contains(&UnitId::new("eastus2", "rg", None)));
}

#[test]
fn test_diagram_lists_every_unit() {
    let graph = DependencyGraph::build(&stack()).unwrap();
    let diagram = render_mermaid(&graph);
    for unit in graph.units() {
        assert!(diagram.contains(&unit.slug()), "missing {}", unit);
    }
}
