//! Integration tests for tree and pipeline generation.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tempfile::tempdir;
use tgs_config::{ConfigLoader, LoadedConfig, ProjectLayout};
use tgs_graph::GraphError;
use tgs_scaffold::{
    FileAction, Generator, PipelineGenerator, ProviderSchemaFile, ScaffoldError, UNIT_FILE,
};
use walkdir::WalkDir;

fn project(root: &Path) -> (ProjectLayout, LoadedConfig) {
    let layout = ProjectLayout::init(root, "Demo").unwrap();
    let loaded = ConfigLoader::from_project(&layout).unwrap();
    (layout, loaded)
}

fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let relative = entry.path().strip_prefix(root).unwrap().to_path_buf();
            (relative, fs::read(entry.path()).unwrap())
        })
        .collect()
}

#[test]
fn test_generate_default_project() {
    let dir = tempdir().unwrap();
    let (layout, loaded) = project(dir.path());
    let out = layout.output_dir();

    let report = Generator::new(&out)
        .generate(&loaded.topology, &loaded.stacks)
        .unwrap();

    // rg, plan and two web apps in three environments
    assert_eq!(report.units, 12);
    assert_eq!(report.count(FileAction::Create), report.files.len());
    assert_eq!(report.files.len(), 33);

    for file in [
        "root.hcl",
        "default/subscription.hcl",
        "default/eastus2/region.hcl",
        "default/eastus2/prod/environment.hcl",
        "_components/main/webapp/component.hcl",
        "_components/main/webapp/main.tf",
        "default/eastus2/test/rg/terragrunt.hcl",
        "default/eastus2/dev/webapp/web/terragrunt.hcl",
    ] {
        assert!(out.join(file).is_file(), "missing {}", file);
    }
}

#[test]
fn test_unit_references_and_inputs() {
    let dir = tempdir().unwrap();
    let (layout, loaded) = project(dir.path());
    let out = layout.output_dir();
    Generator::new(&out)
        .generate(&loaded.topology, &loaded.stacks)
        .unwrap();

    let api = fs::read_to_string(out.join("default/eastus2/dev/webapp/api").join(UNIT_FILE)).unwrap();
    assert!(api.contains("path   = \"${get_terragrunt_dir()}/../../../../../_components/main/webapp/component.hcl\""));
    assert!(api.contains("dependency \"plan\" {\n  config_path = \"../../plan\""));
    assert!(api.contains("dependency \"rg\" {\n  config_path = \"../../rg\""));
    assert!(api.contains("\"Demo-e2d-app-api\""));
    assert!(api.contains("dependency.rg.outputs.name"));

    let rg = fs::read_to_string(out.join("default/eastus2/prod/rg").join(UNIT_FILE)).unwrap();
    assert!(!rg.contains("dependency \""));
    assert!(rg.contains("\"Demo-e2p-rg\""));

    let subscription = fs::read_to_string(out.join("default/subscription.hcl")).unwrap();
    assert!(subscription.contains("remote_state_container      = \"tfstate\""));
    assert!(subscription.contains("\"subscription\" = \"default\""));
}

#[test]
fn test_second_run_is_byte_identical() {
    let dir = tempdir().unwrap();
    let (layout, loaded) = project(dir.path());
    let out = layout.output_dir();
    let generator = Generator::new(&out);

    generator.generate(&loaded.topology, &loaded.stacks).unwrap();
    let first = snapshot(&out);

    let report = generator.generate(&loaded.topology, &loaded.stacks).unwrap();
    assert!(report.is_unchanged());
    assert_eq!(report.count(FileAction::Unchanged) + report.count(FileAction::Preserved), 33);
    assert_eq!(snapshot(&out), first);
}

#[test]
fn test_hand_edits_survive_in_scaffold_once_files() {
    let dir = tempdir().unwrap();
    let (layout, loaded) = project(dir.path());
    let out = layout.output_dir();
    let generator = Generator::new(&out);
    generator.generate(&loaded.topology, &loaded.stacks).unwrap();

    let main_tf = out.join("_components/main/plan/main.tf");
    let component_hcl = out.join("_components/main/plan/component.hcl");
    fs::write(&main_tf, "# mine\n").unwrap();
    fs::write(&component_hcl, "# stale\n").unwrap();

    let report = generator.generate(&loaded.topology, &loaded.stacks).unwrap();
    let action = |path: &str| {
        report
            .files
            .iter()
            .find(|f| f.path == Path::new(path))
            .map(|f| f.action)
    };

    assert_eq!(action("_components/main/plan/main.tf"), Some(FileAction::Preserved));
    assert_eq!(action("_components/main/plan/component.hcl"), Some(FileAction::Update));
    assert_eq!(fs::read_to_string(&main_tf).unwrap(), "# mine\n");
    assert_ne!(fs::read_to_string(&component_hcl).unwrap(), "# stale\n");
}

#[test]
fn test_dry_run_writes_nothing() {
    let dir = tempdir().unwrap();
    let (layout, loaded) = project(dir.path());
    let out = layout.output_dir();

    let report = Generator::new(&out)
        .with_dry_run(true)
        .generate(&loaded.topology, &loaded.stacks)
        .unwrap();

    assert!(report.dry_run);
    assert_eq!(report.count(FileAction::Create), 33);
    assert!(!out.exists());
}

#[test]
fn test_cancelled_run_stops_before_units() {
    let dir = tempdir().unwrap();
    let (layout, loaded) = project(dir.path());
    let out = layout.output_dir();

    let cancel = Arc::new(AtomicBool::new(true));
    let err = Generator::new(&out)
        .with_cancel(cancel)
        .generate(&loaded.topology, &loaded.stacks)
        .unwrap_err();

    assert!(matches!(err, ScaffoldError::Cancelled));
    let units = WalkDir::new(&out)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name() == UNIT_FILE)
        .count();
    assert_eq!(units, 0);
}

#[test]
fn test_provider_schema_drives_variables() {
    let dir = tempdir().unwrap();
    let (layout, loaded) = project(dir.path());
    let out = layout.output_dir();

    let schema_path = dir.path().join("schema.json");
    fs::write(
        &schema_path,
        r#"{
          "provider_schemas": {
            "registry.terraform.io/hashicorp/azurerm": {
              "resource_schemas": {
                "azurerm_service_plan": {
                  "block": {
                    "attributes": {
                      "id": { "type": "string", "computed": true },
                      "location": { "type": "string", "required": true },
                      "name": { "type": "string", "required": true },
                      "os_type": { "type": "string", "required": true },
                      "resource_group_name": { "type": "string", "required": true },
                      "sku_name": { "type": "string", "required": true, "description": "SKU of the plan" },
                      "tags": { "type": ["map", "string"], "optional": true }
                    }
                  }
                }
              }
            }
          }
        }"#,
    )
    .unwrap();

    let schema = ProviderSchemaFile::load(&schema_path).unwrap();
    Generator::new(&out)
        .with_schema(Arc::new(schema))
        .generate(&loaded.topology, &loaded.stacks)
        .unwrap();

    let variables = fs::read_to_string(out.join("_components/main/plan/variables.tf")).unwrap();
    assert!(variables.contains("variable \"sku_name\" {\n  description = \"SKU of the plan\""));
    let main = fs::read_to_string(out.join("_components/main/plan/main.tf")).unwrap();
    assert!(main.contains("tags                = var.tags"));

    // No schema for web apps: minimal variables
    let webapp = fs::read_to_string(out.join("_components/main/webapp/variables.tf")).unwrap();
    assert!(webapp.contains("variable \"resource_group_name\""));
    assert!(!webapp.contains("sku_name"));
}

#[test]
fn test_pipeline_stages_follow_dependencies() {
    let dir = tempdir().unwrap();
    let (layout, loaded) = project(dir.path());

    let records = PipelineGenerator::new(layout.pipeline_dir(), ProjectLayout::OUTPUT_DIR)
        .generate(&loaded.topology, &loaded.stacks)
        .unwrap();
    assert_eq!(records.len(), 4);

    let content = fs::read_to_string(layout.pipeline_dir().join("default-dev.yml")).unwrap();
    let document: serde_yaml::Value = serde_yaml::from_str(&content).unwrap();
    let stages = document["stages"].as_sequence().unwrap();

    let jobs = |index: usize| -> Vec<String> {
        stages[index]["jobs"]
            .as_sequence()
            .unwrap()
            .iter()
            .map(|job| job["job"].as_str().unwrap().to_string())
            .collect()
    };
    assert_eq!(jobs(0), vec!["eastus2_rg"]);
    assert_eq!(jobs(1), vec!["eastus2_plan"]);
    assert_eq!(jobs(2), vec!["eastus2_webapp_api", "eastus2_webapp_web"]);

    let depends_on: Vec<&str> = stages[2]["dependsOn"]
        .as_sequence()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert_eq!(depends_on, vec!["stage_0", "stage_1"]);
    assert!(layout.pipeline_dir().join("templates/deploy-unit.yml").is_file());
}

const MULTI_TOPOLOGY: &str = r#"
name: Multi
subscriptions:
  alpha:
    remote_state: { name: stalpha, resource_group: rg-state }
    environments:
      - name: dev
      - name: prod
        stack: edge
  beta:
    remote_state: { name: stbeta, resource_group: rg-state }
    environments:
      - name: dev
        stack: edge
"#;

const MAIN_STACK: &str = r#"
stack: { name: main, version: 1.0.0, description: Regional web }
components:
  rg: { source: azurerm_resource_group, provider: azurerm, version: "4.14.0", description: Resource group }
  dns:
    source: azurerm_dns_zone
    provider: azurerm
    version: "4.14.0"
    description: DNS zone
    deps: ["{region}.rg"]
  web:
    source: azurerm_linux_web_app
    provider: azurerm
    version: "4.14.0"
    description: Web app
    deps: ["{region}.rg", "eastus2.dns"]
architecture:
  regions:
    eastus2:
      - component: rg
      - component: dns
    westus:
      - component: rg
      - component: web
        apps: [api]
"#;

const EDGE_STACK: &str = r#"
stack: { name: edge, version: 1.0.0, description: Edge plan }
components:
  resource_group: { source: azurerm_resource_group, provider: azurerm, version: "4.14.0", description: Resource group }
  plan:
    source: azurerm_service_plan
    provider: azurerm
    version: "4.14.0"
    description: App service plan
    deps: ["{region}.resource_group"]
architecture:
  regions:
    westus:
      - component: resource_group
      - component: plan
"#;

const CYCLIC_EDGE_STACK: &str = r#"
stack: { name: edge, version: 1.0.0, description: Cyclic }
components:
  x: { source: azurerm_resource_group, provider: azurerm, version: "4", description: d, deps: ["{region}.y"] }
  y: { source: azurerm_resource_group, provider: azurerm, version: "4", description: d, deps: ["{region}.x"] }
architecture:
  regions:
    westus:
      - component: x
      - component: y
"#;

fn multi_stacks(edge: &str) -> BTreeMap<String, Vec<u8>> {
    BTreeMap::from([
        ("edge".to_string(), edge.as_bytes().to_vec()),
        ("main".to_string(), MAIN_STACK.as_bytes().to_vec()),
    ])
}

fn multi_project() -> LoadedConfig {
    ConfigLoader::load(MULTI_TOPOLOGY.as_bytes(), &multi_stacks(EDGE_STACK)).unwrap()
}

#[test]
fn test_multi_stack_tree_emits_shared_files_once() {
    let dir = tempdir().unwrap();
    let out = dir.path().join(".infra");
    let loaded = multi_project();

    let report = Generator::new(&out)
        .generate(&loaded.topology, &loaded.stacks)
        .unwrap();

    // main in alpha/dev (4 units), edge in alpha/prod and beta/dev (2 units each)
    assert_eq!(report.units, 8);

    let paths: BTreeSet<&Path> = report.files.iter().map(|f| f.path.as_path()).collect();
    assert_eq!(paths.len(), report.files.len(), "a file was emitted twice");

    let descriptors = |name: &str| -> Vec<String> {
        report
            .files
            .iter()
            .filter(|f| f.path.file_name().is_some_and(|n| n == name))
            .map(|f| f.path.to_string_lossy().replace('\\', "/"))
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect()
    };
    assert_eq!(descriptors("subscription.hcl"), vec!["alpha/subscription.hcl", "beta/subscription.hcl"]);
    assert_eq!(
        descriptors("region.hcl"),
        vec!["alpha/eastus2/region.hcl", "alpha/westus/region.hcl", "beta/westus/region.hcl"]
    );
    assert_eq!(descriptors("environment.hcl").len(), 4);
    assert!(out.join("alpha/westus/prod/environment.hcl").is_file());

    assert_eq!(
        descriptors("component.hcl"),
        vec![
            "_components/edge/plan/component.hcl",
            "_components/edge/resource_group/component.hcl",
            "_components/main/dns/component.hcl",
            "_components/main/rg/component.hcl",
            "_components/main/web/component.hcl",
        ]
    );
    assert!(!out.join("_components/main/plan").exists());

    // root, 2 subscriptions, 3 regions, 4 environments, 5 templates of 5 files, 8 units
    assert_eq!(report.files.len(), 1 + 2 + 3 + 4 + 25 + 8);
}

#[test]
fn test_cross_region_dependency_path() {
    let dir = tempdir().unwrap();
    let out = dir.path().join(".infra");
    let loaded = multi_project();
    Generator::new(&out)
        .generate(&loaded.topology, &loaded.stacks)
        .unwrap();

    let api = fs::read_to_string(out.join("alpha/westus/dev/web/api").join(UNIT_FILE)).unwrap();
    assert!(api.contains("dependency \"eastus2_dns\" {\n  config_path = \"../../../../eastus2/dev/dns\""));
    assert!(api.contains("dependency \"rg\" {\n  config_path = \"../../rg\""));
    assert!(api
        .lines()
        .any(|line| line.split_whitespace().eq(["location", "=", "\"westus\""])));
}

#[test]
fn test_dependency_labels_do_not_shadow_inputs() {
    let dir = tempdir().unwrap();
    let out = dir.path().join(".infra");
    let loaded = multi_project();
    Generator::new(&out)
        .generate(&loaded.topology, &loaded.stacks)
        .unwrap();

    let variables = fs::read_to_string(out.join("_components/edge/plan/variables.tf")).unwrap();
    assert_eq!(variables.matches("variable \"resource_group_name\"").count(), 1);
    assert!(variables.contains("variable \"resource_group_2_name\""));

    let plan = fs::read_to_string(out.join("beta/westus/dev/plan").join(UNIT_FILE)).unwrap();
    let inputs = &plan[plan.find("inputs = {").unwrap()..];
    let pairs: Vec<(&str, &str)> = inputs
        .lines()
        .skip(1)
        .filter_map(|line| line.split_once(" = "))
        .map(|(key, value)| (key.trim(), value.trim()))
        .collect();
    let keys: BTreeSet<&str> = pairs.iter().map(|(key, _)| *key).collect();
    assert_eq!(keys.len(), pairs.len(), "{pairs:?}");
    assert!(plan.contains("dependency \"resource_group_2\" {"));
    assert!(pairs.contains(&("resource_group_name", "dependency.resource_group_2.outputs.name")));
    assert!(pairs.contains(&("resource_group_2_id", "dependency.resource_group_2.outputs.id")));
}

#[test]
fn test_cyclic_stack_writes_nothing() {
    let dir = tempdir().unwrap();
    let out = dir.path().join(".infra");
    let pipelines = dir.path().join(".azuredevops");
    let (topology, stacks) =
        ConfigLoader::decode(MULTI_TOPOLOGY.as_bytes(), &multi_stacks(CYCLIC_EDGE_STACK)).unwrap();

    let err = Generator::new(&out).generate(&topology, &stacks).unwrap_err();
    assert!(matches!(err, ScaffoldError::Graph(GraphError::Cycle { .. })));
    assert!(!out.exists());

    let err = PipelineGenerator::new(&pipelines, ProjectLayout::OUTPUT_DIR)
        .generate(&topology, &stacks)
        .unwrap_err();
    assert!(matches!(err, ScaffoldError::Graph(GraphError::Cycle { .. })));
    assert!(!pipelines.exists());
}
