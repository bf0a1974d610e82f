//! HCL and Terraform renderers for the generated tree.
//!
//! Every renderer is a pure function of its inputs so regenerating an
//! unchanged project yields byte-identical files.

use std::collections::BTreeMap;

use tgs_config::{Component, RemoteState};

use crate::schema::{ResourceSchema, RESOURCE_GROUP_TYPE};

/// Header of files that are regenerated on every run.
pub const MANAGED_HEADER: &str = "# Generated by tgs. Manual changes are overwritten on the next run.\n";

/// Header of files written once and then owned by the user.
pub const SCAFFOLD_HEADER: &str = "# Scaffolded by tgs. This file is yours to edit; tgs will not overwrite it.\n";

/// Commands allowed to run against mocked dependency outputs.
const MOCK_COMMANDS: &str = r#"["init", "validate", "plan"]"#;

/// Quote a value as an HCL string literal.
pub fn hcl_string(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace("${", "$${")
        .replace("%{", "%%{");
    format!("\"{}\"", escaped)
}

/// Render `key = value` lines with aligned equals signs.
fn attributes(pairs: &[(String, String)], indent: usize) -> String {
    let width = pairs.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let pad = " ".repeat(indent);
    pairs
        .iter()
        .map(|(key, value)| format!("{pad}{key:<width$} = {value}\n"))
        .collect()
}

fn hcl_map(map: &BTreeMap<String, String>, indent: usize) -> String {
    if map.is_empty() {
        return "{}".to_string();
    }
    let pairs: Vec<(String, String)> = map
        .iter()
        .map(|(key, value)| (hcl_string(key), hcl_string(value)))
        .collect();
    format!("{{\n{}{}}}", attributes(&pairs, indent + 2), " ".repeat(indent))
}

fn pair(key: &str, value: String) -> (String, String) {
    (key.to_string(), value)
}

/// Root configuration shared by every unit through `include "root"`.
pub fn render_root() -> String {
    format!(
        r#"{header}
locals {{
  subscription = read_terragrunt_config(find_in_parent_folders("subscription.hcl"))
}}

remote_state {{
  backend = "azurerm"

  generate = {{
    path      = "backend.tf"
    if_exists = "overwrite_terragrunt"
  }}

  config = {{
    resource_group_name  = local.subscription.locals.remote_state_resource_group
    storage_account_name = local.subscription.locals.remote_state_account
    container_name       = local.subscription.locals.remote_state_container
    key                  = "${{path_relative_to_include()}}/terraform.tfstate"
  }}
}}
"#,
        header = MANAGED_HEADER
    )
}

/// Subscription-level descriptor.
#[derive(Debug, Clone)]
pub struct SubscriptionDescriptor<'a> {
    pub project: &'a str,
    pub name: &'a str,
    pub remote_state: &'a RemoteState,
    pub tags: BTreeMap<String, String>,
}

pub fn render_subscription(descriptor: &SubscriptionDescriptor<'_>) -> String {
    let locals = attributes(
        &[
            pair("project", hcl_string(descriptor.project)),
            pair("subscription", hcl_string(descriptor.name)),
            pair("remote_state_account", hcl_string(&descriptor.remote_state.name)),
            pair(
                "remote_state_resource_group",
                hcl_string(&descriptor.remote_state.resource_group),
            ),
            pair("remote_state_container", hcl_string(descriptor.remote_state.container())),
        ],
        2,
    );

    format!(
        "{}\nlocals {{\n{}\n  tags = {}\n}}\n",
        MANAGED_HEADER,
        locals,
        hcl_map(&descriptor.tags, 2)
    )
}

/// Region-level descriptor.
#[derive(Debug, Clone)]
pub struct RegionDescriptor<'a> {
    pub name: &'a str,
    pub abbreviation: String,
    pub tags: BTreeMap<String, String>,
}

pub fn render_region(descriptor: &RegionDescriptor<'_>) -> String {
    let locals = attributes(
        &[
            pair("region", hcl_string(descriptor.name)),
            pair("region_abbreviation", hcl_string(&descriptor.abbreviation)),
        ],
        2,
    );

    format!(
        "{}\nlocals {{\n{}\n  tags = {}\n}}\n",
        MANAGED_HEADER,
        locals,
        hcl_map(&descriptor.tags, 2)
    )
}

/// Environment-level descriptor. One per subscription, region and environment.
#[derive(Debug, Clone)]
pub struct EnvironmentDescriptor<'a> {
    pub name: &'a str,
    pub abbreviation: String,
    pub stack: &'a str,
    pub naming_format: &'a str,
    pub tags: BTreeMap<String, String>,
}

pub fn render_environment(descriptor: &EnvironmentDescriptor<'_>) -> String {
    let locals = attributes(
        &[
            pair("environment", hcl_string(descriptor.name)),
            pair("environment_abbreviation", hcl_string(&descriptor.abbreviation)),
            pair("stack", hcl_string(descriptor.stack)),
            pair("naming_format", hcl_string(descriptor.naming_format)),
        ],
        2,
    );

    format!(
        "{}\nlocals {{\n{}\n  tags = {}\n}}\n",
        MANAGED_HEADER,
        locals,
        hcl_map(&descriptor.tags, 2)
    )
}

/// Shared template of a component inside a stack.
#[derive(Debug, Clone)]
pub struct ComponentTemplate<'a> {
    pub stack: &'a str,
    pub name: &'a str,
    pub component: &'a Component,
    pub schema: ResourceSchema,
    /// Labels of the component's dependencies, in declaration order.
    pub dependency_labels: Vec<String>,
}

impl ComponentTemplate<'_> {
    fn resource(&self) -> String {
        format!("{}.this", self.component.source)
    }

    pub fn render_component_hcl(&self) -> String {
        let locals = attributes(
            &[
                pair("stack", hcl_string(self.stack)),
                pair("component", hcl_string(self.name)),
                pair("resource_type", hcl_string(&self.component.source)),
                pair("provider", hcl_string(&self.component.provider)),
                pair("provider_version", hcl_string(&self.component.version)),
                pair("description", hcl_string(&self.component.description)),
            ],
            2,
        );

        format!(
            r#"{header}
locals {{
{locals}}}

terraform {{
  source = "${{get_parent_terragrunt_dir("root")}}/_components/{stack}/{name}"
}}
"#,
            header = MANAGED_HEADER,
            locals = locals,
            stack = self.stack,
            name = self.name,
        )
    }

    pub fn render_main_tf(&self) -> String {
        let pairs: Vec<(String, String)> = self
            .schema
            .variables()
            .map(|attr| (attr.name.clone(), format!("var.{}", attr.name)))
            .collect();

        format!(
            "{}# {}\n\nresource \"{}\" \"this\" {{\n{}}}\n",
            SCAFFOLD_HEADER,
            self.component.description,
            self.component.source,
            attributes(&pairs, 2)
        )
    }

    pub fn render_variables_tf(&self) -> String {
        let mut blocks = Vec::new();

        for attr in self.schema.variables().filter(|attr| attr.name != "tags") {
            let description = attr
                .description
                .clone()
                .unwrap_or_else(|| format!("Value of the {} argument", attr.name));
            blocks.push(variable_block(&attr.name, &description, &attr.type_expr, None));
        }

        blocks.push(variable_block(
            "app",
            "Application instance name, if any",
            "string",
            Some("null"),
        ));
        blocks.push(variable_block("tags", "Tags applied to the resource", "map(string)", Some("{}")));

        for label in &self.dependency_labels {
            blocks.push(variable_block(
                &format!("{}_id", label),
                &format!("ID of the {} dependency", label),
                "string",
                Some("null"),
            ));
            blocks.push(variable_block(
                &format!("{}_name", label),
                &format!("Name of the {} dependency", label),
                "string",
                Some("null"),
            ));
        }

        format!("{}\n{}", SCAFFOLD_HEADER, blocks.join("\n"))
    }

    pub fn render_outputs_tf(&self) -> String {
        let resource = self.resource();
        let mut outputs = vec![
            ("id", format!("{}.id", resource)),
            ("name", format!("{}.name", resource)),
        ];
        if self.schema.has("location") {
            outputs.push(("location", format!("{}.location", resource)));
        }
        if self.component.source == RESOURCE_GROUP_TYPE {
            outputs.push(("resource_group_name", format!("{}.name", resource)));
        } else if self.schema.has("resource_group_name") {
            outputs.push(("resource_group_name", format!("{}.resource_group_name", resource)));
        }

        let blocks: Vec<String> = outputs
            .into_iter()
            .map(|(name, value)| format!("output \"{}\" {{\n  value = {}\n}}\n", name, value))
            .collect();

        format!("{}\n{}", SCAFFOLD_HEADER, blocks.join("\n"))
    }

    pub fn render_provider_tf(&self) -> String {
        let provider = &self.component.provider;
        let body = if provider == "azurerm" { "\n  features {}\n" } else { "" };

        format!(
            r#"{header}
terraform {{
  required_providers {{
    {provider} = {{
      source  = "hashicorp/{provider}"
      version = "{version}"
    }}
  }}
}}

provider "{provider}" {{{body}}}
"#,
            header = SCAFFOLD_HEADER,
            provider = provider,
            version = self.component.version,
            body = body,
        )
    }
}

fn variable_block(name: &str, description: &str, type_expr: &str, default: Option<&str>) -> String {
    let mut pairs = vec![
        pair("description", hcl_string(description)),
        pair("type", type_expr.to_string()),
    ];
    if let Some(default) = default {
        pairs.push(pair("default", default.to_string()));
    }
    format!("variable \"{}\" {{\n{}}}\n", name, attributes(&pairs, 2))
}

/// A `dependency` block of a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyBlock {
    pub label: String,
    /// Relative path from the unit directory to the dependency's directory.
    pub config_path: String,
    pub location: String,
    /// The dependency is a resource group whose name feeds `resource_group_name`.
    pub provides_resource_group: bool,
}

/// Inputs of a unit's `terragrunt.hcl`.
#[derive(Debug, Clone)]
pub struct UnitConfig<'a> {
    /// Path to the shared `component.hcl`, relative to the unit directory.
    pub component_hcl: String,
    pub name: String,
    pub location: &'a str,
    pub app: Option<&'a str>,
    pub dependencies: Vec<DependencyBlock>,
}

pub fn render_unit(unit: &UnitConfig<'_>) -> String {
    let mut out = format!(
        r#"{header}
include "root" {{
  path = find_in_parent_folders("root.hcl")
}}

include "component" {{
  path   = "${{get_terragrunt_dir()}}/{component}"
  expose = true
}}

include "environment" {{
  path   = find_in_parent_folders("environment.hcl")
  expose = true
}}

include "region" {{
  path   = find_in_parent_folders("region.hcl")
  expose = true
}}
"#,
        header = MANAGED_HEADER,
        component = unit.component_hcl,
    );

    for dep in &unit.dependencies {
        let mocks = attributes(
            &[
                pair("id", hcl_string(&format!("mock-{}-id", dep.label))),
                pair("name", hcl_string(&format!("mock-{}", dep.label))),
                pair("location", hcl_string(&dep.location)),
                pair("resource_group_name", hcl_string("mock-resource-group")),
            ],
            4,
        );
        out.push_str(&format!(
            r#"
dependency "{label}" {{
  config_path = "{path}"

  mock_outputs = {{
{mocks}  }}
  mock_outputs_allowed_terraform_commands = {commands}
}}
"#,
            label = dep.label,
            path = dep.config_path,
            mocks = mocks,
            commands = MOCK_COMMANDS,
        ));
    }

    let mut inputs = vec![
        pair("name", hcl_string(&unit.name)),
        pair("location", hcl_string(unit.location)),
    ];
    if let Some(app) = unit.app {
        inputs.push(pair("app", hcl_string(app)));
    }
    if let Some(group) = unit.dependencies.iter().find(|dep| dep.provides_resource_group) {
        inputs.push(pair(
            "resource_group_name",
            format!("dependency.{}.outputs.name", group.label),
        ));
    }
    for dep in &unit.dependencies {
        inputs.push((format!("{}_id", dep.label), format!("dependency.{}.outputs.id", dep.label)));
        inputs.push((format!("{}_name", dep.label), format!("dependency.{}.outputs.name", dep.label)));
    }
    inputs.push(pair("tags", "include.environment.locals.tags".to_string()));

    out.push_str(&format!("\ninputs = {{\n{}}}\n", attributes(&inputs, 2)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component() -> Component {
        Component {
            source: "azurerm_service_plan".to_string(),
            provider: "azurerm".to_string(),
            version: "4.14.0".to_string(),
            description: "App service plan".to_string(),
            deps: vec!["{region}.rg".to_string()],
        }
    }

    #[test]
    fn test_hcl_string_escapes_interpolation() {
        assert_eq!(hcl_string(r#"a "b" ${c}"#), r#""a \"b\" $${c}""#);
    }

    #[test]
    fn test_attributes_are_aligned() {
        let rendered = attributes(&[pair("a", "1".into()), pair("long", "2".into())], 2);
        assert_eq!(rendered, "  a    = 1\n  long = 2\n");
    }

    #[test]
    fn test_component_files() {
        let component = component();
        let template = ComponentTemplate {
            stack: "main",
            name: "plan",
            component: &component,
            schema: ResourceSchema::minimal(&component.source),
            dependency_labels: vec!["rg".to_string()],
        };

        let hcl = template.render_component_hcl();
        assert!(hcl.contains(r#"source = "${get_parent_terragrunt_dir("root")}/_components/main/plan""#));

        let main = template.render_main_tf();
        assert!(main.contains("resource \"azurerm_service_plan\" \"this\" {"));
        assert!(main.contains("  resource_group_name = var.resource_group_name\n"));

        let variables = template.render_variables_tf();
        assert!(variables.contains("variable \"rg_id\" {"));
        assert!(variables.contains("variable \"resource_group_name\" {"));

        let outputs = template.render_outputs_tf();
        assert!(outputs.contains("value = azurerm_service_plan.this.resource_group_name"));

        assert!(template.render_provider_tf().contains("features {}"));
    }

    #[test]
    fn test_unit_without_dependencies() {
        let rendered = render_unit(&UnitConfig {
            component_hcl: "../../../../_components/main/rg/component.hcl".to_string(),
            name: "CUSTTP-e2d-rg".to_string(),
            location: "eastus2",
            app: None,
            dependencies: Vec::new(),
        });

        assert!(rendered.contains("include \"root\" {"));
        assert!(!rendered.contains("dependency \""));
        assert!(rendered.contains("  name     = \"CUSTTP-e2d-rg\"\n"));
        assert!(!rendered.contains("app "));
    }

    #[test]
    fn test_unit_dependency_blocks_and_inputs() {
        let rendered = render_unit(&UnitConfig {
            component_hcl: "../../../../../_components/main/webapp/component.hcl".to_string(),
            name: "CUSTTP-e2d-app-api".to_string(),
            location: "eastus2",
            app: Some("api"),
            dependencies: vec![
                DependencyBlock {
                    label: "plan".to_string(),
                    config_path: "../../plan".to_string(),
                    location: "eastus2".to_string(),
                    provides_resource_group: false,
                },
                DependencyBlock {
                    label: "rg".to_string(),
                    config_path: "../../rg".to_string(),
                    location: "eastus2".to_string(),
                    provides_resource_group: true,
                },
            ],
        });

        assert!(rendered.contains("dependency \"rg\" {\n  config_path = \"../../rg\""));
        assert!(rendered.contains("mock_outputs_allowed_terraform_commands = [\"init\", \"validate\", \"plan\"]"));
        assert!(rendered.contains("resource_group_name = dependency.rg.outputs.name"));
        assert!(rendered.contains("plan_id             = dependency.plan.outputs.id"));
        assert!(rendered.contains("app                 = \"api\""));
    }
}
