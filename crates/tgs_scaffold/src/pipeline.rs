//! Azure DevOps pipeline generation.
//!
//! One pipeline per subscription and environment. Each dependency stage of the
//! environment's stack becomes a pipeline stage with one job per unit.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use tgs_config::{ConfigError, StackConfig, TopologyConfig};
use tgs_graph::{order_for_pipeline, DependencyGraph};
use tgs_naming::paths::{to_slash, unit_dir};

use crate::error::ScaffoldResult;
use crate::generator::build_graphs;
use crate::writer::{FileRecord, TreeWriter, WriteMode};

/// Step template shared by every pipeline, relative to the pipeline directory.
pub const DEPLOY_TEMPLATE: &str = "templates/deploy-unit.yml";

const DEPLOY_TEMPLATE_BODY: &str = r#"# Generated by tgs. Manual changes are overwritten on the next run.
parameters:
  - name: workingDirectory
    type: string
  - name: serviceConnection
    type: string
  - name: dependencies
    type: string
    default: ''

steps:
  - checkout: self

  - script: echo "Deploying $(System.JobName) after: ${{ parameters.dependencies }}"
    displayName: Show dependencies

  - task: AzureCLI@2
    displayName: Terragrunt apply
    inputs:
      azureSubscription: ${{ parameters.serviceConnection }}
      scriptType: bash
      scriptLocation: inlineScript
      addSpnToEnvironment: true
      workingDirectory: ${{ parameters.workingDirectory }}
      inlineScript: |
        export ARM_CLIENT_ID="$servicePrincipalId"
        export ARM_CLIENT_SECRET="$servicePrincipalKey"
        export ARM_TENANT_ID="$tenantId"
        export ARM_SUBSCRIPTION_ID="$(az account show --query id -o tsv)"
        terragrunt apply -auto-approve --terragrunt-non-interactive
"#;

const HEADER: &str = "# Generated by tgs. Manual changes are overwritten on the next run.\n";

#[derive(Debug, Serialize)]
struct PipelineDocument {
    name: String,
    trigger: String,
    stages: Vec<PipelineStage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PipelineStage {
    stage: String,
    display_name: String,
    depends_on: Vec<String>,
    jobs: Vec<PipelineJob>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PipelineJob {
    job: String,
    display_name: String,
    steps: Vec<TemplateStep>,
}

#[derive(Debug, Serialize)]
struct TemplateStep {
    template: String,
    parameters: BTreeMap<String, String>,
}

/// Writes the pipeline directory of a project.
#[derive(Debug, Clone)]
pub struct PipelineGenerator {
    pipeline_root: PathBuf,
    /// Generated tree location relative to the repository root.
    infra_dir: String,
    dry_run: bool,
}

impl PipelineGenerator {
    pub fn new(pipeline_root: impl Into<PathBuf>, infra_dir: impl Into<String>) -> Self {
        Self {
            pipeline_root: pipeline_root.into(),
            infra_dir: infra_dir.into(),
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Write the step template and one pipeline per subscription and environment.
    pub fn generate(
        &self,
        topology: &TopologyConfig,
        stacks: &BTreeMap<String, StackConfig>,
    ) -> ScaffoldResult<Vec<FileRecord>> {
        let graphs = build_graphs(topology, stacks)?;

        let mut writer = TreeWriter::new(&self.pipeline_root, self.dry_run);
        writer.write(Path::new(DEPLOY_TEMPLATE), DEPLOY_TEMPLATE_BODY, WriteMode::Managed)?;

        for (subscription, config) in &topology.subscriptions {
            for environment in &config.environments {
                let stack_name = environment.stack_name();
                let graph = graphs
                    .get(stack_name)
                    .ok_or_else(|| ConfigError::StackNotFound(stack_name.to_string()))?;

                let content = self.render(subscription, &environment.name, graph)?;
                let file = format!("{}-{}.yml", subscription, environment.name);
                writer.write(Path::new(&file), &content, WriteMode::Managed)?;
            }
        }

        info!(
            "Pipelines written to {:?} ({} file(s))",
            self.pipeline_root,
            writer.records().len()
        );
        Ok(writer.into_records())
    }

    /// Render the pipeline of one subscription and environment.
    pub fn render(&self, subscription: &str, environment: &str, graph: &DependencyGraph) -> ScaffoldResult<String> {
        let stages = order_for_pipeline(graph);

        let stages = stages
            .iter()
            .map(|stage| PipelineStage {
                stage: stage.name(),
                display_name: format!("Stage {}", stage.index),
                depends_on: stage
                    .prerequisites(graph)
                    .into_iter()
                    .map(|index| format!("stage_{}", index))
                    .collect(),
                jobs: stage
                    .units
                    .iter()
                    .map(|unit| {
                        let dependencies: Vec<String> =
                            graph.dependencies_of(unit).iter().map(|dep| dep.slug()).collect();
                        let directory = Path::new(&self.infra_dir).join(unit_dir(subscription, environment, unit));

                        PipelineJob {
                            job: unit.slug(),
                            display_name: unit.to_string(),
                            steps: vec![TemplateStep {
                                template: DEPLOY_TEMPLATE.to_string(),
                                parameters: BTreeMap::from([
                                    ("dependencies".to_string(), dependencies.join(",")),
                                    ("serviceConnection".to_string(), subscription.to_string()),
                                    ("workingDirectory".to_string(), to_slash(&directory)),
                                ]),
                            }],
                        }
                    })
                    .collect(),
            })
            .collect();

        let document = PipelineDocument {
            name: format!("{}-{}", subscription, environment),
            trigger: "none".to_string(),
            stages,
        };

        let yaml = serde_yaml::to_string(&document)?;
        Ok(format!("{}{}", HEADER, yaml))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tgs_config::{Component, RegionComponent};

    fn graph() -> DependencyGraph {
        let mut stack = StackConfig::default();
        stack.components.insert("rg".to_string(), Component::default());
        stack.components.insert(
            "plan".to_string(),
            Component {
                deps: vec!["{region}.rg".to_string()],
                ..Default::default()
            },
        );
        stack.architecture.regions.insert(
            "eastus2".to_string(),
            vec![RegionComponent::new("rg"), RegionComponent::new("plan")],
        );
        DependencyGraph::build(&stack).unwrap()
    }

    #[test]
    fn test_render_stages_and_jobs() {
        let generator = PipelineGenerator::new(".azuredevops", ".infra");
        let yaml = generator.render("default", "dev", &graph()).unwrap();

        let document: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        let stages = document["stages"].as_sequence().unwrap();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0]["stage"].as_str(), Some("stage_0"));
        assert!(stages[0]["dependsOn"].as_sequence().unwrap().is_empty());
        assert_eq!(stages[1]["dependsOn"][0].as_str(), Some("stage_0"));

        let job = &stages[1]["jobs"][0];
        assert_eq!(job["job"].as_str(), Some("eastus2_plan"));
        let params = &job["steps"][0]["parameters"];
        assert_eq!(params["dependencies"].as_str(), Some("eastus2_rg"));
        assert_eq!(
            params["workingDirectory"].as_str(),
            Some(".infra/default/eastus2/dev/plan")
        );
    }
}
