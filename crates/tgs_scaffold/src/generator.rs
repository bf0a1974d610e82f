//! Terragrunt tree generation.
//!
//! The walk visits subscriptions (sorted), their environments (declared
//! order), the regions of each environment's stack (sorted), the components
//! placed in a region (declared order) and finally the apps of each placement.
//! Every unit gets a `terragrunt.hcl`; shared component templates and
//! hierarchy descriptors are emitted once per distinct directory.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use tgs_config::{
    Component, ConfigError, DependencyPattern, Environment, StackConfig, Subscription,
    TopologyConfig, UnitId,
};
use tgs_graph::{DependencyGraph, GraphError};
use tgs_naming::paths::{
    component_dir, environment_dir, region_dir, relative_path, subscription_dir, to_slash, unit_dir,
};
use tgs_naming::{NamingContext, NamingEngine, DEFAULT_FORMAT};

use crate::error::{ScaffoldError, ScaffoldResult};
use crate::schema::{NoSchema, ResourceSchema, SchemaCache, SchemaSource, RESOURCE_GROUP_TYPE};
use crate::templates::{
    render_environment, render_region, render_root, render_subscription, render_unit,
    ComponentTemplate, DependencyBlock, EnvironmentDescriptor, RegionDescriptor,
    SubscriptionDescriptor, UnitConfig,
};
use crate::writer::{FileAction, FileRecord, TreeWriter, WriteMode};

/// Name of the per-unit configuration file.
pub const UNIT_FILE: &str = "terragrunt.hcl";

/// Outcome of a generation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationReport {
    pub files: Vec<FileRecord>,
    /// Units rendered, counted once per environment.
    pub units: usize,
    pub dry_run: bool,
}

impl GenerationReport {
    pub fn count(&self, action: FileAction) -> usize {
        self.files.iter().filter(|file| file.action == action).count()
    }

    /// Whether the run left every file as it was.
    pub fn is_unchanged(&self) -> bool {
        self.files.iter().all(|file| !file.action.is_change())
    }

    pub fn changed(&self) -> impl Iterator<Item = &FileRecord> {
        self.files.iter().filter(|file| file.action.is_change())
    }
}

/// Generates the Terragrunt tree under an output root.
#[derive(Clone)]
pub struct Generator {
    output_root: PathBuf,
    dry_run: bool,
    cancel: Arc<AtomicBool>,
    schema: Arc<dyn SchemaSource>,
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("output_root", &self.output_root)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

impl Generator {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            dry_run: false,
            cancel: Arc::new(AtomicBool::new(false)),
            schema: Arc::new(NoSchema),
        }
    }

    /// Record actions without writing anything.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Share a cancellation flag; the run stops before the next unit once it is set.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_schema(mut self, schema: Arc<dyn SchemaSource>) -> Self {
        self.schema = schema;
        self
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Generate the tree for a validated topology and its stacks.
    pub fn generate(
        &self,
        topology: &TopologyConfig,
        stacks: &BTreeMap<String, StackConfig>,
    ) -> ScaffoldResult<GenerationReport> {
        info!(
            "Generating '{}' into {:?}{}",
            topology.name,
            self.output_root,
            if self.dry_run { " (dry run)" } else { "" }
        );

        // Every graph is built before the first write so a cyclic stack leaves the tree untouched
        let graphs = build_graphs(topology, stacks)?;

        let mut run = Run {
            topology,
            writer: TreeWriter::new(&self.output_root, self.dry_run),
            naming: NamingEngine::new(&topology.naming),
            schemas: SchemaCache::new(self.schema.as_ref()),
            cancel: &self.cancel,
            graphs,
            emitted: BTreeSet::new(),
            units: 0,
        };

        run.writer.write(Path::new("root.hcl"), &render_root(), WriteMode::Managed)?;

        for (name, subscription) in &topology.subscriptions {
            run.subscription(name, subscription, stacks)?;
        }

        let report = GenerationReport {
            units: run.units,
            dry_run: self.dry_run,
            files: run.writer.into_records(),
        };

        info!(
            "Generated {} unit(s): {} created, {} updated, {} unchanged, {} preserved",
            report.units,
            report.count(FileAction::Create),
            report.count(FileAction::Update),
            report.count(FileAction::Unchanged),
            report.count(FileAction::Preserved)
        );
        Ok(report)
    }
}

/// State of a single generation run.
struct Run<'a> {
    topology: &'a TopologyConfig,
    writer: TreeWriter,
    naming: NamingEngine,
    schemas: SchemaCache<'a>,
    cancel: &'a AtomicBool,
    graphs: BTreeMap<String, DependencyGraph>,
    /// Files already emitted in this run.
    emitted: BTreeSet<PathBuf>,
    units: usize,
}

impl<'a> Run<'a> {
    /// Write a file once per run.
    fn emit_once(&mut self, path: PathBuf, content: impl FnOnce() -> String, mode: WriteMode) -> ScaffoldResult<()> {
        if self.emitted.insert(path.clone()) {
            self.writer.write(&path, &content(), mode)?;
        }
        Ok(())
    }

    fn subscription(
        &mut self,
        name: &str,
        subscription: &Subscription,
        stacks: &BTreeMap<String, StackConfig>,
    ) -> ScaffoldResult<()> {
        let topology = self.topology;
        let descriptor = SubscriptionDescriptor {
            project: &topology.name,
            name,
            remote_state: &subscription.remote_state,
            tags: self.tags(&[("project", &topology.name), ("subscription", name)]),
        };
        self.emit_once(
            subscription_dir(name).join("subscription.hcl"),
            || render_subscription(&descriptor),
            WriteMode::Managed,
        )?;

        for environment in &subscription.environments {
            let stack_name = environment.stack_name();
            let stack = stacks
                .get(stack_name)
                .ok_or_else(|| ConfigError::StackNotFound(stack_name.to_string()))?;
            self.environment(name, environment, stack_name, stack)?;
        }
        Ok(())
    }

    fn environment(
        &mut self,
        subscription: &str,
        environment: &Environment,
        stack_name: &str,
        stack: &StackConfig,
    ) -> ScaffoldResult<()> {
        let topology = self.topology;

        for (region, placements) in &stack.architecture.regions {
            let region_descriptor = RegionDescriptor {
                name: region,
                abbreviation: self.naming.region_abbreviation(region),
                tags: self.tags(&[
                    ("project", &topology.name),
                    ("subscription", subscription),
                    ("region", region),
                ]),
            };
            self.emit_once(
                region_dir(subscription, region).join("region.hcl"),
                || render_region(&region_descriptor),
                WriteMode::Managed,
            )?;

            let environment_descriptor = EnvironmentDescriptor {
                name: &environment.name,
                abbreviation: self.naming.environment_abbreviation(&environment.name),
                stack: stack_name,
                naming_format: topology.naming.format.as_deref().unwrap_or(DEFAULT_FORMAT),
                tags: self.tags(&[
                    ("project", &topology.name),
                    ("subscription", subscription),
                    ("region", region),
                    ("environment", &environment.name),
                    ("stack", stack_name),
                ]),
            };
            self.emit_once(
                environment_dir(subscription, region, &environment.name).join("environment.hcl"),
                || render_environment(&environment_descriptor),
                WriteMode::Managed,
            )?;

            for placement in placements {
                let component = stack.component(&placement.component).ok_or_else(|| {
                    ScaffoldError::UnknownComponent {
                        stack: stack_name.to_string(),
                        component: placement.component.clone(),
                    }
                })?;
                self.component_template(stack_name, &placement.component, component)?;

                for unit in placement.instances(region) {
                    if self.cancel.load(Ordering::SeqCst) {
                        info!("Generation cancelled before {}", unit);
                        return Err(ScaffoldError::Cancelled);
                    }
                    self.unit(subscription, &environment.name, stack_name, stack, &unit, component)?;
                }
            }
        }
        Ok(())
    }

    /// Shared template files of a component, once per stack and component.
    fn component_template(&mut self, stack: &str, name: &str, component: &Component) -> ScaffoldResult<()> {
        let dir = component_dir(stack, name);
        if self.emitted.contains(&dir) {
            return Ok(());
        }
        self.emitted.insert(dir.clone());

        let schema = self.schemas.get(&component.source);
        let labels = dependency_labels(name, component, &reserved_inputs(&schema))?;
        let template = ComponentTemplate {
            stack,
            name,
            component,
            schema,
            dependency_labels: labels.into_iter().map(|(_, label)| label).collect(),
        };

        let files = [
            ("component.hcl", template.render_component_hcl(), WriteMode::Managed),
            ("main.tf", template.render_main_tf(), WriteMode::ScaffoldOnce),
            ("variables.tf", template.render_variables_tf(), WriteMode::ScaffoldOnce),
            ("outputs.tf", template.render_outputs_tf(), WriteMode::ScaffoldOnce),
            ("provider.tf", template.render_provider_tf(), WriteMode::ScaffoldOnce),
        ];
        for (file, content, mode) in files {
            self.writer.write(&dir.join(file), &content, mode)?;
        }
        Ok(())
    }

    fn unit(
        &mut self,
        subscription: &str,
        environment: &str,
        stack_name: &str,
        stack: &StackConfig,
        unit: &UnitId,
        component: &Component,
    ) -> ScaffoldResult<()> {
        let dir = unit_dir(subscription, environment, unit);
        let schema = self.schemas.get(&component.source);
        let labels = dependency_labels(&unit.component, component, &reserved_inputs(&schema))?;

        let graph = self
            .graphs
            .get(stack_name)
            .ok_or_else(|| ConfigError::StackNotFound(stack_name.to_string()))?;

        let dependencies = graph
            .dependency_edges_of(unit)
            .into_iter()
            .map(|edge| DependencyBlock {
                label: label_for(&labels, &edge.pattern),
                config_path: to_slash(&relative_path(&dir, &unit_dir(subscription, environment, &edge.target))),
                location: edge.target.region.clone(),
                provides_resource_group: stack
                    .component(&edge.target.component)
                    .is_some_and(|target| target.source == RESOURCE_GROUP_TYPE),
            })
            .collect();

        let name = self.naming.name(&NamingContext {
            project: &self.topology.name,
            region: &unit.region,
            environment,
            component: &unit.component,
            app: unit.app(),
            resource_type: &component.source,
        })?;

        let config = UnitConfig {
            component_hcl: to_slash(
                &relative_path(&dir, &component_dir(stack_name, &unit.component)).join("component.hcl"),
            ),
            name,
            location: &unit.region,
            app: unit.app(),
            dependencies,
        };

        debug!("Rendering {} for {}/{}", unit, subscription, environment);
        self.writer
            .write(&dir.join(UNIT_FILE), &render_unit(&config), WriteMode::Managed)?;
        self.units += 1;
        Ok(())
    }

    /// Topology tags merged with level tags; level tags win.
    fn tags(&self, level: &[(&str, &str)]) -> BTreeMap<String, String> {
        let mut tags = self.topology.tags.clone();
        for (key, value) in level {
            tags.insert(key.to_string(), value.to_string());
        }
        tags
    }
}

/// Dependency graphs of every stack an environment deploys, keyed by stack name.
pub(crate) fn build_graphs(
    topology: &TopologyConfig,
    stacks: &BTreeMap<String, StackConfig>,
) -> ScaffoldResult<BTreeMap<String, DependencyGraph>> {
    let mut graphs = BTreeMap::new();
    for stack_name in topology.referenced_stacks() {
        let stack = stacks
            .get(stack_name)
            .ok_or_else(|| ConfigError::StackNotFound(stack_name.to_string()))?;
        graphs.insert(stack_name.to_string(), DependencyGraph::build(stack)?);
    }
    Ok(graphs)
}

/// Input names a unit sets regardless of its dependencies.
const FIXED_INPUTS: &[&str] = &["name", "location", "app", "tags", "resource_group_name"];

/// Variable and input names dependency labels must not shadow.
pub fn reserved_inputs(schema: &ResourceSchema) -> BTreeSet<String> {
    FIXED_INPUTS
        .iter()
        .map(|name| name.to_string())
        .chain(schema.variables().map(|attr| attr.name.clone()))
        .collect()
}

/// Labels of a component's dependencies in declaration order, as
/// `(normalized notation, label)` pairs unique within the component.
///
/// Notations that would share a label, or whose `<label>_id` / `<label>_name`
/// inputs would clash with a `reserved` name, get a numeric suffix.
pub fn dependency_labels(
    name: &str,
    component: &Component,
    reserved: &BTreeSet<String>,
) -> ScaffoldResult<Vec<(String, String)>> {
    let mut used: BTreeSet<String> = BTreeSet::new();
    let mut ordered: Vec<(String, String)> = Vec::new();

    for notation in &component.deps {
        let pattern = DependencyPattern::parse(notation).map_err(|source| GraphError::Notation {
            component: name.to_string(),
            source,
        })?;
        let key = pattern.to_string();
        if ordered.iter().any(|(existing, _)| existing == &key) {
            continue;
        }

        let base = pattern.label();
        let mut label = base.clone();
        let mut suffix = 2;
        let clashes = |label: &str| {
            reserved.contains(&format!("{}_id", label)) || reserved.contains(&format!("{}_name", label))
        };
        while clashes(&label) || !used.insert(label.clone()) {
            label = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        ordered.push((key, label));
    }

    Ok(ordered)
}

fn label_for(labels: &[(String, String)], pattern: &DependencyPattern) -> String {
    let key = pattern.to_string();
    labels
        .iter()
        .find(|(notation, _)| notation == &key)
        .map(|(_, label)| label.clone())
        .unwrap_or_else(|| pattern.label())
}
