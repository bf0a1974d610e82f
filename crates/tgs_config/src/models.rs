//! Data models for topology and stack configuration.
//!
//! Every map is a `BTreeMap` so traversal is always in sorted key order.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stack used by environments that do not name one.
pub const DEFAULT_STACK: &str = "main";

/// Remote-state container used when a subscription does not name one.
pub const DEFAULT_STATE_CONTAINER: &str = "tfstate";

/// Tokens a naming format may reference, written as `{token}`.
pub const NAMING_TOKENS: &[&str] = &["project", "region", "env", "type", "component", "app"];

/// Project-wide deployment topology (`.tgs/config.yaml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TopologyConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subscriptions: BTreeMap<String, Subscription>,
    #[serde(default, skip_serializing_if = "NamingConfig::is_empty")]
    pub naming: NamingConfig,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl TopologyConfig {
    /// Names of every stack referenced by an environment, defaulted where absent.
    pub fn referenced_stacks(&self) -> BTreeSet<&str> {
        self.subscriptions
            .values()
            .flat_map(|sub| sub.environments.iter())
            .map(Environment::stack_name)
            .collect()
    }
}

/// A cloud subscription with its remote-state target and environments.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Subscription {
    #[serde(default)]
    pub remote_state: RemoteState,
    #[serde(default)]
    pub environments: Vec<Environment>,
}

/// Remote-state storage location.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RemoteState {
    /// Storage account name.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub resource_group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
}

impl RemoteState {
    pub fn container(&self) -> &str {
        self.container.as_deref().unwrap_or(DEFAULT_STATE_CONTAINER)
    }
}

/// A deployment environment inside a subscription.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Environment {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl Environment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stack: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// The stack this environment deploys.
    pub fn stack_name(&self) -> &str {
        self.stack.as_deref().unwrap_or(DEFAULT_STACK)
    }
}

/// Character set a resource name must satisfy after substitution.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Charset {
    /// Letters, digits and single hyphens; case preserved.
    #[default]
    AlphanumericHyphen,
    /// Lowercase letters and digits only.
    LowerAlphanumeric,
}

/// Naming rules for one resource type.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResourceTypeNaming {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abbreviation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charset: Option<Charset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

/// Naming convention section of the topology document.
///
/// Everything is optional; the naming engine supplies built-in tables and the
/// global default format.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NamingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub regions: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environments: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_length: Option<usize>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resource_types: BTreeMap<String, ResourceTypeNaming>,
    /// Component-level format overrides, keyed by component name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub components: BTreeMap<String, String>,
}

impl NamingConfig {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Every format string declared anywhere in the section, with its location.
    pub fn declared_formats(&self) -> Vec<(String, &str)> {
        let mut formats = Vec::new();
        if let Some(format) = &self.format {
            formats.push(("naming.format".to_string(), format.as_str()));
        }
        for (ty, rules) in &self.resource_types {
            if let Some(format) = &rules.format {
                formats.push((format!("naming.resource_types.{}.format", ty), format.as_str()));
            }
        }
        for (component, format) in &self.components {
            formats.push((format!("naming.components.{}", component), format.as_str()));
        }
        formats
    }
}

/// A named, versioned set of components and their regional placement.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StackConfig {
    #[serde(default)]
    pub stack: StackMeta,
    #[serde(default)]
    pub components: BTreeMap<String, Component>,
    #[serde(default)]
    pub architecture: Architecture,
}

/// Stack identity block.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StackMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
}

/// A reusable provisioned-resource definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Component {
    /// Resource type, e.g. `azurerm_service_plan`.
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    /// Dependency notation strings (`region.component[.app]`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deps: Vec<String>,
}

/// Regional placement of components.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Architecture {
    #[serde(default)]
    pub regions: BTreeMap<String, Vec<RegionComponent>>,
}

/// One component placed in a region, optionally once per app.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RegionComponent {
    pub component: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apps: Vec<String>,
}

impl RegionComponent {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            apps: Vec::new(),
        }
    }

    pub fn with_apps<I, S>(mut self, apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.apps = apps.into_iter().map(Into::into).collect();
        self
    }

    /// Deployable units produced by this entry in `region`, in declared app order.
    pub fn instances(&self, region: &str) -> Vec<UnitId> {
        if self.apps.is_empty() {
            vec![UnitId::new(region, &self.component, None)]
        } else {
            self.apps
                .iter()
                .map(|app| UnitId::new(region, &self.component, Some(app.as_str())))
                .collect()
        }
    }
}

impl StackConfig {
    /// Every deployable unit: regions sorted, entries and apps in declared order.
    pub fn units(&self) -> Vec<UnitId> {
        self.architecture
            .regions
            .iter()
            .flat_map(|(region, entries)| entries.iter().flat_map(move |rc| rc.instances(region)))
            .collect()
    }

    /// Component names placed in at least one region.
    pub fn placed_components(&self) -> BTreeSet<&str> {
        self.architecture
            .regions
            .values()
            .flatten()
            .map(|rc| rc.component.as_str())
            .collect()
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.get(name)
    }
}

/// Identity of a deployable unit: `(region, component, app)`.
///
/// Ordering is region, then component, then app (`None` first), which is the
/// tie-break order used everywhere units are sorted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId {
    pub region: String,
    pub component: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
}

impl UnitId {
    pub fn new(region: impl Into<String>, component: impl Into<String>, app: Option<&str>) -> Self {
        Self {
            region: region.into(),
            component: component.into(),
            app: app.map(str::to_string),
        }
    }

    pub fn app(&self) -> Option<&str> {
        self.app.as_deref()
    }

    /// Identifier usable as a job or block name: `region_component[_app]`.
    pub fn slug(&self) -> String {
        let raw = match &self.app {
            Some(app) => format!("{}_{}_{}", self.region, self.component, app),
            None => format!("{}_{}", self.region, self.component),
        };
        raw.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect()
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.app {
            Some(app) => write!(f, "{}.{}.{}", self.region, self.component, app),
            None => write!(f, "{}.{}", self.region, self.component),
        }
    }
}
