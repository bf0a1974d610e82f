//! Structural and referential validation.
//!
//! Every problem is collected into a [`ValidationReport`]; nothing here stops at
//! the first error.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use regex::Regex;

use crate::models::{NamingConfig, StackConfig, TopologyConfig, UnitId, NAMING_TOKENS};
use crate::notation::{DependencyPattern, ResolveContext, Resolution};

/// A single problem and where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub location: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Validation result with details.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, location: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationIssue {
            location: location.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, location: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationIssue {
            location: location.into(),
            message: message.into(),
        });
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Validator for topology and stack documents.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the topology together with every loaded stack.
    pub fn validate(topology: &TopologyConfig, stacks: &BTreeMap<String, StackConfig>) -> ValidationReport {
        let mut report = Self::validate_topology(topology, stacks);
        for (key, stack) in stacks {
            report.merge(Self::validate_stack(key, stack));
        }
        report
    }

    /// Validate the topology document and its stack references.
    pub fn validate_topology(
        topology: &TopologyConfig,
        stacks: &BTreeMap<String, StackConfig>,
    ) -> ValidationReport {
        let mut report = ValidationReport::new();
        let loc = |path: &str| format!("config: {}", path);

        if topology.name.trim().is_empty() {
            report.add_error(loc("name"), "project name cannot be empty");
        }

        if topology.subscriptions.is_empty() {
            report.add_error(loc("subscriptions"), "at least one subscription is required");
        }

        let segment = segment_pattern();
        for (sub_name, sub) in &topology.subscriptions {
            let sub_loc = format!("subscriptions.{}", sub_name);
            check_segment(&mut report, &segment, loc(&sub_loc), "subscription", sub_name);

            if sub.remote_state.name.trim().is_empty() {
                report.add_error(
                    loc(&format!("{}.remote_state.name", sub_loc)),
                    "remote state storage name is required",
                );
            }
            if sub.remote_state.resource_group.trim().is_empty() {
                report.add_error(
                    loc(&format!("{}.remote_state.resource_group", sub_loc)),
                    "remote state resource group is required",
                );
            }
            if sub.environments.is_empty() {
                report.add_error(
                    loc(&format!("{}.environments", sub_loc)),
                    "at least one environment is required",
                );
            }

            let mut seen = BTreeSet::new();
            for (i, env) in sub.environments.iter().enumerate() {
                let env_loc = loc(&format!("{}.environments[{}]", sub_loc, i));
                if env.name.trim().is_empty() {
                    report.add_error(env_loc.clone(), "environment name cannot be empty");
                } else if !segment.is_match(&env.name) {
                    check_segment(&mut report, &segment, env_loc.clone(), "environment", &env.name);
                } else if !seen.insert(env.name.as_str()) {
                    report.add_error(
                        env_loc.clone(),
                        format!("environment '{}' is declared more than once", env.name),
                    );
                }

                let stack = env.stack_name();
                if !stacks.contains_key(stack) {
                    report.add_error(
                        env_loc,
                        format!("environment '{}' references unknown stack '{}'", env.name, stack),
                    );
                }
            }
        }

        report.merge(Self::validate_naming(&topology.naming));

        let referenced = topology.referenced_stacks();
        for key in stacks.keys() {
            if !referenced.contains(key.as_str()) {
                report.add_warning(
                    format!("stack '{}'", key),
                    "stack is not referenced by any environment",
                );
            }
        }

        report
    }

    /// Validate the naming section.
    pub fn validate_naming(naming: &NamingConfig) -> ValidationReport {
        let mut report = ValidationReport::new();
        let token = token_pattern();

        if naming.fallback_length == Some(0) {
            report.add_error("config: naming.fallback_length", "fallback length must be at least 1");
        }

        for (table, entries) in [("regions", &naming.regions), ("environments", &naming.environments)] {
            for (key, abbreviation) in entries {
                if abbreviation.trim().is_empty() {
                    report.add_error(
                        format!("config: naming.{}.{}", table, key),
                        "abbreviation cannot be empty",
                    );
                }
            }
        }

        for (ty, rules) in &naming.resource_types {
            if rules.abbreviation.as_deref().is_some_and(|a| a.trim().is_empty()) {
                report.add_error(
                    format!("config: naming.resource_types.{}.abbreviation", ty),
                    "abbreviation cannot be empty",
                );
            }
            if rules.max_length == Some(0) {
                report.add_error(
                    format!("config: naming.resource_types.{}.max_length", ty),
                    "max length must be at least 1",
                );
            }
        }

        for (location, format) in naming.declared_formats() {
            for captures in token.captures_iter(format) {
                let name = &captures[1];
                if !NAMING_TOKENS.contains(&name) {
                    report.add_error(
                        format!("config: {}", location),
                        format!("unknown naming token '{{{}}}' in format '{}'", name, format),
                    );
                }
            }
        }

        report
    }

    /// Validate one stack document.
    pub fn validate_stack(key: &str, stack: &StackConfig) -> ValidationReport {
        let mut report = ValidationReport::new();
        let loc = |path: &str| format!("stack '{}': {}", key, path);

        let meta = &stack.stack;
        for (field, value) in [
            ("name", &meta.name),
            ("version", &meta.version),
            ("description", &meta.description),
        ] {
            if value.trim().is_empty() {
                report.add_error(loc(&format!("stack.{}", field)), format!("stack {} cannot be empty", field));
            }
        }
        if !meta.name.is_empty() && meta.name != key {
            report.add_warning(
                loc("stack.name"),
                format!("stack name '{}' differs from its file name '{}'", meta.name, key),
            );
        }

        if stack.components.is_empty() {
            report.add_error(loc("components"), "at least one component is required");
        }

        let segment = segment_pattern();
        for (name, component) in &stack.components {
            check_segment(&mut report, &segment, loc(&format!("components.{}", name)), "component", name);
            for (field, value) in [
                ("source", &component.source),
                ("provider", &component.provider),
                ("version", &component.version),
                ("description", &component.description),
            ] {
                if value.trim().is_empty() {
                    report.add_error(
                        loc(&format!("components.{}.{}", name, field)),
                        format!("component '{}' is missing its {}", name, field),
                    );
                }
            }
        }

        if stack.architecture.regions.is_empty() {
            report.add_error(loc("architecture.regions"), "at least one region is required");
        }

        Self::validate_placements(key, stack, &mut report);
        Self::validate_unit_identifiers(key, stack, &mut report);
        Self::validate_dependencies(key, stack, &mut report);

        let placed = stack.placed_components();
        for name in stack.components.keys() {
            if !placed.contains(name.as_str()) {
                report.add_warning(
                    loc(&format!("components.{}", name)),
                    format!("component '{}' is not deployed in any region", name),
                );
            }
        }

        report
    }

    /// Unknown components and colliding unit identities.
    fn validate_placements(key: &str, stack: &StackConfig, report: &mut ValidationReport) {
        let segment = segment_pattern();
        for (region, entries) in &stack.architecture.regions {
            check_segment(
                report,
                &segment,
                format!("stack '{}': architecture.regions.{}", key, region),
                "region",
                region,
            );
            // component -> (no-app instance seen, app names seen)
            let mut seen: BTreeMap<&str, (bool, BTreeSet<&str>)> = BTreeMap::new();

            for (i, rc) in entries.iter().enumerate() {
                let location = format!("stack '{}': architecture.regions.{}[{}]", key, region, i);

                if !stack.components.contains_key(&rc.component) {
                    report.add_error(
                        location.clone(),
                        format!("unknown component '{}' in region '{}'", rc.component, region),
                    );
                }

                let (no_app_seen, apps_seen) = seen.entry(rc.component.as_str()).or_default();

                if rc.apps.is_empty() {
                    if *no_app_seen {
                        report.add_error(
                            location.clone(),
                            format!(
                                "component '{}' is declared more than once in region '{}'",
                                rc.component, region
                            ),
                        );
                    }
                    *no_app_seen = true;
                    continue;
                }

                for app in &rc.apps {
                    if app.trim().is_empty() {
                        report.add_error(
                            location.clone(),
                            format!("component '{}' has an empty app name", rc.component),
                        );
                    } else if !segment.is_match(app) {
                        check_segment(report, &segment, location.clone(), "app", app);
                    } else if !apps_seen.insert(app.as_str()) {
                        report.add_error(
                            location.clone(),
                            format!(
                                "app '{}' of component '{}' is declared more than once in region '{}'",
                                app, rc.component, region
                            ),
                        );
                    }
                }
            }
        }
    }

    /// Distinct units must not share the identifier used for pipeline jobs and diagram nodes.
    fn validate_unit_identifiers(key: &str, stack: &StackConfig, report: &mut ValidationReport) {
        let units: BTreeSet<UnitId> = stack.units().into_iter().collect();
        let mut slugs: BTreeMap<String, &UnitId> = BTreeMap::new();

        for unit in &units {
            if let Some(existing) = slugs.insert(unit.slug(), unit) {
                report.add_error(
                    format!("stack '{}': architecture.regions.{}", key, unit.region),
                    format!(
                        "units '{}' and '{}' share the identifier '{}'",
                        existing,
                        unit,
                        unit.slug()
                    ),
                );
            }
        }
    }

    /// Dependency strings must parse and resolve to units that exist.
    fn validate_dependencies(key: &str, stack: &StackConfig, report: &mut ValidationReport) {
        let units: BTreeSet<UnitId> = stack.units().into_iter().collect();
        let placed = stack.placed_components();

        for (name, component) in &stack.components {
            for (i, dep) in component.deps.iter().enumerate() {
                let location = format!("stack '{}': components.{}.deps[{}]", key, name, i);

                let pattern = match DependencyPattern::parse(dep) {
                    Ok(pattern) => pattern,
                    Err(e) => {
                        report.add_error(location, e.to_string());
                        continue;
                    }
                };

                if !stack.components.contains_key(&pattern.component) {
                    report.add_error(
                        location,
                        format!(
                            "component '{}' depends on unknown component '{}'",
                            name, pattern.component
                        ),
                    );
                    continue;
                }

                if !placed.contains(pattern.component.as_str()) {
                    report.add_error(
                        location,
                        format!(
                            "component '{}' depends on '{}', which is not deployed in any region",
                            name, pattern.component
                        ),
                    );
                    continue;
                }

                for unit in units.iter().filter(|u| &u.component == name) {
                    if let Resolution::Target(target) = pattern.resolve(&ResolveContext::for_unit(unit)) {
                        if !units.contains(&target) {
                            report.add_error(
                                location.clone(),
                                format!(
                                    "dependency '{}' of '{}' resolves to '{}', which is not deployed",
                                    dep, unit, target
                                ),
                            );
                        }
                    }
                }
            }
        }
    }
}

/// Names that become directory segments and notation parts.
fn segment_pattern() -> Regex {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").expect("segment pattern is a valid regex")
}

fn check_segment(report: &mut ValidationReport, pattern: &Regex, location: String, kind: &str, value: &str) {
    if !pattern.is_match(value) {
        report.add_error(
            location,
            format!(
                "{} name '{}' may only contain letters, digits, '-' and '_' and must start with a letter or digit",
                kind, value
            ),
        );
    }
}

fn token_pattern() -> Regex {
    Regex::new(r"\{([^{}]*)\}").expect("token pattern is a valid regex")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Component, RegionComponent};

    fn component(deps: &[&str]) -> Component {
        Component {
            source: "azurerm_resource_group".to_string(),
            provider: "azurerm".to_string(),
            version: "4.14.0".to_string(),
            description: "test".to_string(),
            deps: deps.iter().map(|d| d.to_string()).collect(),
        }
    }

    fn stack() -> StackConfig {
        let mut stack = StackConfig::default();
        stack.stack.name = "main".to_string();
        stack.stack.version = "1.0.0".to_string();
        stack.stack.description = "test".to_string();
        stack.components.insert("rg".to_string(), component(&[]));
        stack
            .components
            .insert("plan".to_string(), component(&["{region}.rg"]));
        stack.architecture.regions.insert(
            "eastus2".to_string(),
            vec![RegionComponent::new("rg"), RegionComponent::new("plan")],
        );
        stack
    }

    #[test]
    fn test_valid_stack() {
        let report = ConfigValidator::validate_stack("main", &stack());
        assert!(report.is_valid(), "{:?}", report.errors);
    }

    #[test]
    fn test_unknown_region_component() {
        let mut stack = stack();
        stack
            .architecture
            .regions
            .get_mut("eastus2")
            .unwrap()
            .push(RegionComponent::new("ghost"));

        let report = ConfigValidator::validate_stack("main", &stack);
        assert!(report
            .errors
            .iter()
            .any(|e| e.message.contains("'ghost'") && e.message.contains("'eastus2'")));
    }

    #[test]
    fn test_dependency_on_unplaced_component() {
        let mut stack = stack();
        stack.components.insert("kv".to_string(), component(&[]));
        stack.components.get_mut("plan").unwrap().deps.push("{region}.kv".to_string());

        let report = ConfigValidator::validate_stack("main", &stack);
        assert!(report
            .errors
            .iter()
            .any(|e| e.message.contains("not deployed in any region")));
    }

    #[test]
    fn test_overlapping_apps_collide() {
        let mut stack = stack();
        let entries = stack.architecture.regions.get_mut("eastus2").unwrap();
        entries.push(RegionComponent::new("plan").with_apps(["api"]));
        entries.push(RegionComponent::new("plan").with_apps(["api", "web"]));
        entries.push(RegionComponent::new("rg"));

        let report = ConfigValidator::validate_stack("main", &stack);
        assert_eq!(report.errors.len(), 2, "{:?}", report.errors);
    }

    #[test]
    fn test_colliding_unit_identifiers() {
        let mut stack = stack();
        stack.components.insert("web-app".to_string(), component(&[]));
        stack.components.insert("web_app".to_string(), component(&[]));
        let entries = stack.architecture.regions.get_mut("eastus2").unwrap();
        entries.push(RegionComponent::new("web-app"));
        entries.push(RegionComponent::new("web_app"));

        let report = ConfigValidator::validate_stack("main", &stack);
        assert_eq!(report.errors.len(), 1, "{:?}", report.errors);
        assert!(report.errors[0].message.contains("'eastus2_web_app'"));
    }

    #[test]
    fn test_names_must_be_path_segments() {
        let mut stack = stack();
        stack
            .architecture
            .regions
            .get_mut("eastus2")
            .unwrap()
            .push(RegionComponent::new("plan").with_apps(["../x", "a/b"]));
        stack
            .architecture
            .regions
            .insert("east.us".to_string(), vec![RegionComponent::new("rg")]);

        let report = ConfigValidator::validate_stack("main", &stack);
        let messages: Vec<&str> = report.errors.iter().map(|e| e.message.as_str()).collect();
        assert!(messages.iter().any(|m| m.contains("app name '../x'")));
        assert!(messages.iter().any(|m| m.contains("app name 'a/b'")));
        assert!(messages.iter().any(|m| m.contains("region name 'east.us'")));
    }

    #[test]
    fn test_environment_name_must_be_path_segment() {
        let mut topology = TopologyConfig {
            name: "CUSTTP".to_string(),
            ..Default::default()
        };
        let mut subscription = crate::models::Subscription::default();
        subscription.remote_state.name = "st".to_string();
        subscription.remote_state.resource_group = "rg".to_string();
        subscription.environments.push(crate::models::Environment::new("dev/blue"));
        topology.subscriptions.insert("sub".to_string(), subscription);
        let stacks = BTreeMap::from([("main".to_string(), stack())]);

        let report = ConfigValidator::validate_topology(&topology, &stacks);
        assert_eq!(report.errors.len(), 1, "{:?}", report.errors);
        assert!(report.errors[0].message.contains("environment name 'dev/blue'"));
    }

    #[test]
    fn test_unknown_naming_token() {
        let naming = NamingConfig {
            format: Some("{project}-{tenant}".to_string()),
            ..Default::default()
        };
        let report = ConfigValidator::validate_naming(&naming);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].message.contains("{tenant}"));
    }
}
