//! Directory layout of the generated tree.
//!
//! All paths are relative to the output root and rendered with `/`
//! separators when they end up inside generated files.

use std::path::{Component, Path, PathBuf};

use tgs_config::UnitId;

/// Directory holding the shared component templates.
pub const COMPONENTS_DIR: &str = "_components";

/// Instance directory: `subscription/region/environment/component[/app]`.
pub fn unit_dir(subscription: &str, environment: &str, unit: &UnitId) -> PathBuf {
    let mut path = PathBuf::from(subscription);
    path.push(&unit.region);
    path.push(environment);
    path.push(&unit.component);
    if let Some(app) = &unit.app {
        path.push(app);
    }
    path
}

pub fn subscription_dir(subscription: &str) -> PathBuf {
    PathBuf::from(subscription)
}

pub fn region_dir(subscription: &str, region: &str) -> PathBuf {
    subscription_dir(subscription).join(region)
}

pub fn environment_dir(subscription: &str, region: &str, environment: &str) -> PathBuf {
    region_dir(subscription, region).join(environment)
}

/// Shared template directory: `_components/stack/component`.
pub fn component_dir(stack: &str, component: &str) -> PathBuf {
    Path::new(COMPONENTS_DIR).join(stack).join(component)
}

/// Path from directory `from` to directory `to`, both relative to the same root.
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component<'_>> = from.components().collect();
    let to: Vec<Component<'_>> = to.components().collect();

    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut path = PathBuf::new();
    for _ in common..from.len() {
        path.push("..");
    }
    for component in &to[common..] {
        path.push(component.as_os_str());
    }
    if path.as_os_str().is_empty() {
        path.push(".");
    }
    path
}

/// Render a relative path with `/` separators.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
