//! Dependency notation: `region.component[.app]`.
//!
//! `region` may be the `{region}` placeholder and `app` may be the `{app}`
//! placeholder. A notation is parsed once into a [`DependencyPattern`] and then
//! resolved against the unit that declares it.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::models::UnitId;

pub const REGION_PLACEHOLDER: &str = "{region}";
pub const APP_PLACEHOLDER: &str = "{app}";

/// Errors raised while parsing a dependency notation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotationError {
    #[error("dependency '{0}' must have the form region.component[.app]")]
    Arity(String),

    #[error("dependency '{0}' has an empty segment")]
    EmptySegment(String),

    #[error("dependency '{notation}' uses '{placeholder}' in the {position} position")]
    MisplacedPlaceholder {
        notation: String,
        placeholder: String,
        position: &'static str,
    },

    #[error("dependency '{notation}' uses unknown placeholder '{placeholder}'")]
    UnknownPlaceholder { notation: String, placeholder: String },
}

/// One region or app segment of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder,
}

impl Segment {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Segment::Placeholder)
    }

    pub fn literal(&self) -> Option<&str> {
        match self {
            Segment::Literal(value) => Some(value),
            Segment::Placeholder => None,
        }
    }
}

/// A parsed dependency notation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyPattern {
    pub region: Segment,
    pub component: String,
    pub app: Option<Segment>,
}

/// The unit a dependency is being resolved for.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    pub region: &'a str,
    pub component: &'a str,
    pub app: Option<&'a str>,
}

impl<'a> ResolveContext<'a> {
    pub fn new(region: &'a str, component: &'a str, app: Option<&'a str>) -> Self {
        Self {
            region,
            component,
            app,
        }
    }

    pub fn for_unit(unit: &'a UnitId) -> Self {
        Self::new(&unit.region, &unit.component, unit.app())
    }
}

/// Outcome of resolving a pattern for one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Target(UnitId),
    /// `{app}` was used by a unit that has no app; no reference is produced.
    Skipped,
}

impl Resolution {
    pub fn target(self) -> Option<UnitId> {
        match self {
            Resolution::Target(unit) => Some(unit),
            Resolution::Skipped => None,
        }
    }
}

impl DependencyPattern {
    /// Parse a notation string.
    pub fn parse(notation: &str) -> Result<Self, NotationError> {
        let parts: Vec<&str> = notation.trim().split('.').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(NotationError::Arity(notation.to_string()));
        }
        if parts.iter().any(|p| p.trim().is_empty()) {
            return Err(NotationError::EmptySegment(notation.to_string()));
        }

        let region = Self::parse_segment(notation, parts[0], REGION_PLACEHOLDER, "region")?;

        let component = parts[1].trim();
        if is_placeholder(component) {
            return Err(Self::placeholder_error(notation, component, "component"));
        }

        let app = match parts.get(2) {
            Some(raw) => Some(Self::parse_segment(notation, raw, APP_PLACEHOLDER, "app")?),
            None => None,
        };

        Ok(Self {
            region,
            component: component.to_string(),
            app,
        })
    }

    fn parse_segment(
        notation: &str,
        raw: &str,
        allowed: &str,
        position: &'static str,
    ) -> Result<Segment, NotationError> {
        let raw = raw.trim();
        if !is_placeholder(raw) {
            return Ok(Segment::Literal(raw.to_string()));
        }
        if raw == allowed {
            Ok(Segment::Placeholder)
        } else {
            Err(Self::placeholder_error(notation, raw, position))
        }
    }

    fn placeholder_error(notation: &str, placeholder: &str, position: &'static str) -> NotationError {
        if placeholder == REGION_PLACEHOLDER || placeholder == APP_PLACEHOLDER {
            NotationError::MisplacedPlaceholder {
                notation: notation.to_string(),
                placeholder: placeholder.to_string(),
                position,
            }
        } else {
            NotationError::UnknownPlaceholder {
                notation: notation.to_string(),
                placeholder: placeholder.to_string(),
            }
        }
    }

    /// Resolve against the declaring unit.
    pub fn resolve(&self, ctx: &ResolveContext<'_>) -> Resolution {
        let region = match &self.region {
            Segment::Literal(region) => region.as_str(),
            Segment::Placeholder => ctx.region,
        };

        let app = match &self.app {
            None => None,
            Some(Segment::Literal(app)) => Some(app.as_str()),
            Some(Segment::Placeholder) => match ctx.app {
                Some(app) => Some(app),
                None => return Resolution::Skipped,
            },
        };

        Resolution::Target(UnitId::new(region, &self.component, app))
    }

    /// Stable label for the reference block and input variables.
    ///
    /// Placeholders contribute nothing so every instance of a component shares
    /// the same label: `[region_]component[_app]`.
    pub fn label(&self) -> String {
        let mut parts = Vec::new();
        if let Some(region) = self.region.literal() {
            parts.push(region);
        }
        parts.push(self.component.as_str());
        if let Some(app) = self.app.as_ref().and_then(Segment::literal) {
            parts.push(app);
        }
        parts
            .join("_")
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect()
    }
}

impl FromStr for DependencyPattern {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DependencyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let segment = |s: &Segment, placeholder: &'static str| match s {
            Segment::Literal(v) => v.clone(),
            Segment::Placeholder => placeholder.to_string(),
        };
        write!(f, "{}.{}", segment(&self.region, REGION_PLACEHOLDER), self.component)?;
        if let Some(app) = &self.app {
            write!(f, ".{}", segment(app, APP_PLACEHOLDER))?;
        }
        Ok(())
    }
}

/// Parse and resolve in one step.
pub fn resolve(notation: &str, ctx: &ResolveContext<'_>) -> Result<Resolution, NotationError> {
    Ok(DependencyPattern::parse(notation)?.resolve(ctx))
}

fn is_placeholder(segment: &str) -> bool {
    segment.starts_with('{') && segment.ends_with('}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_and_app_placeholders() {
        let ctx = ResolveContext::new("westus", "webapp", Some("api"));
        let resolved = resolve("{region}.serviceplan.{app}", &ctx).unwrap();
        assert_eq!(
            resolved,
            Resolution::Target(UnitId::new("westus", "serviceplan", Some("api")))
        );
    }

    #[test]
    fn test_literal_region_is_verbatim() {
        let ctx = ResolveContext::new("westus", "webapp", None);
        let resolved = resolve("eastus2.rg", &ctx).unwrap();
        assert_eq!(resolved, Resolution::Target(UnitId::new("eastus2", "rg", None)));
    }

    #[test]
    fn test_two_segments_target_region_level_instance() {
        let ctx = ResolveContext::new("westus", "webapp", Some("api"));
        let target = resolve("{region}.rg", &ctx).unwrap().target().unwrap();
        assert_eq!(target.app, None);
    }

    #[test]
    fn test_app_placeholder_without_app_is_skipped() {
        let ctx = ResolveContext::new("westus", "webapp", None);
        assert_eq!(resolve("{region}.serviceplan.{app}", &ctx).unwrap(), Resolution::Skipped);
    }

    #[test]
    fn test_literal_app_is_verbatim() {
        let ctx = ResolveContext::new("westus", "webapp", Some("web"));
        let target = resolve("{region}.webapp.api", &ctx).unwrap().target().unwrap();
        assert_eq!(target, UnitId::new("westus", "webapp", Some("api")));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(DependencyPattern::parse("rg"), Err(NotationError::Arity(_))));
        assert!(matches!(
            DependencyPattern::parse("a.b.c.d"),
            Err(NotationError::Arity(_))
        ));
        assert!(matches!(
            DependencyPattern::parse("{region}..api"),
            Err(NotationError::EmptySegment(_))
        ));
        assert!(matches!(
            DependencyPattern::parse("{region}.{app}"),
            Err(NotationError::MisplacedPlaceholder { position: "component", .. })
        ));
        assert!(matches!(
            DependencyPattern::parse("{app}.rg"),
            Err(NotationError::MisplacedPlaceholder { position: "region", .. })
        ));
        assert!(matches!(
            DependencyPattern::parse("{region}.rg.{env}"),
            Err(NotationError::UnknownPlaceholder { .. })
        ));
    }

    #[test]
    fn test_label_ignores_placeholders() {
        let pattern: DependencyPattern = "{region}.serviceplan.{app}".parse().unwrap();
        assert_eq!(pattern.label(), "serviceplan");

        let pattern: DependencyPattern = "eastus2.kv".parse().unwrap();
        assert_eq!(pattern.label(), "eastus2_kv");

        let pattern: DependencyPattern = "{region}.web-app.api".parse().unwrap();
        assert_eq!(pattern.label(), "web_app_api");
    }

    #[test]
    fn test_display_round_trips_notation() {
        let pattern: DependencyPattern = "{region}.serviceplan.{app}".parse().unwrap();
        assert_eq!(pattern.to_string(), "{region}.serviceplan.{app}");
    }
}
