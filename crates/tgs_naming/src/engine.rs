//! Naming convention engine.

use regex::Regex;
use tracing::debug;

use tgs_config::{Charset, NamingConfig, NAMING_TOKENS};

use crate::abbreviations::{builtin_rules, AbbreviationTable, DEFAULT_FALLBACK_LENGTH};
use crate::error::{NamingError, NamingResult};
use crate::sanitize::sanitize;

/// Format used when neither the component nor the resource type overrides it.
pub const DEFAULT_FORMAT: &str = "{project}-{region}{env}-{type}-{app}";

/// Everything a name can be derived from.
#[derive(Debug, Clone, Copy)]
pub struct NamingContext<'a> {
    pub project: &'a str,
    pub region: &'a str,
    pub environment: &'a str,
    pub component: &'a str,
    pub app: Option<&'a str>,
    pub resource_type: &'a str,
}

/// Resolves formats, renders tokens and sanitizes the result.
#[derive(Debug, Clone)]
pub struct NamingEngine {
    config: NamingConfig,
    token_pattern: Regex,
    regions: AbbreviationTable,
    environments: AbbreviationTable,
    resource_types: AbbreviationTable,
}

impl Default for NamingEngine {
    fn default() -> Self {
        Self::new(&NamingConfig::default())
    }
}

impl NamingEngine {
    /// Create an engine from the topology `naming` section.
    pub fn new(config: &NamingConfig) -> Self {
        let fallback = config.fallback_length.unwrap_or(DEFAULT_FALLBACK_LENGTH).max(1);
        Self {
            config: config.clone(),
            token_pattern: Regex::new(r"\{([^{}]*)\}").expect("token pattern is a valid regex"),
            regions: AbbreviationTable::regions(&config.regions, fallback),
            environments: AbbreviationTable::environments(&config.environments, fallback),
            resource_types: AbbreviationTable::resource_types(&config.resource_types, fallback),
        }
    }

    /// Format for a context: component override, then resource type, then global.
    pub fn format_for(&self, ctx: &NamingContext<'_>) -> &str {
        if let Some(format) = self.config.components.get(ctx.component) {
            return format;
        }
        if let Some(format) = self
            .config
            .resource_types
            .get(ctx.resource_type)
            .and_then(|rules| rules.format.as_deref())
        {
            return format;
        }
        self.config.format.as_deref().unwrap_or(DEFAULT_FORMAT)
    }

    /// Name for a context using its resolved format.
    pub fn name(&self, ctx: &NamingContext<'_>) -> NamingResult<String> {
        self.name_with_format(ctx, self.format_for(ctx))
    }

    /// Name for a context using an explicit format.
    pub fn name_with_format(&self, ctx: &NamingContext<'_>, format: &str) -> NamingResult<String> {
        let raw = self.render(ctx, format)?;
        let (charset, max_length) = self.rules_for(ctx.resource_type);
        let name = sanitize(&raw, charset, max_length);

        if name.is_empty() {
            return Err(NamingError::Empty {
                component: ctx.component.to_string(),
                resource_type: ctx.resource_type.to_string(),
                raw,
            });
        }

        debug!("Named {} ({}) as {}", ctx.component, ctx.resource_type, name);
        Ok(name)
    }

    /// Substitute tokens. Absent tokens render as nothing.
    pub fn render(&self, ctx: &NamingContext<'_>, format: &str) -> NamingResult<String> {
        if let Some(unknown) = self
            .token_pattern
            .captures_iter(format)
            .map(|caps| caps[1].to_string())
            .find(|token| !NAMING_TOKENS.contains(&token.as_str()))
        {
            return Err(NamingError::UnknownToken {
                token: unknown,
                format: format.to_string(),
            });
        }

        let rendered = self
            .token_pattern
            .replace_all(format, |caps: &regex::Captures| match &caps[1] {
                "project" => ctx.project.to_string(),
                "region" => self.region_abbreviation(ctx.region),
                "env" => self.environment_abbreviation(ctx.environment),
                "type" => self.type_abbreviation(ctx.resource_type),
                "component" => ctx.component.to_string(),
                "app" => ctx.app.unwrap_or_default().to_string(),
                _ => String::new(),
            })
            .to_string();

        Ok(rendered)
    }

    pub fn region_abbreviation(&self, region: &str) -> String {
        self.regions.get(region)
    }

    pub fn environment_abbreviation(&self, environment: &str) -> String {
        self.environments.get(environment)
    }

    pub fn type_abbreviation(&self, resource_type: &str) -> String {
        self.resource_types.get_resource_type(resource_type)
    }

    /// Charset and length limit: configured rules first, then built-ins.
    pub fn rules_for(&self, resource_type: &str) -> (Charset, Option<usize>) {
        let builtin = builtin_rules(resource_type);
        let configured = self.config.resource_types.get(resource_type);

        let charset = configured
            .and_then(|rules| rules.charset)
            .or(builtin.map(|(charset, _)| charset))
            .unwrap_or_default();
        let max_length = configured
            .and_then(|rules| rules.max_length)
            .or(builtin.map(|(_, max)| max));

        (charset, max_length)
    }
}
