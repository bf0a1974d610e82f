//! Provider schema lookup.
//!
//! Schemas are best-effort: when a resource type has no schema the component
//! template falls back to a minimal variable set.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ScaffoldError, ScaffoldResult};

/// Resource type whose instances do not live inside a resource group.
pub const RESOURCE_GROUP_TYPE: &str = "azurerm_resource_group";

/// One configurable attribute of a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaAttribute {
    pub name: String,
    /// Terraform type expression, e.g. `string` or `map(string)`.
    pub type_expr: String,
    pub required: bool,
    pub description: Option<String>,
}

impl SchemaAttribute {
    pub fn required(name: &str, type_expr: &str) -> Self {
        Self {
            name: name.to_string(),
            type_expr: type_expr.to_string(),
            required: true,
            description: None,
        }
    }
}

/// Configurable attributes of a resource type, sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceSchema {
    pub attributes: Vec<SchemaAttribute>,
}

impl ResourceSchema {
    /// Variables used when no schema is known for a resource type.
    pub fn minimal(resource_type: &str) -> Self {
        let mut attributes = vec![
            SchemaAttribute::required("location", "string"),
            SchemaAttribute::required("name", "string"),
        ];
        if resource_type != RESOURCE_GROUP_TYPE {
            attributes.push(SchemaAttribute::required("resource_group_name", "string"));
        }
        Self { attributes }
    }

    /// Attributes a component template wires to variables.
    pub fn variables(&self) -> impl Iterator<Item = &SchemaAttribute> {
        self.attributes
            .iter()
            .filter(|attr| attr.required || attr.name == "tags")
    }

    pub fn has(&self, name: &str) -> bool {
        self.attributes.iter().any(|attr| attr.name == name)
    }
}

/// Source of resource schemas.
#[cfg_attr(test, mockall::automock)]
pub trait SchemaSource: Send + Sync {
    fn schema_for(&self, resource_type: &str) -> Option<ResourceSchema>;
}

/// Source that knows no schemas.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSchema;

impl SchemaSource for NoSchema {
    fn schema_for(&self, _resource_type: &str) -> Option<ResourceSchema> {
        None
    }
}

/// Schemas read from a `terraform providers schema -json` dump.
#[derive(Debug, Clone, Default)]
pub struct ProviderSchemaFile {
    path: PathBuf,
    resources: BTreeMap<String, ResourceSchema>,
}

#[derive(Debug, Deserialize)]
struct SchemaDump {
    #[serde(default)]
    provider_schemas: BTreeMap<String, ProviderDump>,
}

#[derive(Debug, Deserialize)]
struct ProviderDump {
    #[serde(default)]
    resource_schemas: BTreeMap<String, ResourceDump>,
}

#[derive(Debug, Deserialize)]
struct ResourceDump {
    block: BlockDump,
}

#[derive(Debug, Deserialize)]
struct BlockDump {
    #[serde(default)]
    attributes: BTreeMap<String, AttributeDump>,
}

#[derive(Debug, Deserialize)]
struct AttributeDump {
    #[serde(rename = "type", default)]
    type_value: Value,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    optional: bool,
    #[serde(default)]
    description: Option<String>,
}

impl ProviderSchemaFile {
    /// Load a schema dump from disk.
    pub fn load(path: impl AsRef<Path>) -> ScaffoldResult<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| ScaffoldError::io(path, e))?;
        Self::from_slice(path, &bytes)
    }

    /// Parse a schema dump. `path` is only used for error messages.
    pub fn from_slice(path: impl Into<PathBuf>, bytes: &[u8]) -> ScaffoldResult<Self> {
        let path = path.into();
        let dump: SchemaDump = serde_json::from_slice(bytes).map_err(|source| ScaffoldError::Schema {
            path: path.clone(),
            source,
        })?;

        let mut resources = BTreeMap::new();
        for provider in dump.provider_schemas.into_values() {
            for (resource_type, resource) in provider.resource_schemas {
                let attributes = resource
                    .block
                    .attributes
                    .into_iter()
                    // Computed-only attributes cannot be set
                    .filter(|(name, attr)| name != "id" && (attr.required || attr.optional))
                    .map(|(name, attr)| SchemaAttribute {
                        name,
                        type_expr: type_expression(&attr.type_value),
                        required: attr.required,
                        description: attr.description.filter(|d| !d.is_empty()),
                    })
                    .collect();
                resources.insert(resource_type, ResourceSchema { attributes });
            }
        }

        debug!("Loaded {} resource schema(s) from {:?}", resources.len(), path);
        Ok(Self { path, resources })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl SchemaSource for ProviderSchemaFile {
    fn schema_for(&self, resource_type: &str) -> Option<ResourceSchema> {
        self.resources.get(resource_type).cloned()
    }
}

/// Render a cty type from the JSON dump as a Terraform type expression.
fn type_expression(value: &Value) -> String {
    match value {
        Value::String(primitive) => primitive.clone(),
        Value::Array(parts) => match (parts.first().and_then(Value::as_str), parts.get(1)) {
            (Some(kind @ ("list" | "set" | "map")), Some(inner)) => {
                format!("{}({})", kind, type_expression(inner))
            }
            _ => "any".to_string(),
        },
        _ => "any".to_string(),
    }
}

/// Memoised lookups for a single generation run.
pub struct SchemaCache<'a> {
    source: &'a dyn SchemaSource,
    entries: BTreeMap<String, Option<ResourceSchema>>,
}

impl<'a> SchemaCache<'a> {
    pub fn new(source: &'a dyn SchemaSource) -> Self {
        Self {
            source,
            entries: BTreeMap::new(),
        }
    }

    /// Schema for a resource type, or the minimal fallback.
    pub fn get(&mut self, resource_type: &str) -> ResourceSchema {
        let source = self.source;
        self.entries
            .entry(resource_type.to_string())
            .or_insert_with(|| {
                let schema = source.schema_for(resource_type);
                if schema.is_none() {
                    warn!("No schema for '{}', using minimal variables", resource_type);
                }
                schema
            })
            .clone()
            .unwrap_or_else(|| ResourceSchema::minimal(resource_type))
    }

    /// Number of distinct resource types looked up.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = r#"{
      "format_version": "1.0",
      "provider_schemas": {
        "registry.terraform.io/hashicorp/azurerm": {
          "resource_schemas": {
            "azurerm_service_plan": {
              "version": 0,
              "block": {
                "attributes": {
                  "id": { "type": "string", "computed": true },
                  "name": { "type": "string", "required": true },
                  "os_type": { "type": "string", "required": true, "description": "" },
                  "sku_name": { "type": "string", "required": true },
                  "tags": { "type": ["map", "string"], "optional": true },
                  "kind": { "type": "string", "computed": true }
                }
              }
            }
          }
        }
      }
    }"#;

    #[test]
    fn test_parse_provider_dump() {
        let file = ProviderSchemaFile::from_slice("schema.json", DUMP.as_bytes()).unwrap();
        let schema = file.schema_for("azurerm_service_plan").unwrap();

        let names: Vec<&str> = schema.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["name", "os_type", "sku_name", "tags"]);
        assert_eq!(schema.attributes[3].type_expr, "map(string)");
        assert_eq!(schema.attributes[1].description, None);
        assert!(file.schema_for("azurerm_key_vault").is_none());
    }

    #[test]
    fn test_invalid_dump_names_path() {
        let err = ProviderSchemaFile::from_slice("broken.json", b"{").unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_minimal_variables() {
        let names = |ty: &str| -> Vec<String> {
            ResourceSchema::minimal(ty)
                .attributes
                .into_iter()
                .map(|a| a.name)
                .collect()
        };
        assert_eq!(names("azurerm_resource_group"), vec!["location", "name"]);
        assert_eq!(
            names("azurerm_service_plan"),
            vec!["location", "name", "resource_group_name"]
        );
    }

    #[test]
    fn test_cache_consults_source_once() {
        let mut source = MockSchemaSource::new();
        source
            .expect_schema_for()
            .withf(|ty| ty == "azurerm_service_plan")
            .times(1)
            .returning(|_| None);

        let mut cache = SchemaCache::new(&source);
        let first = cache.get("azurerm_service_plan");
        let second = cache.get("azurerm_service_plan");

        assert_eq!(first, second);
        assert!(first.has("resource_group_name"));
        assert_eq!(cache.len(), 1);
    }
}
