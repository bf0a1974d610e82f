//! Built-in abbreviation tables.
//!
//! Entries in the topology `naming` section override these; anything missing
//! from both falls back to a prefix of the value.

use std::collections::BTreeMap;

use tgs_config::{Charset, ResourceTypeNaming};

/// Default number of characters kept for unknown values.
pub const DEFAULT_FALLBACK_LENGTH: usize = 3;

const REGIONS: &[(&str, &str)] = &[
    ("australiaeast", "ae"),
    ("australiasoutheast", "ase"),
    ("brazilsouth", "brs"),
    ("canadacentral", "cc"),
    ("canadaeast", "ce"),
    ("centralindia", "ci"),
    ("centralus", "c"),
    ("eastasia", "ea"),
    ("eastus", "e"),
    ("eastus2", "e2"),
    ("francecentral", "frc"),
    ("germanywestcentral", "gwc"),
    ("japaneast", "je"),
    ("japanwest", "jw"),
    ("koreacentral", "kc"),
    ("northcentralus", "nc"),
    ("northeurope", "ne"),
    ("norwayeast", "noe"),
    ("southafricanorth", "san"),
    ("southcentralus", "sc"),
    ("southeastasia", "sea"),
    ("swedencentral", "sec"),
    ("switzerlandnorth", "szn"),
    ("uksouth", "uks"),
    ("ukwest", "ukw"),
    ("westcentralus", "wc"),
    ("westeurope", "we"),
    ("westus", "w"),
    ("westus2", "w2"),
    ("westus3", "w3"),
];

const ENVIRONMENTS: &[(&str, &str)] = &[
    ("dev", "d"),
    ("development", "d"),
    ("test", "t"),
    ("qa", "q"),
    ("uat", "u"),
    ("stage", "s"),
    ("staging", "s"),
    ("prod", "p"),
    ("production", "p"),
];

const RESOURCE_TYPES: &[(&str, &str)] = &[
    ("azurerm_api_management", "apim"),
    ("azurerm_application_insights", "appi"),
    ("azurerm_container_registry", "cr"),
    ("azurerm_cosmosdb_account", "cosmos"),
    ("azurerm_dns_zone", "dns"),
    ("azurerm_eventhub_namespace", "evhns"),
    ("azurerm_key_vault", "kv"),
    ("azurerm_kubernetes_cluster", "aks"),
    ("azurerm_linux_function_app", "func"),
    ("azurerm_linux_web_app", "app"),
    ("azurerm_log_analytics_workspace", "log"),
    ("azurerm_mssql_database", "sqldb"),
    ("azurerm_mssql_server", "sql"),
    ("azurerm_network_security_group", "nsg"),
    ("azurerm_private_endpoint", "pep"),
    ("azurerm_public_ip", "pip"),
    ("azurerm_redis_cache", "redis"),
    ("azurerm_resource_group", "rg"),
    ("azurerm_service_plan", "asp"),
    ("azurerm_servicebus_namespace", "sbns"),
    ("azurerm_storage_account", "st"),
    ("azurerm_subnet", "snet"),
    ("azurerm_user_assigned_identity", "id"),
    ("azurerm_virtual_network", "vnet"),
    ("azurerm_windows_function_app", "func"),
    ("azurerm_windows_web_app", "app"),
];

/// Resource types whose names have stricter character rules.
const RESOURCE_RULES: &[(&str, Charset, usize)] = &[
    ("azurerm_container_registry", Charset::LowerAlphanumeric, 50),
    ("azurerm_key_vault", Charset::AlphanumericHyphen, 24),
    ("azurerm_storage_account", Charset::LowerAlphanumeric, 24),
];

/// Lookup table with a prefix fallback.
#[derive(Debug, Clone)]
pub struct AbbreviationTable {
    entries: BTreeMap<String, String>,
    fallback_length: usize,
}

impl AbbreviationTable {
    fn with_defaults(
        defaults: &[(&str, &str)],
        overrides: &BTreeMap<String, String>,
        fallback_length: usize,
    ) -> Self {
        let mut entries: BTreeMap<String, String> = defaults
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        entries.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self {
            entries,
            fallback_length,
        }
    }

    pub fn regions(overrides: &BTreeMap<String, String>, fallback_length: usize) -> Self {
        Self::with_defaults(REGIONS, overrides, fallback_length)
    }

    pub fn environments(overrides: &BTreeMap<String, String>, fallback_length: usize) -> Self {
        Self::with_defaults(ENVIRONMENTS, overrides, fallback_length)
    }

    pub fn resource_types(
        overrides: &BTreeMap<String, ResourceTypeNaming>,
        fallback_length: usize,
    ) -> Self {
        let overrides: BTreeMap<String, String> = overrides
            .iter()
            .filter_map(|(ty, rules)| rules.abbreviation.clone().map(|a| (ty.clone(), a)))
            .collect();
        Self::with_defaults(RESOURCE_TYPES, &overrides, fallback_length)
    }

    /// Abbreviation for `value`, or its first characters when unknown.
    pub fn get(&self, value: &str) -> String {
        if let Some(abbreviation) = self.entries.get(value) {
            return abbreviation.clone();
        }
        prefix(value, self.fallback_length)
    }

    /// Abbreviation for a resource type; unknown types drop the provider prefix first.
    pub fn get_resource_type(&self, resource_type: &str) -> String {
        if let Some(abbreviation) = self.entries.get(resource_type) {
            return abbreviation.clone();
        }
        let without_provider = resource_type
            .split_once('_')
            .map(|(_, rest)| rest)
            .unwrap_or(resource_type);
        prefix(without_provider, self.fallback_length)
    }
}

/// Built-in charset and length limit for a resource type.
pub fn builtin_rules(resource_type: &str) -> Option<(Charset, usize)> {
    RESOURCE_RULES
        .iter()
        .find(|(ty, _, _)| *ty == resource_type)
        .map(|(_, charset, max)| (*charset, *max))
}

fn prefix(value: &str, length: usize) -> String {
    value
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(length)
        .collect::<String>()
        .to_lowercase()
}
