//! Admin configuration model
//!
//! Persisted shape:
//! `{ "admins": [i64], "maintenanceMode": bool, "generationLimits": { "<quotaKey>": u32 } }`

use std::collections::{BTreeMap, BTreeSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::models::ModelKey;
use crate::utils::errors::{RelayError, Result};

/// Admin seeded when no configuration exists yet
pub const DEFAULT_ADMIN_ID: i64 = 556348928;

/// Default per-model generation quota
pub fn default_limit(model: ModelKey) -> u32 {
    match model {
        ModelKey::StableDiffusion | ModelKey::Dalle => 5,
        _ => 10,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminConfig {
    pub admins: BTreeSet<i64>,
    pub maintenance_mode: bool,
    pub generation_limits: BTreeMap<ModelKey, u32>,
}

impl AdminConfig {
    /// Hardcoded defaults with the given seed admins
    pub fn with_admins(admins: impl IntoIterator<Item = i64>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
            maintenance_mode: false,
            generation_limits: ModelKey::ALL.iter().map(|m| (*m, default_limit(*m))).collect(),
        }
    }

    /// Parse and validate persisted JSON
    pub fn from_json_str(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(RelayError::AdminConfigInvalid(vec!["admin config is empty".to_string()]));
        }

        let value: Value = serde_json::from_str(raw)?;
        let violations = validate_value(&value);
        if !violations.is_empty() {
            return Err(RelayError::AdminConfigInvalid(violations));
        }

        // Shape is validated above, so the lookups below cannot miss
        let admins = value["admins"]
            .as_array()
            .map(|ids| ids.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default();
        let maintenance_mode = value["maintenanceMode"].as_bool().unwrap_or(false);
        let generation_limits = ModelKey::ALL
            .iter()
            .filter_map(|m| {
                value["generationLimits"][m.quota_key()]
                    .as_u64()
                    .map(|limit| (*m, limit as u32))
            })
            .collect();

        Ok(Self { admins, maintenance_mode, generation_limits })
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn limit_for(&self, model: ModelKey) -> Option<u32> {
        self.generation_limits.get(&model).copied()
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self::with_admins([DEFAULT_ADMIN_ID])
    }
}

/// Collect one message per violated field requirement
pub fn validate_value(value: &Value) -> Vec<String> {
    let mut violations = Vec::new();

    let Some(root) = value.as_object() else {
        violations.push("admin config must be a JSON object".to_string());
        return violations;
    };

    match root.get("admins").and_then(Value::as_array) {
        Some(ids) if ids.iter().all(|id| id.as_i64().is_some()) => {}
        _ => violations.push("admins must be an array of integers".to_string()),
    }

    if !root.get("maintenanceMode").map_or(false, Value::is_boolean) {
        violations.push("maintenanceMode must be a boolean".to_string());
    }

    match root.get("generationLimits").and_then(Value::as_object) {
        Some(limits) => {
            for model in ModelKey::ALL {
                match limits.get(model.quota_key()) {
                    None => violations.push(format!("generationLimits is missing {}", model.quota_key())),
                    Some(limit) => {
                        let valid = limit.as_u64().map_or(false, |l| l <= u32::MAX as u64);
                        if !valid {
                            violations.push(format!(
                                "generationLimits.{} must be a non-negative integer",
                                model.quota_key()
                            ));
                        }
                    }
                }
            }
        }
        None => violations.push("generationLimits must be an object".to_string()),
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = AdminConfig::default();
        assert!(config.admins.contains(&DEFAULT_ADMIN_ID));
        assert!(!config.maintenance_mode);
        assert_eq!(config.limit_for(ModelKey::ChatGpt), Some(10));
        assert_eq!(config.limit_for(ModelKey::StableDiffusion), Some(5));
        assert_eq!(config.limit_for(ModelKey::Dalle), Some(5));
        assert_eq!(config.generation_limits.len(), ModelKey::ALL.len());
    }

    #[test]
    fn test_persisted_shape() {
        let config = AdminConfig::default();
        let value: Value = serde_json::from_str(&config.to_json_pretty().unwrap()).unwrap();
        assert_eq!(value["admins"], json!([DEFAULT_ADMIN_ID]));
        assert_eq!(value["maintenanceMode"], json!(false));
        assert_eq!(value["generationLimits"]["mistralai"], json!(10));

        let parsed = AdminConfig::from_json_str(&value.to_string()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_one_message_per_violation() {
        let value = json!({
            "admins": "nope",
            "maintenanceMode": 1,
            "generationLimits": []
        });
        let violations = validate_value(&value);
        assert_eq!(violations, vec![
            "admins must be an array of integers".to_string(),
            "maintenanceMode must be a boolean".to_string(),
            "generationLimits must be an object".to_string(),
        ]);
    }

    #[test]
    fn test_missing_and_negative_limits() {
        let value = json!({
            "admins": [1],
            "maintenanceMode": false,
            "generationLimits": {
                "chatGpt": -1, "stableDiffusion": 5, "dalle": 5,
                "mistralai": 10, "claude": 10
            }
        });
        let violations = validate_value(&value);
        assert!(violations.contains(&"generationLimits.chatGpt must be a non-negative integer".to_string()));
        assert!(violations.contains(&"generationLimits is missing gemini".to_string()));
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn test_empty_input_rejected() {
        assert_matches!(AdminConfig::from_json_str("  "), Err(RelayError::AdminConfigInvalid(_)));
        assert_matches!(AdminConfig::from_json_str("{oops"), Err(RelayError::Serialization(_)));
    }
}
