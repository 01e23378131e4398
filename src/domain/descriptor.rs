use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::errors::{DomainError, Result};

// ── ParameterDescriptor ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemsDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(
        rename = "enum",
        default,
        deserialize_with = "non_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub allowed: Option<Vec<String>>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub items: Option<ItemsDescriptor>,
    // absent means required
    #[serde(default = "required_by_default")]
    pub required: bool,
}

fn required_by_default() -> bool {
    true
}

// Optional keys may be omitted but never `null`.
fn non_null<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl ParameterDescriptor {
    pub fn new(kind: &str, description: &str) -> Self {
        Self {
            kind: kind.to_string(),
            description: description.to_string(),
            format: None,
            minimum: None,
            maximum: None,
            allowed: None,
            items: None,
            required: true,
        }
    }
}

// ── Parameters ────────────────────────────────────────────────────────────────

/// Kept in document order: it decides which violation is reported first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters(Vec<(String, ParameterDescriptor)>);

impl Parameters {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterDescriptor)> {
        self.0.iter().map(|(name, param)| (name.as_str(), param))
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|(name, _)| name.as_str()).collect()
    }
}

impl FromIterator<(String, ParameterDescriptor)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (String, ParameterDescriptor)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for Parameters {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, param) in &self.0 {
            map.serialize_entry(name, param)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Parameters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ParametersVisitor;

        impl<'de> Visitor<'de> for ParametersVisitor {
            type Value = Parameters;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of parameter names to parameter descriptors")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Parameters, A::Error> {
                let mut entries: Vec<(String, ParameterDescriptor)> =
                    Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, param)) = map.next_entry::<String, ParameterDescriptor>()? {
                    if entries.iter().any(|(existing, _)| *existing == name) {
                        return Err(de::Error::custom(format!(
                            "duplicate parameter '{}'",
                            name
                        )));
                    }
                    entries.push((name, param));
                }
                Ok(Parameters(entries))
            }
        }

        deserializer.deserialize_map(ParametersVisitor)
    }
}

// ── OperationKind ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Create,
    List,
    Update,
    Delete,
}

impl OperationKind {
    pub const ALL: [OperationKind; 4] = [
        OperationKind::Create,
        OperationKind::List,
        OperationKind::Update,
        OperationKind::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Create => "create",
            OperationKind::List => "list",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = DomainError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "create" => Ok(OperationKind::Create),
            "list" => Ok(OperationKind::List),
            "update" => Ok(OperationKind::Update),
            "delete" => Ok(OperationKind::Delete),
            _ => Err(DomainError::InvalidData(format!(
                "Invalid operation: {}",
                s
            ))),
        }
    }
}

// ── Operation / Tool ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Parameters,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub create: Option<OperationDescriptor>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub list: Option<OperationDescriptor>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub update: Option<OperationDescriptor>,
    #[serde(default, deserialize_with = "non_null", skip_serializing_if = "Option::is_none")]
    pub delete: Option<OperationDescriptor>,
}

impl ToolDescriptor {
    pub fn operation(&self, kind: OperationKind) -> Option<&OperationDescriptor> {
        match kind {
            OperationKind::Create => self.create.as_ref(),
            OperationKind::List => self.list.as_ref(),
            OperationKind::Update => self.update.as_ref(),
            OperationKind::Delete => self.delete.as_ref(),
        }
    }

    pub fn operations(&self) -> impl Iterator<Item = (OperationKind, &OperationDescriptor)> {
        OperationKind::ALL
            .into_iter()
            .filter_map(|kind| self.operation(kind).map(|op| (kind, op)))
    }
}

// ── Auth ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfiguration {
    pub token_header: String,
    pub token_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub configuration: AuthConfiguration,
}

// ── ConfigSnapshot (root) ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub name: String,
    pub version: String,
    pub description: String,
    pub tools: BTreeMap<String, ToolDescriptor>,
    pub auth: AuthDescriptor,
    pub examples: BTreeMap<String, BTreeMap<String, Value>>,
}

impl ConfigSnapshot {
    /// Rules serde cannot express. One bad descriptor fails the snapshot.
    pub fn check_invariants(&self) -> Result<()> {
        for (tool_name, tool) in &self.tools {
            for (kind, op) in tool.operations() {
                for (param_name, param) in op.parameters.iter() {
                    let path = format!("tools.{}.{}.parameters.{}", tool_name, kind, param_name);
                    check_parameter(&path, param)?;
                }
            }
        }
        Ok(())
    }
}

fn check_parameter(path: &str, param: &ParameterDescriptor) -> Result<()> {
    for (label, bound) in [("minimum", param.minimum), ("maximum", param.maximum)] {
        if matches!(bound, Some(value) if !value.is_finite()) {
            return Err(DomainError::ConfigSchema(format!(
                "{}: {} must be a finite number",
                path, label
            )));
        }
    }
    if let (Some(min), Some(max)) = (param.minimum, param.maximum) {
        if min > max {
            return Err(DomainError::ConfigSchema(format!(
                "{}: minimum ({}) must be <= maximum ({})",
                path, min, max
            )));
        }
    }
    if matches!(&param.allowed, Some(values) if values.is_empty()) {
        return Err(DomainError::ConfigSchema(format!(
            "{}: enum must list at least one value",
            path
        )));
    }
    Ok(())
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot_with_param(param: Value) -> ConfigSnapshot {
        serde_json::from_value(json!({
            "name": "grc",
            "version": "1.0.0",
            "description": "test",
            "tools": {
                "risk-assessment": {
                    "create": {
                        "name": "createRiskAssessment",
                        "description": "Create",
                        "parameters": { "impact": param }
                    }
                }
            },
            "auth": {
                "type": "bearer",
                "description": "Bearer token",
                "configuration": { "tokenHeader": "Authorization", "tokenPrefix": "Bearer" }
            },
            "examples": {}
        }))
        .unwrap()
    }

    #[test]
    fn test_parameters_keep_document_order() {
        let params: Parameters = serde_json::from_str(
            r#"{
                "zeta": { "type": "string", "description": "z" },
                "alpha": { "type": "number", "description": "a" },
                "mid": { "type": "array", "description": "m", "items": { "type": "string" } }
            }"#,
        )
        .unwrap();
        assert_eq!(params.names(), vec!["zeta", "alpha", "mid"]);
        let kinds: Vec<&str> = params.iter().map(|(_, p)| p.kind.as_str()).collect();
        assert_eq!(kinds, vec!["string", "number", "array"]);
    }

    #[test]
    fn test_duplicate_parameter_is_rejected() {
        let err = serde_json::from_str::<Parameters>(
            r#"{
                "title": { "type": "string", "description": "a" },
                "title": { "type": "string", "description": "b" }
            }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate parameter 'title'"), "{}", err);
    }

    #[test]
    fn test_required_defaults_to_true() {
        let param: ParameterDescriptor =
            serde_json::from_value(json!({ "type": "string", "description": "d" })).unwrap();
        assert!(param.required);

        let optional: ParameterDescriptor = serde_json::from_value(
            json!({ "type": "string", "description": "d", "required": false }),
        )
        .unwrap();
        assert!(!optional.required);
    }

    #[test]
    fn test_non_string_enum_member_is_rejected() {
        let res = serde_json::from_value::<ParameterDescriptor>(
            json!({ "type": "string", "description": "d", "enum": ["a", 1] }),
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_tool_operations_iterate_in_crud_order() {
        let tool: ToolDescriptor = serde_json::from_value(json!({
            "delete": { "name": "d", "description": "d", "parameters": {} },
            "create": { "name": "c", "description": "c", "parameters": {} }
        }))
        .unwrap();
        let kinds: Vec<OperationKind> = tool.operations().map(|(kind, _)| kind).collect();
        assert_eq!(kinds, vec![OperationKind::Create, OperationKind::Delete]);
        assert!(tool.operation(OperationKind::List).is_none());
    }

    #[test]
    fn test_operation_kind_from_str() {
        assert_eq!("create".parse::<OperationKind>().unwrap(), OperationKind::Create);
        assert_eq!("delete".parse::<OperationKind>().unwrap(), OperationKind::Delete);
        assert!("Create".parse::<OperationKind>().is_err());
        assert!("archive".parse::<OperationKind>().is_err());
    }

    #[test]
    fn test_inverted_bounds_fail_invariants() {
        let snapshot = snapshot_with_param(
            json!({ "type": "number", "description": "i", "minimum": 10, "maximum": 1 }),
        );
        let err = snapshot.check_invariants().unwrap_err();
        assert!(matches!(err, DomainError::ConfigSchema(_)));
        assert!(err
            .to_string()
            .contains("tools.risk-assessment.create.parameters.impact"));
    }

    #[test]
    fn test_empty_enum_fails_invariants() {
        let snapshot =
            snapshot_with_param(json!({ "type": "string", "description": "s", "enum": [] }));
        assert!(matches!(
            snapshot.check_invariants(),
            Err(DomainError::ConfigSchema(_))
        ));
    }

    #[test]
    fn test_consistent_bounds_pass_invariants() {
        let snapshot = snapshot_with_param(
            json!({ "type": "number", "description": "i", "minimum": 1, "maximum": 1 }),
        );
        assert!(snapshot.check_invariants().is_ok());
    }
}
