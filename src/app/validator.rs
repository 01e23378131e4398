use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::app::constraint::{compile, Validator};
use crate::domain::{
    descriptor::{ConfigSnapshot, OperationDescriptor, OperationKind},
    errors::{DomainError, Result},
};

pub const ROOT_FIELD: &str = "$";

#[derive(Debug, Clone)]
pub struct CompiledOperation {
    tool: String,
    kind: OperationKind,
    validators: Vec<Validator>,
}

impl CompiledOperation {
    pub fn compile(tool: &str, kind: OperationKind, op: &OperationDescriptor) -> Self {
        Self {
            tool: tool.to_string(),
            kind,
            validators: op
                .parameters
                .iter()
                .map(|(name, param)| compile(name, param))
                .collect(),
        }
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    /// Returns only declared parameters; undeclared input fields are dropped.
    pub fn validate(&self, input: &Value) -> Result<Map<String, Value>> {
        let fields = input
            .as_object()
            .ok_or_else(|| DomainError::violation(ROOT_FIELD, "expected object", Some(input)))?;

        let mut validated = Map::new();
        for validator in &self.validators {
            if let Some(value) = validator.check(fields.get(validator.field()))? {
                validated.insert(validator.field().to_string(), value);
            }
        }
        Ok(validated)
    }
}

#[derive(Debug, Default)]
pub struct ParameterValidator {
    operations: BTreeMap<String, BTreeMap<OperationKind, CompiledOperation>>,
}

impl ParameterValidator {
    pub fn new(snapshot: &ConfigSnapshot) -> Self {
        let operations = snapshot
            .tools
            .iter()
            .map(|(tool_name, tool)| {
                let compiled = tool
                    .operations()
                    .map(|(kind, op)| (kind, CompiledOperation::compile(tool_name, kind, op)))
                    .collect();
                (tool_name.clone(), compiled)
            })
            .collect();
        Self { operations }
    }

    pub fn operation(&self, tool: &str, operation: &str) -> Result<&CompiledOperation> {
        operation
            .parse::<OperationKind>()
            .ok()
            .and_then(|kind| self.operations.get(tool)?.get(&kind))
            .ok_or_else(|| DomainError::UnknownOperation {
                tool: tool.to_string(),
                operation: operation.to_string(),
            })
    }

    pub fn validate(&self, tool: &str, operation: &str, input: &Value) -> Result<Map<String, Value>> {
        let compiled = self.operation(tool, operation)?;
        compiled.validate(input).map_err(|err| {
            tracing::debug!(tool, operation, error = %err, "parameters rejected");
            err
        })
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────
