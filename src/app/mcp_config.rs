use serde_json::{Map, Value};

use crate::{
    app::validator::ParameterValidator,
    domain::{
        descriptor::{ConfigSnapshot, OperationDescriptor, OperationKind, ToolDescriptor},
        errors::Result,
    },
};

pub const DEFAULT_EXAMPLE_OPERATION: &str = "create";

#[derive(Debug)]
pub struct McpConfig {
    snapshot: ConfigSnapshot,
    validator: ParameterValidator,
}

impl McpConfig {
    pub fn new(snapshot: ConfigSnapshot) -> Self {
        let validator = ParameterValidator::new(&snapshot);
        Self {
            snapshot,
            validator,
        }
    }

    pub fn config(&self) -> &ConfigSnapshot {
        &self.snapshot
    }

    pub fn tool_names(&self) -> impl Iterator<Item = &str> {
        self.snapshot.tools.keys().map(String::as_str)
    }

    pub fn tool_config(&self, tool: &str) -> Option<&ToolDescriptor> {
        self.snapshot.tools.get(tool)
    }

    pub fn tool_operation(&self, tool: &str, kind: OperationKind) -> Option<&OperationDescriptor> {
        self.tool_config(tool)?.operation(kind)
    }

    /// Worked example for `tool`; `operation` defaults to `create`.
    pub fn example(&self, tool: &str, operation: Option<&str>) -> Option<&Value> {
        self.snapshot
            .examples
            .get(tool)?
            .get(operation.unwrap_or(DEFAULT_EXAMPLE_OPERATION))
    }

    pub fn validate_parameters(
        &self,
        tool: &str,
        operation: &str,
        raw: &Value,
    ) -> Result<Map<String, Value>> {
        self.validator.validate(tool, operation, raw)
    }
}
