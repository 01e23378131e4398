use serde_json::{json, Map, Value};

use crate::app::mcp_config::McpConfig;
use crate::domain::descriptor::{ParameterDescriptor, ToolDescriptor};

/// `tools/list` result: one MCP tool per configured tool, selected
/// operation passed as `action`.
pub(super) fn tools_schema(config: &McpConfig) -> Value {
    let tools: Vec<Value> = config
        .config()
        .tools
        .iter()
        .map(|(name, tool)| tool_schema(name, tool))
        .collect();
    json!({ "tools": tools })
}

fn tool_schema(name: &str, tool: &ToolDescriptor) -> Value {
    let actions: Vec<&str> = tool.operations().map(|(kind, _)| kind.as_str()).collect();
    let summary = tool
        .operations()
        .map(|(kind, op)| format!("{}: {}", kind, op.description))
        .collect::<Vec<_>>()
        .join("; ");

    let mut properties = Map::new();
    properties.insert(
        "action".to_string(),
        json!({
            "type": "string",
            "description": "Operation to perform",
            "enum": actions
        }),
    );
    // Operations may share a parameter name; the first declaration describes it.
    for (_, op) in tool.operations() {
        for (param_name, param) in op.parameters.iter() {
            if !properties.contains_key(param_name) {
                properties.insert(param_name.to_string(), parameter_schema(param));
            }
        }
    }

    json!({
        "name": name,
        "description": summary,
        "inputSchema": {
            "type": "object",
            "properties": properties,
            "required": ["action"]
        }
    })
}

fn parameter_schema(param: &ParameterDescriptor) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::from(param.kind.as_str()));
    schema.insert("description".into(), Value::from(param.description.as_str()));
    if let Some(format) = &param.format {
        schema.insert("format".into(), Value::from(format.as_str()));
    }
    if let Some(min) = param.minimum {
        schema.insert("minimum".into(), json!(min));
    }
    if let Some(max) = param.maximum {
        schema.insert("maximum".into(), json!(max));
    }
    if let Some(allowed) = &param.allowed {
        schema.insert("enum".into(), json!(allowed));
    }
    if let Some(items) = &param.items {
        schema.insert("items".into(), json!({ "type": items.kind }));
    }
    Value::Object(schema)
}
