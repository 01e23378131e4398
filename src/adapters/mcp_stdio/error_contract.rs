use serde_json::{json, Value};

use crate::adapters::mcp_stdio::rpc::RpcEnvelope;
use crate::adapters::mcp_stdio::to_json_text;
use crate::domain::errors::DomainError;

pub(super) fn domain_error_response(id: Value, err: &DomainError) -> RpcEnvelope {
    let (kind, code, details) = match err {
        DomainError::ConfigLoad(_) => ("config", "config_load", Value::Null),
        DomainError::ConfigSchema(_) => ("config", "config_schema", Value::Null),
        DomainError::UnknownOperation { tool, operation } => (
            "not_found",
            "unknown_operation",
            json!({ "tool": tool, "operation": operation }),
        ),
        DomainError::ConstraintViolation {
            field,
            reason,
            actual,
        } => (
            "validation",
            "constraint_violation",
            json!({ "field": field, "reason": reason, "actual": actual }),
        ),
        DomainError::InvalidData(_) => ("validation", "invalid_data", Value::Null),
        DomainError::NotFound(_) => ("not_found", "not_found", Value::Null),
        DomainError::Unauthorized(_) => ("unauthorized", "unauthorized", Value::Null),
        DomainError::Io(_) => ("io_error", "io_error", Value::Null),
        DomainError::Deserialize(_) => ("deserialize_error", "deserialize_error", Value::Null),
    };

    let mut payload = json!({
        "error": true,
        "kind": kind,
        "code": code,
        "message": err.to_string(),
        "request_id": id
    });
    if !details.is_null() {
        payload["details"] = details;
    }

    // MCP convention: tool-level errors are returned inside result + isError=true
    RpcEnvelope::success(
        id,
        json!({
            "content": [{ "type": "text", "text": to_json_text(&payload) }],
            "isError": true
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(envelope: &RpcEnvelope) -> Value {
        let result = envelope.result.as_ref().unwrap();
        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().unwrap();
        serde_json::from_str(text).expect("must be valid JSON")
    }

    #[test]
    fn test_constraint_violation_carries_field_details() {
        let err = DomainError::violation("impact", "must be <= 5", Some(&json!(6)));
        let parsed = body(&domain_error_response(json!(42), &err));
        assert_eq!(parsed["kind"], "validation");
        assert_eq!(parsed["code"], "constraint_violation");
        assert_eq!(parsed["request_id"], 42);
        assert_eq!(parsed["details"]["field"], "impact");
        assert_eq!(parsed["details"]["reason"], "must be <= 5");
        assert_eq!(parsed["details"]["actual"], 6);
    }

    #[test]
    fn test_unknown_operation_names_the_pair() {
        let err = DomainError::UnknownOperation {
            tool: "nonexistent-tool".into(),
            operation: "create".into(),
        };
        let parsed = body(&domain_error_response(json!("req-1"), &err));
        assert_eq!(parsed["code"], "unknown_operation");
        assert_eq!(parsed["message"], "Tool nonexistent-tool.create not found");
        assert_eq!(parsed["details"]["tool"], "nonexistent-tool");
        assert_eq!(parsed["request_id"], "req-1");
    }

    #[test]
    fn test_simple_errors_have_no_details() {
        let parsed = body(&domain_error_response(
            json!(1),
            &DomainError::Unauthorized("invalid token".into()),
        ));
        assert_eq!(parsed["kind"], "unauthorized");
        assert!(parsed.get("details").is_none());
    }
}
