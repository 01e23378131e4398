use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::app::compliance_usecases::ComplianceUseCases;
use crate::app::mcp_config::McpConfig;
use crate::domain::descriptor::OperationKind;
use crate::domain::errors::DomainError;

use super::tool_success;

pub(super) const RISK_ASSESSMENT_TOOL: &str = "risk-assessment";
pub(super) const COMPLIANCE_REPORT_TOOL: &str = "compliance-report";
pub(super) const POLICY_DOCUMENT_TOOL: &str = "policy-document";

const RISK_ID: &str = "riskId";
const REPORT_ID: &str = "reportId";
const POLICY_ID: &str = "policyId";

/// Validates `args` against the configured operation, then runs it.
/// Business logic only ever sees declared, validated fields.
pub(super) async fn handle_tool_call(
    tool: &str,
    args: &Value,
    config: &McpConfig,
    uc: &ComplianceUseCases,
) -> Result<Value, DomainError> {
    let mut fields = args.as_object().cloned().unwrap_or_default();
    let action = match fields.remove("action") {
        Some(Value::String(action)) => action,
        Some(_) => return Err(DomainError::InvalidData("'action' must be a string".into())),
        None => {
            return Err(DomainError::InvalidData(format!(
                "'action' is required for tool '{}'",
                tool
            )))
        }
    };

    let validated = config.validate_parameters(tool, &action, &Value::Object(fields))?;
    let kind: OperationKind = action.parse()?;
    tracing::debug!(tool, action = %kind, fields = validated.len(), "tool call");

    let payload = dispatch(tool, kind, validated, uc).await?;
    tool_success(tool, kind.as_str(), payload)
}

async fn dispatch(
    tool: &str,
    kind: OperationKind,
    mut fields: Map<String, Value>,
    uc: &ComplianceUseCases,
) -> Result<Value, DomainError> {
    use OperationKind::*;

    match (tool, kind) {
        (RISK_ASSESSMENT_TOOL, Create) => {
            to_payload(uc.create_risk_assessment(decode(fields)?).await?)
        }
        (RISK_ASSESSMENT_TOOL, List) => match take_id_opt(&mut fields, RISK_ID)? {
            Some(id) => single(RISK_ID, &id, uc.get_risk_assessment(&id).await?),
            None => to_payload(uc.list_risk_assessments().await?),
        },
        (RISK_ASSESSMENT_TOOL, Update) => {
            let id = take_id(&mut fields, RISK_ID)?;
            to_payload(uc.update_risk_assessment(&id, decode(fields)?).await?)
        }
        (RISK_ASSESSMENT_TOOL, Delete) => {
            let id = take_id(&mut fields, RISK_ID)?;
            let deleted = uc.delete_risk_assessment(&id).await?;
            Ok(json!({ RISK_ID: id, "deleted": deleted }))
        }

        (COMPLIANCE_REPORT_TOOL, Create) => {
            to_payload(uc.create_compliance_report(decode(fields)?).await?)
        }
        (COMPLIANCE_REPORT_TOOL, List) => match take_id_opt(&mut fields, REPORT_ID)? {
            Some(id) => single(REPORT_ID, &id, uc.get_compliance_report(&id).await?),
            None => to_payload(uc.list_compliance_reports().await?),
        },
        (COMPLIANCE_REPORT_TOOL, Update) => {
            let id = take_id(&mut fields, REPORT_ID)?;
            to_payload(uc.update_compliance_report(&id, decode(fields)?).await?)
        }
        (COMPLIANCE_REPORT_TOOL, Delete) => {
            let id = take_id(&mut fields, REPORT_ID)?;
            let deleted = uc.delete_compliance_report(&id).await?;
            Ok(json!({ REPORT_ID: id, "deleted": deleted }))
        }

        (POLICY_DOCUMENT_TOOL, Create) => {
            to_payload(uc.create_policy_document(decode(fields)?).await?)
        }
        (POLICY_DOCUMENT_TOOL, List) => match take_id_opt(&mut fields, POLICY_ID)? {
            Some(id) => single(POLICY_ID, &id, uc.get_policy_document(&id).await?),
            None => to_payload(uc.list_policy_documents().await?),
        },
        (POLICY_DOCUMENT_TOOL, Update) => {
            let id = take_id(&mut fields, POLICY_ID)?;
            to_payload(uc.update_policy_document(&id, decode(fields)?).await?)
        }
        (POLICY_DOCUMENT_TOOL, Delete) => {
            let id = take_id(&mut fields, POLICY_ID)?;
            let deleted = uc.delete_policy_document(&id).await?;
            Ok(json!({ POLICY_ID: id, "deleted": deleted }))
        }

        _ => Err(DomainError::NotFound(format!(
            "no handler registered for {}.{}",
            tool, kind
        ))),
    }
}

fn decode<T: DeserializeOwned>(fields: Map<String, Value>) -> Result<T, DomainError> {
    serde_json::from_value(Value::Object(fields))
        .map_err(|e| DomainError::InvalidData(format!("invalid arguments: {}", e)))
}

fn to_payload<T: Serialize>(value: T) -> Result<Value, DomainError> {
    Ok(serde_json::to_value(value)?)
}

fn single<T: Serialize>(key: &str, id: &str, record: Option<T>) -> Result<Value, DomainError> {
    match record {
        Some(record) => to_payload(vec![record]),
        None => Err(DomainError::NotFound(format!("{} '{}' not found", key, id))),
    }
}

fn take_id_opt(fields: &mut Map<String, Value>, key: &str) -> Result<Option<String>, DomainError> {
    match fields.remove(key) {
        None => Ok(None),
        Some(Value::String(id)) if !id.trim().is_empty() => Ok(Some(id.trim().to_string())),
        Some(_) => Err(DomainError::InvalidData(format!(
            "'{}' must be a non-empty string",
            key
        ))),
    }
}

fn take_id(fields: &mut Map<String, Value>, key: &str) -> Result<String, DomainError> {
    take_id_opt(fields, key)?
        .ok_or_else(|| DomainError::InvalidData(format!("'{}' is required", key)))
}
