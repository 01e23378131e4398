use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::tempdir;

use grc_mcp_server::{
    adapters::config_source::{FileConfigSource, StaticConfigSource, MAX_CONFIG_BYTES},
    app::{compliance_usecases::ComplianceUseCases, config_loader::ConfigLoader},
    domain::{
        descriptor::OperationKind,
        errors::DomainError,
        models::{ComplianceReport, PolicyDocumentPatch, ReportStatus, RiskAssessment},
    },
};

const SAMPLE_CONFIG: &str = include_str!("../config/mcp.json");

#[test]
fn test_load_from_file_and_inspect_descriptors() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("mcp.json");
    std::fs::write(&path, SAMPLE_CONFIG).unwrap();

    let loader = ConfigLoader::new();
    assert!(loader.get().is_none());
    let config = loader.load(&FileConfigSource::new(&path)).unwrap();

    assert_eq!(
        config.tool_names().collect::<Vec<_>>(),
        vec!["compliance-report", "policy-document", "risk-assessment"]
    );
    let create = config
        .tool_operation("risk-assessment", OperationKind::Create)
        .unwrap();
    assert_eq!(create.name, "createRiskAssessment");
    assert_eq!(
        create.parameters.names(),
        vec![
            "riskName",
            "description",
            "category",
            "impact",
            "likelihood",
            "mitigationPlan",
            "owner",
            "dueDate"
        ]
    );
    assert_eq!(config.config().auth.configuration.token_prefix, "Bearer");
    assert!(config.example("risk-assessment", Some("delete")).is_none());
    assert!(Arc::ptr_eq(&config, &loader.get().unwrap()));
}

#[test]
fn test_missing_file_is_a_load_error() {
    let tmp = tempdir().unwrap();
    let loader = ConfigLoader::new();
    let err = loader
        .load(&FileConfigSource::new(tmp.path().join("absent.json")))
        .unwrap_err();
    assert!(matches!(err, DomainError::ConfigLoad(_)));
    assert!(loader.get().is_none());
}

#[test]
fn test_oversized_file_is_rejected_before_parsing() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("huge.json");
    std::fs::write(&path, vec![b' '; MAX_CONFIG_BYTES as usize + 1]).unwrap();

    let err = ConfigLoader::new()
        .load(&FileConfigSource::new(&path))
        .unwrap_err();
    assert!(matches!(err, DomainError::ConfigLoad(_)));
    assert!(err.to_string().contains("too large"));
}

#[test]
fn test_schema_errors_reject_the_whole_document() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("mcp.json");

    let mut doc: Value = serde_json::from_str(SAMPLE_CONFIG).unwrap();
    doc["tools"]["risk-assessment"]["create"]["parameters"]["impact"]["minimum"] = json!(9);
    std::fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();
    let err = ConfigLoader::new()
        .load(&FileConfigSource::new(&path))
        .unwrap_err();
    assert!(matches!(err, DomainError::ConfigSchema(_)));

    let mut doc: Value = serde_json::from_str(SAMPLE_CONFIG).unwrap();
    doc.as_object_mut().unwrap().remove("auth");
    std::fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();
    let err = ConfigLoader::new()
        .load(&FileConfigSource::new(&path))
        .unwrap_err();
    assert!(matches!(err, DomainError::ConfigSchema(_)));
}

#[tokio::test]
async fn test_validated_examples_drive_the_compliance_service() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("mcp.json");
    std::fs::write(&path, SAMPLE_CONFIG).unwrap();
    let config = ConfigLoader::new()
        .load(&FileConfigSource::new(&path))
        .unwrap();
    let uc = ComplianceUseCases::in_memory();

    let risk_fields = config
        .validate_parameters(
            "risk-assessment",
            "create",
            config.example("risk-assessment", None).unwrap(),
        )
        .unwrap();
    let risk: RiskAssessment = serde_json::from_value(Value::Object(risk_fields)).unwrap();
    let risk = uc.create_risk_assessment(risk).await.unwrap();
    assert_eq!(risk.due_date.as_deref(), Some("2025-12-31T00:00:00.000Z"));

    let report_fields = config
        .validate_parameters(
            "compliance-report",
            "create",
            config.example("compliance-report", None).unwrap(),
        )
        .unwrap();
    let report: ComplianceReport = serde_json::from_value(Value::Object(report_fields)).unwrap();
    let report = uc.create_compliance_report(report).await.unwrap();
    assert_eq!(report.status, ReportStatus::InProgress);
    assert_eq!(report.findings.len(), 2);

    let reports = uc.list_compliance_reports().await.unwrap();
    assert_eq!(reports, vec![report.clone()]);

    let risk_id = risk.risk_id.unwrap();
    assert!(uc.delete_risk_assessment(&risk_id).await.unwrap());
    assert!(uc.get_risk_assessment(&risk_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_policy_update_keeps_untouched_fields() {
    let config = ConfigLoader::new()
        .load(&StaticConfigSource::new("sample", SAMPLE_CONFIG))
        .unwrap();
    let uc = ComplianceUseCases::in_memory();

    let fields = config
        .validate_parameters(
            "policy-document",
            "create",
            config.example("policy-document", None).unwrap(),
        )
        .unwrap();
    let created = uc
        .create_policy_document(serde_json::from_value(Value::Object(fields)).unwrap())
        .await
        .unwrap();
    let id = created.policy_id.clone().unwrap();

    let err = config
        .validate_parameters(
            "policy-document",
            "update",
            &json!({ "policyId": id, "version": "1.1.0", "approvedBy": 7 }),
        )
        .unwrap_err();
    assert!(matches!(err, DomainError::ConstraintViolation { .. }));

    let mut patch_fields = config
        .validate_parameters(
            "policy-document",
            "update",
            &json!({ "policyId": id, "version": "1.1.0" }),
        )
        .unwrap();
    patch_fields.remove("policyId");
    let patch: PolicyDocumentPatch = serde_json::from_value(Value::Object(patch_fields)).unwrap();
    let updated = uc.update_policy_document(&id, patch).await.unwrap();

    assert_eq!(updated.version, "1.1.0");
    assert_eq!(updated.title, created.title);
    assert_eq!(updated.policy_id, created.policy_id);
}
