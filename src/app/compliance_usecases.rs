use std::sync::Arc;

use crate::{
    adapters::memory_store::InMemoryRecordStore,
    app::ports::RecordRepositoryPort,
    domain::{
        errors::{DomainError, Result},
        models::{
            new_record_id, now_rfc3339, ComplianceReport, ComplianceReportPatch, PolicyDocument,
            PolicyDocumentPatch, Record, RiskAssessment, RiskAssessmentPatch,
        },
    },
};

pub struct ComplianceUseCases {
    risks: Arc<dyn RecordRepositoryPort<RiskAssessment>>,
    reports: Arc<dyn RecordRepositoryPort<ComplianceReport>>,
    policies: Arc<dyn RecordRepositoryPort<PolicyDocument>>,
}

impl ComplianceUseCases {
    pub fn new(
        risks: Arc<dyn RecordRepositoryPort<RiskAssessment>>,
        reports: Arc<dyn RecordRepositoryPort<ComplianceReport>>,
        policies: Arc<dyn RecordRepositoryPort<PolicyDocument>>,
    ) -> Self {
        Self {
            risks,
            reports,
            policies,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(InMemoryRecordStore::new()),
        )
    }

    // ── risk assessments ──────────────────────────────────────────────────────

    pub async fn create_risk_assessment(&self, mut risk: RiskAssessment) -> Result<RiskAssessment> {
        risk.check()?;
        risk.risk_id.get_or_insert_with(|| new_record_id("risk"));
        risk.due_date.get_or_insert_with(now_rfc3339);
        self.risks.insert(risk.clone()).await?;
        tracing::debug!(id = ?risk.risk_id, "risk assessment created");
        Ok(risk)
    }

    pub async fn list_risk_assessments(&self) -> Result<Vec<RiskAssessment>> {
        self.risks.list().await
    }

    pub async fn get_risk_assessment(&self, risk_id: &str) -> Result<Option<RiskAssessment>> {
        self.risks.get(risk_id).await
    }

    pub async fn update_risk_assessment(
        &self,
        risk_id: &str,
        patch: RiskAssessmentPatch,
    ) -> Result<RiskAssessment> {
        update_record(self.risks.as_ref(), risk_id, |risk| {
            patch.apply(risk);
            risk.check()
        })
        .await
    }

    pub async fn delete_risk_assessment(&self, risk_id: &str) -> Result<bool> {
        self.risks.delete(risk_id).await
    }

    // ── compliance reports ────────────────────────────────────────────────────

    pub async fn create_compliance_report(
        &self,
        mut report: ComplianceReport,
    ) -> Result<ComplianceReport> {
        let now = now_rfc3339();
        report.report_id.get_or_insert_with(|| new_record_id("report"));
        report.created_at.get_or_insert_with(|| now.clone());
        report.updated_at = Some(now);
        self.reports.insert(report.clone()).await?;
        tracing::debug!(id = ?report.report_id, "compliance report created");
        Ok(report)
    }

    pub async fn list_compliance_reports(&self) -> Result<Vec<ComplianceReport>> {
        self.reports.list().await
    }

    pub async fn get_compliance_report(&self, report_id: &str) -> Result<Option<ComplianceReport>> {
        self.reports.get(report_id).await
    }

    pub async fn update_compliance_report(
        &self,
        report_id: &str,
        patch: ComplianceReportPatch,
    ) -> Result<ComplianceReport> {
        update_record(self.reports.as_ref(), report_id, |report| {
            patch.apply(report);
            report.updated_at = Some(now_rfc3339());
            Ok(())
        })
        .await
    }

    pub async fn delete_compliance_report(&self, report_id: &str) -> Result<bool> {
        self.reports.delete(report_id).await
    }

    // ── policy documents ──────────────────────────────────────────────────────

    pub async fn create_policy_document(&self, mut policy: PolicyDocument) -> Result<PolicyDocument> {
        policy.policy_id.get_or_insert_with(|| new_record_id("policy"));
        self.policies.insert(policy.clone()).await?;
        tracing::debug!(id = ?policy.policy_id, "policy document created");
        Ok(policy)
    }

    pub async fn list_policy_documents(&self) -> Result<Vec<PolicyDocument>> {
        self.policies.list().await
    }

    pub async fn get_policy_document(&self, policy_id: &str) -> Result<Option<PolicyDocument>> {
        self.policies.get(policy_id).await
    }

    pub async fn update_policy_document(
        &self,
        policy_id: &str,
        patch: PolicyDocumentPatch,
    ) -> Result<PolicyDocument> {
        update_record(self.policies.as_ref(), policy_id, |policy| {
            patch.apply(policy);
            Ok(())
        })
        .await
    }

    pub async fn delete_policy_document(&self, policy_id: &str) -> Result<bool> {
        self.policies.delete(policy_id).await
    }
}

/// Read-modify-replace. Patches never carry an id, so the stored id survives.
async fn update_record<T, F>(repo: &dyn RecordRepositoryPort<T>, id: &str, mutate: F) -> Result<T>
where
    T: Record,
    F: FnOnce(&mut T) -> Result<()>,
{
    let not_found = || DomainError::NotFound(format!("{} '{}' not found", T::KIND, id));
    let mut record = repo.get(id).await?.ok_or_else(not_found)?;
    mutate(&mut record)?;
    if !repo.replace(record.clone()).await? {
        return Err(not_found());
    }
    Ok(record)
}
