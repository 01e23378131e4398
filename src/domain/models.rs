use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::errors::{DomainError, Result};

pub const MIN_RISK_SCORE: f64 = 1.0;
pub const MAX_RISK_SCORE: f64 = 5.0;

/// `<prefix>-<unix millis>-<4 base32 chars>`; the suffix keeps ids distinct
/// when two records land in the same millisecond.
pub fn new_record_id(prefix: &str) -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz234567";
    let mut rng = rand::thread_rng();
    let mut suffix = String::with_capacity(4);
    for _ in 0..4 {
        let idx = rand::Rng::gen_range(&mut rng, 0..ALPHABET.len());
        suffix.push(ALPHABET[idx] as char);
    }
    format!("{}-{}-{}", prefix, Utc::now().timestamp_millis(), suffix)
}

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

// ── Record ────────────────────────────────────────────────────────────────────

pub trait Record: Clone + Send + Sync + 'static {
    const KIND: &'static str;

    fn record_id(&self) -> Option<&str>;
}

impl Record for RiskAssessment {
    const KIND: &'static str = "risk assessment";

    fn record_id(&self) -> Option<&str> {
        self.risk_id.as_deref()
    }
}

impl Record for ComplianceReport {
    const KIND: &'static str = "compliance report";

    fn record_id(&self) -> Option<&str> {
        self.report_id.as_deref()
    }
}

impl Record for PolicyDocument {
    const KIND: &'static str = "policy document";

    fn record_id(&self) -> Option<&str> {
        self.policy_id.as_deref()
    }
}

// ── ReportStatus ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportStatus {
    Compliant,
    NonCompliant,
    InProgress,
}

// ── RiskAssessment ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_id: Option<String>,
    pub risk_name: String,
    pub description: String,
    pub category: String,
    pub impact: f64,
    pub likelihood: f64,
    pub mitigation_plan: String,
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

impl RiskAssessment {
    pub fn check(&self) -> Result<()> {
        check_score("impact", self.impact)?;
        check_score("likelihood", self.likelihood)
    }
}

fn check_score(field: &str, value: f64) -> Result<()> {
    if !(MIN_RISK_SCORE..=MAX_RISK_SCORE).contains(&value) {
        return Err(DomainError::InvalidData(format!(
            "{} must be between {} and {} (got {})",
            field, MIN_RISK_SCORE, MAX_RISK_SCORE, value
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessmentPatch {
    pub risk_name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub impact: Option<f64>,
    pub likelihood: Option<f64>,
    pub mitigation_plan: Option<String>,
    pub owner: Option<String>,
    pub due_date: Option<String>,
}

impl RiskAssessmentPatch {
    pub fn apply(self, target: &mut RiskAssessment) {
        merge(&mut target.risk_name, self.risk_name);
        merge(&mut target.description, self.description);
        merge(&mut target.category, self.category);
        merge(&mut target.impact, self.impact);
        merge(&mut target.likelihood, self.likelihood);
        merge(&mut target.mitigation_plan, self.mitigation_plan);
        merge(&mut target.owner, self.owner);
        if self.due_date.is_some() {
            target.due_date = self.due_date;
        }
    }
}

// ── ComplianceReport ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_id: Option<String>,
    pub title: String,
    pub regulation_id: String,
    pub status: ReportStatus,
    pub findings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReportPatch {
    pub title: Option<String>,
    pub regulation_id: Option<String>,
    pub status: Option<ReportStatus>,
    pub findings: Option<Vec<String>>,
}

impl ComplianceReportPatch {
    pub fn apply(self, target: &mut ComplianceReport) {
        merge(&mut target.title, self.title);
        merge(&mut target.regulation_id, self.regulation_id);
        merge(&mut target.status, self.status);
        merge(&mut target.findings, self.findings);
    }
}

// ── PolicyDocument ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,
    pub title: String,
    pub content: String,
    pub version: String,
    pub approved_by: String,
    pub effective_date: String,
    pub review_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDocumentPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub version: Option<String>,
    pub approved_by: Option<String>,
    pub effective_date: Option<String>,
    pub review_date: Option<String>,
}

impl PolicyDocumentPatch {
    pub fn apply(self, target: &mut PolicyDocument) {
        merge(&mut target.title, self.title);
        merge(&mut target.content, self.content);
        merge(&mut target.version, self.version);
        merge(&mut target.approved_by, self.approved_by);
        merge(&mut target.effective_date, self.effective_date);
        merge(&mut target.review_date, self.review_date);
    }
}

fn merge<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────
