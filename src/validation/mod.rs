//! Asset validation: per-asset integrity checks with bounded retry,
//! aggregated into a single three-way report.

pub mod checks;
pub mod engine;

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use checks::{check_asset, CheckLimits, CheckOutcome};
pub use engine::{ValidationEngine, ValidationError};

/// Overall outcome of a validation run.
///
/// Three-way rather than boolean so the pipeline can continue to a
/// best-effort publish under partial asset loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Passed,
    PassedWithWarnings,
    Failed,
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ValidationStatus::Passed => "passed",
            ValidationStatus::PassedWithWarnings => "passed_with_warnings",
            ValidationStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Severity of one validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationSeverity {
    /// The asset is unusable; it counts as invalid.
    Error,
    /// The asset is usable but falls short of a configured floor.
    Warning,
}

/// One structured finding produced while checking one asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationFinding {
    pub asset_id: String,
    pub severity: ValidationSeverity,
    pub message: String,
}

/// Aggregated result of one validation run.
///
/// Recomputed from scratch each run, never persisted incrementally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub status: ValidationStatus,
    pub total_checked: u32,
    pub valid_count: u32,
    pub invalid_count: u32,
    /// Findings in check order.
    pub findings: Vec<ValidationFinding>,
    /// Scalar metrics keyed `{asset_id}.{metric}`.
    pub metrics: BTreeMap<String, f64>,
    /// Retries consumed per asset category.
    pub retry_summary: BTreeMap<String, u32>,
    pub duration: Duration,
}

impl ValidationReport {
    /// Findings at error severity.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationFinding> {
        self.findings
            .iter()
            .filter(|f| f.severity == ValidationSeverity::Error)
    }

    /// Findings at warning severity.
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationFinding> {
        self.findings
            .iter()
            .filter(|f| f.severity == ValidationSeverity::Warning)
    }
}

/// Derives the three-way status from the valid/invalid counts.
pub(crate) fn derive_status(total: u32, valid: u32, invalid: u32) -> ValidationStatus {
    if total > 0 && valid == 0 {
        ValidationStatus::Failed
    } else if invalid > 0 {
        ValidationStatus::PassedWithWarnings
    } else {
        ValidationStatus::Passed
    }
}
