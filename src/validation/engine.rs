//! Validation engine: bounded per-asset retry plus report aggregation.
//!
//! Each asset gets its own retry budget with exponential backoff on
//! integrity failure. A final failure marks the asset invalid and appends an
//! error finding; it never aborts the run. Soft shortfalls become warning
//! findings on an asset that still counts as valid.

use std::collections::BTreeMap;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::agents::types::GeneratedArtifact;
use crate::config::ForgeConfig;
use crate::pipeline::cancel::CancelToken;
use crate::storage::AssetStore;
use crate::validation::{
    check_asset, derive_status, CheckLimits, ValidationFinding, ValidationReport,
    ValidationSeverity,
};

/// Errors raised by the engine itself; check failures never surface here.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Validation cancelled")]
    Cancelled,
}

/// Runs integrity-and-quality validation over a run's accepted assets.
#[derive(Debug)]
pub struct ValidationEngine {
    store: AssetStore,
    limits: CheckLimits,
    max_retries: u32,
    backoff_base: Duration,
}

impl ValidationEngine {
    pub fn new(store: AssetStore, config: &ForgeConfig) -> Self {
        Self {
            store,
            limits: CheckLimits::from_config(config),
            max_retries: config.validation_max_retries,
            backoff_base: config.validation_backoff_base,
        }
    }

    /// Validates every asset and aggregates one report.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::Cancelled` when the run's cancel signal
    /// fires during a backoff sleep.
    pub async fn validate(
        &self,
        artifacts: &[&GeneratedArtifact],
        cancel: &CancelToken,
    ) -> Result<ValidationReport, ValidationError> {
        let started = Instant::now();
        info!(assets = artifacts.len(), "Starting asset validation");

        let mut findings = Vec::new();
        let mut metrics = BTreeMap::new();
        let mut retry_summary: BTreeMap<String, u32> = BTreeMap::new();
        let mut valid_count = 0u32;
        let mut invalid_count = 0u32;

        for artifact in artifacts {
            match self
                .check_with_retry(artifact, &mut retry_summary, cancel)
                .await?
            {
                Ok(outcome) => {
                    valid_count += 1;
                    for (metric, value) in outcome.metrics {
                        metrics.insert(format!("{}.{}", artifact.id, metric), value);
                    }
                    for warning in outcome.warnings {
                        findings.push(ValidationFinding {
                            asset_id: artifact.id.clone(),
                            severity: ValidationSeverity::Warning,
                            message: warning,
                        });
                    }
                }
                Err(message) => {
                    invalid_count += 1;
                    findings.push(ValidationFinding {
                        asset_id: artifact.id.clone(),
                        severity: ValidationSeverity::Error,
                        message,
                    });
                }
            }
        }

        let total_checked = artifacts.len() as u32;
        let status = derive_status(total_checked, valid_count, invalid_count);
        info!(
            %status,
            valid = valid_count,
            invalid = invalid_count,
            "Asset validation finished"
        );

        Ok(ValidationReport {
            status,
            total_checked,
            valid_count,
            invalid_count,
            findings,
            metrics,
            retry_summary,
            duration: started.elapsed(),
        })
    }

    /// Checks one asset, retrying integrity failures with `base * 2^attempt`
    /// backoff. The inner `Result` carries the asset-level outcome.
    async fn check_with_retry(
        &self,
        artifact: &GeneratedArtifact,
        retry_summary: &mut BTreeMap<String, u32>,
        cancel: &CancelToken,
    ) -> Result<Result<crate::validation::CheckOutcome, String>, ValidationError> {
        let category = artifact.category.as_str();
        let mut attempt = 0u32;
        loop {
            match check_asset(&self.store, artifact, &self.limits) {
                Ok(outcome) => return Ok(Ok(outcome)),
                Err(err) if attempt < self.max_retries => {
                    let delay = self.backoff_base * 2u32.saturating_pow(attempt);
                    debug!(
                        asset_id = %artifact.id,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Integrity check failed, retrying"
                    );
                    *retry_summary.entry(category.to_string()).or_insert(0) += 1;
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = cancel.cancelled() => return Err(ValidationError::Cancelled),
                    }
                    attempt += 1;
                }
                Err(err) => {
                    warn!(asset_id = %artifact.id, error = %err, "Asset failed validation");
                    return Ok(Err(err.to_string()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::types::AssetCategory;
    use crate::validation::ValidationStatus;
    use std::path::PathBuf;

    fn fast_engine(store: AssetStore) -> ValidationEngine {
        let mut config = ForgeConfig::default();
        config.validation_backoff_base = Duration::ZERO;
        ValidationEngine::new(store, &config)
    }

    fn artifact(id: &str, category: AssetCategory, location: PathBuf) -> GeneratedArtifact {
        GeneratedArtifact {
            id: id.to_string(),
            slide_number: None,
            category,
            location,
            quality_score: 0.9,
            generation_latency: Duration::from_millis(5),
            refinement_iteration: 0,
            prompt_used: "p".to_string(),
            duration_seconds: None,
        }
    }

    fn written_artifact(store: &AssetStore, id: &str) -> GeneratedArtifact {
        let path = store.root().join(format!("{}.png", id));
        store.write(&path, &[0u8; 64]).expect("write");
        artifact(id, AssetCategory::Image, path)
    }

    #[tokio::test]
    async fn test_all_valid_assets_pass() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = AssetStore::new(dir.path());
        let a = written_artifact(&store, "a");
        let b = written_artifact(&store, "b");
        let engine = fast_engine(store);

        let report = engine
            .validate(&[&a, &b], &CancelToken::never())
            .await
            .expect("validate");

        assert_eq!(report.status, ValidationStatus::Passed);
        assert_eq!(report.valid_count, 2);
        assert_eq!(report.invalid_count, 0);
        assert!(report.metrics.contains_key("a.quality_score"));
    }

    #[tokio::test]
    async fn test_missing_asset_becomes_invalid_after_retries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = AssetStore::new(dir.path());
        let good1 = written_artifact(&store, "good1");
        let good2 = written_artifact(&store, "good2");
        let missing = artifact(
            "missing",
            AssetCategory::Image,
            dir.path().join("never_written.png"),
        );
        let engine = fast_engine(store);

        let report = engine
            .validate(&[&good1, &missing, &good2], &CancelToken::never())
            .await
            .expect("validate");

        assert_eq!(report.status, ValidationStatus::PassedWithWarnings);
        assert_eq!(report.valid_count, 2);
        assert_eq!(report.invalid_count, 1);
        assert_eq!(report.errors().count(), 1);
        assert_eq!(report.errors().next().map(|f| f.asset_id.as_str()), Some("missing"));
        // Default budget is 3 retries, all consumed by the missing image.
        assert_eq!(report.retry_summary.get("image"), Some(&3));
    }

    #[tokio::test]
    async fn test_every_asset_missing_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = AssetStore::new(dir.path());
        let missing = artifact("m", AssetCategory::Image, dir.path().join("m.png"));
        let engine = fast_engine(store);

        let report = engine
            .validate(&[&missing], &CancelToken::never())
            .await
            .expect("validate");

        assert_eq!(report.status, ValidationStatus::Failed);
    }

    #[tokio::test]
    async fn test_zero_assets_pass() {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = fast_engine(AssetStore::new(dir.path()));

        let report = engine
            .validate(&[], &CancelToken::never())
            .await
            .expect("validate");

        assert_eq!(report.status, ValidationStatus::Passed);
        assert_eq!(report.total_checked, 0);
    }

    #[tokio::test]
    async fn test_soft_shortfall_warns_but_stays_valid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = AssetStore::new(dir.path());
        let path = store.root().join("low.png");
        store.write(&path, &[0u8; 64]).expect("write");
        let mut low = artifact("low", AssetCategory::Image, path);
        low.quality_score = 0.2;
        let engine = fast_engine(store);

        let report = engine
            .validate(&[&low], &CancelToken::never())
            .await
            .expect("validate");

        assert_eq!(report.status, ValidationStatus::Passed);
        assert_eq!(report.valid_count, 1);
        assert_eq!(report.warnings().count(), 1);
    }
}
