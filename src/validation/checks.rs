//! Per-asset integrity and quality checks.
//!
//! A check either fails hard (the asset is missing or unreadable, which the
//! engine retries with backoff) or succeeds with a set of soft shortfalls
//! that become warning findings while the asset still counts as valid.

use crate::agents::types::{AssetCategory, GeneratedArtifact};
use crate::config::ForgeConfig;
use crate::error::StoreError;
use crate::storage::AssetStore;

/// Configured floors below which a valid asset earns a warning.
#[derive(Debug, Clone, Copy)]
pub struct CheckLimits {
    pub quality_floor: f64,
    pub min_asset_bytes: u64,
    pub min_video_seconds: u32,
}

impl CheckLimits {
    pub fn from_config(config: &ForgeConfig) -> Self {
        Self {
            quality_floor: config.validation_quality_floor,
            min_asset_bytes: config.validation_min_asset_bytes,
            min_video_seconds: config.validation_min_video_seconds,
        }
    }
}

/// Result of one successful asset check.
#[derive(Debug, Default)]
pub struct CheckOutcome {
    /// Metric values keyed by metric name (the engine qualifies them with
    /// the asset id).
    pub metrics: Vec<(&'static str, f64)>,
    /// Soft-shortfall messages; the asset remains valid.
    pub warnings: Vec<String>,
}

/// Checks one asset's integrity and quality floors.
///
/// # Errors
///
/// Returns `StoreError` when the asset is missing or cannot be read back;
/// the engine treats this as transient and retries.
pub fn check_asset(
    store: &AssetStore,
    artifact: &GeneratedArtifact,
    limits: &CheckLimits,
) -> Result<CheckOutcome, StoreError> {
    let size_bytes = store.size_bytes(&artifact.location)?;
    // A zero-byte read-back means the write never landed.
    let bytes = store.read_back(&artifact.location)?;
    if bytes.is_empty() {
        return Err(StoreError::NotFound(artifact.location.clone()));
    }

    let mut outcome = CheckOutcome::default();
    outcome.metrics.push(("quality_score", artifact.quality_score));
    outcome.metrics.push(("size_bytes", size_bytes as f64));
    outcome.metrics.push((
        "refinement_iteration",
        f64::from(artifact.refinement_iteration),
    ));

    if size_bytes < limits.min_asset_bytes {
        outcome.warnings.push(format!(
            "size {} bytes is below the {} byte floor",
            size_bytes, limits.min_asset_bytes
        ));
    }

    if artifact.quality_score < limits.quality_floor {
        outcome.warnings.push(format!(
            "quality score {:.2} is below the {:.2} floor",
            artifact.quality_score, limits.quality_floor
        ));
    }

    if artifact.category == AssetCategory::Video {
        let duration = artifact.duration_seconds.unwrap_or(0);
        outcome
            .metrics
            .push(("duration_seconds", f64::from(duration)));
        if duration < limits.min_video_seconds {
            outcome.warnings.push(format!(
                "duration {}s is below the {}s floor",
                duration, limits.min_video_seconds
            ));
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn limits() -> CheckLimits {
        CheckLimits {
            quality_floor: 0.5,
            min_asset_bytes: 16,
            min_video_seconds: 15,
        }
    }

    fn artifact(category: AssetCategory, location: PathBuf) -> GeneratedArtifact {
        GeneratedArtifact {
            id: "asset".to_string(),
            slide_number: None,
            category,
            location,
            quality_score: 0.9,
            generation_latency: Duration::from_millis(5),
            refinement_iteration: 1,
            prompt_used: "p".to_string(),
            duration_seconds: None,
        }
    }

    #[test]
    fn test_healthy_asset_has_no_warnings() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = AssetStore::new(dir.path());
        let path = dir.path().join("asset.png");
        store.write(&path, &[0u8; 64]).expect("write");

        let outcome =
            check_asset(&store, &artifact(AssetCategory::Image, path), &limits()).expect("check");
        assert!(outcome.warnings.is_empty());
        assert!(outcome.metrics.iter().any(|(k, _)| *k == "quality_score"));
    }

    #[test]
    fn test_missing_asset_is_integrity_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = AssetStore::new(dir.path());
        let path = dir.path().join("missing.png");

        let err = check_asset(&store, &artifact(AssetCategory::Image, path), &limits())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn test_small_and_low_quality_asset_warns() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = AssetStore::new(dir.path());
        let path = dir.path().join("tiny.png");
        store.write(&path, b"x").expect("write");

        let mut asset = artifact(AssetCategory::Image, path);
        asset.quality_score = 0.3;

        let outcome = check_asset(&store, &asset, &limits()).expect("check");
        assert_eq!(outcome.warnings.len(), 2);
    }

    #[test]
    fn test_short_video_warns_on_duration() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = AssetStore::new(dir.path());
        let path = dir.path().join("clip.mp4");
        store.write(&path, &[0u8; 64]).expect("write");

        let mut asset = artifact(AssetCategory::Video, path);
        asset.duration_seconds = Some(8);

        let outcome = check_asset(&store, &asset, &limits()).expect("check");
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("duration"));
        assert!(outcome
            .metrics
            .iter()
            .any(|(k, v)| *k == "duration_seconds" && (*v - 8.0).abs() < f64::EPSILON));
    }
}
