//! Publishing stage.
//!
//! Validates the run's media through the validation engine, then publishes
//! the manifest and the validation report. A `Failed` report aborts the
//! stage; `PassedWithWarnings` publishes best-effort with the surviving
//! assets.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::agents::error::AgentError;
use crate::agents::types::{MediaBundle, PublishOutput};
use crate::config::ForgeConfig;
use crate::manifest;
use crate::pipeline::cancel::CancelToken;
use crate::storage::AssetStore;
use crate::validation::{ValidationEngine, ValidationError, ValidationStatus};

const STAGE: &str = "publishing";

/// Validates and publishes the run's media bundle.
pub struct PublisherAgent {
    store: AssetStore,
    engine: ValidationEngine,
}

impl PublisherAgent {
    pub fn new(store: AssetStore, config: &ForgeConfig) -> Self {
        let engine = ValidationEngine::new(store.clone(), config);
        Self { store, engine }
    }

    /// Runs the publishing stage.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::ValidationRejected` when no asset survived
    /// validation, `AgentError::Cancelled` on cancellation, and store or
    /// serialization errors when the manifest cannot be written.
    pub async fn run(
        &self,
        bundle: &MediaBundle,
        cancel: &CancelToken,
    ) -> Result<PublishOutput, AgentError> {
        let artifacts = bundle.all_artifacts();
        let report = self
            .engine
            .validate(&artifacts, cancel)
            .await
            .map_err(|ValidationError::Cancelled| AgentError::Cancelled { stage: STAGE })?;

        if report.status == ValidationStatus::Failed {
            return Err(AgentError::ValidationRejected {
                invalid_count: report.invalid_count,
                total_checked: report.total_checked,
            });
        }
        if report.status == ValidationStatus::PassedWithWarnings {
            warn!(
                invalid = report.invalid_count,
                "Publishing best-effort with partial asset loss"
            );
        }

        // Only assets that survived validation ship in the manifest.
        let invalid_ids: Vec<&str> = report.errors().map(|f| f.asset_id.as_str()).collect();
        let surviving = artifacts
            .iter()
            .copied()
            .filter(|a| !invalid_ids.contains(&a.id.as_str()));
        let deck_pages = match bundle.deck.pages.len() {
            0 => None,
            n => Some(n as u32),
        };
        let manifest = manifest::from_artifacts(surviving, deck_pages);

        let manifest_id = Uuid::new_v4().to_string();
        let manifest_location = self.store.manifest_path(&manifest_id);
        self.store
            .write(&manifest_location, &serde_json::to_vec_pretty(&manifest)?)?;
        self.store.write(
            &self.store.report_path(&manifest_id),
            &serde_json::to_vec_pretty(&report)?,
        )?;

        info!(
            %manifest_id,
            assets = manifest.len(),
            status = %report.status,
            "Manifest published"
        );

        Ok(PublishOutput {
            manifest_id,
            status: report.status,
            report,
            manifest,
            manifest_location,
            published_at: Utc::now(),
        })
    }
}
