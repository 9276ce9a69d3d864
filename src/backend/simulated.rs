//! Simulated generation backend.
//!
//! Stands in for the real image/video/deck rendering services. Artifacts are
//! placeholder byte blobs written through the real path layout, and quality
//! scores come from a configurable profile, which is what makes retry and
//! validation behavior reproducible in tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::backend::{GenerationRequest, GenerationSample, ScoredBackend};
use crate::error::BackendError;

/// How the simulated backend scores the artifacts it produces.
#[derive(Debug, Clone)]
pub enum QualityProfile {
    /// Every artifact gets the same score.
    Fixed(f64),
    /// Score per refinement iteration; iterations past the end reuse the
    /// last entry.
    Sequence(Vec<f64>),
    /// Uniformly random score in `[min, max]`.
    Uniform { min: f64, max: f64 },
}

impl QualityProfile {
    fn score(&self, iteration: u32) -> f64 {
        match self {
            QualityProfile::Fixed(score) => *score,
            QualityProfile::Sequence(scores) => {
                let idx = (iteration as usize).min(scores.len().saturating_sub(1));
                scores.get(idx).copied().unwrap_or(0.0)
            }
            QualityProfile::Uniform { min, max } => rand::thread_rng().gen_range(*min..=*max),
        }
    }
}

/// Scored backend that fabricates artifacts instead of calling a renderer.
#[derive(Debug)]
pub struct SimulatedBackend {
    label: String,
    profile: QualityProfile,
    latency: Duration,
    duration_seconds: Option<u32>,
    /// Request ids whose artifact bytes are silently dropped after a
    /// "successful" call, for exercising read-back validation.
    lost_artifacts: HashSet<String>,
    /// Remaining transient failures to inject, per request id.
    failures: Mutex<HashMap<String, u32>>,
}

impl SimulatedBackend {
    /// Creates a backend for one asset category label with a quality profile.
    pub fn new(label: impl Into<String>, profile: QualityProfile) -> Self {
        Self {
            label: label.into(),
            profile,
            latency: Duration::from_millis(10),
            duration_seconds: None,
            lost_artifacts: HashSet::new(),
            failures: Mutex::new(HashMap::new()),
        }
    }

    /// Sets the simulated per-call latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Sets the reported media duration for time-based artifacts.
    pub fn with_duration_seconds(mut self, seconds: u32) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    /// Marks a request id whose artifacts succeed but never land on disk.
    pub fn with_lost_artifact(mut self, id: impl Into<String>) -> Self {
        self.lost_artifacts.insert(id.into());
        self
    }

    /// Injects `count` transient failures for a request id before it succeeds.
    pub fn with_transient_failures(self, id: impl Into<String>, count: u32) -> Self {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(id.into(), count);
        }
        self
    }

    fn take_failure(&self, id: &str) -> bool {
        let mut failures = match self.failures.lock() {
            Ok(guard) => guard,
            Err(_) => return false,
        };
        match failures.get_mut(id) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

#[async_trait::async_trait]
impl ScoredBackend for SimulatedBackend {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationSample, BackendError> {
        if self.take_failure(&request.id) {
            return Err(BackendError::Unavailable(format!(
                "simulated {} backend failure for '{}'",
                self.label, request.id
            )));
        }

        let started = Instant::now();
        tokio::time::sleep(self.latency).await;

        if !self.lost_artifacts.contains(&request.id) {
            let payload = format!(
                "{} artifact for '{}' iteration {}\nprompt: {}\nstyle: {}\n",
                self.label, request.id, request.iteration, request.prompt_text, request.style_guidance
            );
            if let Some(parent) = request.output_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&request.output_path, payload.as_bytes())?;
        }

        Ok(GenerationSample {
            artifact_id: request.id.clone(),
            location: request.output_path.clone(),
            quality_score: self.profile.score(request.iteration),
            latency: started.elapsed(),
            duration_seconds: self.duration_seconds,
        })
    }
}
