//! Manifest builder.
//!
//! A pure projection of the run's accepted artifacts into an id-keyed
//! lookup structure. No retry, no IO; keyed storage makes the result
//! independent of input ordering and the build idempotent.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::agents::types::{AssetCategory, GeneratedArtifact, MediaBundle};

/// Final id-to-metadata mapping of all accepted artifacts.
pub type AssetManifest = BTreeMap<String, ManifestEntry>;

/// Attribute record for one published asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub category: AssetCategory,
    pub location: PathBuf,
    pub quality_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
}

/// Builds the manifest for a media bundle.
pub fn build(bundle: &MediaBundle) -> AssetManifest {
    let deck_pages = match bundle.deck.pages.len() {
        0 => None,
        n => Some(n as u32),
    };
    from_artifacts(bundle.all_artifacts(), deck_pages)
}

/// Builds the manifest from an arbitrary artifact collection.
///
/// `deck_total_pages` is attached to deck-category entries only.
pub fn from_artifacts<'a>(
    artifacts: impl IntoIterator<Item = &'a GeneratedArtifact>,
    deck_total_pages: Option<u32>,
) -> AssetManifest {
    artifacts
        .into_iter()
        .map(|artifact| {
            let entry = ManifestEntry {
                category: artifact.category,
                location: artifact.location.clone(),
                quality_score: artifact.quality_score,
                slide_number: artifact.slide_number,
                duration_seconds: artifact.duration_seconds,
                total_pages: match artifact.category {
                    AssetCategory::Deck => deck_total_pages,
                    _ => None,
                },
            };
            (artifact.id.clone(), entry)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn artifact(id: &str, category: AssetCategory, slide: Option<u32>) -> GeneratedArtifact {
        GeneratedArtifact {
            id: id.to_string(),
            slide_number: slide,
            category,
            location: PathBuf::from(format!("/tmp/{}", id)),
            quality_score: 0.9,
            generation_latency: Duration::from_millis(5),
            refinement_iteration: 0,
            prompt_used: "p".to_string(),
            duration_seconds: match category {
                AssetCategory::Video => Some(30),
                _ => None,
            },
        }
    }

    #[test]
    fn test_order_independent() {
        let a = artifact("img_slide_1", AssetCategory::Image, Some(1));
        let b = artifact("img_slide_2", AssetCategory::Image, Some(2));
        let c = artifact("trailer", AssetCategory::Video, None);

        let forward = from_artifacts([&a, &b, &c], None);
        let reversed = from_artifacts([&c, &b, &a], None);
        assert_eq!(forward, reversed);
        assert_eq!(forward.len(), 3);
    }

    #[test]
    fn test_category_specific_fields() {
        let img = artifact("img_slide_1", AssetCategory::Image, Some(1));
        let vid = artifact("trailer", AssetCategory::Video, None);
        let deck = artifact("pitch_deck", AssetCategory::Deck, None);

        let manifest = from_artifacts([&img, &vid, &deck], Some(6));

        assert_eq!(manifest["img_slide_1"].slide_number, Some(1));
        assert_eq!(manifest["img_slide_1"].total_pages, None);
        assert_eq!(manifest["trailer"].duration_seconds, Some(30));
        assert_eq!(manifest["pitch_deck"].total_pages, Some(6));
    }

    #[test]
    fn test_idempotent() {
        let a = artifact("img_slide_1", AssetCategory::Image, Some(1));
        assert_eq!(from_artifacts([&a], None), from_artifacts([&a], None));
    }
}
