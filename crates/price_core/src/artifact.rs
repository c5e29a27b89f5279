//! Persisted pipeline artifacts
//!
//! An artifact is a canonical JSON envelope around the fitted [`Pipeline`]
//! together with the Blake3 hash of the pipeline's canonical form. Loading
//! recomputes the hash, so a truncated or edited file is rejected before any
//! prediction runs. Saving goes through a temporary file in the target
//! directory and an atomic rename, replacing any previous artifact.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

use crate::gbdt::ModelError;
use crate::pipeline::Pipeline;
use crate::serde_canon::{hash_canonical_hex, to_canonical_json, CanonicalError};

/// Envelope format version
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed artifact: {0}")]
    Json(#[from] serde_json::Error),

    #[error("canonical serialization error: {0}")]
    Canonical(#[from] CanonicalError),

    #[error("artifact hash mismatch: expected {expected}, computed {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("unsupported artifact format version {0}")]
    UnsupportedVersion(u32),

    #[error("invalid model: {0}")]
    InvalidModel(#[from] ModelError),
}

/// On-disk envelope for a fitted pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineArtifact {
    pub format_version: u32,

    /// Unix seconds at save time
    pub created_at: i64,

    /// Blake3 hex of the canonical pipeline JSON
    pub model_hash: String,

    pub pipeline: Pipeline,
}

impl PipelineArtifact {
    pub fn new(pipeline: Pipeline) -> Result<Self, ArtifactError> {
        Ok(Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            created_at: chrono::Utc::now().timestamp(),
            model_hash: hash_canonical_hex(&pipeline)?,
            pipeline,
        })
    }

    /// Check version, content hash and model structure.
    pub fn verify(&self) -> Result<(), ArtifactError> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedVersion(self.format_version));
        }

        let actual = hash_canonical_hex(&self.pipeline)?;
        if actual != self.model_hash {
            return Err(ArtifactError::HashMismatch {
                expected: self.model_hash.clone(),
                actual,
            });
        }

        self.pipeline.regressor().validate()?;
        Ok(())
    }
}

/// Persist `pipeline` at `path`, creating parent directories.
///
/// Returns the model hash written into the envelope.
pub fn save_pipeline(pipeline: &Pipeline, path: &Path) -> Result<String, ArtifactError> {
    let artifact = PipelineArtifact::new(pipeline.clone())?;
    let json = to_canonical_json(&artifact)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(json.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;

    info!(
        "Saved pipeline artifact to {} ({} bytes, hash {})",
        path.display(),
        json.len(),
        artifact.model_hash
    );

    Ok(artifact.model_hash)
}

/// Load and verify the artifact at `path`.
pub fn load_artifact(path: &Path) -> Result<PipelineArtifact, ArtifactError> {
    let json = fs::read_to_string(path)?;
    let artifact: PipelineArtifact = serde_json::from_str(&json)?;
    artifact.verify()?;

    debug!(
        "Loaded pipeline artifact {} (hash {}, {} trees)",
        path.display(),
        artifact.model_hash,
        artifact.pipeline.regressor().num_trees()
    );

    Ok(artifact)
}

/// Load the verified pipeline stored at `path`.
pub fn load_pipeline(path: &Path) -> Result<Pipeline, ArtifactError> {
    Ok(load_artifact(path)?.pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::OneHotEncoder;
    use crate::frame::{Column, Frame};
    use crate::gbdt::{GbdtModel, Node, Tree};
    use crate::schema::FeatureSchema;
    use tempfile::tempdir;

    fn test_pipeline() -> Pipeline {
        let schema = FeatureSchema::default();
        let frame = Frame::new(vec![
            ("State".to_string(), Column::categorical(["Goa", "Assam"])),
            ("District".to_string(), Column::categorical(["Panaji", "Jorhat"])),
            ("Commodity".to_string(), Column::categorical(["Cashew", "Tea"])),
        ])
        .unwrap();
        let encoder = OneHotEncoder::new().fit(&schema, &frame).unwrap();

        // Columns: Assam, Goa, Jorhat, Panaji, Cashew, Tea
        let tree = Tree::new(
            vec![
                Node::internal(0, 1, 0.5, 1, 2),
                Node::leaf(1, -250.125),
                Node::leaf(2, 250.125),
            ],
            0.1,
        );
        let model = GbdtModel::new(9000.0 / 7.0, vec![tree], 6);
        Pipeline::from_parts(schema, encoder, model).unwrap()
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model_files").join("model.joblib");
        let pipeline = test_pipeline();

        let hash = save_pipeline(&pipeline, &path).unwrap();
        let artifact = load_artifact(&path).unwrap();

        assert_eq!(artifact.model_hash, hash);
        assert_eq!(artifact.pipeline, pipeline);
        assert_eq!(
            pipeline.predict_one(&["Goa", "Panaji", "Cashew"]).unwrap(),
            artifact
                .pipeline
                .predict_one(&["Goa", "Panaji", "Cashew"])
                .unwrap()
        );
    }

    #[test]
    fn test_save_overwrites_previous_artifact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.joblib");

        save_pipeline(&test_pipeline(), &path).unwrap();
        fs::write(&path, "stale").unwrap();
        save_pipeline(&test_pipeline(), &path).unwrap();

        assert!(load_pipeline(&path).is_ok());
    }

    #[test]
    fn test_tampered_artifact_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.joblib");
        save_pipeline(&test_pipeline(), &path).unwrap();

        let json = fs::read_to_string(&path).unwrap();
        fs::write(&path, json.replace("250.125", "999.5")).unwrap();

        assert!(matches!(
            load_pipeline(&path),
            Err(ArtifactError::HashMismatch { .. })
        ));
    }

    #[test]
    fn test_corrupt_artifact_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.joblib");
        fs::write(&path, b"\x80\x04not json").unwrap();

        assert!(load_pipeline(&path).is_err());
    }

    #[test]
    fn test_unsupported_version() {
        let mut artifact = PipelineArtifact::new(test_pipeline()).unwrap();
        artifact.format_version = 7;
        assert!(matches!(
            artifact.verify(),
            Err(ArtifactError::UnsupportedVersion(7))
        ));
    }
}
