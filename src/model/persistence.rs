//! The single-file model artifact written by training and read by the server.

use crate::model::error::ModelError;
use crate::model::pipeline::RainModel;
use crate::types::features::{schema_matches, FEATURE_COLUMNS};
use bincode::config::{Configuration, Fixint, LittleEndian};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

/// A fitted model together with the feature layout it expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub feature_columns: Vec<String>,
    pub trained_at: DateTime<Utc>,
    pub training_rows: usize,
    pub model: RainModel,
}

impl ModelArtifact {
    pub fn new(model: RainModel, training_rows: usize, trained_at: DateTime<Utc>) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            feature_columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            trained_at,
            training_rows,
            model,
        }
    }

    /// Writes the artifact to `path`, creating parent directories.
    ///
    /// The bytes go to a temporary file next to `path` which then replaces it, so a
    /// reader never sees a half-written artifact.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let bytes = bincode::serde::encode_to_vec(self, BINCODE_CONFIG)
            .map_err(|e| ModelError::ArtifactEncode(Box::new(e)))?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| ModelError::ArtifactWrite(dir.to_path_buf(), e))?;

        let mut temp_file =
            NamedTempFile::new_in(dir).map_err(|e| ModelError::ArtifactWrite(path.to_path_buf(), e))?;
        temp_file
            .write_all(&bytes)
            .and_then(|_| temp_file.as_file().sync_all())
            .map_err(|e| ModelError::ArtifactWrite(path.to_path_buf(), e))?;
        temp_file
            .persist(path)
            .map_err(|e| ModelError::ArtifactWrite(path.to_path_buf(), e.error))?;

        info!("Wrote model artifact ({} bytes) to {:?}", bytes.len(), path);
        Ok(())
    }

    /// Reads an artifact, rejecting unknown format versions and foreign feature layouts.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let bytes = std::fs::read(path).map_err(|e| ModelError::ArtifactRead(path.to_path_buf(), e))?;
        let (artifact, _) = bincode::serde::decode_from_slice::<ModelArtifact, _>(&bytes, BINCODE_CONFIG)
            .map_err(|e| ModelError::ArtifactDecode(path.to_path_buf(), Box::from(e)))?;
        artifact.validate()?;
        info!(
            "Loaded model artifact from {:?} (trained {} on {} rows)",
            path, artifact.trained_at, artifact.training_rows
        );
        Ok(artifact)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ModelError::UnsupportedVersion(self.format_version));
        }
        if !schema_matches(&self.feature_columns) {
            return Err(ModelError::SchemaMismatch {
                expected: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
                found: self.feature_columns.clone(),
            });
        }
        Ok(())
    }
}
