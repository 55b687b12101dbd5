//! Model serialization and persistence
//!
//! Models are written as pretty-printed JSON together with a small metadata
//! block for tracking where and when they were produced.

use crate::core::{Result, SVMError};
use crate::model::SvmModel;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// On-disk representation of a trained model
#[derive(Debug, Serialize, Deserialize)]
pub struct SerializableModel {
    pub model: SvmModel,
    pub metadata: ModelMetadata,
}

/// Model metadata for tracking and validation
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Library version used to create the model
    pub library_version: String,
    /// Number of support vectors
    pub n_support_vectors: usize,
    /// Creation timestamp
    pub created_at: String,
}

impl SerializableModel {
    /// Wrap a trained model, stamping the current time
    pub fn from_model(model: &SvmModel) -> Self {
        Self {
            model: model.clone(),
            metadata: ModelMetadata {
                library_version: env!("CARGO_PKG_VERSION").to_string(),
                n_support_vectors: model.total_sv(),
                created_at: chrono::Utc::now().to_rfc3339(),
            },
        }
    }

    /// Save model to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path).map_err(SVMError::IoError)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| SVMError::SerializationError(e.to_string()))?;
        Ok(())
    }

    /// Load model from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path).map_err(SVMError::IoError)?;
        let reader = BufReader::new(file);
        let model = serde_json::from_reader(reader)
            .map_err(|e| SVMError::SerializationError(e.to_string()))?;
        Ok(model)
    }

    pub fn into_model(self) -> SvmModel {
        self.model
    }
}

/// Save a model to `path`
pub fn save_model<P: AsRef<Path>>(path: P, model: &SvmModel) -> Result<()> {
    SerializableModel::from_model(model).save_to_file(path)
}

/// Load a model previously written by [`save_model`]
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<SvmModel> {
    SerializableModel::load_from_file(path).map(SerializableModel::into_model)
}
