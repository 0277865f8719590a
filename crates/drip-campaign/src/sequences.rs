//! [`SequenceLibrary`] — per-segment email sequences stored as JSON files.
//!
//! `Credit Building` lives at `<folder>/credit_building.json`, a JSON array of
//! `{"subject": "...", "body": "..."}` objects. A missing or malformed file is
//! an empty sequence: the caller skips the contact and nothing is sent. So is
//! a label that would resolve outside the folder.

use std::{
  io::ErrorKind,
  path::{Path, PathBuf},
};

use drip_core::sequence::{SequenceStep, sequence_key};
use tracing::{error, warn};

use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct SequenceLibrary {
  folder: PathBuf,
}

impl SequenceLibrary {
  /// Use the sequences under `folder`, which must exist.
  pub fn open(folder: impl Into<PathBuf>) -> Result<Self> {
    let folder = folder.into();
    if !folder.is_dir() {
      return Err(Error::MissingSequenceFolder(folder));
    }
    Ok(Self { folder })
  }

  pub fn folder(&self) -> &Path { &self.folder }

  /// Path of the resource for `segment`, always directly inside the folder.
  pub fn path_for(&self, segment: &str) -> Option<PathBuf> {
    let path = self.folder.join(sequence_key(segment)?);
    (path.parent() == Some(self.folder.as_path())).then_some(path)
  }

  /// The ordered steps for `segment`; empty if there is no usable resource.
  pub async fn load(&self, segment: &str) -> Vec<SequenceStep> {
    let Some(path) = self.path_for(segment) else {
      warn!(segment, "segment label does not name a sequence file; ignoring");
      return Vec::new();
    };

    let raw = match tokio::fs::read_to_string(&path).await {
      Ok(raw) => raw,
      Err(e) if e.kind() == ErrorKind::NotFound => {
        warn!(segment, path = %path.display(), "no sequence found for segment");
        return Vec::new();
      }
      Err(e) => {
        error!(segment, path = %path.display(), error = %e, "failed to read sequence");
        return Vec::new();
      }
    };

    match serde_json::from_str::<Vec<SequenceStep>>(&raw) {
      Ok(steps) => steps,
      Err(e) => {
        error!(segment, path = %path.display(), error = %e, "malformed sequence");
        Vec::new()
      }
    }
  }
}
