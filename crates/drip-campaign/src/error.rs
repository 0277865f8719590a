//! Error types for `drip-campaign`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] drip_core::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("sequence folder {0:?} does not exist")]
  MissingSequenceFolder(PathBuf),

  #[error("no segments configured")]
  NoSegments,

  #[error("segment {0:?} cannot name a sequence file")]
  UnusableSegment(String),

  #[error("{0} is already registered")]
  AlreadyRegistered(String),
}

/// Why a single message was not handed to the mail server.
#[derive(Debug, Error)]
pub enum MailError {
  #[error("invalid recipient address: {0:?}")]
  InvalidRecipient(String),

  #[error("invalid sender address: {0}")]
  InvalidSender(String),

  #[error("could not build message: {0}")]
  Build(String),

  #[error("transport error: {0}")]
  Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
