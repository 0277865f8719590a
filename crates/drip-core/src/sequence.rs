//! Sequence steps and the `{name}` placeholder.

use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

/// The only placeholder a template may contain.
pub const NAME_PLACEHOLDER: &str = "{name}";

/// Substituted when a contact's name cell is blank.
pub const FALLBACK_NAME: &str = "there";

/// File extension of a sequence resource.
pub const SEQUENCE_EXTENSION: &str = "json";

/// One email in a segment's sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceStep {
  pub subject: String,
  /// Body template; see [`personalize`].
  pub body:    String,
}

/// Replace every `{name}` in `template` with `name`, or with
/// [`FALLBACK_NAME`] if `name` is blank.
pub fn personalize(template: &str, name: &str) -> String {
  let name = name.trim();
  let name = if name.is_empty() { FALLBACK_NAME } else { name };
  template.replace(NAME_PLACEHOLDER, name)
}

/// Resource identifier for a segment: `Credit Building` →
/// `credit_building.json`.
///
/// `None` for a label that could not name a single file inside the sequence
/// folder: blank, hidden, or containing a path separator or `..`.
pub fn sequence_key(segment: &str) -> Option<String> {
  let stem = segment.trim().to_lowercase().replace(' ', "_");
  if stem.is_empty()
    || stem.starts_with('.')
    || stem.contains(['/', '\\', '\0'])
    || stem.contains("..")
  {
    return None;
  }

  let key = format!("{stem}.{SEQUENCE_EXTENSION}");
  let mut components = Path::new(&key).components();
  match (components.next(), components.next()) {
    (Some(Component::Normal(_)), None) => Some(key),
    _ => None,
  }
}
