//! Runtime configuration: a TOML file layered under `DRIP_*` environment
//! variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use drip_campaign::{CampaignSettings, smtp::SmtpSettings};
use serde::Deserialize;

/// Everything the binary needs, deserialised from `drip.toml`.
#[derive(Debug, Deserialize)]
pub struct DripConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  pub store_path: PathBuf,
  #[serde(default = "default_worksheet")]
  pub worksheet:  String,
  pub mail:       SmtpSettings,
  pub campaign:   CampaignSettings,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8080 }
fn default_worksheet() -> String { "Sheet1".into() }

impl DripConfig {
  /// Read `path` (if it exists) and overlay the environment, e.g.
  /// `DRIP_PORT=9000` or `DRIP_MAIL__SENDER=team@example.com`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let mut config: DripConfig = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("DRIP")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise DripConfig")?;

    config.store_path = expand_tilde(&config.store_path);
    config.campaign.sequence_folder = expand_tilde(&config.campaign.sequence_folder);
    Ok(config)
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
