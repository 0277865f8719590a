//! Mail account credentials, from the config file or a base64 blob in the
//! environment.

use anyhow::{Context as _, bail};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use drip_campaign::smtp::{SmtpCredentials, SmtpSettings};

/// Environment variable holding `base64({"username": ..., "password": ...})`.
pub const CREDENTIALS_VAR: &str = "DRIP_MAIL_CREDENTIALS_BASE64";

/// Decode a credential blob.
pub fn decode(blob: &str) -> anyhow::Result<SmtpCredentials> {
  let json = B64
    .decode(blob.trim())
    .with_context(|| format!("{CREDENTIALS_VAR} is not valid base64"))?;
  serde_json::from_slice(&json)
    .with_context(|| format!("{CREDENTIALS_VAR} does not hold a username and password"))
}

/// Credentials from `[mail.credentials]`, falling back to the environment.
pub fn resolve(settings: &SmtpSettings) -> anyhow::Result<SmtpCredentials> {
  if let Some(credentials) = &settings.credentials {
    return Ok(credentials.clone());
  }
  match std::env::var(CREDENTIALS_VAR) {
    Ok(blob) => decode(&blob),
    Err(_) => bail!("no mail credentials: set [mail.credentials] or {CREDENTIALS_VAR}"),
  }
}
