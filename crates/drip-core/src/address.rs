//! Text normalisation and the syntactic email check.
//!
//! Every comparison against stored cells goes through [`normalize`] on both
//! sides. Spreadsheet exports routinely carry non-breaking spaces, so a plain
//! `trim()` is not enough.

/// Replace non-breaking spaces, trim, and lower-case.
pub fn normalize(s: &str) -> String {
  s.replace('\u{a0}', " ").trim().to_lowercase()
}

/// Normalise an email address into the contact key form.
pub fn normalize_email(s: &str) -> String { normalize(s) }

/// Basic syntactic check: `local@domain.tld`.
///
/// The local part may contain ASCII letters, digits, and `._%+-`; the domain
/// may contain ASCII letters, digits, `.` and `-`, and must end in a label of
/// at least two ASCII letters.
pub fn is_valid_email(s: &str) -> bool {
  let Some((local, domain)) = s.split_once('@') else {
    return false;
  };
  if local.is_empty() || domain.contains('@') {
    return false;
  }
  if !local
    .chars()
    .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c))
  {
    return false;
  }
  if !domain
    .chars()
    .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
  {
    return false;
  }
  let Some((host, tld)) = domain.rsplit_once('.') else {
    return false;
  };
  !host.is_empty() && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
}
