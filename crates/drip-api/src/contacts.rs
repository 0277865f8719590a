//! Handlers for `/contacts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/contacts` | Body: `{"name":"Alice","email":"alice@example.com"}`; 409 if the email is known |

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use drip_campaign::Campaign;
use drip_core::{address::normalize_email, mail::MailTransport, sheet::Worksheet};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub name:  String,
  pub email: String,
}

#[derive(Debug, Serialize)]
pub struct Registered {
  pub row:   u32,
  pub email: String,
}

/// `POST /contacts`
pub async fn register<W, T>(
  State(campaign): State<Arc<Campaign<W, T>>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  W: Worksheet,
  T: MailTransport,
{
  let row = campaign.register(&body.name, &body.email).await?;
  Ok((StatusCode::CREATED, Json(Registered { row: row.get(), email: normalize_email(&body.email) })))
}
