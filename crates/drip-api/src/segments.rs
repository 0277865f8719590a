//! Handlers for `/segments` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/segments` | Configured segment labels |
//! | `GET`  | `/segments/select` | `?email=&segment=`; the link in invitation emails |
//! | `POST` | `/segments/select` | Body: `{"email":"...","segment":"..."}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::Local;
use drip_campaign::Campaign;
use drip_core::{mail::MailTransport, sheet::Worksheet};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// `GET /segments`
pub async fn list<W, T>(State(campaign): State<Arc<Campaign<W, T>>>) -> Json<Vec<String>>
where
  W: Worksheet,
  T: MailTransport,
{
  Json(campaign.settings().segments.clone())
}

#[derive(Debug, Deserialize)]
pub struct Selection {
  pub email:   String,
  pub segment: String,
}

#[derive(Debug, Serialize)]
pub struct SelectionOutcome {
  pub assigned: bool,
  pub message:  String,
}

/// `GET /segments/select?email=<email>&segment=<segment>`
pub async fn select_link<W, T>(
  State(campaign): State<Arc<Campaign<W, T>>>,
  Query(selection): Query<Selection>,
) -> Result<Json<SelectionOutcome>, ApiError>
where
  W: Worksheet,
  T: MailTransport,
{
  select(&campaign, selection).await
}

/// `POST /segments/select`
pub async fn select_json<W, T>(
  State(campaign): State<Arc<Campaign<W, T>>>,
  Json(selection): Json<Selection>,
) -> Result<Json<SelectionOutcome>, ApiError>
where
  W: Worksheet,
  T: MailTransport,
{
  select(&campaign, selection).await
}

async fn select<W, T>(
  campaign: &Campaign<W, T>,
  selection: Selection,
) -> Result<Json<SelectionOutcome>, ApiError>
where
  W: Worksheet,
  T: MailTransport,
{
  let Some(segment) = campaign.settings().catalogue_label(&selection.segment) else {
    return Err(ApiError::BadRequest(format!("unknown segment {:?}", selection.segment.trim())));
  };

  let today = Local::now().date_naive();
  let assigned = campaign.assign_on(&selection.email, segment, today).await?;

  let message = if assigned {
    format!("Thanks! You'll start receiving emails about {segment} shortly.")
  } else {
    "Your segment is already set, or we couldn't find your registration.".to_owned()
  };
  Ok(Json(SelectionOutcome { assigned, message }))
}
