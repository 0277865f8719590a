//! JSON HTTP surface for drip: contact intake and link-based segment
//! selection.
//!
//! Exposes an axum [`Router`] backed by any [`Campaign`]. TLS and request
//! tracing are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(drip_api::api_router(campaign.clone()))
//! ```

pub mod contacts;
pub mod error;
pub mod segments;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use drip_campaign::Campaign;
use drip_core::{mail::MailTransport, sheet::Worksheet};

pub use error::ApiError;

/// Build a fully-materialised API router for `campaign`.
pub fn api_router<W, T>(campaign: Arc<Campaign<W, T>>) -> Router<()>
where
  W: Worksheet + 'static,
  T: MailTransport + 'static,
{
  Router::new()
    .route("/contacts", post(contacts::register::<W, T>))
    .route("/segments", get(segments::list::<W, T>))
    .route(
      "/segments/select",
      get(segments::select_link::<W, T>).post(segments::select_json::<W, T>),
    )
    .with_state(campaign)
}
