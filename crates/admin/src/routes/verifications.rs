//! OTP verification audit trail.

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use tracing::{debug, instrument};

use petal_core::Phone;

use super::ListQuery;
use crate::db::VerificationRepository;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Verification requests, newest first, optionally for one phone number.
///
/// Lapsed pending requests are marked expired first so the listing shows
/// their real state.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    // Stored numbers are normalized; match the same form
    let phone = query
        .phone
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| Phone::parse(p).map_or_else(|_| p.to_owned(), |phone| phone.as_str().to_owned()));

    let repo = VerificationRepository::new(state.pool());
    let expired = repo.expire_stale().await?;
    if expired > 0 {
        debug!(expired, "Marked lapsed verification requests expired");
    }

    let requests = repo.list(phone.as_deref(), query.page()).await?;
    Ok(Json(requests))
}
