//! Moderation and diagnostics handlers. Admins only.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{delete, get, post},
    Extension, Router,
};
use uuid::Uuid;

use crate::api::middleware::{require_admin, CurrentUser};
use crate::api::AppState;
use crate::errors::AppResult;
use crate::infra::ErrorEntry;
use crate::types::NoContent;
use domain::Review;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/reviews", get(pending_reviews))
        .route("/admin/reviews/:id/approve", post(approve_review))
        .route("/admin/reviews/:id", delete(delete_review))
        .route("/admin/errors", get(recent_errors))
}

/// Moderation queue across all events, newest first
#[utoipa::path(
    get,
    path = "/admin/reviews",
    tag = "Admin",
    responses(
        (status = 200, description = "Pending reviews", body = [Review]),
        (status = 403, description = "Admins only")
    ),
    security(("bearer_auth" = []))
)]
pub async fn pending_reviews(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<Review>>> {
    require_admin(&user)?;
    let reviews = state.services.reviews().pending_reviews().await?;
    Ok(Json(reviews))
}

#[utoipa::path(
    post,
    path = "/admin/reviews/{id}/approve",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Review id")),
    responses(
        (status = 200, description = "Approved review", body = Review),
        (status = 404, description = "Review not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn approve_review(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Review>> {
    require_admin(&user)?;
    let review = state.services.reviews().approve_review(id).await?;
    Ok(Json(review))
}

/// Reject or remove a review
#[utoipa::path(
    delete,
    path = "/admin/reviews/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Review id")),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 404, description = "Review not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_review(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<NoContent> {
    require_admin(&user)?;
    state.services.reviews().delete_review(id).await?;
    Ok(NoContent)
}

/// Recent unexpected errors, newest first
#[utoipa::path(
    get,
    path = "/admin/errors",
    tag = "Admin",
    responses(
        (status = 200, description = "Error log", body = [ErrorEntry]),
        (status = 403, description = "Admins only")
    ),
    security(("bearer_auth" = []))
)]
pub async fn recent_errors(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<ErrorEntry>>> {
    require_admin(&user)?;
    Ok(Json(state.error_log.entries()))
}
