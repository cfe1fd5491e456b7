//! Handlers for the signed-in user's own profile, membership and bookings.

use axum::{
    extract::State,
    response::Json,
    routing::get,
    Extension, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::errors::AppResult;
use crate::services::SubscriptionStatusView;
use crate::types::Created;
use domain::{ProfileUpdate, Registration, Subscription, User};

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct SubscribeRequest {
    /// Defaults to "card"
    #[validate(length(max = 40, message = "Payment method label is too long"))]
    #[schema(example = "card")]
    pub payment_method: Option<String>,
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_profile).put(update_profile))
        .route("/me/subscription", get(subscription_status).post(subscribe))
        .route("/me/registrations", get(my_registrations))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Me",
    responses(
        (status = 200, description = "Current profile", body = User),
        (status = 401, description = "Not signed in")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<User>> {
    let profile = state.services.users().get_profile(user.id).await?;
    Ok(Json(profile))
}

/// Partial edit; blank bio or photo clears it
#[utoipa::path(
    put,
    path = "/me",
    tag = "Me",
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Updated profile", body = User),
        (status = 422, description = "Invalid profile")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(update): Json<ProfileUpdate>,
) -> AppResult<Json<User>> {
    let profile = state.services.users().update_profile(user.id, update).await?;
    Ok(Json(profile))
}

#[utoipa::path(
    get,
    path = "/me/subscription",
    tag = "Me",
    responses(
        (status = 200, description = "Membership status and offer", body = SubscriptionStatusView)
    ),
    security(("bearer_auth" = []))
)]
pub async fn subscription_status(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<SubscriptionStatusView>> {
    let status = state.services.subscriptions().status(user.id).await?;
    Ok(Json(status))
}

/// Buy the annual plan
#[utoipa::path(
    post,
    path = "/me/subscription",
    tag = "Me",
    request_body = SubscribeRequest,
    responses(
        (status = 201, description = "Subscribed", body = Subscription),
        (status = 409, description = "Already subscribed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn subscribe(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<SubscribeRequest>,
) -> AppResult<Created<Subscription>> {
    let subscription = state
        .services
        .subscriptions()
        .subscribe(user.id, payload.payment_method)
        .await?;

    Ok(Created(subscription))
}

#[utoipa::path(
    get,
    path = "/me/registrations",
    tag = "Me",
    responses(
        (status = 200, description = "Registrations, oldest first", body = [Registration])
    ),
    security(("bearer_auth" = []))
)]
pub async fn my_registrations(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<Registration>>> {
    let registrations = state.services.registrations().list_for_user(user.id).await?;
    Ok(Json(registrations))
}
