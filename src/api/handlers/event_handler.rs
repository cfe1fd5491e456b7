//! Event catalog, registration and review handlers.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::middleware::{require_admin, CurrentUser};
use crate::api::AppState;
use crate::errors::AppResult;
use crate::services::EventView;
use crate::types::{Created, NoContent};
use domain::{Event, EventUpdate, NewEvent, Registration, Review};

/// Review submission
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewRequest {
    /// Stars from 1 to 5
    #[schema(example = 5)]
    pub rating: i64,
    #[serde(default)]
    pub comment: String,
}

pub fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/:id",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route(
            "/events/:id/registration",
            post(register).delete(unregister),
        )
        .route("/events/:id/registrations", get(list_attendees))
        .route("/events/:id/reviews", get(list_reviews).post(create_review))
}

/// All events, soonest first, priced for the caller
#[utoipa::path(
    get,
    path = "/events",
    tag = "Events",
    responses(
        (status = 200, description = "Event catalog", body = [EventView])
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_events(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<EventView>>> {
    let viewer = state.services.users().get_profile(user.id).await?;
    let events = state.services.events().list_events(Some(&viewer)).await?;
    Ok(Json(events))
}

#[utoipa::path(
    get,
    path = "/events/{id}",
    tag = "Events",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event", body = EventView),
        (status = 404, description = "Event not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_event(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<EventView>> {
    let viewer = state.services.users().get_profile(user.id).await?;
    let event = state.services.events().get_event(id, Some(&viewer)).await?;
    Ok(Json(event))
}

#[utoipa::path(
    post,
    path = "/events",
    tag = "Events",
    request_body = NewEvent,
    responses(
        (status = 201, description = "Event created", body = Event),
        (status = 403, description = "Admins only"),
        (status = 422, description = "Invalid event")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_event(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<NewEvent>,
) -> AppResult<Created<Event>> {
    require_admin(&user)?;
    let event = state.services.events().create_event(input).await?;
    Ok(Created(event))
}

/// Partial edit. Capacity may not drop below confirmed registrations.
#[utoipa::path(
    put,
    path = "/events/{id}",
    tag = "Events",
    params(("id" = Uuid, Path, description = "Event id")),
    request_body = EventUpdate,
    responses(
        (status = 200, description = "Event updated", body = Event),
        (status = 403, description = "Admins only"),
        (status = 404, description = "Event not found"),
        (status = 422, description = "Invalid edit")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_event(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(update): Json<EventUpdate>,
) -> AppResult<Json<Event>> {
    require_admin(&user)?;
    let event = state.services.events().update_event(id, update).await?;
    Ok(Json(event))
}

/// Delete an event with its registrations and reviews
#[utoipa::path(
    delete,
    path = "/events/{id}",
    tag = "Events",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 403, description = "Admins only"),
        (status = 404, description = "Event not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_event(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<NoContent> {
    require_admin(&user)?;
    state.services.events().delete_event(id).await?;
    Ok(NoContent)
}

/// Take a seat, or a waitlist place once the event is full
#[utoipa::path(
    post,
    path = "/events/{id}/registration",
    tag = "Registrations",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 201, description = "Registered", body = Registration),
        (status = 402, description = "Active subscription required"),
        (status = 404, description = "Event not found"),
        (status = 409, description = "Already registered or event closed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn register(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Created<Registration>> {
    let registration = state.services.registrations().register(id, user.id).await?;
    Ok(Created(registration))
}

/// Withdraw. Succeeds when not registered too.
#[utoipa::path(
    delete,
    path = "/events/{id}/registration",
    tag = "Registrations",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 204, description = "Not registered any more")
    ),
    security(("bearer_auth" = []))
)]
pub async fn unregister(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<NoContent> {
    state
        .services
        .registrations()
        .unregister(id, user.id)
        .await?;
    Ok(NoContent)
}

#[utoipa::path(
    get,
    path = "/events/{id}/registrations",
    tag = "Registrations",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 200, description = "Attendees, oldest first", body = [Registration]),
        (status = 403, description = "Admins only")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_attendees(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<Registration>>> {
    require_admin(&user)?;
    let registrations = state.services.registrations().list_for_event(id).await?;
    Ok(Json(registrations))
}

/// Approved reviews, newest first
#[utoipa::path(
    get,
    path = "/events/{id}/reviews",
    tag = "Reviews",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 200, description = "Approved reviews", body = [Review])
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<Review>>> {
    let reviews = state.services.reviews().event_reviews(id).await?;
    Ok(Json(reviews))
}

/// Submit a review for moderation
#[utoipa::path(
    post,
    path = "/events/{id}/reviews",
    tag = "Reviews",
    params(("id" = Uuid, Path, description = "Event id")),
    request_body = ReviewRequest,
    responses(
        (status = 201, description = "Pending review", body = Review),
        (status = 404, description = "Event not found"),
        (status = 422, description = "Rating out of range")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_review(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewRequest>,
) -> AppResult<Created<Review>> {
    let review = state
        .services
        .reviews()
        .create_review(id, user.id, payload.rating, payload.comment)
        .await?;
    Ok(Created(review))
}
