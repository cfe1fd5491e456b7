//! OpenAPI documentation configuration.
//!
//! Provides Swagger UI for API exploration and testing.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{
    admin_handler, auth_handler, event_handler, me_handler, upload_handler,
};
use crate::infra::ErrorEntry;
use crate::services::{EventView, SubscriptionStatusView, TokenResponse};
use crate::types::MessageResponse;
use domain::{
    Event, EventUpdate, NewEvent, ProfileUpdate, Rating, RatingSummary, Registration,
    RegistrationStatus, Review, ReviewStatus, Subscription, SubscriptionOffer, SubscriptionPlan,
    SubscriptionStatus, User,
};

/// OpenAPI documentation for the Supper Club API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Supper Club API",
        version = "0.1.0",
        description = "Culinary event booking: membership, seat registration with waitlist, and moderated reviews",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        auth_handler::register,
        auth_handler::login,
        auth_handler::logout,
        auth_handler::request_password_reset,
        auth_handler::confirm_password_reset,
        me_handler::get_profile,
        me_handler::update_profile,
        me_handler::subscription_status,
        me_handler::subscribe,
        me_handler::my_registrations,
        event_handler::list_events,
        event_handler::get_event,
        event_handler::create_event,
        event_handler::update_event,
        event_handler::delete_event,
        event_handler::register,
        event_handler::unregister,
        event_handler::list_attendees,
        event_handler::list_reviews,
        event_handler::create_review,
        admin_handler::pending_reviews,
        admin_handler::approve_review,
        admin_handler::delete_review,
        admin_handler::recent_errors,
        upload_handler::upload,
    ),
    components(
        schemas(
            // Domain types
            User,
            ProfileUpdate,
            Subscription,
            SubscriptionPlan,
            SubscriptionStatus,
            SubscriptionOffer,
            Event,
            NewEvent,
            EventUpdate,
            Registration,
            RegistrationStatus,
            Review,
            ReviewStatus,
            Rating,
            RatingSummary,
            // Service views
            EventView,
            SubscriptionStatusView,
            TokenResponse,
            ErrorEntry,
            MessageResponse,
            // Request bodies
            auth_handler::RegisterRequest,
            auth_handler::LoginRequest,
            auth_handler::PasswordResetRequest,
            auth_handler::PasswordResetConfirm,
            me_handler::SubscribeRequest,
            event_handler::ReviewRequest,
            upload_handler::UploadResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Accounts, sessions and password reset"),
        (name = "Me", description = "Profile, membership and bookings of the caller"),
        (name = "Events", description = "Event catalog"),
        (name = "Registrations", description = "Seats and waitlist"),
        (name = "Reviews", description = "Event reviews"),
        (name = "Admin", description = "Moderation and diagnostics"),
        (name = "Uploads", description = "Image uploads")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for JWT Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT token obtained from /auth/login"))
                        .build(),
                ),
            );
        }
    }
}
