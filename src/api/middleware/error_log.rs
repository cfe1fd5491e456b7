//! Records server errors in the admin-visible error log.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::api::AppState;
use crate::errors::ErrorReport;

/// Pick up the report `AppError` attaches to 5xx responses.
pub async fn error_log_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let mut response = next.run(request).await;

    if let Some(report) = response.extensions_mut().remove::<ErrorReport>() {
        state
            .error_log
            .record(report.code, format!("{} ({})", report.detail, path));
    }
    response
}
