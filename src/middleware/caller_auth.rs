use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::models::User;
use crate::util::extract_bearer_token;

/// The authenticated caller, inserted into request extensions.
#[derive(Clone)]
pub struct CallerContext {
    pub user: User,
}

/// Authenticate a caller from the bearer API key.
fn authenticate_caller(state: &AppState, headers: &HeaderMap) -> Result<User> {
    let api_key = extract_bearer_token(headers).ok_or(AppError::Unauthorized)?;
    let conn = state.db.get()?;
    queries::get_user_by_api_key(&conn, api_key)?.ok_or(AppError::Unauthorized)
}

/// Rejects requests without a valid API key. Capability checks are done by
/// each handler.
pub async fn caller_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let user = authenticate_caller(&state, request.headers())?;
    tracing::debug!(user_id = user.id, "Authenticated caller");
    request.extensions_mut().insert(CallerContext { user });
    Ok(next.run(request).await)
}
