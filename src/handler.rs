//! HTTP request handlers for the redirect service
//!
//! This module implements:
//! - Shortening a long URL into a fresh short id
//! - Redirecting a short id to its long URL while recording the visit
//! - Exposing the raw visit log of a short id
//! - Serving the form page

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};

use crate::database::AppState;
use crate::error::{AppError, StoreError};
use crate::model::{CreateRequest, CreateResponse, VisitLogResponse};

/// Fresh ids tried before giving up on a shorten request
pub const MAX_ID_ATTEMPTS: usize = 5;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Creates a new short link
///
/// This handler:
/// 1. Rejects a missing, empty or malformed `url` before the store is touched
/// 2. Mints a short id and inserts the link, retrying on an id collision
/// 3. Returns the id together with the shareable link
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com/very/long/path" }
/// ```
///
/// # Response
///
/// - **201 Created** - `{ "id": "...", "short_url": "..." }`
/// - **400 Bad Request** - invalid input
/// - **503 Service Unavailable** - storage failed or timed out
pub async fn create_short_url(
    State(state): State<AppState>,
    payload: Result<Json<CreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload.map_err(|rejection| AppError::InvalidInput(rejection.body_text()))?;
    let url = validate_url(request.url)?;

    let id = mint_short_link(&state, &url).await?;
    tracing::info!(%id, redirect_url = %url, "short link created");

    let response = CreateResponse {
        short_url: state.short_url(&id),
        id,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Redirects a short id to its long URL
///
/// The lookup and the visit append happen in one storage operation, so the
/// visit is only recorded when a redirect is actually issued.
///
/// # Response
///
/// - **302 Found** - `Location` set to the stored URL
/// - **404 Not Found** - `{ "error": "Short URL not found" }`
/// - **500 Internal Server Error** - the stored URL cannot be sent as `Location`
pub async fn redirect_url(
    Path(short_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let redirect_url = match state.store.resolve_and_record_visit(&short_id).await {
        Ok(url) => url,
        Err(StoreError::NotFound(_)) => {
            tracing::warn!(%short_id, "unknown short id requested");
            return Err(AppError::NotFound);
        }
        Err(err) => return Err(err.into()),
    };

    tracing::debug!(%short_id, %redirect_url, "redirecting");

    // validate_url rules this out for links created through the API
    let location = HeaderValue::try_from(redirect_url).map_err(|err| {
        StoreError::InvalidData(format!("stored url of {} is not a valid header: {}", short_id, err))
    })?;

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

/// Returns the raw visit log of a short id without recording a visit
pub async fn visit_log(
    Path(short_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<VisitLogResponse>, AppError> {
    let link = state.store.get(&short_id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(link.into()))
}

/// Serves the shortening form
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Inserts `url` under a freshly generated id, retrying on collision
async fn mint_short_link(state: &AppState, url: &str) -> Result<String, AppError> {
    for attempt in 1..=MAX_ID_ATTEMPTS {
        let candidate = state.generator.generate(url);

        match state.store.create(&candidate, url).await {
            Ok(id) => return Ok(id),
            Err(StoreError::DuplicateKey(taken)) => {
                tracing::warn!(id = %taken, attempt, "short id collision, retrying");
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(AppError::StorageUnavailable(format!(
        "no free short id after {} attempts",
        MAX_ID_ATTEMPTS
    )))
}

fn validate_url(url: Option<String>) -> Result<String, AppError> {
    let url = url.map(|url| url.trim().to_string()).unwrap_or_default();

    if url.is_empty() {
        return Err(AppError::InvalidInput("url is required".to_string()));
    }

    // Must be usable as a Location header later on
    if HeaderValue::from_str(&url).is_err() {
        return Err(AppError::InvalidInput(
            "url contains characters that cannot be redirected to".to_string(),
        ));
    }

    Ok(url)
}
