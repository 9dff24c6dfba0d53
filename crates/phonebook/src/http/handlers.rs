//! Request handlers for the info page and the contact routes.

use async_trait::async_trait;
use axum::body::HttpBody as _;
use axum::extract::{FromRequest, Path, Request, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Local, TimeZone};
use tracing::debug;

use crate::contact::{Contact, ContactInput};

use super::error::ApiError;
use super::AppState;

/// A contact body. An empty body reads as `{}`.
#[derive(Debug)]
pub struct ContactBody(pub ContactInput);

#[async_trait]
impl<S> FromRequest<S> for ContactBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        if request.body().size_hint().exact() == Some(0) {
            return Ok(Self(ContactInput::default()));
        }
        let Json(input) = Json::<ContactInput>::from_request(request, state).await?;
        Ok(Self(input))
    }
}

/// Render the info page fragment.
pub fn info_page<Tz>(count: usize, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!(
        "<p>Phonebook has info for {count} people <br/> {}</p>",
        now.format("%a %b %d %Y %H:%M:%S GMT%z")
    )
}

/// `GET /info`
pub async fn info(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let count = state.store.count().await?;
    Ok(Html(info_page(count, &Local::now())))
}

/// `GET /api/persons`
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Contact>>, ApiError> {
    Ok(Json(state.store.find_all().await?))
}

/// `GET /api/persons/:id`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    Ok(match state.store.find_by_id(&id).await? {
        Some(contact) => Json(contact).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    })
}

/// `POST /api/persons`
pub async fn create(
    State(state): State<AppState>,
    ContactBody(input): ContactBody,
) -> Result<Json<Contact>, ApiError> {
    if input.name.is_none() {
        return Err(ApiError::ContentMissing);
    }

    let contact = state.store.insert(input).await?;
    debug!("Created contact {}", contact.id);
    Ok(Json(contact))
}

/// `PUT /api/persons/:id`
///
/// Replaces both fields; a missing one fails validation.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ContactBody(input): ContactBody,
) -> Result<Response, ApiError> {
    Ok(match state.store.update_by_id(&id, input).await? {
        Some(contact) => Json(contact).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    })
}

/// `DELETE /api/persons/:id`
///
/// Deleting an unknown id still succeeds.
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if !state.store.delete_by_id(&id).await? {
        debug!("Delete of unknown contact {id}");
    }
    Ok(StatusCode::NO_CONTENT)
}
