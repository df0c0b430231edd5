//! Entry Routes

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::Entry;
use tracing::info;

use crate::error::ApiError;
use crate::AppState;

const EMPTY_CONTENT: &str = "Content cannot be empty.";

/// Public shape of an entry; `created_at` stays internal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryView {
    pub id: i64,
    pub content: String,
}

impl From<&Entry> for EntryView {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.id,
            content: entry.content.clone(),
        }
    }
}

/// Form body for entry creation.
///
/// Accepts `application/x-www-form-urlencoded` and `multipart/form-data`.
#[derive(Debug, Deserialize)]
pub struct CreateEntryForm {
    pub content: String,
}

#[async_trait]
impl<S> FromRequest<S> for CreateEntryForm
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(form) = Form::<CreateEntryForm>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            return Ok(form);
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(IntoResponse::into_response)?
        {
            if field.name() == Some("content") {
                let content = field.text().await.map_err(IntoResponse::into_response)?;
                return Ok(Self { content });
            }
        }

        Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "Missing form field `content`",
        )
            .into_response())
    }
}

/// Trim surrounding whitespace; reject input that is empty afterwards
pub fn normalize_content(raw: &str) -> Result<String, ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(EMPTY_CONTENT.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Entries for display, newest first
pub async fn list_views(state: &AppState) -> Result<Vec<EntryView>, ApiError> {
    let entries = state.store.list_entries().await?;
    Ok(entries.iter().map(EntryView::from).collect())
}

/// List all entries
pub async fn handle_list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<EntryView>>, ApiError> {
    Ok(Json(list_views(&state).await?))
}

/// Create an entry from the `content` form field
pub async fn handle_create(
    State(state): State<Arc<AppState>>,
    form: CreateEntryForm,
) -> Result<Json<EntryView>, ApiError> {
    let content = match normalize_content(&form.content) {
        Ok(content) => content,
        Err(err) => {
            metrics::counter!("entries_rejected_total").increment(1);
            return Err(err);
        }
    };

    let entry = state.store.create_entry(&content).await?;
    metrics::counter!("entries_created_total").increment(1);
    info!("Created entry {}", entry.id);

    Ok(Json(EntryView::from(&entry)))
}
