//! Landing Page Route

use axum::{extract::State, response::Html};
use std::sync::Arc;

use super::entries::list_views;
use crate::error::ApiError;
use crate::AppState;

/// Render the landing page with every entry, newest first
pub async fn handle_index(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    let entries = list_views(&state).await?;
    let page = state.pages.render_index(&entries)?;
    Ok(Html(page))
}
