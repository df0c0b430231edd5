//! HTML page rendering

use handlebars::{Handlebars, TemplateError};
use serde_json::json;

use crate::error::ApiError;
use crate::routes::entries::EntryView;

const INDEX_TEMPLATE_NAME: &str = "index";
const INDEX_TEMPLATE: &str = include_str!("../templates/index.html.hbs");

/// Compiled page templates
pub struct Pages {
    registry: Handlebars<'static>,
}

impl Pages {
    /// Compile the embedded templates
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.register_template_string(INDEX_TEMPLATE_NAME, INDEX_TEMPLATE)?;
        Ok(Self { registry })
    }

    /// Landing page listing `entries` in the order given
    pub fn render_index(&self, entries: &[EntryView]) -> Result<String, ApiError> {
        self.registry
            .render(INDEX_TEMPLATE_NAME, &json!({ "entries": entries }))
            .map_err(|e| ApiError::Render(e.to_string()))
    }
}
