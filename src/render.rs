//! # Notification Rendering
//!
//! This module renders notification content by applying Handlebars templates
//! to a merged context built from template defaults, rule overrides, and the
//! webhook payload itself.

use handlebars::{Handlebars, no_escape};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

/// Errors produced while rendering notification content
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template failed to render: {0}")]
    Template(#[from] handlebars::RenderError),
    #[error("json template produced invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("unknown render engine '{0}'")]
    UnknownEngine(String),
}

/// Output contract of a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderEngine {
    /// Plain text output, stored as rendered
    Text,
    /// Output must parse as JSON after rendering
    Json,
}

impl RenderEngine {
    /// Resolve an engine from its stored name
    pub fn from_name(name: &str) -> Result<Self, RenderError> {
        match name {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(RenderError::UnknownEngine(other.to_string())),
        }
    }
}

/// Renders notification templates
pub struct Renderer {
    handlebars: Handlebars<'static>,
}

impl Renderer {
    /// Create a renderer with a fresh template registry
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        // Notifications are chat text or JSON payloads, never HTML
        handlebars.register_escape_fn(no_escape);
        Self { handlebars }
    }

    /// Render template content against context data
    ///
    /// For the JSON engine the rendered output must itself parse as JSON;
    /// the original rendered string is returned either way.
    pub fn render(
        &self,
        engine: RenderEngine,
        content: &str,
        data: &JsonValue,
    ) -> Result<String, RenderError> {
        let rendered = self.handlebars.render_template(content, data)?;

        if engine == RenderEngine::Json {
            serde_json::from_str::<JsonValue>(&rendered)?;
        }

        Ok(rendered)
    }

    /// Render a template against its stored example data
    pub fn preview(
        &self,
        engine_name: &str,
        content: &str,
        example_data: Option<&JsonValue>,
    ) -> Result<String, RenderError> {
        let engine = RenderEngine::from_name(engine_name)?;
        let empty = JsonValue::Object(Map::new());
        let data = example_data.unwrap_or(&empty);
        self.render(engine, content, data)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the render context for one rule firing
///
/// Sources merge shallowly in order, later keys winning: template default
/// options, then rule overrides, then the webhook payload. The trigger name
/// is inserted last under `event_type` so templates can always reach it.
/// Sources that are not JSON objects contribute nothing.
pub fn merge_context(
    default_options: Option<&JsonValue>,
    rule_options: Option<&JsonValue>,
    payload: &JsonValue,
    trigger: &str,
) -> JsonValue {
    let mut merged = Map::new();

    for source in [default_options, rule_options, Some(payload)]
        .into_iter()
        .flatten()
    {
        if let Some(object) = source.as_object() {
            for (key, value) in object {
                merged.insert(key.clone(), value.clone());
            }
        }
    }

    merged.insert(
        "event_type".to_string(),
        JsonValue::String(trigger.to_string()),
    );

    JsonValue::Object(merged)
}
