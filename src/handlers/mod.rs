// src/handlers/mod.rs

use axum::response::Html;
use minijinja::{Environment, Value, context};

use crate::{error::AppError, templates::render, utils::session::Session};

pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod exam;

/// Renders a full page: `ctx` plus the current user and the pending flashes,
/// which are consumed.
pub(crate) fn render_page(
    templates: &Environment<'static>,
    session: &Session,
    name: &str,
    ctx: Value,
) -> Result<Html<String>, AppError> {
    render(
        templates,
        name,
        context! {
            user => session.user(),
            flashes => session.take_flashes(),
            ..ctx
        },
    )
}

/// Fallback for unknown paths.
pub async fn not_found() -> AppError {
    AppError::NotFound("Page not found".to_string())
}
