// src/handlers/admin.rs

use std::sync::Arc;

use axum::{
    Extension, Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use minijinja::context;
use validator::Validate;

use super::render_page;
use crate::{
    error::AppError,
    models::exam::{Exam, ExamDraft},
    state::Templates,
    store::Store,
    utils::{
        form::{FormFields, parse_exam_form},
        session::{FlashCategory, Session, SessionUser},
    },
};

pub async fn create_exam_page(
    State(templates): State<Templates>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, AppError> {
    render_page(&templates, &session, "create_exam.html", context! {})
}

fn decode_draft(fields: &FormFields) -> Result<ExamDraft, AppError> {
    let draft = parse_exam_form(fields)?;
    draft.validate()?;
    Ok(draft)
}

/// Creates a new exam from the authoring form.
/// Admin only. The exam is active as soon as it is stored.
pub async fn create_exam(
    State(store): State<Arc<dyn Store>>,
    Extension(session): Extension<Session>,
    Extension(user): Extension<SessionUser>,
    Form(fields): Form<FormFields>,
) -> Result<Redirect, AppError> {
    let draft = match decode_draft(&fields) {
        Ok(draft) => draft,
        Err(AppError::BadRequest(msg)) => {
            session.flash(FlashCategory::Error, msg);
            return Ok(Redirect::to("/admin/create-exam"));
        }
        Err(e) => return Err(e),
    };

    let exam = Exam::from_draft(draft, user.object_id()?);
    let question_count = exam.questions.len();

    let id = store.insert_exam(exam).await.map_err(|e| {
        tracing::error!("Failed to create exam: {:?}", e);
        e
    })?;
    tracing::info!(
        "Admin {} created exam {} with {} questions",
        user.user_id,
        id,
        question_count
    );

    session.flash(FlashCategory::Success, "Exam created successfully");
    Ok(Redirect::to("/admin/dashboard"))
}
