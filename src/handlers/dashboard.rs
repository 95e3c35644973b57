// src/handlers/dashboard.rs

use std::{collections::HashMap, sync::Arc};

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use minijinja::context;

use super::render_page;
use crate::{
    config::RECENT_EXAMS_LIMIT,
    error::AppError,
    models::{
        exam::{AdminStats, ExamSummary},
        exam_result::ResultSummary,
        user::Role,
    },
    state::Templates,
    store::Store,
    utils::session::{Session, SessionUser},
};

/// Student landing page: active exams and the student's own past results.
/// Admins are sent to the admin dashboard instead.
pub async fn dashboard(
    State(store): State<Arc<dyn Store>>,
    State(templates): State<Templates>,
    Extension(session): Extension<Session>,
    Extension(user): Extension<SessionUser>,
) -> Result<Response, AppError> {
    if user.is_admin() {
        return Ok(Redirect::to("/admin/dashboard").into_response());
    }

    let exams: Vec<ExamSummary> = store
        .list_active_exams()
        .await?
        .iter()
        .map(ExamSummary::from)
        .collect();

    let results = store.results_for_student(user.object_id()?).await?;

    // Results may reference exams that are no longer active, so titles are
    // looked up individually rather than taken from `exams`.
    let mut titles: HashMap<_, String> = HashMap::new();
    for result in &results {
        if titles.contains_key(&result.exam_id) {
            continue;
        }
        let title = store
            .find_exam(result.exam_id)
            .await?
            .map(|exam| exam.title)
            .unwrap_or_else(|| "Unknown exam".to_string());
        titles.insert(result.exam_id, title);
    }

    let results: Vec<ResultSummary> = results
        .iter()
        .map(|r| ResultSummary::new(r, titles.get(&r.exam_id).cloned().unwrap_or_default()))
        .collect();

    let page = render_page(
        &templates,
        &session,
        "dashboard.html",
        context! { exams => exams, results => results },
    )?;
    Ok(page.into_response())
}

/// Admin landing page: collection counts and the most recent exams.
pub async fn admin_dashboard(
    State(store): State<Arc<dyn Store>>,
    State(templates): State<Templates>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, AppError> {
    let stats = AdminStats {
        total_exams: store.count_exams(false).await?,
        total_students: store.count_users_by_role(Role::Student).await?,
        total_results: store.count_results().await?,
        active_exams: store.count_exams(true).await?,
    };

    let recent_exams: Vec<ExamSummary> = store
        .recent_exams(RECENT_EXAMS_LIMIT)
        .await?
        .iter()
        .map(ExamSummary::from)
        .collect();

    render_page(
        &templates,
        &session,
        "admin_dashboard.html",
        context! { stats => stats, recent_exams => recent_exams },
    )
}
