// src/routes.rs

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{
    handlers::{self, admin, auth, dashboard, exam},
    state::AppState,
    utils::session::{require_admin, require_login, session_middleware},
};

/// Assembles the main application router.
///
/// * Public pages (landing, login, register, logout).
/// * Pages behind the login gate (student dashboard, exam delivery).
/// * `/admin/*` behind the admin gate.
/// * Global middleware: request tracing, then the session layer, so every
///   handler and gate sees a `Session` in the request extensions.
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(auth::index))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", get(auth::logout));

    let student_routes = Router::new()
        .route("/dashboard", get(dashboard::dashboard))
        .route("/exam/{id}", get(exam::take_exam))
        .route("/submit-exam", post(exam::submit_exam))
        .route_layer(middleware::from_fn(require_login));

    let admin_routes = Router::new()
        .route("/dashboard", get(dashboard::admin_dashboard))
        .route(
            "/create-exam",
            get(admin::create_exam_page).post(admin::create_exam),
        )
        .route_layer(middleware::from_fn(require_admin));

    Router::new()
        .merge(public_routes)
        .merge(student_routes)
        .nest("/admin", admin_routes)
        .fallback(handlers::not_found)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    session_middleware,
                )),
        )
        .with_state(state)
}
