// src/handlers/auth.rs

use std::sync::Arc;

use axum::{
    Extension, Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use minijinja::context;
use validator::Validate;

use super::render_page;
use crate::{
    error::AppError,
    models::user::{LoginForm, RegisterForm, Role, User},
    state::Templates,
    store::Store,
    utils::{
        hash::{hash_password, verify_password},
        session::{FlashCategory, Session, SessionUser},
    },
};

/// Landing page. Logged-in users go straight to their dashboard.
pub async fn index(
    State(templates): State<Templates>,
    Extension(session): Extension<Session>,
) -> Result<Response, AppError> {
    if session.user().is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }

    Ok(render_page(&templates, &session, "index.html", context! {})?.into_response())
}

pub async fn login_page(
    State(templates): State<Templates>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, AppError> {
    render_page(&templates, &session, "login.html", context! {})
}

/// Authenticates by email and password.
///
/// An unknown email and a wrong password produce the same response, so the
/// form cannot be used to probe for registered addresses.
pub async fn login(
    State(store): State<Arc<dyn Store>>,
    State(templates): State<Templates>,
    Extension(session): Extension<Session>,
    Form(payload): Form<LoginForm>,
) -> Result<Response, AppError> {
    let user = store.find_user_by_email(payload.email.trim()).await?;

    let authenticated = match &user {
        Some(user) => verify_password(&payload.password, &user.password)?,
        None => false,
    };

    let user = match user {
        Some(user) if authenticated => user,
        _ => {
            tracing::info!("Failed login attempt");
            session.flash(FlashCategory::Error, "Invalid email or password");
            return Ok(render_page(&templates, &session, "login.html", context! {})?.into_response());
        }
    };

    let user_id = user
        .id
        .ok_or_else(|| AppError::InternalServerError("Stored user has no _id".to_string()))?;

    session.login(SessionUser {
        user_id: user_id.to_hex(),
        username: user.username,
        role: user.role,
    });
    session.flash(FlashCategory::Success, "Login successful");
    tracing::info!("User {} logged in as {}", user_id, user.role.as_str());

    let target = match user.role {
        Role::Admin => "/admin/dashboard",
        Role::Student => "/dashboard",
    };
    Ok(Redirect::to(target).into_response())
}

pub async fn register_page(
    State(templates): State<Templates>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, AppError> {
    render_page(&templates, &session, "register.html", context! {})
}

/// Registers a new student account.
///
/// Hashes the password using Argon2 before storing it.
/// Every outcome is a flash plus a redirect.
pub async fn register(
    State(store): State<Arc<dyn Store>>,
    Extension(session): Extension<Session>,
    Form(mut payload): Form<RegisterForm>,
) -> Result<Redirect, AppError> {
    payload.username = payload.username.trim().to_string();
    payload.email = payload.email.trim().to_string();

    if let Err(validation_errors) = payload.validate() {
        let err = AppError::from(validation_errors);
        session.flash(FlashCategory::Error, err.user_message());
        return Ok(Redirect::to("/register"));
    }

    if store.find_user_by_email(&payload.email).await?.is_some() {
        session.flash(FlashCategory::Error, "Email already registered");
        return Ok(Redirect::to("/register"));
    }

    let hashed_password = hash_password(&payload.password)?;
    let user = User::new(&payload.username, &payload.email, hashed_password, Role::Student);

    match store.insert_user(user).await {
        Ok(id) => tracing::info!("Registered student {}", id),
        // Lost the race against a concurrent registration with the same email.
        Err(AppError::Conflict(_)) => {
            session.flash(FlashCategory::Error, "Email already registered");
            return Ok(Redirect::to("/register"));
        }
        Err(e) => {
            tracing::error!("Failed to register user: {:?}", e);
            return Err(e);
        }
    }

    session.flash(FlashCategory::Success, "Registration successful. Please login.");
    Ok(Redirect::to("/login"))
}

pub async fn logout(Extension(session): Extension<Session>) -> Redirect {
    session.clear();
    session.flash(FlashCategory::Success, "Logged out successfully");
    Redirect::to("/")
}
