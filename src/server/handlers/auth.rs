//! Form-driven account endpoints.
//!
//! Every mutation answers with a redirect plus a flash cookie; error
//! messages stay generic so the forms never reveal which check failed.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{Html, IntoResponse, Response};
use axum::Form;
use serde::Deserialize;

use crate::accounts::{AccountError, Registration};
use crate::server::flash::{flash_redirect, redirect, Severity};
use crate::server::handlers::pages::RESET_HTML;
use crate::server::session::{
    clear_session_cookie, session_cookie, session_from_headers, SessionUser,
};
use crate::state::AppState;

const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Response {
    let email = form.email.trim().to_lowercase();
    let password = form.password.trim();

    if email.is_empty() || password.is_empty() {
        return flash_redirect("/", Severity::Error, "All fields are required!");
    }

    match state.accounts.login(&email, password).await {
        Ok(user) => {
            let token = state.sessions.create(SessionUser {
                user_id: user.id,
                email: user.email.clone(),
                is_verified: user.is_verified,
            });
            let mut response = redirect("/chat_page");
            if let Ok(value) = session_cookie(&token).parse() {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            response
        }
        Err(AccountError::EmailNotVerified) => {
            flash_redirect("/#verify", Severity::Error, "Please verify your email first.")
        }
        Err(AccountError::InvalidCredentials) => {
            flash_redirect("/", Severity::Error, "Invalid email or password.")
        }
        Err(err) => {
            tracing::error!("login failed: {}", err);
            flash_redirect("/", Severity::Error, GENERIC_FAILURE)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    employee_id: String,
    #[serde(default)]
    department: String,
    #[serde(default)]
    job_title: String,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Form(form): Form<RegisterForm>,
) -> Response {
    let registration = Registration {
        name: form.name,
        email: form.email,
        password: form.password,
        employee_id: form.employee_id,
        department: form.department,
        job_title: form.job_title,
    };

    match state.accounts.register(registration).await {
        Ok(()) => flash_redirect(
            "/#verify",
            Severity::Info,
            "Registration successful! Please verify your email.",
        ),
        Err(AccountError::Validation(message)) => {
            flash_redirect("/#register", Severity::Error, &message)
        }
        Err(AccountError::AlreadyRegistered) => flash_redirect(
            "/#register",
            Severity::Error,
            "Email or Employee ID already registered.",
        ),
        Err(AccountError::MailFailed) => flash_redirect(
            "/#register",
            Severity::Error,
            "Failed to send verification email. Please try again.",
        ),
        Err(err) => {
            tracing::error!("registration failed: {}", err);
            flash_redirect("/#register", Severity::Error, GENERIC_FAILURE)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenParams {
    token: Option<String>,
}

pub async fn verify_email(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TokenParams>,
) -> Response {
    let token = match params.token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => token.to_string(),
        _ => return flash_redirect("/", Severity::Error, "Invalid verification link."),
    };

    match state.accounts.verify_email(&token).await {
        Ok(()) => flash_redirect(
            "/",
            Severity::Info,
            "Email verified successfully! Please log in.",
        ),
        Err(AccountError::InvalidToken) => flash_redirect(
            "/",
            Severity::Error,
            "Verification link is invalid or expired.",
        ),
        Err(err) => {
            tracing::error!("email verification failed: {}", err);
            flash_redirect("/", Severity::Error, GENERIC_FAILURE)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ResendForm {
    #[serde(default)]
    email: String,
}

pub async fn resend_verification(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ResendForm>,
) -> Response {
    let email = form.email.trim().to_lowercase();
    if email.is_empty() {
        return flash_redirect("/#verify", Severity::Error, "Email is required!");
    }

    match state.accounts.resend_verification(&email).await {
        Ok(()) => flash_redirect(
            "/#verify",
            Severity::Info,
            "Verification email resent! Check your inbox.",
        ),
        Err(AccountError::AlreadyVerified) => {
            flash_redirect("/#verify", Severity::Error, "This email is already verified.")
        }
        Err(AccountError::EmailNotFound) => {
            flash_redirect("/#verify", Severity::Error, "Email not found.")
        }
        Err(AccountError::MailFailed) => flash_redirect(
            "/#verify",
            Severity::Error,
            "Failed to resend verification email.",
        ),
        Err(err) => {
            tracing::error!("verification resend failed: {}", err);
            flash_redirect("/#verify", Severity::Error, GENERIC_FAILURE)
        }
    }
}

/// Reset form page. A link with an invalid or expired token bounces
/// back to the landing page instead of rendering the form.
pub async fn reset_password_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TokenParams>,
) -> Response {
    if let Some(token) = params.token.as_deref().map(str::trim) {
        if !token.is_empty() {
            match state.accounts.reset_token_valid(token).await {
                Ok(true) => {}
                Ok(false) => {
                    return flash_redirect(
                        "/",
                        Severity::Error,
                        "Reset link is invalid or expired.",
                    )
                }
                Err(err) => {
                    tracing::error!("reset token check failed: {}", err);
                    return flash_redirect("/", Severity::Error, GENERIC_FAILURE);
                }
            }
        }
    }
    Html(RESET_HTML).into_response()
}

#[derive(Debug, Deserialize)]
pub struct ResetForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    new_password: String,
}

/// Two flows share this endpoint: posting an email requests a reset
/// link, posting a new password (with the token in the query string)
/// consumes it.
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TokenParams>,
    Form(form): Form<ResetForm>,
) -> Response {
    let email = form.email.trim().to_lowercase();
    if !email.is_empty() {
        return match state.accounts.request_password_reset(&email).await {
            Ok(()) => flash_redirect(
                "/",
                Severity::Info,
                "Password reset email sent! Check your inbox.",
            ),
            Err(AccountError::EmailNotFound) => {
                flash_redirect("/", Severity::Error, "Email not found.")
            }
            Err(AccountError::MailFailed) => {
                flash_redirect("/", Severity::Error, "Failed to send reset email.")
            }
            Err(err) => {
                tracing::error!("reset request failed: {}", err);
                flash_redirect("/", Severity::Error, GENERIC_FAILURE)
            }
        };
    }

    let new_password = form.new_password.trim();
    if new_password.is_empty() {
        return redirect("/reset_password");
    }

    let token = match params.token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => token.to_string(),
        _ => return flash_redirect("/", Severity::Error, "Invalid reset link."),
    };

    match state.accounts.reset_password(&token, new_password).await {
        Ok(()) => flash_redirect(
            "/",
            Severity::Info,
            "Password reset successfully! Please log in.",
        ),
        Err(AccountError::Validation(message)) => {
            let location = format!("/reset_password?token={}", token);
            flash_redirect(&location, Severity::Error, &message)
        }
        Err(AccountError::InvalidToken) => {
            flash_redirect("/", Severity::Error, "Reset link is invalid or expired.")
        }
        Err(err) => {
            tracing::error!("password reset failed: {}", err);
            flash_redirect("/", Severity::Error, GENERIC_FAILURE)
        }
    }
}

pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some((token, _)) = session_from_headers(&headers, &state.sessions) {
        state.sessions.remove(&token);
    }
    let mut response = redirect("/");
    if let Ok(value) = clear_session_cookie().parse() {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}
