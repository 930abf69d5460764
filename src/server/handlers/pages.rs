//! Static page handlers.
//!
//! Pages are embedded at compile time; all dynamic behavior (flash
//! messages, the reset token) is handled client-side from cookies and
//! the query string.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Response};

use crate::server::flash::{self, Severity};
use crate::server::session::{clear_session_cookie, session_from_headers};
use crate::state::AppState;

const INDEX_HTML: &str = include_str!("../../../assets/index.html");
const CHAT_HTML: &str = include_str!("../../../assets/chat.html");
pub(crate) const RESET_HTML: &str = include_str!("../../../assets/reset_password.html");

/// Landing page with the login, register and verification forms.
/// A verified logged-in user is sent straight to the chat page.
pub async fn index(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some((_, user)) = session_from_headers(&headers, &state.sessions) {
        if user.is_verified {
            return flash::redirect("/chat_page");
        }
    }
    Html(INDEX_HTML).into_response()
}

/// Chat UI, reachable only with a verified session. An unverified
/// session is terminated and bounced back to the verification form.
pub async fn chat_page(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    match session_from_headers(&headers, &state.sessions) {
        None => flash::redirect("/"),
        Some((token, user)) if !user.is_verified => {
            state.sessions.remove(&token);
            let mut response = flash::flash_redirect(
                "/#verify",
                Severity::Error,
                "Please verify your email to access the chatbot.",
            );
            if let Ok(value) = clear_session_cookie().parse() {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            response
        }
        Some(_) => Html(CHAT_HTML).into_response(),
    }
}
