//! Redirect-plus-flash responses.
//!
//! Mutation endpoints answer with a 303 redirect and a short-lived
//! `flash` cookie carrying `severity:message`; the pages read and clear
//! it client-side.

use axum::body::Body;
use axum::http::{header, Response, StatusCode};

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Error => "error",
        }
    }
}

pub fn flash_redirect(location: &str, severity: Severity, message: &str) -> Response<Body> {
    let value = urlencoding::encode(&format!("{}:{}", severity.as_str(), message)).into_owned();
    let cookie = format!("{}={}; Path=/; Max-Age=60", FLASH_COOKIE, value);

    Response::builder()
        .status(StatusCode::SEE_OTHER)
        .header(header::LOCATION, location)
        .header(header::SET_COOKIE, cookie)
        .body(Body::empty())
        .expect("static redirect response")
}

pub fn redirect(location: &str) -> Response<Body> {
    Response::builder()
        .status(StatusCode::SEE_OTHER)
        .header(header::LOCATION, location)
        .body(Body::empty())
        .expect("static redirect response")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flash_redirect_sets_location_and_cookie() {
        let response = flash_redirect("/#register", Severity::Error, "Invalid email format.");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/#register"
        );

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(cookie.starts_with("flash=error%3AInvalid%20email%20format."));
        assert!(cookie.contains("Max-Age=60"));
    }

    #[test]
    fn plain_redirect_has_no_cookie() {
        let response = redirect("/chat_page");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }
}
