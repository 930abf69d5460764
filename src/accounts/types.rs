use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed set of departments an employee can register under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Department {
    HR,
    IT,
    Finance,
    Marketing,
    Operations,
}

impl Department {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "HR" => Some(Department::HR),
            "IT" => Some(Department::IT),
            "Finance" => Some(Department::Finance),
            "Marketing" => Some(Department::Marketing),
            "Operations" => Some(Department::Operations),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::HR => "HR",
            Department::IT => "IT",
            Department::Finance => "Finance",
            Department::Marketing => "Marketing",
            Department::Operations => "Operations",
        }
    }
}

/// Verification/reset token state for a user.
///
/// "Never issued" and "pending" are structurally distinct; consuming a
/// token (verification or password change) returns the user to `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenState {
    None,
    Pending {
        value: String,
        expiry: DateTime<Utc>,
    },
}

impl TokenState {
    pub fn from_columns(token: Option<String>, expiry: Option<String>) -> Self {
        match (token, expiry) {
            (Some(value), Some(raw)) if !value.is_empty() => {
                match DateTime::parse_from_rfc3339(&raw) {
                    Ok(parsed) => TokenState::Pending {
                        value,
                        expiry: parsed.with_timezone(&Utc),
                    },
                    Err(_) => TokenState::None,
                }
            }
            _ => TokenState::None,
        }
    }

    /// Token is usable only while its expiry is strictly in the future.
    pub fn is_valid(&self, candidate: &str, now: DateTime<Utc>) -> bool {
        match self {
            TokenState::Pending { value, expiry } => {
                crate::core::security::tokens_match(value, candidate) && *expiry > now
            }
            TokenState::None => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub employee_id: String,
    pub department: Department,
    pub job_title: String,
    pub is_verified: bool,
    pub token: TokenState,
}
