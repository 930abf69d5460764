//! Account management: registration, login, email verification and
//! password reset, backed by a pooled SQLite `users` table.

mod service;
mod store;
mod types;

pub use service::{AccountError, AccountService, Registration};
pub use store::UserStore;
pub use types::{Department, TokenState, User};
