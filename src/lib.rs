pub mod accounts;
pub mod core;
pub mod llm;
pub mod mailer;
pub mod rag;
pub mod server;
pub mod state;
