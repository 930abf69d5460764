//! Environment-sourced application configuration.
//!
//! Every knob comes from the environment with a local-development default,
//! so the binary runs with no configuration at all against a local Ollama
//! instance and an on-disk data directory.

use std::env;
use std::fs;
use std::path::PathBuf;

/// SMTP relay settings for outbound transactional mail.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub sender_name: String,
}

/// Language-model endpoint and model names used by the RAG pipeline.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub generation_model: String,
    pub embedding_model: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Base URL embedded in verification and reset links. Configured rather
    /// than derived from the request Host header.
    pub public_base_url: String,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub smtp: SmtpConfig,
    pub llm: LlmConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let host = env_or("HOST", "127.0.0.1");
        let port = env::var("PORT")
            .ok()
            .and_then(|val| val.parse::<u16>().ok())
            .unwrap_or(8000);
        let bind_addr = format!("{}:{}", host, port);
        let public_base_url = env_or("PUBLIC_BASE_URL", &format!("http://{}", bind_addr));

        let data_dir = env::var("HR_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));
        let log_dir = data_dir.join("logs");

        for dir in [&data_dir, &log_dir] {
            let _ = fs::create_dir_all(dir);
        }

        let smtp = SmtpConfig {
            host: env_or("SMTP_SERVER", "smtp.gmail.com"),
            port: env::var("SMTP_PORT")
                .ok()
                .and_then(|val| val.parse::<u16>().ok())
                .unwrap_or(587),
            user: env_or("SMTP_USER", ""),
            password: env_or("SMTP_PASSWORD", ""),
            sender_name: env_or("SENDER_NAME", "GBS HR Assistant"),
        };

        let llm = LlmConfig {
            base_url: env_or("OLLAMA_BASE_URL", "http://localhost:11434"),
            generation_model: env_or("GENERATION_MODEL", "llama3.2"),
            embedding_model: env_or("EMBEDDING_MODEL", "nomic-embed-text"),
        };

        AppConfig {
            bind_addr,
            public_base_url,
            data_dir,
            log_dir,
            smtp,
            llm,
        }
    }

    pub fn users_db_path(&self) -> PathBuf {
        self.data_dir.join("users.db")
    }

    pub fn vector_db_path(&self) -> PathBuf {
        self.data_dir.join("vectors.db")
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|val| !val.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
