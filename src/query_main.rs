//! Command-line entry point for querying the handbook index directly,
//! without the web server in front.

use std::env;
use std::sync::Arc;

use anyhow::Context;

use hr_assistant_backend::core::config::AppConfig;
use hr_assistant_backend::llm::OllamaProvider;
use hr_assistant_backend::rag::{RagQueryService, SqliteVectorStore, VectorStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let question = env::args().skip(1).collect::<Vec<_>>().join(" ");
    if question.trim().is_empty() {
        eprintln!("usage: hr-query <question>");
        std::process::exit(2);
    }

    let config = AppConfig::from_env();

    let store: Arc<dyn VectorStore> = Arc::new(
        SqliteVectorStore::with_path(config.vector_db_path())
            .await
            .context("Failed to open the vector store")?,
    );
    let llm = Arc::new(OllamaProvider::new(config.llm.base_url.clone()));
    let service = RagQueryService::new(store, llm, &config.llm);

    let answer = service
        .query(&question)
        .await
        .context("Query pipeline failed")?;

    println!("Response:\n\n{}\n\nSources:\n\n{:?}", answer.text, answer.sources);
    Ok(())
}
