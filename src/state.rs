use std::sync::Arc;

use crate::accounts::{AccountService, UserStore};
use crate::core::config::AppConfig;
use crate::llm::OllamaProvider;
use crate::mailer::SmtpMailer;
use crate::rag::{RagQueryService, SqliteVectorStore, VectorStore};
use crate::server::session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub accounts: AccountService,
    pub rag: Arc<RagQueryService>,
    pub vectors: Arc<dyn VectorStore>,
    pub sessions: SessionStore,
}

impl AppState {
    /// Wire the full production stack from environment configuration.
    pub async fn initialize() -> anyhow::Result<Arc<Self>> {
        let config = AppConfig::from_env();

        let users = UserStore::new(config.users_db_path()).await?;
        let mailer = Arc::new(SmtpMailer::new(&config.smtp)?);
        let accounts = AccountService::new(users, mailer, config.public_base_url.clone());

        let vectors: Arc<dyn VectorStore> =
            Arc::new(SqliteVectorStore::with_path(config.vector_db_path()).await?);
        let llm = Arc::new(OllamaProvider::new(config.llm.base_url.clone()));
        let rag = Arc::new(RagQueryService::new(vectors.clone(), llm, &config.llm));

        Ok(Arc::new(AppState {
            config,
            accounts,
            rag,
            vectors,
            sessions: SessionStore::new(),
        }))
    }

    /// Assemble a state from pre-built parts. Tests use this to swap in
    /// stub providers and mailers.
    pub fn from_parts(
        config: AppConfig,
        accounts: AccountService,
        rag: Arc<RagQueryService>,
        vectors: Arc<dyn VectorStore>,
    ) -> Arc<Self> {
        Arc::new(AppState {
            config,
            accounts,
            rag,
            vectors,
            sessions: SessionStore::new(),
        })
    }
}
