//! The RAG query pipeline.
//!
//! embed question -> retrieve top-k chunks -> assemble prompt -> invoke
//! model -> strip reasoning tags -> return answer + source ids.
//!
//! Every step runs sequentially inside the request; any downstream
//! failure is an unrecoverable request-level failure. There is no retry,
//! caching, or token-budget accounting.

use std::sync::Arc;
use std::sync::OnceLock;

use regex::Regex;

use crate::core::config::LlmConfig;
use crate::core::errors::ApiError;
use crate::llm::LlmProvider;

use super::store::VectorStore;

/// Number of nearest chunks fed into the prompt context.
const TOP_K: usize = 5;

/// Delimiter between chunks in the context block.
const CONTEXT_DELIMITER: &str = "\n\n---\n\n";

const PROMPT_TEMPLATE: &str = "\
You are an HR assistant chatbot for GBS Technologies.
Provide a concise, professional response relevant to HR policies, procedures, or information outlined in the handbook.
Answer the question based only on the given context below from the company handbook.
If there is even a little bit information related to question found than give that to the user.
Otherwise, don't try to make up an answer.
Act like you know these information and don't let user to know that you are using context from company handbook.

{context}

---

Question: {question}
";

/// A generated answer plus the source ids of the chunks it was grounded
/// on, in retrieval order.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<String>,
}

pub struct RagQueryService {
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn LlmProvider>,
    generation_model: String,
    embedding_model: String,
}

impl RagQueryService {
    pub fn new(store: Arc<dyn VectorStore>, llm: Arc<dyn LlmProvider>, config: &LlmConfig) -> Self {
        Self {
            store,
            llm,
            generation_model: config.generation_model.clone(),
            embedding_model: config.embedding_model.clone(),
        }
    }

    pub async fn query(&self, question: &str) -> Result<Answer, ApiError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ApiError::BadRequest("question must not be empty".to_string()));
        }

        let embeddings = self
            .llm
            .embed(&[question.to_string()], &self.embedding_model)
            .await?;
        let query_embedding = embeddings.into_iter().next().ok_or_else(|| {
            ApiError::Internal("embedding provider returned no vector".to_string())
        })?;

        // Ascending distance; concatenation order feeds straight into the
        // prompt and can influence the model's output.
        let results = self.store.search(&query_embedding, TOP_K).await?;

        let context = results
            .iter()
            .map(|r| r.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_DELIMITER);

        let prompt = render_prompt(&context, question);

        let raw = self.llm.generate(&prompt, &self.generation_model).await?;

        let text = strip_reasoning(&raw);
        let sources = results.iter().map(|r| r.chunk.source_id.clone()).collect();

        Ok(Answer { text, sources })
    }
}

/// Question and context are substituted verbatim, no escaping.
fn render_prompt(context: &str, question: &str) -> String {
    PROMPT_TEMPLATE
        .replace("{context}", context)
        .replace("{question}", question)
}

/// Remove `<think>...</think>` blocks some models emit, then trim.
fn strip_reasoning(raw: &str) -> String {
    static THINK_TAGS: OnceLock<Regex> = OnceLock::new();
    let re = THINK_TAGS.get_or_init(|| Regex::new(r"(?s)<think>.*?</think>").expect("static regex"));
    re.replace_all(raw, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::rag::store::{DocumentChunk, ScoredChunk};

    struct StubProvider {
        response: Option<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl StubProvider {
        fn answering(response: &str) -> Self {
            Self {
                response: Some(response.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                response: None,
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn health_check(&self) -> Result<bool, ApiError> {
            Ok(self.response.is_some())
        }

        async fn generate(&self, prompt: &str, _model_id: &str) -> Result<String, ApiError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.response
                .clone()
                .ok_or_else(|| ApiError::Internal("model unavailable".to_string()))
        }

        async fn embed(
            &self,
            inputs: &[String],
            _model_id: &str,
        ) -> Result<Vec<Vec<f32>>, ApiError> {
            if self.response.is_none() {
                return Err(ApiError::Internal("embedding unavailable".to_string()));
            }
            Ok(inputs.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    struct FixedStore {
        results: Vec<ScoredChunk>,
    }

    #[async_trait]
    impl VectorStore for FixedStore {
        async fn insert_batch(
            &self,
            _items: Vec<(DocumentChunk, Vec<f32>)>,
        ) -> Result<(), ApiError> {
            Ok(())
        }

        async fn search(
            &self,
            _query_embedding: &[f32],
            limit: usize,
        ) -> Result<Vec<ScoredChunk>, ApiError> {
            Ok(self.results.iter().take(limit).cloned().collect())
        }

        async fn count(&self) -> Result<usize, ApiError> {
            Ok(self.results.len())
        }
    }

    fn scored(id: &str, content: &str, source: &str, distance: f32) -> ScoredChunk {
        ScoredChunk {
            chunk: DocumentChunk {
                chunk_id: id.to_string(),
                content: content.to_string(),
                source_id: source.to_string(),
            },
            distance,
        }
    }

    fn service(provider: StubProvider, results: Vec<ScoredChunk>) -> (RagQueryService, Arc<StubProvider>) {
        let provider = Arc::new(provider);
        let config = LlmConfig {
            base_url: "http://localhost:11434".to_string(),
            generation_model: "llama3.2".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
        };
        (
            RagQueryService::new(Arc::new(FixedStore { results }), provider.clone(), &config),
            provider,
        )
    }

    #[tokio::test]
    async fn answer_carries_sources_in_retrieval_order() {
        let results = vec![
            scored("c1", "Employees get 20 vacation days.", "handbook:p4", 0.1),
            scored("c2", "Carryover is capped at 5 days.", "handbook:p5", 0.2),
        ];
        let (service, _) = service(StubProvider::answering("You get 20 days."), results);

        let answer = service.query("How many vacation days?").await.unwrap();

        assert_eq!(answer.text, "You get 20 days.");
        assert_eq!(answer.sources, vec!["handbook:p4", "handbook:p5"]);
    }

    #[tokio::test]
    async fn prompt_embeds_context_and_question_in_order() {
        let results = vec![
            scored("c1", "First chunk.", "s1", 0.1),
            scored("c2", "Second chunk.", "s2", 0.2),
        ];
        let (service, provider) = service(StubProvider::answering("ok"), results);

        service.query("What is the policy?").await.unwrap();

        let prompts = provider.prompts.lock().unwrap();
        let prompt = &prompts[0];
        assert!(prompt.contains("First chunk.\n\n---\n\nSecond chunk."));
        assert!(prompt.contains("Question: What is the policy?"));
        let first = prompt.find("First chunk.").unwrap();
        let second = prompt.find("Second chunk.").unwrap();
        assert!(first < second);
    }

    #[tokio::test]
    async fn reasoning_tags_are_stripped() {
        let raw = "<think>step one\nstep two</think>  The answer is 20 days.  ";
        let (service, _) = service(
            StubProvider::answering(raw),
            vec![scored("c1", "chunk", "s1", 0.1)],
        );

        let answer = service.query("question?").await.unwrap();
        assert_eq!(answer.text, "The answer is 20 days.");
    }

    #[tokio::test]
    async fn empty_question_is_a_request_failure() {
        let (service, _) = service(StubProvider::answering("ok"), vec![]);

        let result = service.query("   ").await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn downstream_failure_propagates() {
        let (service, _) = service(StubProvider::failing(), vec![]);

        let result = service.query("question?").await;
        assert!(matches!(result, Err(ApiError::Internal(_))));
    }

    #[test]
    fn strip_reasoning_is_non_greedy() {
        let raw = "<think>a</think>keep<think>b</think>";
        assert_eq!(strip_reasoning(raw), "keep");
    }

    #[test]
    fn strip_reasoning_leaves_plain_output_alone() {
        assert_eq!(strip_reasoning("  plain answer \n"), "plain answer");
    }
}
