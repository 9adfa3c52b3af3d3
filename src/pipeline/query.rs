//! Retrieve, generate and cache one answer.

use tracing::{debug, info, instrument};

use super::error::PipelineError;
use super::types::{QueryRequest, QueryResponse};
use super::{QueryCacheKey, RagPipeline};
use crate::generation::parse_advice;
use crate::hashing::query_cache_key;
use crate::metadata::{QueryLog, QueryLogDocument};
use crate::vectordb::VectorMatch;

const CONTEXT_SEPARATOR: &str = "\n---\n";

/// Renders one retrieved chunk as `path::id` followed by its text.
pub fn format_context(hit: &VectorMatch) -> String {
    let path = hit.attributes.get("path").map_or("", String::as_str);
    let text = hit.attributes.get("text").map_or("", String::as_str);
    format!("{}::{}\n{}", path, hit.id, text)
}

/// Builds the generator prompt from retrieved contexts and the user's question.
pub fn build_prompt(contexts: &[String], question: &str) -> String {
    format!(
        "\nYou are a code mentor assistant. Use the CONTEXT below (code chunks) and the QUESTION to produce:\n\
         - a short list of concrete suggestions\n\
         - a few insights about code structure or risk\n\
         - guidance on next steps\n\
         \n\
         CONTEXT:\n\
         {}\n\
         \n\
         QUESTION:\n\
         {}\n\
         \n\
         RESPONSE FORMAT:\n\
         JSON with fields: suggestions (list), insights (list), guidance (string)\n",
        contexts.join(CONTEXT_SEPARATOR),
        question
    )
}

impl RagPipeline {
    /// Answers `request.prompt` against the `request.repo_id` namespace.
    ///
    /// Identical `(repo, prompt, top_k)` requests within the cache TTL return the
    /// cached response without touching the embedder, index or generator.
    #[instrument(
        skip(self, request),
        fields(repo_id = %request.repo_id, prompt_len = request.prompt.len(), top_k = request.top_k)
    )]
    pub async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, PipelineError> {
        let repo_id = request.repo_id.as_str();
        if repo_id.trim().is_empty() {
            return Err(PipelineError::InvalidRequest("repoId is required".to_string()));
        }
        if request.prompt.trim().is_empty() {
            return Err(PipelineError::InvalidRequest("prompt is required".to_string()));
        }
        if request.top_k == 0 {
            return Err(PipelineError::InvalidRequest(
                "topK must be at least 1".to_string(),
            ));
        }

        let key: QueryCacheKey = (
            repo_id.to_string(),
            query_cache_key(repo_id, &request.prompt, request.top_k),
        );
        if let Some(cached) = self.query_cache.get(&key) {
            debug!("query cache hit");
            return Ok(cached);
        }

        let query_vector = self.embedder.embed_one(&request.prompt).await?;
        let hits = self
            .index
            .query(repo_id, query_vector, request.top_k)
            .await?;
        debug!(hits = hits.len(), "retrieved context");

        let contexts: Vec<String> = hits.iter().map(format_context).collect();
        let prompt = build_prompt(&contexts, &request.prompt);

        let raw = self.generator.generate(&prompt).await?;
        let advice = parse_advice(&raw);

        self.metadata
            .record_query_log(&QueryLogDocument {
                repo_id: repo_id.to_string(),
                log: QueryLog {
                    prompt: request.prompt.clone(),
                    result: advice.clone(),
                },
            })
            .await;

        let response = QueryResponse {
            suggestions: advice.suggestions,
            insights: advice.insights,
            guidance: advice.guidance,
            raw_output: raw,
        };
        self.query_cache.set(key, response.clone());

        info!(
            suggestions = response.suggestions.len(),
            insights = response.insights.len(),
            "query answered"
        );
        Ok(response)
    }
}
