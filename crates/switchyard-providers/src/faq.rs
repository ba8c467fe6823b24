//! Retrieval-augmented FAQ answering: look up the closest FAQ entries, then
//! let a completion provider phrase the answer from them alone.

use std::sync::Arc;
use switchyard_core::{
    AnswerConfig, Completion, CompletionProvider, CompletionRequest, Error, Result,
};
use switchyard_semantic::{EmbeddingProvider, FaqMatch, FaqStore};

/// Prompt asking the model to answer from the retrieved context only.
#[must_use]
pub fn build_faq_prompt(context: &str, question: &str) -> String {
    format!(
        "Given the following context and question, generate answer based on this context only.\n\
         If the answer is not found in the context, kindly state \"I don't know\". \
         Don't try to make up an answer.\n\n\
         CONTEXT: {context}\n\n\
         QUESTION: {question}\n"
    )
}

/// Generated answer plus the FAQ entries it was grounded on.
#[derive(Debug, Clone)]
pub struct FaqAnswer {
    /// Model-written answer.
    pub text: String,
    /// Retrieved entries placed in the prompt, closest first.
    pub sources: Vec<FaqMatch>,
    /// Provider that wrote the answer.
    pub provider: String,
}

/// Retrieval plus completion over an FAQ store.
pub struct FaqPipeline<E> {
    store: FaqStore<E>,
    provider: Arc<dyn CompletionProvider>,
    n_results: usize,
}

impl<E: EmbeddingProvider> FaqPipeline<E> {
    /// Pipeline placing the default number of entries in each prompt.
    #[must_use]
    pub fn new(store: FaqStore<E>, provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            store,
            provider,
            n_results: AnswerConfig::default().n_results,
        }
    }

    /// Number of FAQ entries placed in the prompt context.
    #[must_use]
    pub fn with_n_results(mut self, n_results: usize) -> Self {
        self.n_results = n_results.max(1);
        self
    }

    /// The backing FAQ store.
    pub fn store(&self) -> &FaqStore<E> {
        &self.store
    }

    /// Answers `question` from the closest FAQ entries. A retryable
    /// completion failure is retried once.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider reports itself unavailable, or if
    /// retrieval or the completion request fails.
    pub async fn answer(&self, question: &str) -> Result<FaqAnswer> {
        if !self.provider.is_available().await {
            return Err(Error::Provider(format!(
                "Completion provider {} is not available",
                self.provider.name()
            )));
        }

        let sources = self.store.search(question, self.n_results).await?;
        let context = sources
            .iter()
            .map(|source| source.answer.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        tracing::debug!("FAQ context for {question:?}: {context}");

        let request = CompletionRequest::new(build_faq_prompt(&context, question));
        let completion = self.complete_with_retry(&request).await?;
        tracing::info!(
            "Answered FAQ query via {} in {}ms ({} tokens)",
            completion.provider,
            completion.latency_ms,
            completion.tokens_used.total()
        );

        Ok(FaqAnswer {
            text: completion.text,
            sources,
            provider: completion.provider,
        })
    }

    async fn complete_with_retry(&self, request: &CompletionRequest) -> Result<Completion> {
        match self.provider.complete(request).await {
            Err(error) if error.is_retryable() => {
                tracing::warn!(
                    "Completion via {} failed, retrying once: {error}",
                    self.provider.name()
                );
                self.provider.complete(request).await
            }
            result => result,
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::assertions_on_result_states,
    reason = "Tests only care that these calls fail"
)]
mod tests {
    use super::*;
    use crate::MockProvider;
    use switchyard_semantic::{FaqEntry, LexicalEmbedder};

    fn entries() -> Vec<FaqEntry> {
        vec![
            FaqEntry {
                question: "Do you accept cash as a payment option?".to_owned(),
                answer: "Yes, cash on delivery is available.".to_owned(),
            },
            FaqEntry {
                question: "What is your refund policy?".to_owned(),
                answer: "Refunds are issued within 7 business days.".to_owned(),
            },
            FaqEntry {
                question: "Do you ship internationally?".to_owned(),
                answer: "We only ship within the country.".to_owned(),
            },
        ]
    }

    #[test]
    fn test_prompt_contains_context_and_question() {
        let prompt = build_faq_prompt("Refunds take 7 days.", "How long do refunds take?");
        assert!(prompt.contains("CONTEXT: Refunds take 7 days."));
        assert!(prompt.contains("QUESTION: How long do refunds take?"));
        assert!(prompt.contains("\"I don't know\""));
    }

    #[tokio::test]
    async fn test_answer_uses_retrieved_context() -> Result<()> {
        let store = FaqStore::new(LexicalEmbedder::default());
        store.ingest(&entries()).await?;
        let provider = MockProvider::new("mock-llm").with_response("cash on delivery", "Yes, cash works.");
        let pipeline = FaqPipeline::new(store, Arc::new(provider.clone())).with_n_results(1);

        let answer = pipeline.answer("Do you take cash as a payment option?").await?;
        assert_eq!(answer.text, "Yes, cash works.");
        assert_eq!(answer.provider, "mock-llm");
        assert_eq!(answer.sources.len(), 1);

        let prompts = provider.get_call_history();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("QUESTION: Do you take cash as a payment option?"));
        Ok(())
    }

    #[tokio::test]
    async fn test_unavailable_provider_is_not_called() -> Result<()> {
        let store = FaqStore::new(LexicalEmbedder::default());
        store.ingest(&entries()).await?;
        let provider = MockProvider::new("mock-llm").with_availability(false);
        let pipeline = FaqPipeline::new(store, Arc::new(provider.clone()));

        let result = pipeline.answer("What is your refund policy?").await;
        assert!(matches!(result, Err(Error::Provider(message)) if message.contains("not available")));
        assert_eq!(provider.call_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried_once() -> Result<()> {
        let flaky = MockProvider::new("mock-llm")
            .with_default_response("Refunds take 7 days.")
            .failing_first(1);
        let pipeline = FaqPipeline::new(FaqStore::new(LexicalEmbedder::default()), Arc::new(flaky.clone()));
        let answer = pipeline.answer("How long do refunds take?").await?;
        assert_eq!(answer.text, "Refunds take 7 days.");
        assert_eq!(flaky.call_count(), 2);

        let down = MockProvider::new("mock-llm").failing_first(2);
        let failing = FaqPipeline::new(FaqStore::new(LexicalEmbedder::default()), Arc::new(down.clone()));
        assert!(failing.answer("How long do refunds take?").await.is_err());
        assert_eq!(down.call_count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_store_still_asks_model() -> Result<()> {
        let provider = MockProvider::new("mock-llm");
        let pipeline = FaqPipeline::new(FaqStore::new(LexicalEmbedder::default()), Arc::new(provider));
        let answer = pipeline.answer("Anything?").await?;
        assert_eq!(answer.text, "I don't know");
        assert!(answer.sources.is_empty());
        assert!(pipeline.store().is_empty().await);
        Ok(())
    }
}
