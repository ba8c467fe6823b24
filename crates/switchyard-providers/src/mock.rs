//! Mock collaborators for testing the router and the FAQ pipeline.
//!
//! Both mocks return canned results keyed by query patterns and record how
//! they were called, so tests can assert on the cascade's behavior without a
//! model server or network access.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use switchyard_core::{
    Category, CategoryId, ClassifierError, ClassifierResult, Completion, CompletionProvider,
    CompletionRequest, Error, IgnoreLock as _, Query, Result, SemanticClassifier, TokenUsage,
};

/// Response storage type
type ResponseMap = Arc<Mutex<HashMap<String, String>>>;

/// Mock completion provider that returns pre-defined responses based on
/// prompt patterns.
#[derive(Clone)]
pub struct MockProvider {
    /// Name reported in [`Completion::provider`]
    name: String,
    /// Predefined responses keyed by prompt substring
    responses: ResponseMap,
    /// Default response if no match found
    default_response: Arc<Mutex<Option<String>>>,
    /// Prompts received, in order
    call_history: Arc<Mutex<Vec<String>>>,
    /// Reported by `is_available`
    available: Arc<AtomicBool>,
    /// Calls left that fail with a retryable provider error
    pending_failures: Arc<AtomicUsize>,
}

impl MockProvider {
    /// Available provider that answers "I don't know" to unmatched prompts.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            default_response: Arc::new(Mutex::new(None)),
            call_history: Arc::new(Mutex::new(Vec::new())),
            available: Arc::new(AtomicBool::new(true)),
            pending_failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Set what `is_available` reports.
    #[must_use]
    pub fn with_availability(self, available: bool) -> Self {
        self.available.store(available, Ordering::SeqCst);
        self
    }

    /// Make the next `count` completions fail with a retryable error.
    #[must_use]
    pub fn failing_first(self, count: usize) -> Self {
        self.pending_failures.store(count, Ordering::SeqCst);
        self
    }

    /// Add a pattern-based response.
    #[must_use]
    pub fn with_response(self, pattern: impl Into<String>, response: impl Into<String>) -> Self {
        self.responses
            .lock_ignore_poison()
            .insert(pattern.into(), response.into());
        self
    }

    /// Set a default response for prompts that don't match any pattern.
    #[must_use]
    pub fn with_default_response(self, response: impl Into<String>) -> Self {
        *self.default_response.lock_ignore_poison() = Some(response.into());
        self
    }

    /// All prompts received so far.
    #[must_use]
    pub fn get_call_history(&self) -> Vec<String> {
        self.call_history.lock_ignore_poison().clone()
    }

    /// Number of completion requests received, failed ones included.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.call_history.lock_ignore_poison().len()
    }

    fn find_response(&self, prompt: &str) -> Option<String> {
        let responses = self.responses.lock_ignore_poison();
        responses
            .iter()
            .find(|(pattern, _)| prompt.contains(pattern.as_str()))
            .map(|(_, response)| response.clone())
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        self.call_history
            .lock_ignore_poison()
            .push(request.prompt.clone());

        let failed = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failed {
            return Err(Error::Provider(format!("{} is temporarily unavailable", self.name)));
        }

        let text = self.find_response(&request.prompt).unwrap_or_else(|| {
            self.default_response
                .lock_ignore_poison()
                .clone()
                .unwrap_or_else(|| "I don't know".to_owned())
        });

        Ok(Completion {
            text,
            provider: self.name.clone(),
            tokens_used: TokenUsage {
                input: request.prompt.len() as u64,
                output: 0,
            },
            latency_ms: 0,
        })
    }
}

/// Scriptable [`SemanticClassifier`].
///
/// By default it initializes synchronously, accepts registration and
/// classifies every query as `None`. Builder methods change each of those.
#[derive(Default)]
pub struct MockClassifier {
    /// Canned results keyed by query substring, checked in insertion order
    responses: Vec<(String, Option<CategoryId>)>,
    default: Option<CategoryId>,
    /// Error returned by every `classify` call
    failure: Option<ClassifierError>,
    /// Error returned by both init paths
    init_failure: Option<ClassifierError>,
    async_only: bool,
    sync_init_calls: AtomicUsize,
    async_init_calls: AtomicUsize,
    register_calls: AtomicUsize,
    classify_calls: AtomicUsize,
    registered_utterances: AtomicUsize,
}

impl MockClassifier {
    /// Classifier that answers `None` to everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `category` for queries containing `pattern`.
    #[must_use]
    pub fn with_response(mut self, pattern: impl Into<String>, category: Option<CategoryId>) -> Self {
        self.responses.push((pattern.into(), category));
        self
    }

    /// Result for queries matching no pattern.
    #[must_use]
    pub fn with_default(mut self, category: Option<CategoryId>) -> Self {
        self.default = category;
        self
    }

    /// Fails every `classify` call with `error`.
    #[must_use]
    pub fn failing_with(mut self, error: ClassifierError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Fails initialization with `error`.
    #[must_use]
    pub fn failing_init_with(mut self, error: ClassifierError) -> Self {
        self.init_failure = Some(error);
        self
    }

    /// Rejects the synchronous init path like a remote-backed classifier.
    #[must_use]
    pub fn async_init_only(mut self) -> Self {
        self.async_only = true;
        self
    }

    /// Calls to `initialize`.
    pub fn sync_init_count(&self) -> usize {
        self.sync_init_calls.load(Ordering::SeqCst)
    }

    /// Calls to `initialize_async`.
    pub fn async_init_count(&self) -> usize {
        self.async_init_calls.load(Ordering::SeqCst)
    }

    /// Calls to `register`.
    pub fn register_count(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }

    /// Calls to `classify`.
    pub fn classify_count(&self) -> usize {
        self.classify_calls.load(Ordering::SeqCst)
    }

    /// Utterances seen by the most recent `register` call.
    pub fn registered_utterances(&self) -> usize {
        self.registered_utterances.load(Ordering::SeqCst)
    }

    fn init_result(&self) -> ClassifierResult<()> {
        self.init_failure.clone().map_or(Ok(()), Err)
    }
}

#[async_trait]
impl SemanticClassifier for MockClassifier {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn initialize(&self) -> ClassifierResult<()> {
        self.sync_init_calls.fetch_add(1, Ordering::SeqCst);
        if self.async_only {
            return Err(ClassifierError::SyncInitUnsupported("mock"));
        }
        self.init_result()
    }

    async fn initialize_async(&self) -> ClassifierResult<()> {
        self.async_init_calls.fetch_add(1, Ordering::SeqCst);
        self.init_result()
    }

    async fn register(&self, categories: &[Arc<Category>]) -> ClassifierResult<()> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        let utterances = categories
            .iter()
            .map(|category| category.utterances.len())
            .sum();
        self.registered_utterances.store(utterances, Ordering::SeqCst);
        Ok(())
    }

    async fn classify(&self, query: &Query) -> ClassifierResult<Option<CategoryId>> {
        self.classify_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let text = query.normalized();
        Ok(self
            .responses
            .iter()
            .find(|(pattern, _)| text.contains(pattern.to_lowercase().as_str()))
            .map_or_else(|| self.default.clone(), |(_, category)| category.clone()))
    }
}
