//! Collaborators around the router: the hosted completion service, the FAQ
//! answering pipeline, and mocks for tests.

/// FAQ answering pipeline.
pub mod faq;
/// Groq provider implementation.
pub mod groq;
/// Mock completion provider and semantic classifier.
pub mod mock;

pub use faq::{FaqAnswer, FaqPipeline, build_faq_prompt};
pub use groq::GroqProvider;
pub use mock::{MockClassifier, MockProvider};
