use std::sync::Arc;
use std::time::Duration;

use crate::provider::GenerationProvider;
use crate::store::Document;

/// Returned when the generation provider fails or times out.
pub const FALLBACK_ANSWER: &str = "Sorry, I encountered an error while generating the answer.";

/// Returned when the provider responds with empty text.
pub const EMPTY_ANSWER: &str = "Sorry, I could not generate an answer.";

/// Builds a bounded context block from retrieved documents and asks the
/// generation provider for a grounded answer.
///
/// The input order is the ranking order; documents are never re-ranked or
/// mutated here, so higher-similarity documents sit earlier in the prompt
/// and survive any truncation the provider itself applies.
#[derive(Clone)]
pub struct AnswerSynthesizer {
    provider: Arc<dyn GenerationProvider>,
    timeout: Duration,
    max_context_docs: usize,
    max_chars_per_doc: usize,
}

impl AnswerSynthesizer {
    pub fn new(
        provider: Arc<dyn GenerationProvider>,
        timeout: Duration,
        max_context_docs: usize,
        max_chars_per_doc: usize,
    ) -> Self {
        Self {
            provider,
            timeout,
            max_context_docs,
            max_chars_per_doc,
        }
    }

    pub async fn synthesize(&self, query: &str, context: &[Document]) -> String {
        let prompt = self.build_prompt(query, context);

        match tokio::time::timeout(self.timeout, self.provider.generate(&prompt)).await {
            Ok(Ok(answer)) => {
                if answer.trim().is_empty() {
                    EMPTY_ANSWER.to_string()
                } else {
                    answer
                }
            }
            Ok(Err(err)) => {
                tracing::warn!("Generation provider failed: {}", err);
                FALLBACK_ANSWER.to_string()
            }
            Err(_) => {
                tracing::warn!("Generation provider timed out after {:?}", self.timeout);
                FALLBACK_ANSWER.to_string()
            }
        }
    }

    fn build_prompt(&self, query: &str, context: &[Document]) -> String {
        let bounded = &context[..context.len().min(self.max_context_docs)];

        let context_text = bounded
            .iter()
            .map(|doc| {
                format!(
                    "Document ID: {}\nContent: {}",
                    doc.id,
                    truncate_chars(&doc.text, self.max_chars_per_doc)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            "You are an AI assistant that answers questions based on provided context.\n\
             Use the following documents to answer the question at the end.\n\
             If you don't know the answer, just say that you don't know, don't try to make up an answer.\n\
             \n\
             Context:\n\
             {context_text}\n\
             \n\
             Question: {query}\n\
             \n\
             Answer:"
        )
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}
