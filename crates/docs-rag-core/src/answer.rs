//! Grounded answering over retrieved context.
//!
//! The [`Answerer`] builds one prompt from an optional grounding preamble,
//! the retrieved context, and the user question, then calls the
//! [`CompletionProvider`] exactly once. The outcome is always explicit:
//!
//! | Variant | When |
//! |---------|------|
//! | [`Answer::Completed`] | the provider returned text in the expected shape |
//! | [`Answer::Declined`] | grounding is on and there is no context; the model is not called |
//! | [`Answer::Degraded`] | the response did not have the expected shape |
//!
//! Transport failures and non-2xx responses are errors, not answers.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Returned in place of model text when the response shape is unexpected.
pub const FALLBACK_MESSAGE: &str = "Unexpected API response format.";

/// Returned when the answer is not in the supplied context.
pub const ABSENT_MESSAGE: &str = "The documentation does not contain the answer.";

pub const DEFAULT_SUBJECT: &str = "MkDocs";

/// A generative model: `prompt → response`.
///
/// `complete` performs the request and returns the decoded response body;
/// `extract_text` pulls the primary text out of that body, returning
/// `None` when the body does not have the provider's expected shape.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn model_name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<Value>;

    fn extract_text(&self, response: &Value) -> Option<String>;
}

/// Constraints that keep the model inside the documentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundingPolicy {
    /// Name of the documented product, e.g. `MkDocs`.
    pub subject: String,
}

impl GroundingPolicy {
    pub fn new(subject: &str) -> Self {
        Self {
            subject: subject.to_string(),
        }
    }

    /// Exact reply for questions outside the documentation's scope.
    pub fn refusal_message(&self) -> String {
        format!(
            "I cannot answer this question because it is outside the {} documentation.",
            self.subject
        )
    }

    pub fn absent_message(&self) -> &'static str {
        ABSENT_MESSAGE
    }

    pub fn instructions(&self) -> String {
        format!(
            "You are a documentation assistant for {subject}.\n\
             You MUST answer strictly based on the provided documentation context.\n\
             If the user asks anything outside the {subject} documentation, reply ONLY with:\n\
             '{refusal}'\n\
             Do NOT use external knowledge. Do NOT guess or hallucinate.\n\
             If the answer cannot be found in the context, say:\n\
             '{absent}'\n\
             ALWAYS stay within the scope of {subject}.\n\n",
            subject = self.subject,
            refusal = self.refusal_message(),
            absent = self.absent_message(),
        )
    }
}

impl Default for GroundingPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_SUBJECT)
    }
}

/// Outcome of [`Answerer::answer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Completed(String),
    Declined(String),
    Degraded(String),
}

impl Answer {
    pub fn text(&self) -> &str {
        match self {
            Answer::Completed(t) | Answer::Declined(t) | Answer::Degraded(t) => t,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Answer::Degraded(_))
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Compose the full prompt sent to the model.
pub fn build_prompt(query: &str, context: &str, grounding: Option<&GroundingPolicy>) -> String {
    let preamble = grounding.map(|g| g.instructions()).unwrap_or_default();
    format!(
        "{preamble}Context:\n{context}\n\nUser question:\n{query}\n\n\
         Answer using ONLY the context above."
    )
}

pub struct Answerer {
    completer: Arc<dyn CompletionProvider>,
    grounding: Option<GroundingPolicy>,
}

impl Answerer {
    pub fn new(completer: Arc<dyn CompletionProvider>, grounding: Option<GroundingPolicy>) -> Self {
        Self {
            completer,
            grounding,
        }
    }

    pub async fn answer(&self, query: &str, context: &str) -> Result<Answer> {
        if let Some(g) = &self.grounding {
            if context.trim().is_empty() {
                tracing::info!("no context retrieved, declining without calling the model");
                return Ok(Answer::Declined(g.absent_message().to_string()));
            }
        }

        let prompt = build_prompt(query, context, self.grounding.as_ref());
        let response = self.completer.complete(&prompt).await?;

        match self.completer.extract_text(&response) {
            Some(text) => Ok(Answer::Completed(text)),
            None => {
                tracing::warn!(
                    model = self.completer.model_name(),
                    "completion response had an unexpected shape"
                );
                Ok(Answer::Degraded(FALLBACK_MESSAGE.to_string()))
            }
        }
    }
}
