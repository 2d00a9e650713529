// AI coach chat
//
// One remote generateContent call per user turn. The chat log lives only for
// the session, and nothing here fails past the chat boundary: provider errors
// become a fixed apology message.

use crate::metrics::Metrics;
use crate::models::CoachSettings;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

pub const GREETING: &str =
    "Hello! I am your AMAX Fit AI coach. Need a workout suggestion or nutrition advice?";

/// Shown when the provider answers with no text
pub const EMPTY_REPLY_FALLBACK: &str =
    "I'm having trouble connecting to the fitness database right now. Try again later!";

/// Shown when the provider call fails for any reason
pub const ERROR_APOLOGY: &str = "Sorry, I couldn't process that. Please check your connection.";

pub const QUICK_ACTIONS: [&str; 3] = ["Suggest a workout", "Nutrition for fat loss", "How to squat?"];

/// Quick actions are offered until the log holds this many messages
const QUICK_ACTION_LIMIT: usize = 3;

#[derive(Error, Debug)]
pub enum CoachError {
    #[error("API key missing: environment variable {0} is not set")]
    MissingCredential(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Advice endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Source of coaching advice for a single user turn
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdviceProvider: Send + Sync {
    /// Return the reply text for one user message. An empty string means the
    /// provider had nothing to say.
    async fn advise(&self, text: &str) -> Result<String, CoachError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Gemini `generateContent` client
#[derive(Debug, Clone)]
pub struct GeminiAdvisor {
    client: Client,
    settings: CoachSettings,
    api_key: Option<String>,
}

impl GeminiAdvisor {
    /// Create a client that reads its key from `settings.api_key_env` per call
    pub fn new(settings: &CoachSettings) -> Result<Self, CoachError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            settings: settings.clone(),
            api_key: None,
        })
    }

    /// Use a fixed key instead of the environment
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        )
    }

    fn api_key(&self) -> Result<String, CoachError> {
        if let Some(key) = &self.api_key {
            return Ok(key.clone());
        }
        std::env::var(&self.settings.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| CoachError::MissingCredential(self.settings.api_key_env.clone()))
    }
}

#[async_trait]
impl AdviceProvider for GeminiAdvisor {
    async fn advise(&self, text: &str) -> Result<String, CoachError> {
        let api_key = self.api_key()?;

        let request = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: &self.settings.system_instruction,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text }],
            }],
        };

        tracing::debug!("Sending advice request to {}", self.settings.model);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CoachError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: GenerateContentResponse = response.json().await?;
        Ok(reply.text())
    }
}

/// Canned provider used when no remote endpoint should be contacted
#[derive(Debug, Clone, Default)]
pub struct OfflineAdvisor;

#[async_trait]
impl AdviceProvider for OfflineAdvisor {
    async fn advise(&self, _text: &str) -> Result<String, CoachError> {
        Ok(String::new())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: ChatRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Session-only chat log with the coach
///
/// [`send()`](Self::send) runs a whole turn. Front ends that must stay
/// responsive during the request call [`begin()`](Self::begin), run the
/// provider themselves, then hand the outcome to [`complete()`](Self::complete).
pub struct CoachChat {
    provider: Arc<dyn AdviceProvider>,
    messages: Vec<ChatMessage>,
    typing: bool,
    metrics: Arc<Metrics>,
}

impl CoachChat {
    pub fn new(provider: Arc<dyn AdviceProvider>, metrics: Arc<Metrics>) -> Self {
        Self {
            provider,
            messages: vec![ChatMessage::new(ChatRole::Model, GREETING)],
            typing: false,
            metrics,
        }
    }

    pub fn provider(&self) -> Arc<dyn AdviceProvider> {
        Arc::clone(&self.provider)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    /// Suggestion chips, offered only at the start of a conversation
    pub fn quick_actions(&self) -> &'static [&'static str] {
        if self.messages.len() < QUICK_ACTION_LIMIT {
            &QUICK_ACTIONS
        } else {
            &[]
        }
    }

    /// Record the user's message and mark the chat as waiting
    ///
    /// Returns the prompt to send, or `None` for blank input or while a
    /// reply is still pending.
    pub fn begin(&mut self, input: &str) -> Option<String> {
        let prompt = input.trim();
        if prompt.is_empty() || self.typing {
            return None;
        }

        self.messages.push(ChatMessage::new(ChatRole::User, prompt));
        self.typing = true;
        self.metrics.record_coach_request();
        Some(prompt.to_string())
    }

    /// Append the reply for the pending turn
    pub fn complete(&mut self, outcome: Result<String, CoachError>) -> &ChatMessage {
        let text = match outcome {
            Ok(reply) if !reply.trim().is_empty() => reply,
            Ok(_) => {
                tracing::warn!("Coach returned an empty reply");
                self.metrics.record_coach_failure();
                EMPTY_REPLY_FALLBACK.to_string()
            }
            Err(e) => {
                tracing::error!("Coach request failed: {}", e);
                self.metrics.record_coach_failure();
                ERROR_APOLOGY.to_string()
            }
        };

        self.typing = false;
        self.messages.push(ChatMessage::new(ChatRole::Model, text));
        &self.messages[self.messages.len() - 1]
    }

    /// Run one full turn against the provider
    pub async fn send(&mut self, input: &str) -> Option<&ChatMessage> {
        let prompt = self.begin(input)?;
        let outcome = self.provider.advise(&prompt).await;
        Some(self.complete(outcome))
    }
}
