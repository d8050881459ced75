//! services/api/src/adapters/openai_llm.rs
//!
//! This module contains the adapter for the prompt-generating LLM.
//! It implements the `TextGenerationBackend` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use journal_core::ports::{
    BackendError, ChatMessage, GenerationRequest, GenerationResponse, MessageRole,
    TextGenerationBackend,
};
use regex::Regex;
use std::sync::OnceLock;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `TextGenerationBackend` using an OpenAI-compatible chat API.
#[derive(Clone)]
pub struct OpenAiGenerationAdapter {
    client: Client<OpenAIConfig>,
}

impl OpenAiGenerationAdapter {
    /// Creates a new `OpenAiGenerationAdapter`.
    pub fn new(client: Client<OpenAIConfig>) -> Self {
        Self { client }
    }

    /// Models tend to wrap a one-line answer in quotes or prefix it with a label.
    fn clean_completion(text: &str) -> String {
        static LABEL: OnceLock<Regex> = OnceLock::new();
        let label = LABEL.get_or_init(|| {
            Regex::new(r"(?i)^\s*(prompt|question|visualization)\s*:\s*")
                .expect("completion label pattern is valid")
        });
        let without_label = label.replace(text.trim(), "");
        without_label
            .trim()
            .trim_matches(|c| c == '"' || c == '\u{201c}' || c == '\u{201d}')
            .trim()
            .to_string()
    }
}

fn to_openai_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage, BackendError> {
    let content = message.content.clone();
    let built: Result<ChatCompletionRequestMessage, OpenAIError> = match message.role {
        MessageRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()
            .map(Into::into),
        MessageRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()
            .map(Into::into),
        MessageRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()
            .map(Into::into),
    };
    built.map_err(|e| BackendError::Transport(format!("Failed to build request: {}", e)))
}

/// Sorts library failures into the engine's taxonomy.
fn classify(err: OpenAIError) -> BackendError {
    match err {
        OpenAIError::Reqwest(e) if e.is_connect() || e.is_timeout() => BackendError::Unreachable,
        OpenAIError::Reqwest(e) => match e.status() {
            Some(status) => BackendError::Status {
                status: Some(status.as_u16()),
                body: e.to_string(),
            },
            None => BackendError::Transport(e.to_string()),
        },
        OpenAIError::ApiError(e) => BackendError::Status {
            status: None,
            body: e.to_string(),
        },
        e @ OpenAIError::JSONDeserialize(..) => BackendError::Decode(e.to_string()),
        other => BackendError::Transport(other.to_string()),
    }
}

//=========================================================================================
// `TextGenerationBackend` Trait Implementation
//=========================================================================================

#[async_trait]
impl TextGenerationBackend for OpenAiGenerationAdapter {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, BackendError> {
        let messages = request
            .messages
            .iter()
            .map(to_openai_message)
            .collect::<Result<Vec<_>, _>>()?;

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&request.model)
            .messages(messages)
            .max_tokens(request.max_tokens)
            .temperature(0.8)
            .n(1)
            .build()
            .map_err(|e| BackendError::Transport(format!("Failed to build request: {}", e)))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(classify)?;

        let candidates = response
            .choices
            .into_iter()
            .filter_map(|choice| choice.message.content)
            .map(|content| Self::clean_completion(&content))
            .collect();

        Ok(GenerationResponse { candidates })
    }
}
