//! crates/journal_core/src/ports.rs
//!
//! Defines the service contracts (traits) the prompt engine depends on.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the generative backend, the cache store and the network probe.

use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for storage-like port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Everything that can go wrong while asking the backend for text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The network could not be reached at all.
    #[error("No network connection")]
    Unreachable,
    #[error("Transport error: {0}")]
    Transport(String),
    /// A non-success answer. `status` is the HTTP code when the transport exposes one.
    #[error("Backend rejected the request: {body}")]
    Status { status: Option<u16>, body: String },
    /// The backend answered, but with no usable text.
    #[error("Backend returned an empty response")]
    EmptyResponse,
    #[error("Failed to decode backend response: {0}")]
    Decode(String),
}

//=========================================================================================
// Generation Request / Response
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// A text-completion request: model, ordered role-tagged messages and a length ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationResponse {
    /// Candidate completions in backend order. Only the first is ever used.
    pub candidates: Vec<String>,
}

impl GenerationResponse {
    /// The first candidate with surrounding whitespace removed, or `EmptyResponse`.
    pub fn first_text(&self) -> Result<String, BackendError> {
        self.candidates
            .first()
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(BackendError::EmptyResponse)
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait TextGenerationBackend: Send + Sync {
    /// Submits a single completion request. Implementations must not retry.
    async fn generate(&self, request: GenerationRequest)
        -> Result<GenerationResponse, BackendError>;
}

#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// Whether the network is reachable right now. The engine treats this as authoritative.
    async fn is_reachable(&self) -> bool;
}

#[async_trait]
pub trait KeyValueCache: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    async fn put(&self, key: &str, value: &str) -> PortResult<()>;

    /// Drops every entry.
    async fn clear(&self) -> PortResult<()>;
}
