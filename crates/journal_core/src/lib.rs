pub mod context;
pub mod domain;
pub mod engine;
pub mod fallback;
pub mod milestones;
pub mod ports;
pub mod progression;

pub use domain::{Goal, InterestCategory, JournalSession, SessionKind, TimeOfDay, UserInterest};
pub use engine::{CacheKey, EngineConfig, EngineStatus, PromptEngine, PromptError};
pub use ports::{
    BackendError, ChatMessage, ConnectivityProbe, GenerationRequest, GenerationResponse,
    KeyValueCache, MessageRole, PortError, PortResult, TextGenerationBackend,
};
