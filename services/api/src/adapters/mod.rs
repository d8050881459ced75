pub mod connectivity;
pub mod openai_llm;
pub mod prompt_cache;

pub use connectivity::{FixedConnectivity, TcpConnectivityProbe};
pub use openai_llm::OpenAiGenerationAdapter;
pub use prompt_cache::{MemoryPromptCache, PgPromptCache};
