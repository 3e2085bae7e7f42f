pub mod gateway;
pub mod gemini;
pub mod mock;
pub mod prompt;

pub use gateway::*;
pub use gemini::*;
pub use mock::*;
pub use prompt::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("API key is missing")]
    MissingApiKey,

    #[error("Could not reach the generation service at {0}")]
    Connection(String),

    #[error("Generation service returned error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Generation task failed: {0}")]
    Task(String),
}

/// Text-generation backend (allows mocking).
pub trait TextGenerator {
    /// Send one prompt to `model` and return the generated text.
    ///
    /// An empty string is a valid answer; callers decide what it means.
    fn generate(&self, model: &str, prompt: &str) -> Result<String, GenerationError>;
}
