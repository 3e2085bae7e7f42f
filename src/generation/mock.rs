use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{GenerationError, TextGenerator};

/// Mock generator for testing. Returns a configurable response or failure
/// and records every prompt it receives.
pub struct MockTextGenerator {
    response: Result<String, String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockTextGenerator {
    pub fn new(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A generator whose every call fails with an HTTP client error.
    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            ..Self::new("")
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().ok()?.last().cloned()
    }
}

impl TextGenerator for MockTextGenerator {
    fn generate(&self, _model: &str, prompt: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.response
            .clone()
            .map_err(GenerationError::HttpClient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_returns_configured_response() {
        let mock = MockTextGenerator::new("drafted");
        assert_eq!(mock.generate("m", "p").unwrap(), "drafted");
        assert_eq!(mock.call_count(), 1);
        assert_eq!(mock.last_prompt().as_deref(), Some("p"));
    }

    #[test]
    fn failing_mock_errors_and_counts() {
        let mock = MockTextGenerator::failing("quota exceeded");
        let err = mock.generate("m", "p").unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
        assert_eq!(mock.call_count(), 1);
    }
}
