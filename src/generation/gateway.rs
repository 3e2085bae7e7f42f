//! The single failure-isolation boundary around text generation.
//!
//! Each operation formats an instruction, makes one request and turns every
//! failure into a fixed user-facing sentence. Nothing here retries, streams
//! or propagates an error to the caller.

use std::sync::Arc;

use serde::Serialize;

use super::prompt::{build_email_prompt, build_soap_prompt};
use super::{GenerationError, TextGenerator};

pub const NOTE_EMPTY_MESSAGE: &str = "Could not generate note.";
pub const NOTE_ERROR_MESSAGE: &str =
    "Error: Unable to connect to AI service. Please check your API key.";
pub const EMAIL_EMPTY_MESSAGE: &str = "Could not generate email.";
pub const EMAIL_ERROR_MESSAGE: &str = "Error generating email.";

/// Which drafting operation a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    SoapNote,
    PatientEmail,
}

impl GenerationKind {
    /// Shown when the generator answers with no text.
    pub fn empty_message(&self) -> &'static str {
        match self {
            Self::SoapNote => NOTE_EMPTY_MESSAGE,
            Self::PatientEmail => EMAIL_EMPTY_MESSAGE,
        }
    }

    /// Shown for any failure, including a missing credential.
    pub fn error_message(&self) -> &'static str {
        match self {
            Self::SoapNote => NOTE_ERROR_MESSAGE,
            Self::PatientEmail => EMAIL_ERROR_MESSAGE,
        }
    }

    /// Collapse a raw generator result into text or a fixed message.
    pub fn resolve(&self, result: Result<String, GenerationError>) -> Result<String, String> {
        match result {
            Ok(text) if text.is_empty() => Err(self.empty_message().to_string()),
            Ok(text) => Ok(text),
            Err(e) => {
                tracing::warn!(kind = ?self, "Text generation failed: {e}");
                Err(self.error_message().to_string())
            }
        }
    }
}

impl std::fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SoapNote => write!(f, "SOAP note refinement"),
            Self::PatientEmail => write!(f, "Patient email draft"),
        }
    }
}

/// A fully formatted request, detached from any screen state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub kind: GenerationKind,
    pub prompt: String,
}

impl GenerationRequest {
    pub fn soap_note(raw_notes: &str) -> Self {
        Self {
            kind: GenerationKind::SoapNote,
            prompt: build_soap_prompt(raw_notes),
        }
    }

    pub fn patient_email(patient_name: &str, topic: &str, key_details: &str) -> Self {
        Self {
            kind: GenerationKind::PatientEmail,
            prompt: build_email_prompt(patient_name, topic, key_details),
        }
    }
}

/// Drafting operations over any `TextGenerator`.
pub struct Gateway<G> {
    generator: G,
    model: String,
}

impl<G: TextGenerator> Gateway<G> {
    pub fn new(generator: G, model: impl Into<String>) -> Self {
        Self {
            generator,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Run one request: generated text, or the kind's fixed message.
    pub fn execute(&self, request: &GenerationRequest) -> Result<String, String> {
        tracing::debug!(kind = %request.kind, model = %self.model, "Sending generation request");
        request
            .kind
            .resolve(self.generator.generate(&self.model, &request.prompt))
    }

    pub fn try_refine_note_to_soap(&self, raw_notes: &str) -> Result<String, String> {
        self.execute(&GenerationRequest::soap_note(raw_notes))
    }

    pub fn try_generate_patient_email(
        &self,
        patient_name: &str,
        topic: &str,
        key_details: &str,
    ) -> Result<String, String> {
        self.execute(&GenerationRequest::patient_email(patient_name, topic, key_details))
    }

    /// SOAP-formatted text, or a fallback sentence. Never fails.
    pub fn refine_note_to_soap(&self, raw_notes: &str) -> String {
        self.try_refine_note_to_soap(raw_notes)
            .unwrap_or_else(|message| message)
    }

    /// Drafted email, or a fallback sentence. Never fails.
    pub fn generate_patient_email(&self, patient_name: &str, topic: &str, key_details: &str) -> String {
        self.try_generate_patient_email(patient_name, topic, key_details)
            .unwrap_or_else(|message| message)
    }
}

impl<G> Gateway<G>
where
    G: TextGenerator + Send + Sync + 'static,
{
    /// `execute` on tokio's blocking pool. A panicked or cancelled task
    /// collapses to the kind's error message like any other failure.
    pub async fn execute_async(self: Arc<Self>, request: GenerationRequest) -> Result<String, String> {
        let kind = request.kind;
        match tokio::task::spawn_blocking(move || self.execute(&request)).await {
            Ok(outcome) => outcome,
            Err(e) => kind.resolve(Err(GenerationError::Task(e.to_string()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::MockTextGenerator;

    fn gateway(mock: MockTextGenerator) -> Gateway<MockTextGenerator> {
        Gateway::new(mock, "gemini-2.5-flash")
    }

    #[test]
    fn returns_generated_text_verbatim() {
        let gw = gateway(MockTextGenerator::new("S: better\nO: calm\nA: stable\nP: continue"));
        assert_eq!(
            gw.refine_note_to_soap("sleeping better"),
            "S: better\nO: calm\nA: stable\nP: continue"
        );
        assert!(gw.generator().last_prompt().unwrap().contains("sleeping better"));
    }

    #[test]
    fn empty_note_response_uses_fixed_message() {
        let gw = gateway(MockTextGenerator::new(""));
        assert_eq!(gw.refine_note_to_soap("x"), "Could not generate note.");
        assert_eq!(gw.try_refine_note_to_soap("x"), Err(NOTE_EMPTY_MESSAGE.to_string()));
    }

    #[test]
    fn note_failure_yields_exactly_the_fallback() {
        let gw = gateway(MockTextGenerator::failing("503 unavailable"));
        assert_eq!(
            gw.refine_note_to_soap("x"),
            "Error: Unable to connect to AI service. Please check your API key."
        );
    }

    #[test]
    fn email_fallbacks() {
        let empty = gateway(MockTextGenerator::new(""));
        assert_eq!(empty.generate_patient_email("A", "B", "C"), "Could not generate email.");

        let failing = gateway(MockTextGenerator::failing("boom"));
        assert_eq!(failing.generate_patient_email("A", "B", "C"), "Error generating email.");
    }

    #[test]
    fn email_prompt_reaches_generator() {
        let gw = gateway(MockTextGenerator::new("Dear Michael, ..."));
        let email = gw.generate_patient_email("Michael Chen", "Appointment Reminder", "Tuesday 3pm");
        assert_eq!(email, "Dear Michael, ...");
        let prompt = gw.generator().last_prompt().unwrap();
        assert!(prompt.contains("Michael Chen"));
        assert!(prompt.contains("Appointment Reminder"));
        assert!(prompt.contains("Tuesday 3pm"));
    }

    #[test]
    fn missing_credential_is_collapsed() {
        let client = crate::generation::GeminiClient::new("http://127.0.0.1:1", None, 1).unwrap();
        let gw = Gateway::new(client, "gemini-2.5-flash");
        assert_eq!(gw.refine_note_to_soap("x"), NOTE_ERROR_MESSAGE);
        assert_eq!(gw.generate_patient_email("a", "b", "c"), EMAIL_ERROR_MESSAGE);
    }

    #[test]
    fn single_shot_no_retry() {
        let gw = gateway(MockTextGenerator::failing("timeout"));
        let _ = gw.refine_note_to_soap("x");
        assert_eq!(gw.generator().call_count(), 1);
    }

    #[tokio::test]
    async fn async_execution_matches_sync() {
        let gw = Arc::new(gateway(MockTextGenerator::new("async draft")));
        let outcome = gw
            .clone()
            .execute_async(GenerationRequest::soap_note("raw"))
            .await;
        assert_eq!(outcome, Ok("async draft".to_string()));
        assert_eq!(gw.generator().call_count(), 1);
    }

    #[tokio::test]
    async fn async_failure_is_collapsed() {
        let gw = Arc::new(gateway(MockTextGenerator::failing("down")));
        let outcome = gw
            .execute_async(GenerationRequest::patient_email("a", "b", "c"))
            .await;
        assert_eq!(outcome, Err(EMAIL_ERROR_MESSAGE.to_string()));
    }

    #[test]
    fn kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&GenerationKind::SoapNote).unwrap(),
            "\"soap_note\""
        );
    }
}
