//! One user's authentication flow.
//!
//! Idle → [`AuthSession::start`] → Capturing → [`AuthSession::capture`] →
//! [`AuthSession::authenticate`] → Authenticated, or back to Idle with the
//! capture discarded when liveness is denied. [`AuthSession::start_over`]
//! resets everything, transcript included.

use crate::assistant::Assistant;
use crate::intent::Intent;
use crate::transcript::ChatMessage;
use facegate_core::LivenessPipeline;
use serde::Serialize;
use thiserror::Error;

const CAPTURED_MESSAGE: &str =
    "Great! I've captured your image. You can now proceed with authentication.";
const SUCCESS_MESSAGE: &str = "Congratulations! Your face authentication was successful.";
const FAILURE_MESSAGE: &str = "I'm sorry, but the liveness detection failed. Let's try again. Make sure you're in a well-lit area and looking directly at the camera.";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("no capture in progress; start a new capture first")]
    NotCapturing,
    #[error("please capture an image first")]
    NoCapture,
    #[error("captured image is empty")]
    EmptyCapture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStage {
    Idle,
    Capturing,
    Authenticated,
}

pub struct AuthSession {
    stage: SessionStage,
    captured: Option<Vec<u8>>,
    assistant: Assistant,
    transcript: Vec<ChatMessage>,
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthSession {
    /// New session; the assistant opens with its greeting.
    pub fn new() -> Self {
        let mut assistant = Assistant::new();
        let greeting = assistant.greet();
        Self {
            stage: SessionStage::Idle,
            captured: None,
            assistant,
            transcript: vec![ChatMessage::bot(greeting)],
        }
    }

    pub fn stage(&self) -> SessionStage {
        self.stage
    }

    pub fn is_authenticated(&self) -> bool {
        self.stage == SessionStage::Authenticated
    }

    pub fn has_capture(&self) -> bool {
        self.captured.is_some()
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn assistant(&self) -> &Assistant {
        &self.assistant
    }

    /// Open the camera. Any earlier capture is dropped.
    pub fn start(&mut self) {
        self.stage = SessionStage::Capturing;
        self.captured = None;
    }

    /// Keep `image` (encoded bytes) for the next authentication attempt.
    pub fn capture(&mut self, image: Vec<u8>) -> Result<(), SessionError> {
        if self.stage != SessionStage::Capturing {
            return Err(SessionError::NotCapturing);
        }
        if image.is_empty() {
            return Err(SessionError::EmptyCapture);
        }
        tracing::debug!(bytes = image.len(), "image captured");
        self.captured = Some(image);
        self.transcript.push(ChatMessage::bot(CAPTURED_MESSAGE));
        Ok(())
    }

    /// Run liveness on the captured image.
    ///
    /// Only valid while capturing. On success the session is authenticated.
    /// On denial the capture is discarded and the session returns to idle so
    /// the user can retry.
    pub async fn authenticate(&mut self, pipeline: &LivenessPipeline) -> Result<bool, SessionError> {
        if self.stage != SessionStage::Capturing {
            return Err(SessionError::NotCapturing);
        }
        let image = self.captured.as_deref().ok_or(SessionError::NoCapture)?;
        let live = pipeline.authenticate_liveness(image).await;

        if live {
            self.stage = SessionStage::Authenticated;
            self.transcript.push(ChatMessage::bot(SUCCESS_MESSAGE));
        } else {
            self.stage = SessionStage::Idle;
            self.captured = None;
            self.transcript.push(ChatMessage::bot(FAILURE_MESSAGE));
        }
        tracing::info!(live, "authentication attempt finished");
        Ok(live)
    }

    /// Handle a chat line from the user. Blank input is ignored.
    pub fn submit(&mut self, input: &str) -> Option<(Intent, &'static str)> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        self.transcript.push(ChatMessage::user(input));
        let (intent, reply) = self.assistant.respond(input);
        self.transcript.push(ChatMessage::bot(reply));
        Some((intent, reply))
    }

    pub fn start_over(&mut self) {
        self.stage = SessionStage::Idle;
        self.captured = None;
        self.transcript.clear();
    }
}
