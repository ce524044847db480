//! facegate-assistant — The conversational front of face authentication.
//!
//! A keyword matcher maps free text to a fixed set of intents with canned
//! replies, and [`AuthSession`] carries one user's capture → authenticate
//! flow together with the chat transcript.

pub mod assistant;
pub mod intent;
pub mod session;
pub mod transcript;

pub use assistant::Assistant;
pub use intent::{classify, Intent};
pub use session::{AuthSession, SessionError, SessionStage};
pub use transcript::{ChatMessage, Sender};
