use crate::intent::{classify, Intent};

/// Scripted assistant. The only state it keeps is whether it has greeted.
#[derive(Debug, Default, Clone)]
pub struct Assistant {
    greeted: bool,
}

impl Assistant {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn greeted(&self) -> bool {
        self.greeted
    }

    /// Opening line of a conversation.
    pub fn greet(&mut self) -> &'static str {
        self.handle(Intent::Greeting)
    }

    /// Classify `input` and return the reply for its intent.
    pub fn respond(&mut self, input: &str) -> (Intent, &'static str) {
        let intent = classify(input);
        tracing::debug!(?intent, "assistant classified input");
        (intent, self.handle(intent))
    }

    fn handle(&mut self, intent: Intent) -> &'static str {
        match intent {
            Intent::Greeting => self.greeted = true,
            Intent::Goodbye => self.greeted = false,
            _ => {}
        }
        intent.response()
    }
}
