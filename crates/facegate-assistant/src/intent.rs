//! Keyword intent classification.
//!
//! Input is lower-cased and scanned against [`INTENT_KEYWORDS`] in order;
//! the first intent with any keyword contained in the input wins. Order
//! matters: "start" is both a greeting and a start-process keyword, and the
//! greeting comes first.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Intent {
    Greeting,
    Help,
    FaceAuth,
    StartProcess,
    Troubleshoot,
    ModelInfo,
    Privacy,
    Requirements,
    Goodbye,
    Unknown,
}

/// Scan order and keywords per intent. Matching is plain substring search.
pub const INTENT_KEYWORDS: &[(Intent, &[&str])] = &[
    (Intent::Greeting, &["hello", "hi", "hey", "start"]),
    (Intent::Help, &["help", "support", "assistance"]),
    (Intent::FaceAuth, &["face", "authentication", "liveness"]),
    (Intent::StartProcess, &["start", "begin", "initiate"]),
    (Intent::Troubleshoot, &["problem", "issue", "not working"]),
    (Intent::ModelInfo, &["model", "size", "performance"]),
    (Intent::Privacy, &["privacy", "data", "security"]),
    (Intent::Requirements, &["requirements", "need", "browser"]),
    (Intent::Goodbye, &["bye", "goodbye", "exit"]),
];

/// Classify free text into an [`Intent`].
pub fn classify(input: &str) -> Intent {
    let lowered = input.to_lowercase();
    INTENT_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::Unknown)
}

impl Intent {
    /// Canned reply for this intent.
    pub fn response(self) -> &'static str {
        match self {
            Intent::Greeting => "Welcome to the Face Authentication Assistant! I can help you with our on-device face authentication platform. How can I assist you today?",
            Intent::Help => "I can help you with:\n1. Starting the face authentication process\n2. Troubleshooting issues\n3. Information about our liveness detection model\n4. Privacy and security concerns\n5. System requirements\nWhat would you like to know more about?",
            Intent::FaceAuth => "Our face authentication platform uses liveness detection to ensure security. It runs entirely on your device, and the liveness check completes in well under a second. Would you like to start the authentication process or learn more about how it works?",
            Intent::StartProcess => "Great! To start the face authentication process:\n1. Make sure a camera is connected\n2. Allow camera access when prompted\n3. Position your face within the frame\n4. Capture an image\n5. Wait for the liveness detection to complete\nAre you ready to begin?",
            Intent::Troubleshoot => "I'm sorry you're experiencing issues. Common problems include:\n1. Poor lighting\n2. Incorrect camera positioning\n3. A missing or damaged model file\n4. An unsupported image format\nCan you describe the specific issue you're facing?",
            Intent::ModelInfo => "Our liveness detection model:\n- Format: ONNX, executed locally with ONNX Runtime\n- Input: a single 224x224 RGB image\n- Speed: completes liveness detection within 500ms on a typical CPU\nDo you have any specific questions about the model?",
            Intent::Privacy => "We take your privacy very seriously. Our face authentication:\n- Processes all data locally on your device\n- Doesn't store facial images or data\n- Discards each captured image once the check completes\nWould you like more details on our privacy measures?",
            Intent::Requirements => "To use our face authentication, you need:\n- A device with a camera\n- The liveness model installed in the model directory\n- Adequate lighting for facial recognition\nIs your system meeting these requirements?",
            Intent::Goodbye => "Thank you for using the Face Authentication Assistant. If you need any further help, don't hesitate to ask. Goodbye!",
            Intent::Unknown => "I'm not sure I understand. Could you rephrase your question or choose from these options: start authentication, troubleshooting, model information, privacy, or system requirements?",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_basic_intents() {
        assert_eq!(classify("Hello there"), Intent::Greeting);
        assert_eq!(classify("I need SUPPORT"), Intent::Help);
        assert_eq!(classify("how does liveness work"), Intent::FaceAuth);
        assert_eq!(classify("let's begin"), Intent::StartProcess);
        assert_eq!(classify("camera not working"), Intent::Troubleshoot);
        assert_eq!(classify("what's the model size"), Intent::ModelInfo);
        assert_eq!(classify("privacy please"), Intent::Privacy);
        assert_eq!(classify("requirements?"), Intent::Requirements);
        assert_eq!(classify("bye"), Intent::Goodbye);
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(classify("qwerty"), Intent::Unknown);
        assert_eq!(classify(""), Intent::Unknown);
    }

    #[test]
    fn test_table_order_wins() {
        // "start" is listed under greeting before start-process.
        assert_eq!(classify("start"), Intent::Greeting);
        // "face" (face-auth) outranks "begin" (start-process).
        assert_eq!(classify("begin face check"), Intent::FaceAuth);
    }

    #[test]
    fn test_substring_matching_is_naive() {
        // "this" contains "hi".
        assert_eq!(classify("this"), Intent::Greeting);
        // "goodbye" contains "bye" but nothing earlier.
        assert_eq!(classify("GOODBYE"), Intent::Goodbye);
    }

    #[test]
    fn test_every_intent_has_a_response() {
        for (intent, _) in INTENT_KEYWORDS {
            assert!(!intent.response().is_empty());
        }
        assert!(Intent::Unknown.response().contains("rephrase"));
    }
}
