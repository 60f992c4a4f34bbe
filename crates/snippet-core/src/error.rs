use thiserror::Error;

/// Shown when a failure carries no usable message of its own.
pub const FALLBACK_MESSAGE: &str = "Something went wrong.";

/// Why a single generation request failed.
///
/// The `Display` output is the user-facing message: it is what ends up in the
/// error notification and, comment-formatted, in the output panel.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerateError {
    /// Empty or whitespace-only prompt; rejected before any request is made.
    #[error("Prompt is required.")]
    PromptRequired,

    /// The request never produced an HTTP response.
    #[error("{}", non_empty_or_fallback(.0))]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("{}", non_empty_or_fallback(.message))]
    Provider { status: u16, message: String },

    /// The response envelope had no candidate text.
    #[error("The provider returned an empty response.")]
    EmptyResponse,
}

fn non_empty_or_fallback(message: &str) -> &str {
    if message.trim().is_empty() {
        FALLBACK_MESSAGE
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_message_is_displayed_verbatim() {
        let err = GenerateError::Provider {
            status: 429,
            message: "Quota exceeded".to_string(),
        };
        assert_eq!(err.to_string(), "Quota exceeded");
    }

    #[test]
    fn test_blank_messages_use_fallback() {
        assert_eq!(GenerateError::Transport(String::new()).to_string(), FALLBACK_MESSAGE);
        let err = GenerateError::Provider {
            status: 500,
            message: "  ".to_string(),
        };
        assert_eq!(err.to_string(), FALLBACK_MESSAGE);
    }
}
