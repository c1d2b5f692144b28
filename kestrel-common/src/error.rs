//! Error handling for the Kestrel compiler
//!
//! Every phase has its own error enum close to the code that raises it.
//! They all funnel into [`CompilerError`], which only keeps the distinction
//! a driving tool cares about: did the user write something we reject, or did
//! the compiler itself break an invariant.

use thiserror::Error;

/// Top-level error reported to whoever drives a compilation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompilerError {
    #[error("Semantic error: {message}")]
    Semantic { message: String },

    #[error("Internal compiler error: {message}")]
    Internal { message: String },
}

impl CompilerError {
    /// Create a semantic (user-facing) error
    pub fn semantic_error(message: impl Into<String>) -> Self {
        CompilerError::Semantic { message: message.into() }
    }

    /// Create an internal compiler error
    pub fn internal_error(message: impl Into<String>) -> Self {
        CompilerError::Internal { message: message.into() }
    }

    /// True when the error points at a compiler bug rather than user input
    pub fn is_internal(&self) -> bool {
        matches!(self, CompilerError::Internal { .. })
    }
}

/// Convert from String (for simple error cases)
impl From<String> for CompilerError {
    fn from(message: String) -> Self {
        CompilerError::Internal { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let user = CompilerError::semantic_error("unknown struct type 'Node'");
        let bug = CompilerError::internal_error("frame size 24 is not 16-byte aligned");

        assert!(!user.is_internal());
        assert!(bug.is_internal());
        assert_eq!(user.to_string(), "Semantic error: unknown struct type 'Node'");
        assert_eq!(bug.to_string(), "Internal compiler error: frame size 24 is not 16-byte aligned");
    }

    #[test]
    fn test_from_string_is_internal() {
        let err: CompilerError = "register pool exhausted".to_string().into();
        assert!(err.is_internal());
    }
}
