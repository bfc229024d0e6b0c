use crate::markup::SourceSpan;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct SkinMenuError {
    pub code: String,
    pub message: String,
    pub span: Option<SourceSpan>,
}

impl SkinMenuError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(
        code: impl Into<String>,
        message: impl Into<String>,
        span: SourceSpan,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            span: Some(span),
        }
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn display_joins_code_and_message() {
        let error = SkinMenuError::new("CONDITION_SYNTAX", "Unbalanced brackets.");
        assert_eq!(error.to_string(), "CONDITION_SYNTAX: Unbalanced brackets.");
        assert!(error.span.is_none());
    }

    #[test]
    fn with_span_keeps_location() {
        let error = SkinMenuError::with_span("XML_MISSING_ATTR", "x", SourceSpan::synthetic());
        assert_eq!(error.span, Some(SourceSpan::synthetic()));
    }
}
