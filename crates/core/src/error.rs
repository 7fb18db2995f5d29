use thiserror::Error;

/// Request validation failures. These abort a run before any task starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("company name must not be empty")]
    EmptySubject,

    #[error("unknown depth '{0}', expected 'standard' or 'detailed'")]
    UnknownDepth(String),

    #[error("unknown focus area '{0}'")]
    UnknownFocusArea(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ValidationError::UnknownDepth("bogus".to_string());
        assert!(error.to_string().contains("bogus"));
        assert!(error.to_string().contains("standard"));
    }
}
