use thiserror::Error;

/// Minimum length of an insight or comment body, in characters
pub const MIN_TEXT_LEN: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("text cannot be empty")]
    Empty,
    #[error("minimum 3 characters")]
    TooShort,
}

/// Validate the body of an insight or comment. Callers run this before any
/// repository call; the repositories themselves never validate.
pub fn validate_insight_text(text: &str) -> Result<(), ValidationError> {
    if text.is_empty() {
        return Err(ValidationError::Empty);
    }
    if text.chars().count() < MIN_TEXT_LEN {
        return Err(ValidationError::TooShort);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_text_rejected() {
        assert_eq!(validate_insight_text(""), Err(ValidationError::Empty));
    }

    #[test]
    fn test_short_text_rejected() {
        assert_eq!(validate_insight_text("ab"), Err(ValidationError::TooShort));
    }

    #[test]
    fn test_minimum_length_accepted() {
        assert_eq!(validate_insight_text("abc"), Ok(()));
    }

    #[test]
    fn test_multibyte_characters_counted_as_one() {
        // Three characters, more than three bytes
        assert_eq!(validate_insight_text("héé"), Ok(()));
    }

    proptest! {
        #[test]
        fn text_with_three_or_more_chars_is_valid(s in ".{3,80}") {
            prop_assert_eq!(validate_insight_text(&s), Ok(()));
        }
    }
}
