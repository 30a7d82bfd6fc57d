//! Field validation shared by model constructors and repository writes.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty after trim.
    Blank { field: &'static str },
    /// Text field exceeds its character limit.
    TooLong {
        field: &'static str,
        max_chars: usize,
        actual_chars: usize,
    },
    /// Numeric field is NaN or infinite.
    NonFinite { field: &'static str },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank { field } => write!(f, "`{field}` must not be blank"),
            Self::TooLong {
                field,
                max_chars,
                actual_chars,
            } => write!(
                f,
                "`{field}` is {actual_chars} chars, limit is {max_chars}"
            ),
            Self::NonFinite { field } => write!(f, "`{field}` must be a finite number"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Blank { field });
    }
    limit_text(field, value, max_chars)
}

pub(crate) fn limit_optional_text(
    field: &'static str,
    value: Option<&str>,
    max_chars: usize,
) -> Result<(), ValidationError> {
    match value {
        Some(value) => limit_text(field, value, max_chars),
        None => Ok(()),
    }
}

pub(crate) fn require_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFinite { field })
    }
}

fn limit_text(field: &'static str, value: &str, max_chars: usize) -> Result<(), ValidationError> {
    let actual_chars = value.chars().count();
    if actual_chars > max_chars {
        return Err(ValidationError::TooLong {
            field,
            max_chars,
            actual_chars,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{limit_optional_text, require_finite, require_text, ValidationError};

    #[test]
    fn require_text_rejects_whitespace_only() {
        assert_eq!(
            require_text("title", "  \n", 10),
            Err(ValidationError::Blank { field: "title" })
        );
    }

    #[test]
    fn limits_count_chars_not_bytes() {
        assert!(require_text("title", "知识点网络", 5).is_ok());
        assert!(matches!(
            limit_optional_text("page", Some("123456"), 5),
            Err(ValidationError::TooLong {
                actual_chars: 6,
                ..
            })
        ));
    }

    #[test]
    fn require_finite_rejects_nan() {
        assert!(require_finite("x", f64::NAN).is_err());
        assert!(require_finite("y", -12.5).is_ok());
    }
}
