use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("an identity is required")]
    EmptyIdentity,
}

/// Opaque token naming an enrollable subject (an employee number in practice).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    /// Trims surrounding whitespace and rejects empty input.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyIdentity);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for Identity {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::empty("")]
    #[case::spaces("   ")]
    #[case::tabs("\t\n")]
    fn test_parse_rejects_blank(#[case] raw: &str) {
        assert_eq!(Identity::parse(raw), Err(ValidationError::EmptyIdentity));
    }

    #[test]
    fn test_parse_trims() {
        assert_eq!(Identity::parse(" 7 ").unwrap().as_str(), "7");
    }

    #[test]
    fn test_from_integer() {
        assert_eq!(Identity::from(42).to_string(), "42");
    }
}
