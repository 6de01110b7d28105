use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{require_non_blank, ModelError};

/// Opaque authenticated caller reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    pub fn new(text: impl Into<String>) -> Result<Self, ModelError> {
        let text = text.into();
        require_non_blank("principal", &text)?;
        Ok(Self(text.trim().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_trims_and_rejects_blank() {
        assert_eq!(Principal::new(" owner-a ").unwrap().as_str(), "owner-a");
        assert!(matches!(Principal::new("   "), Err(ModelError::Validation(_))));
    }

    #[test]
    fn principal_serializes_as_plain_string() {
        let p = Principal::new("owner-a").unwrap();
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"owner-a\"");
    }
}
