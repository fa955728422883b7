use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    #[default]
    Sha256,
    Sha512,
}

impl DigestAlgorithm {
    /// Tag used in sidecar record names, e.g. `a.sha256.txt`.
    pub fn tag(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha512 => "sha512",
        }
    }

    /// Length of the lowercase hex rendering.
    pub fn hex_len(&self) -> usize {
        match self {
            DigestAlgorithm::Sha256 => 64,
            DigestAlgorithm::Sha512 => 128,
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(DigestAlgorithm::Sha256),
            "sha512" | "sha-512" => Ok(DigestAlgorithm::Sha512),
            other => Err(format!("Unsupported digest algorithm: '{}'. Expected sha256 or sha512", other)),
        }
    }
}

/// Hex digest as stored in a sidecar record.
///
/// Values read back from records are kept as opaque tokens: a malformed record
/// simply never compares equal to a computed digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DigestValue(String);

impl DigestValue {
    pub(crate) fn from_hex(hex: String) -> Self {
        Self(hex)
    }

    pub fn from_token(token: &str) -> Self {
        Self(token.to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, other: &DigestValue) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }

    pub fn short(&self) -> &str {
        let end = self.0.len().min(12);
        self.0.get(..end).unwrap_or(&self.0)
    }
}

impl fmt::Display for DigestValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_algorithm() {
        assert_eq!("sha256".parse::<DigestAlgorithm>().unwrap(), DigestAlgorithm::Sha256);
        assert_eq!("SHA-512".parse::<DigestAlgorithm>().unwrap(), DigestAlgorithm::Sha512);
        let err = "md5".parse::<DigestAlgorithm>().unwrap_err();
        assert!(err.contains("Unsupported digest algorithm"));
    }

    #[test]
    fn test_matches_ignores_case() {
        let lower = DigestValue::from_token("dead");
        let upper = DigestValue("DEAD".to_string());
        assert!(lower.matches(&upper));
        assert!(!lower.matches(&DigestValue::from_token("beef")));
    }

    #[test]
    fn test_from_token_lowercases() {
        assert_eq!(DigestValue::from_token("ABCdef").as_str(), "abcdef");
    }
}
