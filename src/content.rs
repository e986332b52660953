//! The kind of structure an uploaded image contains.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Caller-declared content of the image.
///
/// Drives both the instruction prompt and the fallback extraction pattern
/// used when the model forgets to fence its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Table,
    Equation,
    Text,
}

impl ContentType {
    /// Every accepted value, in documentation order.
    pub const ALL: [ContentType; 3] = [ContentType::Table, ContentType::Equation, ContentType::Text];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Table => "table",
            ContentType::Equation => "equation",
            ContentType::Text => "text",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownContentType(pub String);

impl fmt::Display for UnknownContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown content type '{}' (expected table, equation or text)", self.0)
    }
}

impl std::error::Error for UnknownContentType {}

impl FromStr for ContentType {
    type Err = UnknownContentType;

    /// Case-insensitive; surrounding whitespace is not tolerated.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(ContentType::Table),
            "equation" => Ok(ContentType::Equation),
            "text" => Ok(ContentType::Text),
            _ => Err(UnknownContentType(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("TABLE".parse::<ContentType>(), Ok(ContentType::Table));
        assert_eq!("Equation".parse::<ContentType>(), Ok(ContentType::Equation));
        assert_eq!("text".parse::<ContentType>(), Ok(ContentType::Text));
    }

    #[test]
    fn parse_rejects_unknown_and_empty() {
        assert!("figure".parse::<ContentType>().is_err());
        assert!("".parse::<ContentType>().is_err());
        assert!(" table".parse::<ContentType>().is_err());
    }

    #[test]
    fn display_round_trips_through_serde() {
        for ct in ContentType::ALL {
            let json = serde_json::to_string(&ct).unwrap();
            assert_eq!(json, format!("\"{ct}\""));
        }
    }
}
