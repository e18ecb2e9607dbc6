use ringsmith::core::selection::AtomSelection;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid boolean '{0}'. Expected one of yes/true/t/1 or no/false/f/0.")]
    InvalidBool(String),

    #[error("{0}")]
    InvalidSelection(String),
}

/// Parses a permissive boolean flag value, case-insensitively.
pub fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" | "t" | "1" => Ok(true),
        "no" | "false" | "f" | "0" => Ok(false),
        _ => Err(ParseError::InvalidBool(value.to_string())),
    }
}

pub fn parse_selection(value: &str) -> Result<AtomSelection, ParseError> {
    value
        .parse::<AtomSelection>()
        .map_err(|e| ParseError::InvalidSelection(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_accepts_all_spellings() {
        for value in ["yes", "true", "t", "1", "YES", "True", " T "] {
            assert_eq!(parse_bool(value), Ok(true), "value {value:?}");
        }
        for value in ["no", "false", "f", "0", "No", "FALSE"] {
            assert_eq!(parse_bool(value), Ok(false), "value {value:?}");
        }
    }

    #[test]
    fn parse_bool_rejects_other_values() {
        assert_eq!(
            parse_bool("maybe"),
            Err(ParseError::InvalidBool("maybe".to_string()))
        );
        assert!(parse_bool("").is_err());
    }

    #[test]
    fn parse_selection_maps_keywords() {
        assert_eq!(parse_selection("ca"), Ok(AtomSelection::AlphaCarbons));
        assert_eq!(parse_selection("chain C"), Ok(AtomSelection::Chain('C')));
        assert!(matches!(
            parse_selection("residue 5"),
            Err(ParseError::InvalidSelection(_))
        ));
    }
}
