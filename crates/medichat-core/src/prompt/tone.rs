use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Response register requested from the model. Chosen per session.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Professional,
    Friendly,
    Reassuring,
    Neutral,
}

impl Tone {
    pub const ALL: [Tone; 4] = [Tone::Professional, Tone::Friendly, Tone::Reassuring, Tone::Neutral];

    pub fn name(&self) -> &'static str {
        match self {
            Tone::Professional => "professional",
            Tone::Friendly => "friendly",
            Tone::Reassuring => "reassuring",
            Tone::Neutral => "neutral",
        }
    }

    pub fn all_names() -> Vec<&'static str> {
        Self::ALL.iter().map(Tone::name).collect()
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseToneError(String);

impl fmt::Display for ParseToneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown tone '{}'. Options: {}",
            self.0,
            Tone::all_names().join(", ")
        )
    }
}

impl std::error::Error for ParseToneError {}

impl FromStr for Tone {
    type Err = ParseToneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "professional" => Ok(Tone::Professional),
            "friendly" => Ok(Tone::Friendly),
            "reassuring" => Ok(Tone::Reassuring),
            "neutral" => Ok(Tone::Neutral),
            _ => Err(ParseToneError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Friendly".parse::<Tone>().unwrap(), Tone::Friendly);
        assert_eq!(" neutral ".parse::<Tone>().unwrap(), Tone::Neutral);
    }

    #[test]
    fn test_parse_unknown() {
        let err = "sarcastic".parse::<Tone>().unwrap_err();
        assert!(err.to_string().contains("professional, friendly, reassuring, neutral"));
    }

    #[test]
    fn test_display_matches_serde() {
        for tone in Tone::ALL {
            let json = serde_json::to_string(&tone).unwrap();
            assert_eq!(json, format!("\"{tone}\""));
        }
        assert_eq!(Tone::default(), Tone::Professional);
    }
}
