//! Small value types shared by the tables: sides, outcomes and result marks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MatchError;

/// One of the two competing rosters in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Attacker,
    Defender,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Attacker, Side::Defender];

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Attacker => "attacker",
            Side::Defender => "defender",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "attacker" => Ok(Side::Attacker),
            "defender" => Ok(Side::Defender),
            _ => Err(MatchError::UnknownSide(s.to_string())),
        }
    }
}

/// A recorded battle outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Win => "Win",
            Outcome::Loss => "Loss",
        }
    }

    pub fn from_stored(s: &str) -> Option<Outcome> {
        match s {
            "Win" => Some(Outcome::Win),
            "Loss" => Some(Outcome::Loss),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a result button sends: a real outcome, or the `remove` sentinel used
/// when a slot is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultMark {
    Outcome(Outcome),
    Remove,
}

impl FromStr for ResultMark {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "remove" => Ok(ResultMark::Remove),
            other => Outcome::from_stored(other)
                .map(ResultMark::Outcome)
                .ok_or_else(|| MatchError::UnknownResult(s.to_string())),
        }
    }
}

impl From<Outcome> for ResultMark {
    fn from(outcome: Outcome) -> Self {
        ResultMark::Outcome(outcome)
    }
}

/// Presentation classification of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultClass {
    Win,
    Loss,
    Unset,
}

impl ResultClass {
    /// Tailwind classes for the slot card.
    pub fn css(self) -> &'static str {
        match self {
            ResultClass::Win => "bg-green-100 border-green-500",
            ResultClass::Loss => "bg-red-100 border-red-500",
            ResultClass::Unset => "",
        }
    }
}

impl From<Option<Outcome>> for ResultClass {
    fn from(outcome: Option<Outcome>) -> Self {
        match outcome {
            Some(Outcome::Win) => ResultClass::Win,
            Some(Outcome::Loss) => ResultClass::Loss,
            None => ResultClass::Unset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_parses_case_insensitively() {
        assert_eq!("Attacker".parse::<Side>().unwrap(), Side::Attacker);
        assert_eq!(" defender ".parse::<Side>().unwrap(), Side::Defender);
        assert!("neutral".parse::<Side>().is_err());
    }

    #[test]
    fn side_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Side::Defender).unwrap(), r#""defender""#);
    }

    #[test]
    fn result_mark_parses_remove_sentinel() {
        assert_eq!("remove".parse::<ResultMark>().unwrap(), ResultMark::Remove);
        assert_eq!(
            "Loss".parse::<ResultMark>().unwrap(),
            ResultMark::Outcome(Outcome::Loss)
        );
        assert!("Draw".parse::<ResultMark>().is_err());
    }

    #[test]
    fn classification_css() {
        assert_eq!(ResultClass::from(Some(Outcome::Win)).css(), "bg-green-100 border-green-500");
        assert_eq!(ResultClass::from(None).css(), "");
    }
}
