// ============================================================
// Layer 3 - Classification Axis
// ============================================================
// The two independent tasks the pipeline solves. Each axis owns
// a fixed, ordered class list; class codes are positions in it.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::config::{INTENT_CLASSES, SENTIMENT_CLASSES};
use crate::domain::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Sentiment,
    Intent,
}

impl Axis {
    pub const ALL: [Axis; 2] = [Axis::Sentiment, Axis::Intent];

    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::Sentiment => "sentiment",
            Axis::Intent    => "intent",
        }
    }

    /// The fixed class list label encoders are fitted against.
    pub fn classes(&self) -> &'static [&'static str] {
        match self {
            Axis::Sentiment => SENTIMENT_CLASSES,
            Axis::Intent    => INTENT_CLASSES,
        }
    }

    /// Sentiment reads the sequence in both directions; intent only forwards.
    pub fn is_bidirectional(&self) -> bool {
        matches!(self, Axis::Sentiment)
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Axis {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sentiment" => Ok(Axis::Sentiment),
            "intent"    => Ok(Axis::Intent),
            other => Err(PipelineError::invalid_input(format!("unknown axis '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_counts() {
        assert_eq!(Axis::Sentiment.classes().len(), 3);
        assert_eq!(Axis::Intent.classes().len(), 5);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Intent".parse::<Axis>().unwrap(), Axis::Intent);
        assert!("topic".parse::<Axis>().is_err());
    }
}
