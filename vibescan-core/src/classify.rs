//! Classifier — maps a composite score to a (sentiment, action) pair.
//!
//! Bands, checked high to low:
//!
//! | score          | sentiment      | action                  |
//! |----------------|----------------|-------------------------|
//! | >= 8           | Strong Bullish | accumulate aggressively |
//! | 4 ..= 7        | Bullish        | accumulate              |
//! | -3 ..= 3       | Neutral        | hold/wait               |
//! | -7 ..= -4      | Bearish        | distribute              |
//! | <= -8          | Strong Bearish | avoid                   |

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sentiment {
    #[serde(rename = "Strong Bearish")]
    StrongBearish,
    Bearish,
    Neutral,
    Bullish,
    #[serde(rename = "Strong Bullish")]
    StrongBullish,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::StrongBullish => "Strong Bullish",
            Sentiment::Bullish => "Bullish",
            Sentiment::Neutral => "Neutral",
            Sentiment::Bearish => "Bearish",
            Sentiment::StrongBearish => "Strong Bearish",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "accumulate aggressively")]
    AccumulateAggressively,
    #[serde(rename = "accumulate")]
    Accumulate,
    #[serde(rename = "hold/wait")]
    HoldWait,
    #[serde(rename = "distribute")]
    Distribute,
    #[serde(rename = "avoid")]
    Avoid,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::AccumulateAggressively => "accumulate aggressively",
            Action::Accumulate => "accumulate",
            Action::HoldWait => "hold/wait",
            Action::Distribute => "distribute",
            Action::Avoid => "avoid",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Classification {
    pub sentiment: Sentiment,
    pub action: Action,
}

pub fn classify(score: i32) -> Classification {
    let (sentiment, action) = if score >= 8 {
        (Sentiment::StrongBullish, Action::AccumulateAggressively)
    } else if score >= 4 {
        (Sentiment::Bullish, Action::Accumulate)
    } else if score > -4 {
        (Sentiment::Neutral, Action::HoldWait)
    } else if score > -8 {
        (Sentiment::Bearish, Action::Distribute)
    } else {
        (Sentiment::StrongBearish, Action::Avoid)
    };
    Classification { sentiment, action }
}
