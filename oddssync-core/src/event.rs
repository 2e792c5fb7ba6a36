//! Push events from the market update stream

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::market::{Market, Odds};

/// A single incremental change pushed by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MarketUpdateEvent {
    /// A market was created
    Created(Market),
    /// A market's liquidity, totals or odds changed
    Updated(Market),
    /// A market was resolved and leaves the active working set
    Resolved(String),
    /// Fresh odds for one market from its `liveOdds` stream; merged by
    /// option index like the odds of an update
    OddsChanged { market_id: String, odds: Vec<Odds> },
}

impl MarketUpdateEvent {
    /// Identifier of the market this event targets
    pub fn market_id(&self) -> &str {
        match self {
            Self::Created(market) | Self::Updated(market) => &market.id,
            Self::Resolved(id) => id,
            Self::OddsChanged { market_id, .. } => market_id,
        }
    }

    pub fn kind(&self) -> MarketUpdateKind {
        match self {
            Self::Created(_) => MarketUpdateKind::Created,
            Self::Updated(_) => MarketUpdateKind::Updated,
            Self::Resolved(_) => MarketUpdateKind::Resolved,
            Self::OddsChanged { .. } => MarketUpdateKind::OddsChanged,
        }
    }
}

/// Event tag as sent on the wire (`CREATED`, `UPDATED`, `RESOLVED`,
/// `ODDS_CHANGED`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketUpdateKind {
    Created,
    Updated,
    Resolved,
    OddsChanged,
}

impl fmt::Display for MarketUpdateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketUpdateKind::Created => write!(f, "CREATED"),
            MarketUpdateKind::Updated => write!(f, "UPDATED"),
            MarketUpdateKind::Resolved => write!(f, "RESOLVED"),
            MarketUpdateKind::OddsChanged => write!(f, "ODDS_CHANGED"),
        }
    }
}

impl FromStr for MarketUpdateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CREATED" => Ok(MarketUpdateKind::Created),
            "UPDATED" => Ok(MarketUpdateKind::Updated),
            "RESOLVED" => Ok(MarketUpdateKind::Resolved),
            "ODDS_CHANGED" => Ok(MarketUpdateKind::OddsChanged),
            _ => Err(format!("Unknown update type: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_odds_changed_targets_its_market() {
        let event = MarketUpdateEvent::OddsChanged {
            market_id: "m4".into(),
            odds: vec![Odds::new(1, dec!(2.2), dec!(40))],
        };
        assert_eq!(event.market_id(), "m4");
        assert_eq!(event.kind(), MarketUpdateKind::OddsChanged);
        assert_eq!(event.kind().to_string(), "ODDS_CHANGED");
        assert_eq!("odds_changed".parse::<MarketUpdateKind>(), Ok(MarketUpdateKind::OddsChanged));
    }
}
