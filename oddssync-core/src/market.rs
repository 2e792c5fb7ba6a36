//! Market data structures for betting markets

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// Odds
// ============================================================================

/// Payout multiplier and cumulative stake for one option of a market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Odds {
    /// Index into the market's option labels
    pub option_index: u32,
    /// Current payout multiplier (opaque, supplied by the server)
    pub odds: Decimal,
    /// Cumulative amount bet on this option
    pub total_amount: Decimal,
    /// When the server last touched this entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
}

impl Odds {
    /// Create a new odds entry without an update timestamp
    pub fn new(option_index: u32, odds: Decimal, total_amount: Decimal) -> Self {
        Self {
            option_index,
            odds,
            total_amount,
            last_update: None,
        }
    }

    /// Overwrite this entry with the fields present on `incoming`
    pub fn merge_from(&mut self, incoming: &Odds) {
        self.odds = incoming.odds;
        self.total_amount = incoming.total_amount;
        if incoming.last_update.is_some() {
            self.last_update = incoming.last_update;
        }
    }
}

/// Merge an incoming odds list into an existing one, keyed by option index.
///
/// Entries sharing an option index are overwritten field by field, unknown
/// indices are appended in incoming order, and existing entries the incoming
/// list does not mention are kept where they are.
pub fn merge_odds(existing: &mut Vec<Odds>, incoming: &[Odds]) {
    for entry in incoming {
        match existing
            .iter_mut()
            .find(|o| o.option_index == entry.option_index)
        {
            Some(current) => current.merge_from(entry),
            None => existing.push(entry.clone()),
        }
    }
}

// ============================================================================
// Market
// ============================================================================

/// A single prediction market with discrete betting options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    /// Unique market identifier
    pub id: String,

    /// Microchain hosting the market
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,

    /// Account that created the market
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,

    /// Human-readable question
    pub description: String,

    /// Option labels, in display order
    pub options: Vec<String>,

    /// Aggregate liquidity
    pub liquidity: Decimal,

    /// Aggregate amount bet across all options
    pub total_bets: Decimal,

    /// Number of bets placed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_bets_count: Option<u64>,

    /// Whether the market still accepts bets
    pub is_active: bool,

    /// When the market was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// When the market was resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,

    /// Index of the winning option once resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winning_option: Option<u32>,

    /// Per-option odds, unique by option index
    #[serde(default)]
    pub odds: Vec<Odds>,
}

impl Market {
    /// Create a new active market with no odds
    pub fn new(id: impl Into<String>, description: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            id: id.into(),
            chain_id: None,
            creator: None,
            description: description.into(),
            options,
            liquidity: Decimal::ZERO,
            total_bets: Decimal::ZERO,
            total_bets_count: None,
            is_active: true,
            created_at: None,
            resolved_at: None,
            winning_option: None,
            odds: Vec::new(),
        }
    }

    /// Check whether `index` points at one of this market's options
    pub fn is_valid_option(&self, index: u32) -> bool {
        (index as usize) < self.options.len()
    }

    /// Get the odds entry for an option
    pub fn odds_for(&self, option_index: u32) -> Option<&Odds> {
        self.odds.iter().find(|o| o.option_index == option_index)
    }

    /// Label of the winning option, if resolved
    pub fn winning_label(&self) -> Option<&str> {
        self.winning_option
            .and_then(|i| self.options.get(i as usize))
            .map(String::as_str)
    }

    /// Restore the odds invariants: no repeated option index and no index
    /// outside the option list. Repeated entries are folded in order.
    ///
    /// Returns the number of entries dropped.
    pub fn normalize(&mut self) -> usize {
        let before = self.odds.len();
        let incoming = std::mem::take(&mut self.odds);
        let option_count = self.options.len();
        let valid: Vec<Odds> = incoming
            .into_iter()
            .filter(|o| (o.option_index as usize) < option_count)
            .collect();
        merge_odds(&mut self.odds, &valid);
        before - self.odds.len()
    }

    /// Apply an update for the same market.
    ///
    /// Required scalar fields are replaced wholesale. Optional metadata
    /// (chain, creator, timestamps, winner, bet count) is only replaced when
    /// the update carries it, since the push stream omits those fields.
    /// Odds are merged with [`merge_odds`].
    pub fn merge_update(&mut self, incoming: Market) {
        let Market {
            id: _,
            chain_id,
            creator,
            description,
            options,
            liquidity,
            total_bets,
            total_bets_count,
            is_active,
            created_at,
            resolved_at,
            winning_option,
            odds,
        } = incoming;

        self.description = description;
        self.options = options;
        self.liquidity = liquidity;
        self.total_bets = total_bets;
        self.is_active = is_active;

        if chain_id.is_some() {
            self.chain_id = chain_id;
        }
        if creator.is_some() {
            self.creator = creator;
        }
        if total_bets_count.is_some() {
            self.total_bets_count = total_bets_count;
        }
        if created_at.is_some() {
            self.created_at = created_at;
        }
        if resolved_at.is_some() {
            self.resolved_at = resolved_at;
        }
        if winning_option.is_some() {
            self.winning_option = winning_option;
        }

        merge_odds(&mut self.odds, &odds);
    }
}

/// One page of a filtered, sorted market query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPage {
    /// Markets on this page, in server order
    pub markets: Vec<Market>,
    /// Total number of markets matching the filter
    pub total_count: u64,
}

impl MarketPage {
    /// Number of pages needed to show `total_count` markets (at least 1)
    pub fn total_pages(total_count: u64, page_size: u32) -> u64 {
        if page_size == 0 {
            return 1;
        }
        total_count.div_ceil(page_size as u64).max(1)
    }
}
