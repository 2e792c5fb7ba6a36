//! Client-side filter state for the market list

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Market category shown in the filter bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    All,
    Sports,
    Esports,
    Politics,
    Finance,
    Entertainment,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::All => "all",
            Category::Sports => "sports",
            Category::Esports => "esports",
            Category::Politics => "politics",
            Category::Finance => "finance",
            Category::Entertainment => "entertainment",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Category::All),
            "sports" => Ok(Category::Sports),
            "esports" => Ok(Category::Esports),
            "politics" => Ok(Category::Politics),
            "finance" => Ok(Category::Finance),
            "entertainment" => Ok(Category::Entertainment),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

/// Status filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    /// Markets still accepting bets
    Active,
    /// Markets with a winning option
    Resolved,
    /// Markets with deep liquidity (no server-side equivalent)
    HighLiquidity,
}

impl StatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::Active => "active",
            StatusFilter::Resolved => "resolved",
            StatusFilter::HighLiquidity => "high_liquidity",
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(StatusFilter::Active),
            "resolved" => Ok(StatusFilter::Resolved),
            "high_liquidity" => Ok(StatusFilter::HighLiquidity),
            _ => Err(format!("Unknown status: {}", s)),
        }
    }
}

/// Sort order for the market list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    LiquidityDesc,
    BetsDesc,
    CreatedDesc,
    OddsVolatility,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::LiquidityDesc => "liquidity_desc",
            SortKey::BetsDesc => "bets_desc",
            SortKey::CreatedDesc => "created_desc",
            SortKey::OddsVolatility => "odds_volatility",
        }
    }

    /// The `MarketSort` enum value the server expects
    pub fn server_key(&self) -> &'static str {
        match self {
            SortKey::LiquidityDesc => "LIQUIDITY_DESC",
            SortKey::BetsDesc => "BETS_DESC",
            SortKey::CreatedDesc => "CREATED_DESC",
            SortKey::OddsVolatility => "ODDS_VOLATILITY",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "liquidity_desc" => Ok(SortKey::LiquidityDesc),
            "bets_desc" => Ok(SortKey::BetsDesc),
            "created_desc" => Ok(SortKey::CreatedDesc),
            "odds_volatility" => Ok(SortKey::OddsVolatility),
            _ => Err(format!("Unknown sort key: {}", s)),
        }
    }
}

/// Current filter, sort and search selection.
///
/// `None` means the value was not recognized; it is left out of the server
/// request instead of failing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub category: Option<Category>,
    pub status: Option<StatusFilter>,
    pub sort: Option<SortKey>,
    #[serde(default)]
    pub search: String,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            category: Some(Category::All),
            status: Some(StatusFilter::Active),
            sort: Some(SortKey::LiquidityDesc),
            search: String::new(),
        }
    }
}

impl FilterState {
    /// Build a filter from raw UI strings. Never fails: unknown values
    /// become `None`.
    pub fn from_raw(
        category: Option<&str>,
        status: Option<&str>,
        sort: Option<&str>,
        search: Option<&str>,
    ) -> Self {
        Self {
            category: category.and_then(|c| c.parse().ok()),
            status: status.and_then(|s| s.parse().ok()),
            sort: sort.and_then(|s| s.parse().ok()),
            search: search.map(|s| s.trim().to_string()).unwrap_or_default(),
        }
    }

    /// Trimmed search text, if any
    pub fn search_text(&self) -> Option<&str> {
        let text = self.search.trim();
        (!text.is_empty()).then_some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        let filter = FilterState::default();
        assert_eq!(filter.category, Some(Category::All));
        assert_eq!(filter.status, Some(StatusFilter::Active));
        assert_eq!(filter.sort, Some(SortKey::LiquidityDesc));
        assert_eq!(filter.search_text(), None);
    }

    #[test]
    fn test_from_raw_drops_unknown_values() {
        let filter = FilterState::from_raw(
            Some("crypto"),
            Some("RESOLVED"),
            Some("most_popular"),
            Some("  world cup "),
        );

        assert_eq!(filter.category, None);
        assert_eq!(filter.status, Some(StatusFilter::Resolved));
        assert_eq!(filter.sort, None);
        assert_eq!(filter.search_text(), Some("world cup"));
    }

    #[test]
    fn test_sort_server_keys() {
        assert_eq!(SortKey::LiquidityDesc.server_key(), "LIQUIDITY_DESC");
        assert_eq!(SortKey::BetsDesc.server_key(), "BETS_DESC");
        assert_eq!(SortKey::CreatedDesc.server_key(), "CREATED_DESC");
        assert_eq!(SortKey::OddsVolatility.server_key(), "ODDS_VOLATILITY");
    }

    #[test]
    fn test_round_trip_labels() {
        for status in [StatusFilter::Active, StatusFilter::Resolved, StatusFilter::HighLiquidity] {
            assert_eq!(status.as_str().parse::<StatusFilter>(), Ok(status));
        }
    }
}
