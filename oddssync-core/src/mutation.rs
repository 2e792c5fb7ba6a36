//! Parameters and results for contract mutations

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{FieldError, MutationError};
use crate::market::{Market, Odds};

/// Longest market description accepted by the create form
pub const MAX_DESCRIPTION_LEN: usize = 200;

/// Option count bounds for a new market
pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 10;

/// Initial liquidity bounds for a new market
pub const MIN_INITIAL_LIQUIDITY: u32 = 10;
pub const MAX_INITIAL_LIQUIDITY: u32 = 100_000;

/// Bet size bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetLimits {
    pub min_bet: Decimal,
    pub max_bet: Decimal,
}

impl Default for BetLimits {
    fn default() -> Self {
        Self {
            min_bet: Decimal::ONE,
            max_bet: Decimal::from(1000),
        }
    }
}

/// Request to create a new market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMarketParams {
    pub description: String,
    pub options: Vec<String>,
    pub initial_liquidity: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_bet: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bet: Option<Decimal>,
}

impl CreateMarketParams {
    /// Check the form rules and return the cleaned-up request (trimmed
    /// description, blank options removed).
    pub fn validated(mut self) -> Result<Self, MutationError> {
        let mut errors = Vec::new();

        self.description = self.description.trim().to_string();
        if self.description.is_empty() {
            errors.push(FieldError::new("description", "Description is required"));
        } else if self.description.chars().count() > MAX_DESCRIPTION_LEN {
            errors.push(FieldError::new(
                "description",
                format!("Description too long (max {} chars)", MAX_DESCRIPTION_LEN),
            ));
        }

        self.options = self
            .options
            .iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();
        if self.options.len() < MIN_OPTIONS {
            errors.push(FieldError::new(
                "options",
                format!("At least {} options are required", MIN_OPTIONS),
            ));
        } else if self.options.len() > MAX_OPTIONS {
            errors.push(FieldError::new(
                "options",
                format!("At most {} options are allowed", MAX_OPTIONS),
            ));
        }

        let min_liquidity = Decimal::from(MIN_INITIAL_LIQUIDITY);
        let max_liquidity = Decimal::from(MAX_INITIAL_LIQUIDITY);
        if self.initial_liquidity < min_liquidity || self.initial_liquidity > max_liquidity {
            errors.push(FieldError::new(
                "initialLiquidity",
                format!(
                    "Liquidity must be between ${} and ${}",
                    MIN_INITIAL_LIQUIDITY, MAX_INITIAL_LIQUIDITY
                ),
            ));
        }

        let defaults = BetLimits::default();
        let min_bet = self.min_bet.unwrap_or(defaults.min_bet);
        let max_bet = self.max_bet.unwrap_or(defaults.max_bet);
        if min_bet >= max_bet {
            errors.push(FieldError::new("minBet", "Min bet must be less than max bet"));
        }

        if errors.is_empty() {
            Ok(self)
        } else {
            Err(MutationError::Validation(errors))
        }
    }

    /// Bet limits this market will enforce
    pub fn bet_limits(&self) -> BetLimits {
        let defaults = BetLimits::default();
        BetLimits {
            min_bet: self.min_bet.unwrap_or(defaults.min_bet),
            max_bet: self.max_bet.unwrap_or(defaults.max_bet),
        }
    }
}

/// Request to place a bet on one option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBetParams {
    pub market_id: String,
    pub option_index: u32,
    pub amount: Decimal,
}

impl PlaceBetParams {
    /// Check the bet against the limits and, when known locally, the market
    pub fn validate(&self, market: Option<&Market>, limits: &BetLimits) -> Result<(), MutationError> {
        let mut errors = Vec::new();

        if self.amount < limits.min_bet {
            errors.push(FieldError::new(
                "amount",
                format!("Minimum bet is ${}", limits.min_bet),
            ));
        } else if self.amount > limits.max_bet {
            errors.push(FieldError::new(
                "amount",
                format!("Maximum bet is ${}", limits.max_bet),
            ));
        }

        if let Some(market) = market {
            if !market.is_active {
                errors.push(FieldError::new("marketId", "Market is no longer active"));
            }
            if !market.is_valid_option(self.option_index) {
                errors.push(FieldError::new(
                    "optionIndex",
                    format!("Option {} does not exist", self.option_index),
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(MutationError::Validation(errors))
        }
    }
}

/// Request to resolve a market with a winning option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveMarketParams {
    pub market_id: String,
    pub winning_option: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_data: Option<String>,
}

impl ResolveMarketParams {
    pub fn validate(&self, market: Option<&Market>) -> Result<(), MutationError> {
        match market {
            Some(market) if !market.is_valid_option(self.winning_option) => {
                Err(MutationError::Validation(vec![FieldError::new(
                    "winningOption",
                    format!("Option {} does not exist", self.winning_option),
                )]))
            }
            _ => Ok(()),
        }
    }
}

/// Request to add liquidity to a market
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLiquidityParams {
    pub market_id: String,
    pub amount: Decimal,
}

impl AddLiquidityParams {
    pub fn validate(&self) -> Result<(), MutationError> {
        if self.amount <= Decimal::ZERO {
            return Err(MutationError::Validation(vec![FieldError::new(
                "amount",
                "Amount must be greater than zero",
            )]));
        }
        Ok(())
    }
}

/// Result of a submitted mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    /// Transaction identifier returned by the contract binding
    pub transaction_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Odds after the mutation, when the server reports them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub new_odds: Vec<Odds>,
}

impl TransactionReceipt {
    pub fn new(transaction_id: impl Into<String>) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            market_id: None,
            bet_id: None,
            timestamp: None,
            new_odds: Vec::new(),
        }
    }
}

/// Payout for a bet at the given multiplier, rounded to cents
pub fn potential_payout(amount: Decimal, odds: Decimal) -> Decimal {
    (amount * odds).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn create_params() -> CreateMarketParams {
        CreateMarketParams {
            description: "  Will it rain tomorrow? ".into(),
            options: vec!["Yes".into(), " ".into(), "No".into()],
            initial_liquidity: dec!(100),
            category: None,
            resolution_time: None,
            min_bet: None,
            max_bet: None,
        }
    }

    #[test]
    fn test_create_validation_cleans_input() {
        let params = create_params().validated().unwrap();
        assert_eq!(params.description, "Will it rain tomorrow?");
        assert_eq!(params.options, vec!["Yes".to_string(), "No".to_string()]);
    }

    #[test]
    fn test_create_validation_collects_errors() {
        let params = CreateMarketParams {
            description: "x".repeat(201),
            options: vec!["Only".into()],
            initial_liquidity: dec!(5),
            min_bet: Some(dec!(50)),
            max_bet: Some(dec!(10)),
            ..create_params()
        };

        let err = params.validated().unwrap_err();
        let fields: Vec<&str> = err.field_errors().iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["description", "options", "initialLiquidity", "minBet"]);
    }

    #[test]
    fn test_bet_limits() {
        let limits = BetLimits::default();
        let mut bet = PlaceBetParams {
            market_id: "1".into(),
            option_index: 0,
            amount: dec!(0.5),
        };
        assert!(bet.validate(None, &limits).is_err());

        bet.amount = dec!(1000.01);
        assert!(bet.validate(None, &limits).is_err());

        bet.amount = dec!(25);
        assert!(bet.validate(None, &limits).is_ok());
    }

    #[test]
    fn test_bet_against_known_market() {
        let mut market = Market::new("1", "Coin flip", vec!["Heads".into(), "Tails".into()]);
        let bet = PlaceBetParams {
            market_id: "1".into(),
            option_index: 2,
            amount: dec!(10),
        };

        let err = bet.validate(Some(&market), &BetLimits::default()).unwrap_err();
        assert_eq!(err.field_errors()[0].field, "optionIndex");

        market.is_active = false;
        let ok_index = PlaceBetParams { option_index: 1, ..bet };
        let err = ok_index.validate(Some(&market), &BetLimits::default()).unwrap_err();
        assert_eq!(err.field_errors()[0].field, "marketId");
    }

    #[test]
    fn test_resolve_and_liquidity_validation() {
        let market = Market::new("1", "Coin flip", vec!["Heads".into(), "Tails".into()]);
        let resolve = ResolveMarketParams {
            market_id: "1".into(),
            winning_option: 3,
            resolution_data: None,
        };
        assert!(resolve.validate(Some(&market)).is_err());
        assert!(resolve.validate(None).is_ok());

        let liquidity = AddLiquidityParams {
            market_id: "1".into(),
            amount: Decimal::ZERO,
        };
        assert!(liquidity.validate().is_err());
    }

    #[test]
    fn test_potential_payout() {
        assert_eq!(potential_payout(dec!(10), dec!(1.755)), dec!(17.55));
        assert_eq!(potential_payout(dec!(3.333), dec!(2)), dec!(6.67));
    }
}
