/// Order Validator - Business Rule Validation
///
/// Checks a placement request before anything is mutated.
///
/// ## Validation Rules
/// - Amount must be positive and at least the configured minimum
/// - Amount must not exceed the configured maximum
/// - Tick spacing of the pool must be positive
/// - Requested tick must lie inside the valid tick range
///
/// ## Usage
/// ```rust,ignore
/// use limit_order_engine::domain::validation::OrderValidator;
///
/// let validator = OrderValidator::new();
/// validator.validate_placement(&key, 125, 5000)?;
/// ```

use crate::domain::tick_math::{check_tick, check_width};
use crate::error::PreconditionError;
use crate::shared::protocol::PoolKey;
use serde::{Deserialize, Serialize};

/// Order validation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Minimum placement size (inclusive)
    pub min_order_size: u128,

    /// Maximum placement size (inclusive)
    pub max_order_size: u128,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_order_size: 1,
            max_order_size: u128::MAX,
        }
    }
}

/// Order validator
pub struct OrderValidator {
    config: ValidationConfig,
}

impl OrderValidator {
    /// Creates a new validator with default configuration
    pub fn new() -> Self {
        Self {
            config: ValidationConfig::default(),
        }
    }

    /// Creates a new validator with custom configuration
    pub fn with_config(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validates a placement of `amount` at raw tick `tick` on `key`
    pub fn validate_placement(
        &self,
        key: &PoolKey,
        tick: i32,
        amount: u128,
    ) -> Result<(), PreconditionError> {
        check_width(key.tick_spacing)?;
        check_tick(tick)?;
        self.validate_amount(amount)
    }

    /// Validates the amount
    pub fn validate_amount(&self, amount: u128) -> Result<(), PreconditionError> {
        if amount == 0 {
            return Err(PreconditionError::ZeroAmount);
        }

        if amount < self.config.min_order_size {
            return Err(PreconditionError::BelowMinimumSize {
                amount,
                minimum: self.config.min_order_size,
            });
        }

        if amount > self.config.max_order_size {
            return Err(PreconditionError::AboveMaximumSize {
                amount,
                maximum: self.config.max_order_size,
            });
        }

        Ok(())
    }
}

impl Default for OrderValidator {
    fn default() -> Self {
        Self::new()
    }
}
