//! Strategy configuration.
//!
//! [`StrategyParams`] is what the operator writes in the config file.
//! [`StrategyConfig`] is the validated, immutable value built once at
//! startup from the params and the instrument's lot size; every component
//! receives it by reference.

use quoter_core::{Qty, BOOK_DEPTH};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Upper bound on slots per side.
pub const MAX_POOL_SIZE: usize = 8;

/// Operator-supplied strategy parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StrategyParams {
    /// Inventory cap in lots (scaled by the instrument lot size).
    #[serde(default = "default_max_position_lots")]
    pub max_position_lots: i64,

    /// Minimum price move (ticks) that justifies a replace.
    /// Quantity changes always replace regardless of this value.
    #[serde(default = "default_min_price_diff")]
    pub min_price_diff: i64,

    /// Number of top levels per side that must carry a quote for a
    /// snapshot to be usable.
    #[serde(default = "default_min_valid_depth")]
    pub min_valid_depth: usize,

    /// Book depth index the quotes are placed at (0 = best).
    #[serde(default = "default_placed_depth")]
    pub placed_depth: usize,

    /// Order slots per side. Slot 0 builds inventory, slot 1 squares it off.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Measure and log tick-to-order latency for every cycle.
    #[serde(default)]
    pub tick_to_order_latency: bool,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            max_position_lots: default_max_position_lots(),
            min_price_diff: default_min_price_diff(),
            min_valid_depth: default_min_valid_depth(),
            placed_depth: default_placed_depth(),
            pool_size: default_pool_size(),
            tick_to_order_latency: false,
        }
    }
}

fn default_max_position_lots() -> i64 {
    1
}
fn default_min_price_diff() -> i64 {
    1
}
fn default_min_valid_depth() -> usize {
    5
}
fn default_placed_depth() -> usize {
    2
}
fn default_pool_size() -> usize {
    2
}

/// Validated, immutable strategy configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyConfig {
    max_position_lots: i64,
    lot_size: i64,
    inventory_cap: Qty,
    min_price_diff: u64,
    min_valid_depth: usize,
    placed_depth: usize,
    pool_size: usize,
    tick_to_order_latency: bool,
}

impl StrategyConfig {
    /// Validate `params` against the instrument lot size.
    pub fn new(params: &StrategyParams, lot_size: i64) -> Result<Self, ConfigError> {
        if params.max_position_lots <= 0 {
            return Err(ConfigError::out_of_range(
                "max_position_lots",
                params.max_position_lots,
                "must be positive",
            ));
        }
        if lot_size <= 0 {
            return Err(ConfigError::out_of_range(
                "lot_size",
                lot_size,
                "must be positive",
            ));
        }
        if params.min_price_diff < 0 {
            return Err(ConfigError::out_of_range(
                "min_price_diff",
                params.min_price_diff,
                "must not be negative",
            ));
        }
        if params.min_valid_depth == 0 || params.min_valid_depth > BOOK_DEPTH {
            return Err(ConfigError::out_of_range(
                "min_valid_depth",
                params.min_valid_depth as i64,
                "must be within 1..=20",
            ));
        }
        // The placed level must be one the validator has checked.
        if params.placed_depth >= params.min_valid_depth {
            return Err(ConfigError::out_of_range(
                "placed_depth",
                params.placed_depth as i64,
                "must be below min_valid_depth",
            ));
        }
        if params.pool_size == 0 || params.pool_size > MAX_POOL_SIZE {
            return Err(ConfigError::out_of_range(
                "pool_size",
                params.pool_size as i64,
                "must be within 1..=8",
            ));
        }
        let inventory_cap = params
            .max_position_lots
            .checked_mul(lot_size)
            .ok_or(ConfigError::Overflow("max_position_lots * lot_size"))?;

        Ok(Self {
            max_position_lots: params.max_position_lots,
            lot_size,
            inventory_cap: Qty::new(inventory_cap),
            min_price_diff: params.min_price_diff as u64,
            min_valid_depth: params.min_valid_depth,
            placed_depth: params.placed_depth,
            pool_size: params.pool_size,
            tick_to_order_latency: params.tick_to_order_latency,
        })
    }

    pub fn max_position_lots(&self) -> i64 {
        self.max_position_lots
    }

    pub fn lot_size(&self) -> i64 {
        self.lot_size
    }

    /// Inventory cap in exchange units.
    pub fn inventory_cap(&self) -> Qty {
        self.inventory_cap
    }

    pub fn min_price_diff(&self) -> u64 {
        self.min_price_diff
    }

    pub fn min_valid_depth(&self) -> usize {
        self.min_valid_depth
    }

    pub fn placed_depth(&self) -> usize {
        self.placed_depth
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Whether the square-off role has a slot.
    pub fn has_square_off_slot(&self) -> bool {
        self.pool_size > 1
    }

    pub fn tick_to_order_latency(&self) -> bool {
        self.tick_to_order_latency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = StrategyParams::default();
        assert_eq!(params.max_position_lots, 1);
        assert_eq!(params.min_price_diff, 1);
        assert_eq!(params.min_valid_depth, 5);
        assert_eq!(params.placed_depth, 2);
        assert_eq!(params.pool_size, 2);
        assert!(!params.tick_to_order_latency);
    }

    #[test]
    fn test_params_serde_defaults() {
        let toml_str = r#"
max_position_lots = 4
min_price_diff = 5
"#;
        let params: StrategyParams = toml::from_str(toml_str).unwrap();
        assert_eq!(params.max_position_lots, 4);
        assert_eq!(params.min_price_diff, 5);
        assert_eq!(params.placed_depth, 2);
        assert_eq!(params.pool_size, 2);
    }

    #[test]
    fn test_cap_is_lot_scaled() {
        let params = StrategyParams {
            max_position_lots: 4,
            ..StrategyParams::default()
        };
        let config = StrategyConfig::new(&params, 25).unwrap();
        assert_eq!(config.inventory_cap(), Qty::new(100));
        assert_eq!(config.max_position_lots(), 4);
        assert!(config.has_square_off_slot());
    }

    #[test]
    fn test_rejects_non_positive_cap() {
        let params = StrategyParams {
            max_position_lots: 0,
            ..StrategyParams::default()
        };
        let err = StrategyConfig::new(&params, 1).unwrap_err();
        assert!(err.to_string().contains("max_position_lots"));
    }

    #[test]
    fn test_rejects_bad_lot_size() {
        assert!(StrategyConfig::new(&StrategyParams::default(), 0).is_err());
    }

    #[test]
    fn test_rejects_negative_min_price_diff() {
        let params = StrategyParams {
            min_price_diff: -1,
            ..StrategyParams::default()
        };
        assert!(StrategyConfig::new(&params, 1).is_err());
    }

    #[test]
    fn test_rejects_depth_out_of_range() {
        let too_deep = StrategyParams {
            min_valid_depth: BOOK_DEPTH + 1,
            ..StrategyParams::default()
        };
        assert!(StrategyConfig::new(&too_deep, 1).is_err());

        let zero = StrategyParams {
            min_valid_depth: 0,
            ..StrategyParams::default()
        };
        assert!(StrategyConfig::new(&zero, 1).is_err());
    }

    #[test]
    fn test_placed_depth_must_be_validated() {
        let params = StrategyParams {
            min_valid_depth: 2,
            placed_depth: 2,
            ..StrategyParams::default()
        };
        let err = StrategyConfig::new(&params, 1).unwrap_err();
        assert!(err.to_string().contains("placed_depth"));
    }

    #[test]
    fn test_pool_size_bounds() {
        let single = StrategyParams {
            pool_size: 1,
            ..StrategyParams::default()
        };
        let config = StrategyConfig::new(&single, 1).unwrap();
        assert!(!config.has_square_off_slot());

        let empty = StrategyParams {
            pool_size: 0,
            ..StrategyParams::default()
        };
        assert!(StrategyConfig::new(&empty, 1).is_err());

        let huge = StrategyParams {
            pool_size: MAX_POOL_SIZE + 1,
            ..StrategyParams::default()
        };
        assert!(StrategyConfig::new(&huge, 1).is_err());
    }

    #[test]
    fn test_cap_overflow() {
        let params = StrategyParams {
            max_position_lots: i64::MAX,
            ..StrategyParams::default()
        };
        assert!(matches!(
            StrategyConfig::new(&params, 2),
            Err(ConfigError::Overflow(_))
        ));
    }
}
