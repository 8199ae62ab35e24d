//! Unit conversion: wei <-> ether

use alloy_primitives::utils::{format_ether, parse_ether};
use alloy_primitives::U256;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error("empty amount")]
    Empty,
    #[error("invalid ether amount {value:?}: {reason}")]
    Invalid { value: String, reason: String },
}

/// Parse a decimal ether string ("1", "0.1", "2.5") into wei
pub fn to_wei(value: &str) -> Result<U256, UnitError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(UnitError::Empty);
    }
    parse_ether(value).map_err(|err| UnitError::Invalid {
        value: value.to_string(),
        reason: err.to_string(),
    })
}

/// Format wei as a trimmed decimal ether string ("2.5", "0.1", "3")
pub fn from_wei(wei: U256) -> String {
    let formatted = format_ether(wei);
    match formatted.split_once('.') {
        Some((integer, decimal)) => {
            let decimal = decimal.trim_end_matches('0');
            if decimal.is_empty() {
                integer.to_string()
            } else {
                format!("{integer}.{decimal}")
            }
        }
        None => formatted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_wei() {
        assert_eq!(
            to_wei("1").unwrap(),
            U256::from(1_000_000_000_000_000_000u128)
        );
        assert_eq!(
            to_wei("0.1").unwrap(),
            U256::from(100_000_000_000_000_000u128)
        );
        assert_eq!(
            to_wei(" 2.5 ").unwrap(),
            U256::from(2_500_000_000_000_000_000u128)
        );
        assert_eq!(to_wei("0.000000000000000001").unwrap(), U256::from(1u64));
    }

    #[test]
    fn test_to_wei_rejects_garbage() {
        assert_eq!(to_wei(""), Err(UnitError::Empty));
        assert_eq!(to_wei("   "), Err(UnitError::Empty));
        assert!(matches!(to_wei("abc"), Err(UnitError::Invalid { .. })));
        assert!(matches!(to_wei("1.x"), Err(UnitError::Invalid { .. })));
    }

    #[test]
    fn test_from_wei() {
        assert_eq!(from_wei(U256::ZERO), "0");
        assert_eq!(from_wei(U256::from(1_000_000_000_000_000_000u128)), "1");
        assert_eq!(from_wei(U256::from(2_500_000_000_000_000_000u128)), "2.5");
        assert_eq!(from_wei(U256::from(100_000_000_000_000_000u128)), "0.1");
        assert_eq!(from_wei(U256::from(1u64)), "0.000000000000000001");
    }

    #[test]
    fn test_round_trip_keeps_decimal_value() {
        for value in ["0", "1", "0.1", "2.5", "123.456", "0.000000000000000001"] {
            assert_eq!(from_wei(to_wei(value).unwrap()), value);
        }
    }
}
