//! Human-format amounts.
//!
//! Model parameters express capacities and fees either as plain numbers or
//! as strings with a magnitude suffix (`5M`, `300k`, `0.2cent`, `0.5%`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GeneratorError;

/// Suffixes checked longest first so that `CENTS` wins over `C`
const SUFFIX_FACTORS: &[(&str, f64)] = &[
    ("CENTS", 1e-2),
    ("CENT", 1e-2),
    ("K", 1e3),
    ("M", 1e6),
    ("B", 1e9),
    ("C", 1e-2),
    ("%", 1e-2),
];

/// Decode a human-format amount string into a float.
///
/// # Examples
/// ```
/// use plasmagen::utils::decode_amount;
///
/// assert_eq!(decode_amount("5M").unwrap(), 5_000_000.0);
/// assert_eq!(decode_amount("300k").unwrap(), 300_000.0);
/// assert!((decode_amount("0.2cent").unwrap() - 0.002).abs() < 1e-12);
/// assert!(decode_amount("lots").is_err());
/// ```
pub fn decode_amount(value: &str) -> Result<f64, GeneratorError> {
    let trimmed = value.trim();
    let upper = trimmed.to_uppercase();
    for (suffix, factor) in SUFFIX_FACTORS {
        if upper.ends_with(suffix) {
            let number = trimmed
                .len()
                .checked_sub(suffix.len())
                .and_then(|end| trimmed.get(..end))
                .ok_or_else(|| GeneratorError::InvalidAmount(value.to_string()))?;
            return number
                .trim()
                .parse::<f64>()
                .map(|n| n * factor)
                .map_err(|_| GeneratorError::InvalidAmount(value.to_string()));
        }
    }
    trimmed
        .parse::<f64>()
        .map_err(|_| GeneratorError::InvalidAmount(value.to_string()))
}

/// An amount read from configuration, stored as a float
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "AmountRepr", into = "f64")]
pub struct Amount(pub f64);

impl Amount {
    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<Amount> for f64 {
    fn from(amount: Amount) -> f64 {
        amount.0
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Amount(value)
    }
}

impl FromStr for Amount {
    type Err = GeneratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_amount(s).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AmountRepr {
    Number(f64),
    Text(String),
}

impl TryFrom<AmountRepr> for Amount {
    type Error = GeneratorError;

    fn try_from(repr: AmountRepr) -> Result<Self, Self::Error> {
        match repr {
            AmountRepr::Number(n) => Ok(Amount(n)),
            AmountRepr::Text(s) => s.parse(),
        }
    }
}

/// Round `value` to `digits` decimal places, half to even.
pub fn float_round(value: f64, digits: u32) -> f64 {
    let scale = 10f64.powi(digits as i32);
    (value * scale).round_ties_even() / scale
}

/// Round `value` up to `digits` decimal places.
pub fn float_round_up(value: f64, digits: u32) -> f64 {
    let scale = 10f64.powi(digits as i32);
    (value * scale).ceil() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_suffixes() {
        assert_eq!(decode_amount("1B").unwrap(), 1e9);
        assert_eq!(decode_amount("2k").unwrap(), 2000.0);
        assert!((decode_amount("0.5%").unwrap() - 0.005).abs() < 1e-12);
        assert!((decode_amount("3cents").unwrap() - 0.03).abs() < 1e-12);
        assert_eq!(decode_amount("42").unwrap(), 42.0);
        assert_eq!(decode_amount(" 7 ").unwrap(), 7.0);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert_eq!(
            decode_amount("xM"),
            Err(GeneratorError::InvalidAmount("xM".to_string()))
        );
        assert!(decode_amount("").is_err());
    }

    #[test]
    fn test_amount_deserializes_from_number_or_string() {
        let a: Amount = serde_json::from_str("\"5M\"").unwrap();
        assert_eq!(a.value(), 5e6);
        let b: Amount = serde_json::from_str("1500").unwrap();
        assert_eq!(b.value(), 1500.0);
        assert!(serde_json::from_str::<Amount>("\"five\"").is_err());
    }

    #[test]
    fn test_float_round() {
        assert_eq!(float_round(1.234, 2), 1.23);
        assert_eq!(float_round(1.0, 0), 1.0);
        assert_eq!(float_round_up(1.231, 2), 1.24);
        assert_eq!(float_round_up(2.0, 2), 2.0);
    }
}
